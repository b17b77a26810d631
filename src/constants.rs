/// 每个像素的通道数 (R, G, B, A)。
pub const CHANNELS_PER_PIXEL: usize = 4;

/// 每个像素中可以承载数据的通道数，Alpha 通道不参与。
pub const USABLE_CHANNELS_PER_PIXEL: usize = 3;

/// 长度头部占用的位数。
/// 长度以 `u32` 大端序 (最高位在前) 写入，每个通道字节承载 1 bit，
/// 因此需要 32 个通道字节。
pub const HEADER_BITS: usize = 32;

/// 长度头部换算成字节后的开销。
pub const HEADER_BYTES: usize = HEADER_BITS / 8;

/// 明文容器的标签前缀。
pub const TAG_PLAIN: &[u8] = b"TXT:";

/// 加密容器的标签前缀。
pub const TAG_ENCRYPTED: &[u8] = b"ENC:";

/// 标签前缀的长度 (字节)。
pub const TAG_LEN: usize = 4;

/// 容器的结束标记。
pub const END_MARKER: &[u8] = b"<<EOF>>";

/// 标签前缀与结束标记合计的封装开销 (字节)。
pub const FRAMING_OVERHEAD: usize = TAG_LEN + END_MARKER.len();

/// 当标签不在开头时，向后搜索标签的窗口大小 (字节)。
/// 用于从头部与负载之间的少量错位中恢复。
pub const TAG_SEARCH_WINDOW: usize = 20;

/// 部分恢复所需的最少可打印字节数，必须严格大于此值。
pub const PARTIAL_RECOVERY_MIN: usize = 10;

/// 部分恢复结果的显示前缀。
pub const PARTIAL_RECOVERY_PREFIX: &str = "[partial recovery] ";

/// 凯撒位移的合法范围。
pub const CAESAR_SHIFT_MIN: u8 = 1;
pub const CAESAR_SHIFT_MAX: u8 = 25;

/// 密钥派生所用的随机盐长度 (字节)。
pub const SALT_LEN: usize = 16;

/// AEAD 随机数长度 (字节)。
pub const NONCE_LEN: usize = 12;
