//! # 位平面编解码模块
//!
//! 把封装好的容器逐位写入 RGBA 通道缓冲区每个字节的最低位 (bit 0)，
//! 并能从中读回。bit 1-7 永远保持不变。
//!
//! 缓冲区的开头是一个 32 位大端序长度头部，随后是容器的各个比特 (最高位在前)。
//! 负载比特跳过 Alpha 通道字节；头部是否跳过取决于 [`Layout`]。

use crate::constants::{
    CHANNELS_PER_PIXEL, HEADER_BITS, HEADER_BYTES, PARTIAL_RECOVERY_MIN, PARTIAL_RECOVERY_PREFIX,
    USABLE_CHANNELS_PER_PIXEL,
};
use crate::container::{Tag, unframe};
use crate::error::StegoError;
use log::{debug, warn};
use std::fmt;

/// 比特在通道缓冲区中的布局方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Layout {
    /// 头部占用物理字节 0..32 (不跳过 Alpha)，负载从字节 32 开始跳过 Alpha。
    /// 与旧版工具生成的图像兼容。
    #[default]
    Compatible,
    /// 头部与负载共用同一条跳过 Alpha 的比特流，不会改动任何 Alpha 字节。
    /// 与 `Compatible` 生成的图像互不兼容。
    Uniform,
}

impl Layout {
    /// 第 `j` 个头部比特所在的物理偏移。
    pub fn header_offset(self, j: usize) -> usize {
        match self {
            Layout::Compatible => j,
            Layout::Uniform => non_alpha_offset(j),
        }
    }

    /// 第 `i` 个负载比特所在的物理偏移 (`i` 从头部之后开始计数)。
    pub fn payload_offset(self, i: usize) -> usize {
        match self {
            // 字节 32 恰好是第 8 个像素的 R 通道，起点与像素对齐
            Layout::Compatible => HEADER_BITS + non_alpha_offset(i),
            Layout::Uniform => non_alpha_offset(HEADER_BITS + i),
        }
    }

    /// 写下完整头部所需的最少物理字节数。
    pub fn header_span(self) -> usize {
        self.header_offset(HEADER_BITS - 1) + 1
    }
}

/// 判断物理偏移是否落在 Alpha 通道上。
pub fn is_alpha(offset: usize) -> bool {
    (offset + 1) % CHANNELS_PER_PIXEL == 0
}

/// 从偏移 0 起第 `k` 个非 Alpha 字节的物理偏移。
fn non_alpha_offset(k: usize) -> usize {
    k + k / USABLE_CHANNELS_PER_PIXEL
}

/// 可承载数据的通道字节数 (排除 Alpha)。
pub fn usable_channel_bytes(len: usize) -> usize {
    len / CHANNELS_PER_PIXEL * USABLE_CHANNELS_PER_PIXEL
}

/// 缓冲区的原始容量 (字节)，尚未扣除长度头部。
pub fn capacity(buffer: &[u8]) -> usize {
    usable_channel_bytes(buffer.len()) / 8
}

/// 仅凭像素尺寸计算容量 (字节)。
pub fn capacity_for_dimensions(width: u32, height: u32) -> usize {
    (width as usize * height as usize * USABLE_CHANNELS_PER_PIXEL) / 8
}

/// 扣除长度头部后，可写入的最大容器长度 (字节)。
pub fn max_container_len(buffer: &[u8]) -> usize {
    capacity(buffer).saturating_sub(HEADER_BYTES)
}

fn check_buffer(buffer: &[u8]) -> Result<(), StegoError> {
    if buffer.len() % CHANNELS_PER_PIXEL != 0 {
        return Err(StegoError::InvalidBuffer { len: buffer.len() });
    }
    Ok(())
}

fn bits_msb_first(bytes: &[u8]) -> impl Iterator<Item = u8> + '_ {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1))
}

fn pack_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (k, &bit)| acc | (bit << (7 - k)))
        })
        .collect()
}

/// 将容器写入通道缓冲区，返回写入的负载比特数。
///
/// # Errors
///
/// * 缓冲区长度不是 4 的倍数时返回 [`StegoError::InvalidBuffer`]。
/// * 容器超过 [`max_container_len`] 时返回 [`StegoError::CapacityExceeded`]，
///   此时缓冲区不会被修改。
pub fn embed(buffer: &mut [u8], container: &[u8], layout: Layout) -> Result<usize, StegoError> {
    check_buffer(buffer)?;

    let available = if buffer.len() < layout.header_span() {
        0
    } else {
        max_container_len(buffer)
    };
    let exceeded = StegoError::CapacityExceeded {
        required: container.len(),
        available,
    };
    if container.len() > available || buffer.len() < layout.header_span() {
        return Err(exceeded);
    }
    let length = u32::try_from(container.len()).map_err(|_| exceeded)?;

    debug!(
        "Embedding {} container bytes into {} channel bytes ({:?} layout, max {})",
        container.len(),
        buffer.len(),
        layout,
        available
    );

    for (j, bit) in bits_msb_first(&length.to_be_bytes()).enumerate() {
        let byte = &mut buffer[layout.header_offset(j)];
        *byte = bit | (*byte & 0xFE);
    }

    let mut written = 0;
    for (i, bit) in bits_msb_first(container).enumerate() {
        let byte = &mut buffer[layout.payload_offset(i)];
        *byte = bit | (*byte & 0xFE);
        written += 1;
    }

    Ok(written)
}

/// 读取 32 位长度头部。
///
/// # Errors
///
/// 缓冲区不足以容纳头部时返回 [`StegoError::NoHiddenData`]。
pub fn read_header(buffer: &[u8], layout: Layout) -> Result<u32, StegoError> {
    if buffer.len() < layout.header_span() {
        return Err(StegoError::NoHiddenData);
    }
    Ok((0..HEADER_BITS).fold(0u32, |acc, j| {
        (acc << 1) | u32::from(buffer[layout.header_offset(j)] & 1)
    }))
}

/// 提取结果。部分恢复是降级的成功，不是错误。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// 明文内容。
    Plain(Vec<u8>),
    /// 需要在外部解密的密文字符串。
    Encrypted(String),
    /// 没有可识别的封装，只保留了可打印 ASCII 字符。
    Partial(String),
}

impl Extracted {
    /// 是否为降级的部分恢复结果。
    pub fn is_degraded(&self) -> bool {
        matches!(self, Extracted::Partial(_))
    }
}

impl fmt::Display for Extracted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extracted::Plain(content) => write!(f, "{}", String::from_utf8_lossy(content)),
            Extracted::Encrypted(ciphertext) => write!(f, "{ciphertext}"),
            Extracted::Partial(text) => write!(f, "{PARTIAL_RECOVERY_PREFIX}{text}"),
        }
    }
}

/// 从通道缓冲区中提取容器并解析。
///
/// 状态流转：读取头部 → 校验长度 → 收集比特 → 解析封装 →
/// 明文 / 密文 / 部分恢复。
///
/// # Errors
///
/// * [`StegoError::InvalidBuffer`]：缓冲区长度不是 4 的倍数。
/// * [`StegoError::NoHiddenData`]：头部为零或超过像素总数。
/// * [`StegoError::DecodeAmbiguous`]：没有标签，可打印残留也不足。
pub fn extract(buffer: &[u8], layout: Layout) -> Result<Extracted, StegoError> {
    check_buffer(buffer)?;

    let length = read_header(buffer, layout)? as usize;
    let pixels = buffer.len() / CHANNELS_PER_PIXEL;
    if length == 0 || length > pixels {
        debug!("Header length {length} is outside 1..={pixels}");
        return Err(StegoError::NoHiddenData);
    }

    let bits: Vec<u8> = (0..length * 8)
        .map(|i| layout.payload_offset(i))
        .take_while(|&offset| offset < buffer.len())
        .map(|offset| buffer[offset] & 1)
        .collect();
    if bits.len() < length * 8 {
        warn!(
            "Buffer exhausted after {} of {} payload bits",
            bits.len(),
            length * 8
        );
    }
    let raw = pack_bits(&bits);

    let unframed = unframe(&raw);
    if unframed.tag != Tag::Unknown && !unframed.marker_found {
        debug!(
            "Returning {} content bytes without an end marker, trailing bytes may be garbage",
            unframed.content.len()
        );
    }
    match unframed.tag {
        Tag::Plain => Ok(Extracted::Plain(unframed.content)),
        Tag::Encrypted => Ok(Extracted::Encrypted(
            String::from_utf8_lossy(&unframed.content).into_owned(),
        )),
        Tag::Unknown => {
            let printable: String = unframed
                .content
                .iter()
                .filter(|b| (0x20..=0x7E).contains(*b))
                .map(|&b| b as char)
                .collect();
            if printable.len() > PARTIAL_RECOVERY_MIN {
                warn!(
                    "No container tag found, returning {} printable bytes as a partial recovery",
                    printable.len()
                );
                Ok(Extracted::Partial(printable))
            } else {
                Err(StegoError::DecodeAmbiguous)
            }
        }
    }
}
