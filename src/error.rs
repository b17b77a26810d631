//! # 错误类型模块
//!
//! 库内部使用的强类型错误。命令处理层 (`handler`) 再用 `anyhow` 附加上下文。

use thiserror::Error;

/// 加密模块产生的错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("A password is required for this cipher")]
    EmptyKey,

    #[error("Caesar shift must be an integer between 1 and 25, got '{0}'")]
    InvalidShift(String),

    #[error("Cipher '{0}' is not supported")]
    Unsupported(String),

    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// 密码错误或密文被篡改。
    #[error("Decryption failed: wrong password or corrupted ciphertext")]
    Authentication,

    #[error("Encryption failed")]
    Encryption,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}

/// 隐写编解码与消息服务产生的错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StegoError {
    /// 容器长度超过图像可承载的最大字节数。
    #[error("Payload needs {required} bytes but the image can carry at most {available}")]
    CapacityExceeded { required: usize, available: usize },

    /// 长度头部为零或不合理，图像中没有隐藏数据。
    #[error("No hidden data found in this image")]
    NoHiddenData,

    /// 读出了比特，但既没有可识别的封装，也没有足够的可打印残留。
    #[error("Could not extract a message: the embedded data is not recognizable")]
    DecodeAmbiguous,

    /// 数据已加密，但调用方没有提供密码。
    #[error("The hidden message is encrypted; a password is required")]
    PasswordRequired,

    /// 加密或解密失败，原样传递加密模块的错误。
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// 通道缓冲区长度不是 4 的倍数。
    #[error("Channel buffer length {len} is not a multiple of 4")]
    InvalidBuffer { len: usize },
}
