//! # 消息服务模块
//!
//! 串起完整流程：文本 → (可选) 加密 → 容器封装 → 写入通道缓冲区，
//! 以及反向的提取 → 解析 → (可选) 解密。

use crate::cipher::{Caesar, Cipher, CipherKind};
use crate::container::frame;
use crate::error::StegoError;
use crate::steganography::{Extracted, Layout, capacity, embed, extract};
use log::{debug, info};

/// 用户提供的保护方式。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Secret {
    #[default]
    None,
    /// 凯撒位移只作用于文本本身，容器仍标记为明文。
    Caesar(u8),
    Keyed { kind: CipherKind, password: String },
}

/// 一次隐藏操作的结果。容量随每次调用返回，不做缓存。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HideReport {
    pub container_len: usize,
    pub capacity: usize,
}

/// 恢复出的消息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revealed {
    pub text: Vec<u8>,
    /// 为 `true` 时是部分恢复的结果，内容不完整且带有前缀。
    pub degraded: bool,
}

impl Secret {
    /// 凯撒位移的密钥。`Keyed` 选择凯撒算法时，密码即为十进制位移。
    fn caesar_key(&self) -> Option<String> {
        match self {
            Secret::Caesar(shift) => Some(shift.to_string()),
            Secret::Keyed {
                kind: CipherKind::Caesar,
                password,
            } => Some(password.clone()),
            _ => None,
        }
    }
}

/// 将文本隐藏到通道缓冲区中。
///
/// # Errors
///
/// * 加密失败时返回 [`StegoError::Cipher`]。
/// * 容器过大时返回 [`StegoError::CapacityExceeded`]。
pub fn hide_message(
    buffer: &mut [u8],
    text: &[u8],
    secret: &Secret,
    layout: Layout,
) -> Result<HideReport, StegoError> {
    let container = match (secret, secret.caesar_key()) {
        (_, Some(shift)) => frame(Caesar.encrypt(text, &shift)?.as_bytes(), false),
        (Secret::Keyed { kind, password }, None) => {
            let ciphertext = kind.cipher()?.encrypt(text, password)?;
            debug!(
                "Encrypted {} bytes with {} into {} characters",
                text.len(),
                kind.as_str(),
                ciphertext.len()
            );
            frame(ciphertext.as_bytes(), true)
        }
        _ => frame(text, false),
    };

    embed(buffer, &container, layout)?;
    info!("Hid a {}-byte container", container.len());

    Ok(HideReport {
        container_len: container.len(),
        capacity: capacity(buffer),
    })
}

/// 从通道缓冲区中恢复文本。
///
/// # Errors
///
/// * [`StegoError::NoHiddenData`] / [`StegoError::DecodeAmbiguous`]：见 [`extract`]。
/// * [`StegoError::PasswordRequired`]：数据已加密但没有提供密码。
/// * [`StegoError::Cipher`]：密码错误或密文损坏，原样传递。
pub fn reveal_message(
    buffer: &[u8],
    secret: &Secret,
    layout: Layout,
) -> Result<Revealed, StegoError> {
    match extract(buffer, layout)? {
        Extracted::Plain(content) => {
            let text = match secret.caesar_key() {
                Some(shift) => Caesar.decrypt(&String::from_utf8_lossy(&content), &shift)?,
                None => content,
            };
            Ok(Revealed {
                text,
                degraded: false,
            })
        }
        Extracted::Encrypted(ciphertext) => match secret {
            Secret::Keyed { kind, password } if *kind != CipherKind::Caesar => Ok(Revealed {
                text: kind.cipher()?.decrypt(&ciphertext, password)?,
                degraded: false,
            }),
            _ => Err(StegoError::PasswordRequired),
        },
        partial @ Extracted::Partial(_) => Ok(Revealed {
            text: partial.to_string().into_bytes(),
            degraded: true,
        }),
    }
}
