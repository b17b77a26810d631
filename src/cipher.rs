//! # 加密模块
//!
//! 在负载进入容器之前对文本做可选的对称加密。所有算法都实现同一个 [`Cipher`] 接口，
//! 各自决定密钥派生方式与输出编码 (base64 / hex)。隐写编解码器只会看到输出的字符串。

use crate::constants::{CAESAR_SHIFT_MAX, CAESAR_SHIFT_MIN, NONCE_LEN, SALT_LEN};
use crate::error::CipherError;
use aes_gcm::Aes256Gcm;
use aes_gcm::aead::{Aead, KeyInit, Nonce};
use base64::{Engine as _, engine::general_purpose};
use argon2::Argon2;
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;

/// 对称加密能力接口。
pub trait Cipher {
    fn encrypt(&self, plaintext: &[u8], key: &str) -> Result<String, CipherError>;
    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<Vec<u8>, CipherError>;
}

/// 可选的算法标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CipherKind {
    /// AES-256-GCM，输出 base64。
    #[default]
    Aes,
    Des,
    Tripledes,
    /// 流密码族，由 ChaCha20-Poly1305 实现，输出 hex。
    Rabbit,
    Rc4,
    /// 字母位移 1-25，不做容器加密标记。
    Caesar,
}

impl CipherKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CipherKind::Aes => "aes",
            CipherKind::Des => "des",
            CipherKind::Tripledes => "tripledes",
            CipherKind::Rabbit => "rabbit",
            CipherKind::Rc4 => "rc4",
            CipherKind::Caesar => "caesar",
        }
    }

    /// 返回该标识对应的实现。DES、3DES、RC4 已被攻破，不提供实现。
    pub fn cipher(self) -> Result<Box<dyn Cipher>, CipherError> {
        match self {
            CipherKind::Aes => Ok(Box::new(AesGcm)),
            CipherKind::Rabbit => Ok(Box::new(StreamCipher)),
            CipherKind::Caesar => Ok(Box::new(Caesar)),
            CipherKind::Des | CipherKind::Tripledes | CipherKind::Rc4 => {
                Err(CipherError::Unsupported(self.as_str().to_string()))
            }
        }
    }
}

/// 由密码和盐派生 256 位密钥 (Argon2id，默认参数)。
fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; 32], CipherError> {
    if password.is_empty() {
        return Err(CipherError::EmptyKey);
    }
    let mut key = [0u8; 32];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

/// 输出布局：`salt || nonce || ciphertext (含认证标签)`。
fn seal<C: KeyInit + Aead>(plaintext: &[u8], password: &str) -> Result<Vec<u8>, CipherError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    let mut rng = rand::rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut nonce);

    let key = derive_key(password, &salt)?;
    let cipher = C::new_from_slice(&key).map_err(|_| CipherError::Encryption)?;
    let ciphertext = cipher
        .encrypt(Nonce::<C>::from_slice(&nonce), plaintext)
        .map_err(|_| CipherError::Encryption)?;

    let mut sealed = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

fn open<C: KeyInit + Aead>(sealed: &[u8], password: &str) -> Result<Vec<u8>, CipherError> {
    // 认证标签固定 16 字节
    if sealed.len() < SALT_LEN + NONCE_LEN + 16 {
        return Err(CipherError::MalformedCiphertext(format!(
            "{} bytes is too short",
            sealed.len()
        )));
    }
    let (salt, rest) = sealed.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(password, salt)?;
    let cipher = C::new_from_slice(&key).map_err(|_| CipherError::Authentication)?;
    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), ciphertext)
        .map_err(|_| CipherError::Authentication)
}

/// AES-256-GCM，密文以标准 base64 输出。
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcm;

impl Cipher for AesGcm {
    fn encrypt(&self, plaintext: &[u8], key: &str) -> Result<String, CipherError> {
        let sealed = seal::<Aes256Gcm>(plaintext, key)?;
        Ok(general_purpose::STANDARD.encode(sealed))
    }

    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<Vec<u8>, CipherError> {
        let sealed = general_purpose::STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| CipherError::MalformedCiphertext(e.to_string()))?;
        open::<Aes256Gcm>(&sealed, key)
    }
}

/// ChaCha20-Poly1305 流密码，密文以小写 hex 输出。
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamCipher;

impl Cipher for StreamCipher {
    fn encrypt(&self, plaintext: &[u8], key: &str) -> Result<String, CipherError> {
        let sealed = seal::<ChaCha20Poly1305>(plaintext, key)?;
        Ok(hex::encode(sealed))
    }

    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<Vec<u8>, CipherError> {
        let sealed = hex::decode(ciphertext.trim())
            .map_err(|e| CipherError::MalformedCiphertext(e.to_string()))?;
        open::<ChaCha20Poly1305>(&sealed, key)
    }
}

/// 凯撒位移。密钥是十进制的位移量 (1-25)，只移动 ASCII 字母。
#[derive(Debug, Clone, Copy, Default)]
pub struct Caesar;

impl Caesar {
    pub fn check_shift(shift: u8) -> Result<u8, CipherError> {
        if (CAESAR_SHIFT_MIN..=CAESAR_SHIFT_MAX).contains(&shift) {
            Ok(shift)
        } else {
            Err(CipherError::InvalidShift(shift.to_string()))
        }
    }

    pub fn parse_shift(key: &str) -> Result<u8, CipherError> {
        let shift = key
            .trim()
            .parse::<u8>()
            .map_err(|_| CipherError::InvalidShift(key.to_string()))?;
        Caesar::check_shift(shift)
    }
}

/// 将 ASCII 字母循环移动 `shift` 位，其余字节保持不变。
pub fn rotate(text: &[u8], shift: u8) -> Vec<u8> {
    let shift = shift % 26;
    text.iter()
        .map(|&byte| match byte {
            b'a'..=b'z' => b'a' + (byte - b'a' + shift) % 26,
            b'A'..=b'Z' => b'A' + (byte - b'A' + shift) % 26,
            _ => byte,
        })
        .collect()
}

impl Cipher for Caesar {
    fn encrypt(&self, plaintext: &[u8], key: &str) -> Result<String, CipherError> {
        let shift = Caesar::parse_shift(key)?;
        Ok(String::from_utf8_lossy(&rotate(plaintext, shift)).into_owned())
    }

    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<Vec<u8>, CipherError> {
        let shift = Caesar::parse_shift(key)?;
        Ok(rotate(ciphertext.as_bytes(), 26 - shift))
    }
}
