//! # lsb_vault 库
//!
//! 本库包含 LSB 隐写工具的核心逻辑：容器封装、位平面编解码、可选加密，
//! 以及命令行层的参数定义与处理函数。

// 声明库包含的所有模块。

pub mod cipher;
pub mod cli;
pub mod constants;
pub mod container;
pub mod error;
pub mod handler;
pub mod message;
pub mod steganography;
