//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use crate::cipher::CipherKind;
use crate::steganography::Layout;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，可选加密后将文本藏入无损图像 (如 PNG)，并能在数据部分损坏时尽量恢复。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，可选加密后将文本藏入无损图像 (如 PNG)，并能在数据部分损坏时尽量恢复。"
)]
pub struct Cli {
    /// 输出更详细的日志 (-v 为 info，-vv 为 debug)。
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：hide (隐藏)、recover (恢复) 和 capacity (容量)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 在图像中隐藏文本文件内容，结果总是保存为 PNG。
    Hide(HideArgs),

    /// 从经过隐写的图像中恢复隐藏的文本。
    Recover(RecoverArgs),

    /// 显示图像可以隐藏的最大文本长度。
    Capacity(CapacityArgs),
}

/// 加密相关的参数，`hide` 与 `recover` 共用。
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SecretArgs {
    /// 加密密码。不提供则以明文隐藏。
    #[arg(short, long, conflicts_with = "caesar")]
    pub password: Option<String>,

    /// 与密码配合使用的加密算法。
    #[arg(long, value_enum, default_value_t = CipherKind::Aes)]
    pub cipher: CipherKind,

    /// 凯撒位移 (1-25)，只移动字母，不标记为加密。
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=25))]
    pub caesar: Option<u8>,
}

/// 'hide' 命令所需的参数。
#[derive(Parser, Debug, Default)]
pub struct HideArgs {
    /// 用于隐写的输入图像文件路径 (如 PNG, BMP)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的文本内容的文件路径。
    #[arg(short, long)]
    pub text: PathBuf,

    /// 隐写完成后，保存结果图像的输出路径。默认为输入图像旁的 `doctored_<名称>.png`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,

    #[command(flatten)]
    pub secret: SecretArgs,

    /// 比特布局。`uniform` 不会改动 Alpha 通道，但与默认布局互不兼容。
    #[arg(long, value_enum, default_value_t = Layout::Compatible)]
    pub layout: Layout,
}

/// 'recover' 命令所需的参数。
#[derive(Parser, Debug, Default)]
pub struct RecoverArgs {
    /// 已隐藏文本数据的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复文本后，保存文本内容的输出路径。默认为 `recovered_<名称>.txt`。
    #[arg(short, long)]
    pub text: Option<PathBuf>,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,

    #[command(flatten)]
    pub secret: SecretArgs,

    /// 隐藏时使用的比特布局。
    #[arg(long, value_enum, default_value_t = Layout::Compatible)]
    pub layout: Layout,
}

/// 'capacity' 命令所需的参数。
#[derive(Parser, Debug, Default)]
pub struct CapacityArgs {
    /// 要检查的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,
}
