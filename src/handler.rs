//! # 命令处理逻辑模块
//!
//! 包含处理 `hide`、`recover` 和 `capacity` 子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、图像解码与编码、调用隐写核心以及向用户报告结果。

use crate::cli::{CapacityArgs, HideArgs, RecoverArgs, SecretArgs};
use crate::constants::{FRAMING_OVERHEAD, HEADER_BYTES};
use crate::error::StegoError;
use crate::message::{Secret, hide_message, reveal_message};
use crate::steganography::capacity_for_dimensions;
use anyhow::{Context, Result};
use colored::Colorize;
use image::{ImageFormat, ImageReader, RgbaImage};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// 可以无损保存 RGBA 像素的输出格式。
const LOSSLESS_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::WebP,
    ImageFormat::Qoi,
];

fn secret_from(args: &SecretArgs) -> Secret {
    match (&args.password, args.caesar) {
        (_, Some(shift)) => Secret::Caesar(shift),
        (Some(password), None) => Secret::Keyed {
            kind: args.cipher,
            password: password.clone(),
        },
        (None, None) => Secret::None,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

/// 在输入图像所在目录生成默认输出路径：`<prefix><名称>.<extension>`。
fn default_output(image: &Path, prefix: &str, extension: &str) -> PathBuf {
    image.with_file_name(format!("{prefix}{}.{extension}", file_stem(image)))
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}\nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 根据扩展名确定输出格式。有损格式 (如 JPEG) 会破坏最低有效位，一律拒绝。
fn output_format(path: &Path) -> Result<ImageFormat> {
    let format = ImageFormat::from_path(path).with_context(|| {
        format!(
            "Cannot determine an image format for {}. \nUse a .png, .bmp, .tiff, .webp or .qoi destination.",
            path.to_string_lossy().red().bold()
        )
    })?;
    anyhow::ensure!(
        format != ImageFormat::Jpeg,
        "Refusing to write {}: lossy formats such as JPEG destroy the hidden bits. \nUse a .png destination instead.",
        path.to_string_lossy().red().bold()
    );
    anyhow::ensure!(
        LOSSLESS_FORMATS.contains(&format),
        "Unsupported output format {:?} for {}. \nUse a .png, .bmp, .tiff, .webp or .qoi destination.",
        format,
        path.to_string_lossy().red().bold()
    );
    Ok(format)
}

/// 解码图像为 RGBA8，并返回按文件内容识别出的格式。
fn load_rgba(path: &Path) -> Result<(RgbaImage, Option<ImageFormat>)> {
    let unreadable = || {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    };
    let reader = ImageReader::open(path)
        .with_context(unreadable)?
        .with_guessed_format()
        .with_context(unreadable)?;
    let format = reader.format();
    let image = reader.decode().with_context(unreadable)?;
    Ok((image.to_rgba8(), format))
}

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责读取图像和文本文件、按需加密、调用隐写核心写入通道缓冲区，
/// 最后按目标扩展名以无损格式写入目标图像文件。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像或文本文件。
/// * 目标文件已存在且未指定 `--force`，或目标是有损格式。
/// * 图像没有足够的空间来隐藏文本。
/// * 无法写入到目标图像文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_output(&args.image, "doctored_", "png"));
    let format = output_format(&dest)?;
    ensure_writable(&dest, args.force)?;

    let (picture, _) = load_rgba(&args.image)?;
    let text = fs::read(&args.text).with_context(|| {
        format!(
            "Unable to read text file: {}",
            args.text.to_string_lossy().red().bold()
        )
    })?;

    let (width, height) = picture.dimensions();
    let mut buffer = picture.into_raw();
    debug!(
        "Loaded {}x{} image ({} channel bytes)",
        width,
        height,
        buffer.len()
    );

    let report = match hide_message(&mut buffer, &text, &secret_from(&args.secret), args.layout) {
        Err(StegoError::CapacityExceeded {
            required,
            available,
        }) => anyhow::bail!(
            "Not enough space in the image to hide the text. \nRequired: {}, Available: {}",
            required.to_string().red().bold(),
            available.to_string().green().bold()
        ),
        other => other.context("Failed to hide the text in the image.")?,
    };

    let doctored = RgbaImage::from_raw(width, height, buffer)
        .context("The modified pixel buffer no longer matches the image dimensions.")?;
    doctored
        .save_with_format(&dest, format)
        .with_context(|| {
            format!(
                "Unable to write to target image file: {}",
                dest.to_string_lossy().red().bold()
            )
        })?;

    println!(
        "The text has been successfully hidden and saved: {} ({} of {} bytes used)",
        dest.to_string_lossy().green().bold(),
        report.container_len + HEADER_BYTES,
        report.capacity
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像文件、提取并解析容器、按需解密，
/// 最后将恢复的文本内容写入目标文本文件。部分恢复的结果会带有前缀并给出警告。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像文件。
/// * 图像中没有隐藏数据，或数据无法识别。
/// * 数据已加密但密码缺失或错误。
/// * 无法写入到目标文本文件。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    let output = args
        .text
        .clone()
        .unwrap_or_else(|| default_output(&args.image, "recovered_", "txt"));
    ensure_writable(&output, args.force)?;

    let (picture, format) = load_rgba(&args.image)?;
    if format == Some(ImageFormat::Jpeg) {
        warn!(
            "{} is a JPEG; lossy compression usually destroys hidden bits",
            args.image.to_string_lossy()
        );
    }
    let buffer = picture.into_raw();

    let revealed =
        reveal_message(&buffer, &secret_from(&args.secret), args.layout).with_context(|| {
            format!(
                "Failed to recover a message from '{}'.",
                args.image.to_string_lossy().red().bold()
            )
        })?;

    if revealed.degraded {
        eprintln!(
            "{}",
            "Warning: no intact container was found; only printable fragments were recovered."
                .yellow()
                .bold()
        );
    }

    fs::write(&output, &revealed.text).with_context(|| {
        format!(
            "Unable to write to target text file: {}",
            output.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The text has been successfully recovered and saved: {}",
        output.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Capacity' 命令的执行逻辑，打印图像尺寸与可隐藏的最大文本长度。
pub fn handle_capacity(args: CapacityArgs) -> Result<()> {
    let (picture, _) = load_rgba(&args.image)?;
    let (width, height) = picture.dimensions();
    let capacity = capacity_for_dimensions(width, height);
    let max_text = capacity.saturating_sub(HEADER_BYTES + FRAMING_OVERHEAD);

    println!(
        "{}x{} pixels: {} bytes of LSB capacity, up to {} bytes of plain text",
        width,
        height,
        capacity.to_string().green().bold(),
        max_text.to_string().green().bold()
    );
    Ok(())
}
