use image::{ImageBuffer, Rgba, RgbaImage};
use lsb_vault::{
    cipher::CipherKind,
    cli::{CapacityArgs, HideArgs, RecoverArgs, SecretArgs},
    handler::{handle_capacity, handle_hide, handle_recover},
    steganography::Layout,
};
use rand::RngCore;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// 一个辅助函数，用于创建一个带有随机像素的测试图像
fn create_test_image(path: &Path, width: u32, height: u32) {
    let mut img_buf = ImageBuffer::new(width, height);
    let mut raw_pixels = vec![0u8; (width * height * 4) as usize];
    rand::rng().fill_bytes(&mut raw_pixels);

    img_buf
        .pixels_mut()
        .zip(raw_pixels.chunks_exact(4))
        .for_each(|(pixel, chunk)| {
            *pixel = Rgba([chunk[0], chunk[1], chunk[2], 255]);
        });

    img_buf.save(path).expect("Failed to create test image.");
}

fn password(pw: &str) -> SecretArgs {
    SecretArgs {
        password: Some(pw.to_string()),
        ..Default::default()
    }
}

/// 验证从隐藏到恢复的完整流程
#[test]
fn test_handle_hide_and_recover_integration() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.png");
    let hidden_image_path = dir.path().join("hidden.png");
    let source_text_path = dir.path().join("source.txt");
    let recovered_text_path = dir.path().join("recovered.txt");

    create_test_image(&original_image_path, 100, 100);
    let original_text = "This is a test message for the handler! 这是一个给处理器的测试信息！";
    fs::write(&source_text_path, original_text)?;

    // 2. 测试 handle_hide
    let hide_args = HideArgs {
        image: original_image_path.clone(),
        text: source_text_path.clone(),
        dest: Some(hidden_image_path.clone()),
        ..Default::default()
    };
    handle_hide(hide_args)?;
    assert!(
        hidden_image_path.exists(),
        "Hidden image should be created."
    );

    // 3. 测试 handle_recover
    let recover_args = RecoverArgs {
        image: hidden_image_path.clone(),
        text: Some(recovered_text_path.clone()),
        ..Default::default()
    };
    handle_recover(recover_args)?;
    assert!(
        recovered_text_path.exists(),
        "Recovered text file should be created."
    );

    // 4. 验证结果
    let recovered_text = fs::read_to_string(&recovered_text_path)?;
    assert_eq!(
        original_text, recovered_text,
        "Recovered text must match the original."
    );

    Ok(())
}

/// 验证当用户不提供输出路径时，是否能正确生成默认路径并完成操作
#[test]
fn test_handle_hide_and_recover_with_defaults() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.png");
    let source_text_path = dir.path().join("source.txt");

    create_test_image(&original_image_path, 100, 100);
    let original_text = "Testing default path generation. 测试默认路径生成。";
    fs::write(&source_text_path, original_text)?;

    // 2. 测试 handle_hide，不提供 dest 路径
    let hide_args = HideArgs {
        image: original_image_path.clone(),
        text: source_text_path.clone(),
        dest: None,
        ..Default::default()
    };
    handle_hide(hide_args)?;

    let expected_hidden_path = dir.path().join("doctored_original.png");
    assert!(
        expected_hidden_path.exists(),
        "Default hidden image should be created at: {:?}",
        expected_hidden_path
    );

    // 3. 测试 handle_recover，不提供 text 输出路径
    let recover_args = RecoverArgs {
        image: expected_hidden_path,
        text: None,
        ..Default::default()
    };
    handle_recover(recover_args)?;

    let expected_recovered_path = dir.path().join("recovered_doctored_original.txt");
    assert!(
        expected_recovered_path.exists(),
        "Default recovered text file should be created at: {:?}",
        expected_recovered_path
    );

    // 4. 验证结果
    let recovered_text = fs::read_to_string(&expected_recovered_path)?;
    assert_eq!(
        original_text, recovered_text,
        "Recovered text from default file must match the original."
    );

    Ok(())
}

/// 验证覆盖保护机制以及 `--force` 标志是否按预期工作
#[test]
fn test_overwrite_protection_and_force_flag() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    let text_path = dir.path().join("text.txt");
    let dest_path = dir.path().join("dest.png");

    create_test_image(&image_path, 50, 50);
    fs::write(&text_path, "some text")?;

    // 场景一：目标文件已存在，不使用 --force
    fs::write(&dest_path, "this is a dummy file to be overwritten")?;

    let result = handle_hide(HideArgs {
        image: image_path.clone(),
        text: text_path.clone(),
        dest: Some(dest_path.clone()),
        force: false,
        ..Default::default()
    });
    assert!(result.is_err(), "Execution should fail without --force when file exists.");
    if let Err(e) = result {
        assert!(e.to_string().contains("Output file already exists"));
    }

    // 场景二：使用 --force 强制覆盖
    let result = handle_hide(HideArgs {
        image: image_path.clone(),
        text: text_path.clone(),
        dest: Some(dest_path.clone()),
        force: true,
        ..Default::default()
    });
    assert!(result.is_ok(), "Execution should succeed with --force when file exists.");

    let dummy_content = fs::read(&dest_path)?;
    assert_ne!(dummy_content, b"this is a dummy file to be overwritten");

    Ok(())
}

/// 验证空间不足时的错误处理
#[test]
fn test_handle_hide_not_enough_space() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("small.png");
    let text_path = dir.path().join("large.txt");
    let dest_path = dir.path().join("dest.png");

    create_test_image(&image_path, 10, 10);
    fs::write(&text_path, "a".repeat(5000))?;

    let result = handle_hide(HideArgs {
        image: image_path,
        text: text_path,
        dest: Some(dest_path.clone()),
        ..Default::default()
    });

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Not enough space"));
    }
    assert!(!dest_path.exists(), "No output should be written on failure.");

    Ok(())
}

/// 验证 2x2 的图像连很短的文本都无法容纳
#[test]
fn test_tiny_image_rejects_short_text() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("tiny.png");
    let text_path = dir.path().join("text.txt");

    create_test_image(&image_path, 2, 2);
    fs::write(&text_path, "x".repeat(50))?;

    let result = handle_hide(HideArgs {
        image: image_path,
        text: text_path,
        ..Default::default()
    });
    assert!(result.unwrap_err().to_string().contains("Not enough space"));

    Ok(())
}

/// 验证加密流程：没有密码时失败，密码正确时恢复原文
#[test]
fn test_encrypted_hide_and_recover() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("carrier.png");
    let hidden_path = dir.path().join("hidden.png");
    let text_path = dir.path().join("secret.txt");
    let recovered_path = dir.path().join("out.txt");

    create_test_image(&image_path, 64, 64);
    fs::write(&text_path, "world")?;

    handle_hide(HideArgs {
        image: image_path,
        text: text_path,
        dest: Some(hidden_path.clone()),
        secret: password("pw"),
        ..Default::default()
    })?;

    let result = handle_recover(RecoverArgs {
        image: hidden_path.clone(),
        text: Some(recovered_path.clone()),
        ..Default::default()
    });
    let err = result.expect_err("Recovering encrypted data without a password must fail.");
    assert!(format!("{err:#}").contains("password is required"));
    assert!(!recovered_path.exists());

    let result = handle_recover(RecoverArgs {
        image: hidden_path.clone(),
        text: Some(recovered_path.clone()),
        secret: password("wrong"),
        ..Default::default()
    });
    assert!(format!("{:#}", result.unwrap_err()).contains("wrong password"));

    handle_recover(RecoverArgs {
        image: hidden_path,
        text: Some(recovered_path.clone()),
        secret: password("pw"),
        ..Default::default()
    })?;
    assert_eq!(fs::read_to_string(&recovered_path)?, "world");

    Ok(())
}

/// 验证流密码与统一布局的组合，以及统一布局不会改动 Alpha 通道
#[test]
fn test_stream_cipher_with_uniform_layout() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("carrier.png");
    let hidden_path = dir.path().join("hidden.png");
    let text_path = dir.path().join("secret.txt");
    let recovered_path = dir.path().join("out.txt");

    create_test_image(&image_path, 80, 60);
    fs::write(&text_path, "stream cipher payload 流密码")?;

    let secret = SecretArgs {
        password: Some("hunter2".to_string()),
        cipher: CipherKind::Rabbit,
        caesar: None,
    };

    handle_hide(HideArgs {
        image: image_path.clone(),
        text: text_path,
        dest: Some(hidden_path.clone()),
        secret: secret.clone(),
        layout: Layout::Uniform,
        ..Default::default()
    })?;

    let original: RgbaImage = image::open(&image_path)?.to_rgba8();
    let hidden: RgbaImage = image::open(&hidden_path)?.to_rgba8();
    assert!(
        original
            .pixels()
            .zip(hidden.pixels())
            .all(|(a, b)| a[3] == b[3]),
        "Uniform layout must not touch the alpha channel."
    );

    handle_recover(RecoverArgs {
        image: hidden_path,
        text: Some(recovered_path.clone()),
        secret,
        layout: Layout::Uniform,
        ..Default::default()
    })?;
    assert_eq!(
        fs::read_to_string(&recovered_path)?,
        "stream cipher payload 流密码"
    );

    Ok(())
}

/// 验证凯撒位移：图像中保存的是位移后的明文
#[test]
fn test_caesar_shift_round_trip() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("carrier.png");
    let hidden_path = dir.path().join("hidden.png");
    let text_path = dir.path().join("secret.txt");
    let shifted_path = dir.path().join("shifted.txt");
    let recovered_path = dir.path().join("out.txt");

    create_test_image(&image_path, 40, 40);
    fs::write(&text_path, "Attack at dawn")?;

    let caesar = SecretArgs {
        caesar: Some(13),
        ..Default::default()
    };
    handle_hide(HideArgs {
        image: image_path,
        text: text_path,
        dest: Some(hidden_path.clone()),
        secret: caesar.clone(),
        ..Default::default()
    })?;

    handle_recover(RecoverArgs {
        image: hidden_path.clone(),
        text: Some(shifted_path.clone()),
        ..Default::default()
    })?;
    assert_eq!(fs::read_to_string(&shifted_path)?, "Nggnpx ng qnja");

    handle_recover(RecoverArgs {
        image: hidden_path,
        text: Some(recovered_path.clone()),
        secret: caesar,
        ..Default::default()
    })?;
    assert_eq!(fs::read_to_string(&recovered_path)?, "Attack at dawn");

    Ok(())
}

/// 验证输出格式跟随目标扩展名，BMP 等无损格式可以完成往返
#[test]
fn test_hide_and_recover_with_bmp_destination() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("carrier.png");
    let text_path = dir.path().join("secret.txt");
    let recovered_path = dir.path().join("out.txt");

    create_test_image(&image_path, 60, 40);
    fs::write(&text_path, "bitmap carrier")?;

    let magics: [(&str, &[&[u8]]); 2] = [
        ("out.bmp", &[&b"BM"[..]]),
        ("out.tiff", &[&b"II*\0"[..], &b"MM\0*"[..]]),
    ];
    for (name, accepted) in magics {
        let dest_path = dir.path().join(name);
        handle_hide(HideArgs {
            image: image_path.clone(),
            text: text_path.clone(),
            dest: Some(dest_path.clone()),
            ..Default::default()
        })?;
        let written = fs::read(&dest_path)?;
        assert!(
            accepted.iter().any(|magic| written.starts_with(magic)),
            "{name} should be encoded in the format its extension names"
        );

        handle_recover(RecoverArgs {
            image: dest_path,
            text: Some(recovered_path.clone()),
            force: true,
            ..Default::default()
        })?;
        assert_eq!(fs::read_to_string(&recovered_path)?, "bitmap carrier");
    }

    Ok(())
}

/// 验证有损格式的输出路径会被拒绝
#[test]
fn test_lossy_destination_is_rejected() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    let text_path = dir.path().join("text.txt");
    let dest_path = dir.path().join("dest.jpg");

    create_test_image(&image_path, 50, 50);
    fs::write(&text_path, "some text")?;

    let result = handle_hide(HideArgs {
        image: image_path,
        text: text_path,
        dest: Some(dest_path.clone()),
        ..Default::default()
    });
    assert!(result.unwrap_err().to_string().contains("lossy formats"));
    assert!(!dest_path.exists());

    Ok(())
}

/// 验证在未隐藏任何数据的图像上恢复会报告没有数据
#[test]
fn test_recover_from_clean_image() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("blank.png");
    RgbaImage::from_pixel(30, 30, Rgba([128, 64, 32, 254])).save(&image_path)?;

    let result = handle_recover(RecoverArgs {
        image: image_path,
        text: Some(dir.path().join("out.txt")),
        ..Default::default()
    });
    assert!(format!("{:#}", result.unwrap_err()).contains("No hidden data"));

    Ok(())
}

/// 验证容量命令可以正常执行
#[test]
fn test_handle_capacity() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    create_test_image(&image_path, 64, 64);

    handle_capacity(CapacityArgs { image: image_path })?;

    Ok(())
}
