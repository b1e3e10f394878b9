//! # 导出策略表模块
//!
//! ## 设计思路
//!
//! 浏览器时代的“嵌套 try/catch 逐格式探测”在这里被改写为数据驱动的
//! 有序策略表：每个条目是 `(目标 MIME, 转换路径)`，按序尝试，
//! 单个条目可独立测试，新增编码器只需在表里加一行。
//!
//! ## 实现思路
//!
//! 1. 原生尝试：按来源类型直接写入原始字节。
//! 2. PNG 重编码回退：来源不是 PNG 时无损转为 PNG（PNG 是目标平台上
//!    剪贴板可写性最好的栅格格式）。
//! 3. 剩余格式扫尾：`jpeg / webp / gif`，跳过来源类型与 PNG；
//!    目前仅实现了 PNG 转换路径，这些条目是显式保留的扩展位，
//!    不是被静默丢弃的分支。

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use once_cell::sync::Lazy;

use super::naming::extension_for_mime;

/// 剩余格式扫尾顺序（不含 PNG，PNG 在第二步单独处理）。
static RESIDUAL_MIMES: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["image/jpeg", "image/webp", "image/gif"]);

type EncodeFn = fn(&[u8]) -> Result<Vec<u8>, String>;

/// 从来源字节到目标格式的转换路径。
pub(super) enum ConversionPath {
    /// 原样写入来源字节。
    Passthrough,
    /// 重编码为目标格式后写入。
    Reencode(EncodeFn),
    /// 暂无转换路径，条目保留为扩展位，执行时记录并跳过。
    Unavailable,
}

/// 单个导出策略：目标类型 + 成功时上报的扩展名 + 转换路径。
pub(super) struct ExportStrategy {
    pub(super) target_mime: String,
    pub(super) extension: &'static str,
    pub(super) path: ConversionPath,
}

/// 为给定来源类型构建完整回退链。
pub(super) fn build_chain(source_mime: &str) -> Vec<ExportStrategy> {
    let source = source_mime.trim().to_ascii_lowercase();
    let mut chain = Vec::with_capacity(2 + RESIDUAL_MIMES.len());

    chain.push(ExportStrategy {
        target_mime: source.clone(),
        extension: extension_for_mime(&source),
        path: ConversionPath::Passthrough,
    });

    if source != "image/png" {
        chain.push(ExportStrategy {
            target_mime: "image/png".to_string(),
            extension: "png",
            path: ConversionPath::Reencode(encode_png),
        });
    }

    for mime in RESIDUAL_MIMES.iter() {
        if *mime == source || *mime == "image/png" {
            continue;
        }

        chain.push(ExportStrategy {
            target_mime: (*mime).to_string(),
            extension: extension_for_mime(mime),
            path: ConversionPath::Unavailable,
        });
    }

    chain
}

/// 将任意可解码的图片字节无损重编码为 PNG。
fn encode_png(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| format!("图片解码失败：{}", e))?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(rgba.as_raw(), width, height, image::ColorType::Rgba8.into())
        .map_err(|e| format!("PNG 编码失败：{}", e))?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn jpeg_bytes() -> Vec<u8> {
        let img = ImageBuffer::from_fn(16, 16, |x, y| {
            Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255])
        });

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .write_to(&mut cursor, ImageFormat::Jpeg)
            .expect("failed to encode test jpeg");
        cursor.into_inner()
    }

    #[test]
    fn jpeg_source_chain_tries_native_then_png_then_residuals() {
        let chain = build_chain("image/jpeg");
        let mimes: Vec<&str> = chain.iter().map(|s| s.target_mime.as_str()).collect();

        assert_eq!(mimes, ["image/jpeg", "image/png", "image/webp", "image/gif"]);
        assert!(matches!(chain[0].path, ConversionPath::Passthrough));
        assert!(matches!(chain[1].path, ConversionPath::Reencode(_)));
        assert!(matches!(chain[2].path, ConversionPath::Unavailable));
        assert_eq!(chain[1].extension, "png");
    }

    #[test]
    fn png_source_chain_skips_reencode_step() {
        let chain = build_chain("image/png");
        let mimes: Vec<&str> = chain.iter().map(|s| s.target_mime.as_str()).collect();

        assert_eq!(mimes, ["image/png", "image/jpeg", "image/webp", "image/gif"]);
        assert!(matches!(chain[0].path, ConversionPath::Passthrough));
        // PNG 来源没有 PNG 重编码步骤，剩余条目均为扩展位
        assert!(chain[1..]
            .iter()
            .all(|s| matches!(s.path, ConversionPath::Unavailable)));
    }

    #[test]
    fn source_mime_matching_is_case_insensitive() {
        let chain = build_chain("IMAGE/PNG");

        assert_eq!(chain[0].target_mime, "image/png");
        assert!(!chain
            .iter()
            .skip(1)
            .any(|s| s.target_mime == "image/png"));
    }

    #[test]
    fn encode_png_produces_decodable_png() {
        let png = encode_png(&jpeg_bytes()).expect("reencode should succeed");

        let format = image::guess_format(&png).expect("guess format failed");
        assert_eq!(format, ImageFormat::Png);

        let decoded = image::load_from_memory(&png).expect("png should decode");
        assert_eq!(decoded.to_rgba8().dimensions(), (16, 16));
    }

    #[test]
    fn encode_png_rejects_undecodable_bytes() {
        let result = encode_png(b"definitely not an image");
        assert!(result.is_err());
    }
}
