//! # 剪贴板落盘端模块
//!
//! ## 设计思路
//!
//! 平台剪贴板没有可靠的“能力预查询”接口：某种 MIME 能否写入，
//! 只能以尝试写入并观察拒绝来探测。因此把平台边界收敛为一个
//! `ClipboardSink` 特征，回退链只依赖这一个写入入口，测试侧用
//! 脚本化替身精确模拟各种拒绝组合。
//!
//! ## 实现思路
//!
//! `ArboardSink` 基于 `arboard`：PNG 字节解码为 RGBA 后经
//! `set_image` 写入；其余 MIME 没有跨平台统一入口，直接返回拒绝，
//! 交由上层回退链转换后重试。

use std::borrow::Cow;

/// 单次写入被拒绝的原因，交由回退链聚合。
#[derive(Debug, Clone)]
pub struct WriteRejection {
    pub mime_type: String,
    pub reason: String,
}

/// 平台剪贴板写入端。
///
/// 实现方收到 MIME 类型与对应字节，要么整体接受，要么给出拒绝原因。
pub trait ClipboardSink: Send + Sync {
    fn write(&self, mime_type: &str, bytes: &[u8]) -> Result<(), WriteRejection>;
}

/// 基于 `arboard` 的系统剪贴板实现。
pub struct ArboardSink;

impl ClipboardSink for ArboardSink {
    fn write(&self, mime_type: &str, bytes: &[u8]) -> Result<(), WriteRejection> {
        if !mime_type.eq_ignore_ascii_case("image/png") {
            return Err(WriteRejection {
                mime_type: mime_type.to_string(),
                reason: "平台剪贴板不接受该格式的直接写入".to_string(),
            });
        }

        let decoded = image::load_from_memory(bytes).map_err(|e| WriteRejection {
            mime_type: mime_type.to_string(),
            reason: format!("PNG 解码失败：{}", e),
        })?;

        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels = rgba.into_raw();

        let mut clipboard = arboard::Clipboard::new().map_err(|e| WriteRejection {
            mime_type: mime_type.to_string(),
            reason: format!("无法访问剪贴板：{}", e),
        })?;

        clipboard
            .set_image(arboard::ImageData {
                width: width as usize,
                height: height as usize,
                bytes: Cow::Owned(pixels),
            })
            .map_err(|e| WriteRejection {
                mime_type: mime_type.to_string(),
                reason: format!("写入失败：{}", e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arboard_sink_rejects_non_png_mime_without_touching_clipboard() {
        let sink = ArboardSink;

        let rejection = sink
            .write("image/jpeg", b"irrelevant")
            .expect_err("non-png mime must be rejected");

        assert_eq!(rejection.mime_type, "image/jpeg");
    }

    #[test]
    #[ignore = "requires system clipboard access"]
    fn arboard_sink_accepts_png_payload() {
        use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
        use std::io::Cursor;

        let img = ImageBuffer::from_fn(8, 8, |_, _| Rgba([10u8, 20, 30, 255]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");

        let sink = ArboardSink;
        sink.write("image/png", &cursor.into_inner())
            .expect("png write should succeed");
    }
}
