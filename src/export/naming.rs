//! # 导出命名模块
//!
//! 导出与另存文件名统一在这里生成：`{前缀}_{时间戳}.{扩展名}`。
//! 时间戳取 RFC 3339（UTC），其中 `:` 与 `.` 替换为 `-`，
//! 保证在所有目标文件系统上都是合法文件名。

use chrono::{SecondsFormat, Utc};

/// 导出文件名前缀，区分导出的是原图、处理结果还是未知来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPrefix {
    Original,
    Processed,
    Image,
}

impl ExportPrefix {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Processed => "processed",
            Self::Image => "image",
        }
    }
}

/// 文件系统安全的时间戳。
pub(crate) fn sanitized_timestamp() -> String {
    Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// 剪贴板导出文件名。
pub(crate) fn export_file_name(prefix: ExportPrefix, extension: &str) -> String {
    format!("{}_{}.{}", prefix.as_str(), sanitized_timestamp(), extension)
}

/// 处理结果另存文件名（服务端固定输出 JPEG）。
pub(crate) fn download_result_name() -> String {
    format!("docuscan_enhanced_{}.jpg", sanitized_timestamp())
}

/// 原图另存文件名，扩展名来自来源类型。
pub(crate) fn download_original_name(extension: &str) -> String {
    format!("docuscan_original_{}.{}", sanitized_timestamp(), extension)
}

/// MIME 类型到文件扩展名。
pub(crate) fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.trim().to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        _ => "img",
    }
}
