//! # 另存边界模块
//!
//! 把会话中的结果或原图字节落到磁盘，对应客户端的“另存为”能力。
//! 文件名模式固定：结果为 `docuscan_enhanced_{时间戳}.jpg`，
//! 原图扩展名取自来源类型。

use std::path::{Path, PathBuf};

use crate::acquire::AcquiredImage;
use crate::export::{download_original_name, download_result_name, extension_for_mime};
use crate::processing::ProcessedImage;

/// 将处理结果写入目标目录，返回完整路径。
pub fn save_result(image: &ProcessedImage, dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join(download_result_name());
    std::fs::write(&path, &image.bytes)?;

    log::info!("💾 结果已另存 - {}", path.display());
    Ok(path)
}

/// 将原图写入目标目录，返回完整路径。
pub fn save_original(image: &AcquiredImage, dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join(download_original_name(extension_for_mime(&image.mime_type)));
    std::fs::write(&path, &image.bytes)?;

    log::info!("💾 原图已另存 - {}", path.display());
    Ok(path)
}
