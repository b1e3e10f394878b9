//! # 图片采集模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（粘贴 / 拖拽 / 文件选择）的候选图片，并在“尽可能早”的阶段执行输入校验。
//! 目标是尽快失败：任何校验不通过都发生在网络调用之前，且不留下半初始化的会话状态。
//!
//! ## 实现思路
//!
//! - 先查声明类型（`image/` 前缀），再查体积上限，最后做字节级校验。
//! - 体积超限的报错信息必须携带人类可读的实际体积（二进制单位，保留一位小数）。
//! - 通过文件签名（magic bytes）识别真实类型，声明类型造假同样会被拒绝。

use crate::config::ClientConfig;

/// 候选图片来源。
///
/// 三种来源的语义差异仅在于文件名是否可得：粘贴内容没有文件名。
#[derive(Debug, Clone)]
pub enum SourceInput {
    /// 剪贴板粘贴内容。
    Pasted { mime_type: String, bytes: Vec<u8> },
    /// 拖拽进窗口的文件。
    Dropped {
        mime_type: String,
        file_name: String,
        bytes: Vec<u8>,
    },
    /// 文件选择器选中的文件。
    Picked {
        mime_type: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl SourceInput {
    fn declared_mime(&self) -> &str {
        match self {
            Self::Pasted { mime_type, .. }
            | Self::Dropped { mime_type, .. }
            | Self::Picked { mime_type, .. } => mime_type,
        }
    }

    fn payload(&self) -> &[u8] {
        match self {
            Self::Pasted { bytes, .. }
            | Self::Dropped { bytes, .. }
            | Self::Picked { bytes, .. } => bytes,
        }
    }

    fn source_hint(&self) -> &'static str {
        match self {
            Self::Pasted { .. } => "paste",
            Self::Dropped { .. } => "drop",
            Self::Picked { .. } => "pick",
        }
    }

    fn into_parts(self) -> (String, Option<String>, Vec<u8>) {
        match self {
            Self::Pasted { mime_type, bytes } => (mime_type, None, bytes),
            Self::Dropped {
                mime_type,
                file_name,
                bytes,
            }
            | Self::Picked {
                mime_type,
                file_name,
                bytes,
            } => (mime_type, Some(file_name), bytes),
        }
    }
}

/// 采集成功后的会话原图，写入会话后不再修改。
#[derive(Debug, Clone)]
pub struct AcquiredImage {
    /// 原始图片字节。
    pub bytes: Vec<u8>,
    /// 声明的 MIME 类型。
    pub mime_type: String,
    /// 原始文件名（粘贴来源没有）。
    pub file_name: Option<String>,
    /// 字节长度。
    pub size_bytes: u64,
}

/// 采集阶段统一错误类型。
///
/// 所有变体都在任何网络调用之前产生，且均不自动重试。
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("类型不支持：{0}")]
    WrongType(String),

    #[error("图片过大：{0}")]
    TooLarge(String),

    #[error("读取失败：{0}")]
    ReadError(String),
}

/// 图片采集器。
///
/// 无内部状态，按配置快照逐项校验候选输入。
pub struct ImageAcquirer;

impl ImageAcquirer {
    /// 校验并解码一个候选图片。
    ///
    /// 校验顺序固定：声明类型 → 体积 → 字节签名。任何一步失败都不产生会话状态。
    pub fn acquire(
        input: SourceInput,
        config: &ClientConfig,
    ) -> Result<AcquiredImage, ValidationError> {
        let declared = input.declared_mime();
        if !declared.starts_with(config.allowed_mime_prefix) {
            return Err(ValidationError::WrongType(format!(
                "仅支持图片类型，实际为 {}",
                if declared.is_empty() { "<未声明>" } else { declared }
            )));
        }

        let size = input.payload().len() as u64;
        if size > config.max_upload_bytes {
            return Err(ValidationError::TooLarge(format!(
                "{}（限制：{}）",
                format_size(size),
                format_size(config.max_upload_bytes)
            )));
        }

        Self::validate_signature(input.payload())?;

        log::info!(
            "📥 图片采集成功 - 来源: {} 类型: {} 体积: {}",
            input.source_hint(),
            declared,
            format_size(size)
        );

        let (mime_type, file_name, bytes) = input.into_parts();
        Ok(AcquiredImage {
            size_bytes: bytes.len() as u64,
            bytes,
            mime_type,
            file_name,
        })
    }

    /// 通过文件签名校验字节内容确实是图片。
    fn validate_signature(bytes: &[u8]) -> Result<(), ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::ReadError("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| ValidationError::ReadError("无法识别图片内容".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(ValidationError::ReadError(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }
}

/// 将字节数格式化为人类可读体积（二进制单位，保留一位小数）。
pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value, UNITS[unit])
}
