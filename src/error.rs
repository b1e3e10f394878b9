//! # 统一错误类型模块
//!
//! ## 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，替代各模块中分散的
//! `.map_err(|e| e.to_string())`、`format!(...)` 等不一致模式。
//! 服务层对外统一返回 `Result<T, AppError>`。
//!
//! ## 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为各模块错误提供 `From` 转换，无需手动 map。
//! - `code` / `stage` 提供稳定的结构化字段，便于上层分支与日志聚合。
//! - 实现 `Serialize` 将错误序列化为字符串，满足 IPC / 前端展示需要。

use serde::Serialize;

use crate::acquire::ValidationError;
use crate::config::ConfigError;
use crate::export::ClipboardError;
use crate::processing::ProcessingError;
use crate::session::SessionError;

/// 应用级统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 采集校验错误（类型 / 体积 / 读取）
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// 远端处理错误（超时 / 网络 / 服务端）
    #[error("{0}")]
    Processing(#[from] ProcessingError),

    /// 剪贴板导出错误（不影响会话阶段）
    #[error("{0}")]
    Clipboard(#[from] ClipboardError),

    /// 会话状态机错误（非法迁移 / 单飞冲突）
    #[error("{0}")]
    Session(#[from] SessionError),

    /// 配置错误
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误：{0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::WrongType(_)) => "E_WRONG_TYPE",
            Self::Validation(ValidationError::TooLarge(_)) => "E_TOO_LARGE",
            Self::Validation(ValidationError::ReadError(_)) => "E_READ",
            Self::Processing(error) => error.code(),
            Self::Clipboard(_) => "E_CLIPBOARD",
            Self::Session(_) => "E_SESSION",
            Self::Config(_) => "E_CONFIG",
            Self::Io(_) => "E_IO",
        }
    }

    /// 错误发生的阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Validation(_) => "acquire",
            Self::Processing(_) => "processing",
            Self::Clipboard(_) => "export",
            Self::Session(_) => "session",
            Self::Config(_) => "config",
            Self::Io(_) => "filesystem",
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
