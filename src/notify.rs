//! # 反馈通知模块
//!
//! 瞬时反馈的渲染（toast 样式、动画）属于外部协作方；本模块只定义
//! 各组件发出反馈的接口。技术细节（状态码、异常名）走日志，
//! 用户文案只保留人类可读信息与服务端显式提供的 `detail`。

/// 一条用户可见的瞬时反馈。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Success(String),
    Error(String),
}

/// 反馈出口。由外部 UI 层实现，本 crate 仅消费。
pub trait Notifier: Send + Sync {
    fn notify(&self, feedback: Feedback);
}

/// 默认实现：反馈降级为日志输出。
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, feedback: Feedback) {
        match feedback {
            Feedback::Success(message) => log::info!("🔔 {}", message),
            Feedback::Error(message) => log::warn!("🔔 {}", message),
        }
    }
}
