//! # 剪贴板导出模块（export）
//!
//! ## 设计思路
//!
//! 该模块补偿浏览器/平台对任意图片 MIME 写入剪贴板的支持差异：
//! 给定任意图片字节与来源类型，通过有序的回退/重编码策略，
//! 保证尽可能产出一个可写入剪贴板的文件对象。
//!
//! - `sink`：平台剪贴板边界（`ClipboardSink` 特征 + `arboard` 实现）
//! - `strategy`：数据驱动的 `(MIME, 转换路径)` 策略表
//! - `exporter`：按表执行回退链、聚合逐次拒绝原因
//! - `naming`：带时间戳的导出/另存文件名
//!
//! ## 实现思路
//!
//! 对外仅暴露导出器、前缀与错误类型；策略表与命名细节保持模块私有。

mod exporter;
mod naming;
mod sink;
mod strategy;

pub use exporter::{AttemptOutcome, ClipboardError, ClipboardExporter, ClipboardWriteAttempt};
pub use naming::ExportPrefix;
pub use sink::{ArboardSink, ClipboardSink, WriteRejection};

pub(crate) use naming::{download_original_name, download_result_name, extension_for_mime};
