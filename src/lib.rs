//! # DocuScan 客户端核心 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 外部协作方（不在本 crate 内）               │
//! │                                                          │
//! │   UI 渲染层（阶段 → 视图的无状态映射）     toast/通知渲染   │
//! │   DocuScan 服务端（/scan-document）                       │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕              本 crate                             │
//! │                                                          │
//! │  ┌─ service ──── ScanService（链路编排、配置快照）         │
//! │  │                                                       │
//! │  ├─ acquire ──── 粘贴/拖拽/选择 → 校验 + 解码              │
//! │  ├─ session ──── 会话状态机（阶段 + 票据式过期门控）        │
//! │  ├─ processing ─ 远端处理客户端（60s 超时、不自动重试）     │
//! │  ├─ export ───── 剪贴板回退链（原生 → PNG 重编码 → 扫尾）  │
//! │  ├─ download ─── 另存边界                                 │
//! │  ├─ notify ───── 反馈出口（特征，外部实现渲染）            │
//! │  ├─ config ───── ClientConfig + ScanMode                 │
//! │  └─ error ────── AppError（统一错误类型）                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`service`] | 采集→自动处理→导出的编排入口，唯一的状态持有方 |
//! | [`acquire`] | 候选图片校验（类型前缀 / 体积上限 / 字节签名） |
//! | [`session`] | `Idle → Loaded → Processing → {Result,Failed}` 状态机 |
//! | [`processing`] | 远端增强请求的发起与错误归类 |
//! | [`export`] | 多格式剪贴板导出：数据驱动的回退/重编码策略表 |
//! | [`download`] | 结果/原图另存到磁盘 |
//! | [`notify`] | 瞬时反馈接口，渲染由外部实现 |
//! | [`config`] | 运行时配置与扫描模式 |
//! | [`error`] | 统一错误类型 `AppError`（含 code/stage） |

pub mod acquire;
pub mod config;
pub mod download;
pub mod error;
pub mod export;
pub mod notify;
pub mod processing;
pub mod service;
pub mod session;

pub use acquire::{AcquiredImage, ImageAcquirer, SourceInput, ValidationError};
pub use config::{ClientConfig, ConfigError, ScanMode};
pub use error::AppError;
pub use export::{ArboardSink, ClipboardError, ClipboardExporter, ClipboardSink, ExportPrefix};
pub use notify::{Feedback, LogNotifier, Notifier};
pub use processing::{ProcessedImage, ProcessingClient, ProcessingError};
pub use service::ScanService;
pub use session::{Phase, ProcessingTicket, SessionError, SessionSnapshot, SessionStateMachine};
