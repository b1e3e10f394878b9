//! # 会话状态机模块
//!
//! ## 设计思路
//!
//! 单个可变会话（原图、结果、当前阶段）由 `SessionStateMachine` 独占持有，
//! 其余组件只拿到不可变快照或一次性写入的结果，杜绝“全局变量 + DOM 可见性”
//! 式的隐式状态。状态枚举是唯一事实来源，渲染层只做映射。
//!
//! ## 实现思路
//!
//! - 阶段固定为 `Idle → Loaded → Processing → {Result | Failed}`，
//!   reset 从任意阶段回到 `Idle`。
//! - 每次采集与重置都会递增 `generation`；处理请求携带签发时的
//!   `ProcessingTicket`，迟到的过期响应按票据丢弃，不会覆盖新会话。
//! - 所有迁移在同一把锁内原子完成，不存在部分更新的中间态。

use std::sync::Mutex;

use crate::acquire::AcquiredImage;
use crate::processing::{ProcessedImage, ProcessingError};

/// 会话阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loaded,
    Processing,
    Result,
    Failed,
}

/// 会话不可变快照，供渲染与导出读取。
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub original: Option<AcquiredImage>,
    pub result: Option<ProcessedImage>,
    pub error: Option<ProcessingError>,
    pub generation: u64,
}

/// 处理票据：标记一次远端处理归属于哪一代会话。
///
/// 迟到响应的 `generation` 与当前会话不一致时直接丢弃。
#[derive(Debug, Clone, Copy)]
pub struct ProcessingTicket {
    generation: u64,
}

/// 状态机错误类型。
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("非法状态迁移：{0}")]
    IllegalTransition(String),

    #[error("已有处理请求在途，不可重复发起")]
    AlreadyProcessing,

    #[error("当前会话没有可用的{0}")]
    MissingPayload(&'static str),

    #[error("会话状态锁已中毒")]
    Poisoned,
}

#[derive(Debug)]
struct SessionState {
    phase: Phase,
    original: Option<AcquiredImage>,
    result: Option<ProcessedImage>,
    error: Option<ProcessingError>,
    generation: u64,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            original: None,
            result: None,
            error: None,
            generation: 0,
        }
    }
}

/// 会话状态机。
pub struct SessionStateMachine {
    state: Mutex<SessionState>,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SessionState>, SessionError> {
        self.state.lock().map_err(|_| SessionError::Poisoned)
    }

    /// 载入新采集的原图。
    ///
    /// 任意阶段均合法：旧会话被整体丢弃（含在途处理请求的“兴趣”），
    /// 新会话从 `Loaded` 开始。
    pub fn load(&self, image: AcquiredImage) -> Result<(), SessionError> {
        let mut state = self.lock()?;

        if state.phase == Phase::Processing {
            log::info!(
                "🔁 处理中收到新采集，放弃第 {} 代会话的在途响应",
                state.generation
            );
        }

        state.generation += 1;
        state.original = Some(image);
        state.result = None;
        state.error = None;
        state.phase = Phase::Loaded;

        log::debug!("📦 会话载入完成 - generation={}", state.generation);
        Ok(())
    }

    /// 载入新采集的原图并立即进入处理阶段，两步在同一把锁内完成。
    ///
    /// “选图即处理”链路使用该迁移：并发采集时，后到的调用不会把
    /// 先到调用的在途处理误判为自己的单飞冲突。
    pub fn load_and_begin(
        &self,
        image: AcquiredImage,
    ) -> Result<(ProcessingTicket, AcquiredImage), SessionError> {
        let mut state = self.lock()?;

        if state.phase == Phase::Processing {
            log::info!(
                "🔁 处理中收到新采集，放弃第 {} 代会话的在途响应",
                state.generation
            );
        }

        state.generation += 1;
        state.original = Some(image.clone());
        state.result = None;
        state.error = None;
        state.phase = Phase::Processing;

        log::debug!("📦 会话载入并进入处理 - generation={}", state.generation);
        Ok((
            ProcessingTicket {
                generation: state.generation,
            },
            image,
        ))
    }

    /// 进入处理阶段，签发本次处理的票据并返回原图副本。
    ///
    /// 仅允许从 `Loaded` 发起；重复发起会被单飞约束拒绝。
    pub fn begin_processing(&self) -> Result<(ProcessingTicket, AcquiredImage), SessionError> {
        let mut state = self.lock()?;

        match state.phase {
            Phase::Loaded => {}
            Phase::Processing => return Err(SessionError::AlreadyProcessing),
            other => {
                return Err(SessionError::IllegalTransition(format!(
                    "{:?} 阶段不能发起处理",
                    other
                )));
            }
        }

        let original = state
            .original
            .clone()
            .ok_or(SessionError::MissingPayload("原图"))?;

        state.error = None;
        state.phase = Phase::Processing;

        Ok((
            ProcessingTicket {
                generation: state.generation,
            },
            original,
        ))
    }

    /// 应用一次远端处理的结果。
    ///
    /// 返回 `Ok(true)` 表示已生效；票据过期（会话已被新采集或重置替换）
    /// 时返回 `Ok(false)` 并丢弃该结果，这是防止慢响应覆盖新会话的
    /// 正确性要求，而非日志美化。
    pub fn complete_processing(
        &self,
        ticket: ProcessingTicket,
        outcome: Result<ProcessedImage, ProcessingError>,
    ) -> Result<bool, SessionError> {
        let mut state = self.lock()?;

        if ticket.generation != state.generation || state.phase != Phase::Processing {
            log::info!(
                "🗑️ 丢弃过期处理响应 - ticket_gen={} current_gen={} phase={:?}",
                ticket.generation,
                state.generation,
                state.phase
            );
            return Ok(false);
        }

        match outcome {
            Ok(result) => {
                state.result = Some(result);
                state.error = None;
                state.phase = Phase::Result;
            }
            Err(error) => {
                state.result = None;
                state.error = Some(error);
                state.phase = Phase::Failed;
            }
        }

        Ok(true)
    }

    /// 重置会话：任意阶段回到 `Idle`，所有载荷清空。
    pub fn reset(&self) -> Result<(), SessionError> {
        let mut state = self.lock()?;

        state.generation += 1;
        state.original = None;
        state.result = None;
        state.error = None;
        state.phase = Phase::Idle;

        log::debug!("🧹 会话已重置 - generation={}", state.generation);
        Ok(())
    }

    /// 当前阶段。
    pub fn phase(&self) -> Result<Phase, SessionError> {
        Ok(self.lock()?.phase)
    }

    /// 会话整体快照（只读副本）。
    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let state = self.lock()?;
        Ok(SessionSnapshot {
            phase: state.phase,
            original: state.original.clone(),
            result: state.result.clone(),
            error: state.error.clone(),
            generation: state.generation,
        })
    }

    /// 当前原图副本，导出链路使用。
    pub fn original(&self) -> Result<AcquiredImage, SessionError> {
        self.lock()?
            .original
            .clone()
            .ok_or(SessionError::MissingPayload("原图"))
    }

    /// 当前处理结果副本，导出链路使用。
    pub fn result(&self) -> Result<ProcessedImage, SessionError> {
        self.lock()?
            .result
            .clone()
            .ok_or(SessionError::MissingPayload("处理结果"))
    }
}
