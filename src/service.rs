//! # 服务层（编排入口）
//!
//! ## 设计思路
//!
//! `ScanService` 把采集、状态机、远端客户端与导出器编排为完整链路，
//! 对外暴露少量稳定 API，替代全局单例函数。平台写入端与反馈出口
//! 都以特征注入，测试可以创建完全隔离的实例。
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ClientConfig>>` 支持运行时调整；
//!   单次请求链路内使用同一配置快照，避免处理中途配置漂移。
//! - 采集成功后自动触发远端处理（产品规则：选图即处理）。
//! - 处理结果经票据门控写回状态机，过期响应在该处被丢弃。
//! - 记录 `acquire/process/total` 阶段耗时，便于性能诊断。

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::acquire::{ImageAcquirer, SourceInput};
use crate::config::{ClientConfig, ConfigError, ScanMode};
use crate::download;
use crate::error::AppError;
use crate::export::{ArboardSink, ClipboardExporter, ClipboardSink, ExportPrefix};
use crate::notify::{Feedback, LogNotifier, Notifier};
use crate::processing::ProcessingClient;
use crate::session::{Phase, SessionSnapshot, SessionStateMachine};

/// 扫描会话服务。
///
/// 持有唯一的会话状态机；其余组件均为无状态协作方。
pub struct ScanService {
    config: Arc<RwLock<ClientConfig>>,
    machine: SessionStateMachine,
    client: ProcessingClient,
    exporter: ClipboardExporter,
    notifier: Arc<dyn Notifier>,
}

impl Default for ScanService {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanService {
    /// 生产默认装配：系统剪贴板 + 日志反馈。
    pub fn new() -> Self {
        Self::with_parts(
            ClientConfig::default(),
            Arc::new(ArboardSink),
            Arc::new(LogNotifier),
        )
    }

    /// 注入式装配，测试与嵌入场景使用。
    pub fn with_parts(
        config: ClientConfig,
        sink: Arc<dyn ClipboardSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            machine: SessionStateMachine::new(),
            client: ProcessingClient::new(),
            exporter: ClipboardExporter::new(sink),
            notifier,
        }
    }

    /// 获取配置快照，保证单次链路使用一致参数。
    fn config_snapshot(&self) -> Result<ClientConfig, AppError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| AppError::Config(ConfigError::Poisoned))
    }

    /// 采集主入口：校验候选图片，载入会话并自动触发远端处理。
    ///
    /// 校验失败时会话保持原状（`Idle` 或上一会话）；处理失败会把会话
    /// 带入 `Failed`，具体原因见返回快照的 `error` 字段。
    pub async fn acquire(&self, input: SourceInput) -> Result<SessionSnapshot, AppError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let acquire_start = Instant::now();
        let image = match ImageAcquirer::acquire(input, &config) {
            Ok(image) => image,
            Err(error) => {
                self.notifier.notify(Feedback::Error(error.to_string()));
                return Err(error.into());
            }
        };
        let acquire_elapsed = acquire_start.elapsed();

        // 选图即处理：载入与进入处理在状态机单锁内完成，
        // 并发采集只会通过代际票据淘汰对方的在途响应
        let process_start = Instant::now();
        let (ticket, original) = self.machine.load_and_begin(image)?;
        let outcome = self.client.process(&original, &config).await;
        let process_elapsed = process_start.elapsed();

        let applied = self.machine.complete_processing(ticket, outcome)?;

        let snapshot = self.machine.snapshot()?;
        if applied {
            match snapshot.phase {
                Phase::Result => {
                    self.notifier
                        .notify(Feedback::Success("文档处理完成".to_string()));
                }
                Phase::Failed => {
                    let message = snapshot
                        .error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "处理失败".to_string());
                    self.notifier.notify(Feedback::Error(message));
                }
                _ => {}
            }
        }

        log::info!(
            "⏱️ 会话链路完成 - acquire={}ms process={}ms total={}ms phase={:?}",
            acquire_elapsed.as_millis(),
            process_elapsed.as_millis(),
            total_start.elapsed().as_millis(),
            snapshot.phase
        );

        Ok(snapshot)
    }

    /// 重置会话，回到 `Idle`。
    pub fn reset(&self) -> Result<(), AppError> {
        Ok(self.machine.reset()?)
    }

    /// 当前会话阶段。
    pub fn phase(&self) -> Result<Phase, AppError> {
        Ok(self.machine.phase()?)
    }

    /// 会话只读快照。
    pub fn snapshot(&self) -> Result<SessionSnapshot, AppError> {
        Ok(self.machine.snapshot()?)
    }

    /// 把原图以文件对象写入系统剪贴板，返回导出文件名。
    ///
    /// 导出结果不改变会话阶段；失败仅以瞬时反馈呈现。
    pub async fn export_original(&self) -> Result<String, AppError> {
        let image = self.machine.original()?;
        self.export_bytes(&image.bytes, &image.mime_type, ExportPrefix::Original)
            .await
    }

    /// 把处理结果以文件对象写入系统剪贴板，返回导出文件名。
    pub async fn export_result(&self) -> Result<String, AppError> {
        let image = self.machine.result()?;
        self.export_bytes(&image.bytes, &image.mime_type, ExportPrefix::Processed)
            .await
    }

    async fn export_bytes(
        &self,
        bytes: &[u8],
        mime_type: &str,
        prefix: ExportPrefix,
    ) -> Result<String, AppError> {
        match self.exporter.export_as_file(bytes, mime_type, prefix).await {
            Ok(name) => {
                self.notifier
                    .notify(Feedback::Success(format!("已复制 {}", name)));
                Ok(name)
            }
            Err(error) => {
                self.notifier.notify(Feedback::Error(error.to_string()));
                Err(error.into())
            }
        }
    }

    /// 将处理结果另存到目标目录。
    pub fn save_result(&self, dir: &Path) -> Result<PathBuf, AppError> {
        let image = self.machine.result()?;
        Ok(download::save_result(&image, dir)?)
    }

    /// 将原图另存到目标目录。
    pub fn save_original(&self, dir: &Path) -> Result<PathBuf, AppError> {
        let image = self.machine.original()?;
        Ok(download::save_original(&image, dir)?)
    }

    /// 切换扫描模式。
    pub fn set_scan_mode(&self, mode: &str) -> Result<(), AppError> {
        let mode = ScanMode::parse(mode)?;

        let mut config = self
            .config
            .write()
            .map_err(|_| AppError::Config(ConfigError::Poisoned))?;
        config.scan_mode = mode;

        log::info!("⚙️ 已切换扫描模式：{}", mode.as_str());
        Ok(())
    }

    /// 当前扫描模式（字符串）。
    pub fn scan_mode(&self) -> Result<String, AppError> {
        let config = self
            .config
            .read()
            .map_err(|_| AppError::Config(ConfigError::Poisoned))?;
        Ok(config.scan_mode.as_str().to_string())
    }

    /// 设置随请求透传的自定义处理配置。
    pub fn set_custom_config(&self, custom: Option<serde_json::Value>) -> Result<(), AppError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| AppError::Config(ConfigError::Poisoned))?;
        config.custom_config = custom;
        Ok(())
    }

    /// 设置网络相关配置，写入前整体校验。
    pub fn set_network_config(
        &self,
        endpoint: String,
        request_timeout: u64,
        connect_timeout: u64,
        max_upload_bytes: u64,
    ) -> Result<(), AppError> {
        let mut candidate = self.config_snapshot()?;
        candidate.endpoint = endpoint;
        candidate.request_timeout = request_timeout;
        candidate.connect_timeout = connect_timeout;
        candidate.max_upload_bytes = max_upload_bytes;
        candidate.validate()?;

        let mut config = self
            .config
            .write()
            .map_err(|_| AppError::Config(ConfigError::Poisoned))?;
        *config = candidate;

        log::info!(
            "⚙️ 网络配置已更新 - endpoint={} timeout={}s",
            config.endpoint,
            config.request_timeout
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::WriteRejection;
    use std::sync::Mutex;

    struct NullSink;

    impl ClipboardSink for NullSink {
        fn write(&self, mime_type: &str, _bytes: &[u8]) -> Result<(), WriteRejection> {
            Err(WriteRejection {
                mime_type: mime_type.to_string(),
                reason: "test sink".to_string(),
            })
        }
    }

    struct CollectingNotifier {
        received: Mutex<Vec<Feedback>>,
    }

    impl CollectingNotifier {
        fn new() -> Self {
            Self {
                received: Mutex::new(Vec::new()),
            }
        }
    }

    impl Notifier for CollectingNotifier {
        fn notify(&self, feedback: Feedback) {
            self.received
                .lock()
                .expect("notifier lock failed")
                .push(feedback);
        }
    }

    fn test_service() -> ScanService {
        ScanService::with_parts(
            ClientConfig::default(),
            Arc::new(NullSink),
            Arc::new(CollectingNotifier::new()),
        )
    }

    #[test]
    fn scan_mode_set_and_get_roundtrip() {
        let service = test_service();

        for mode in ["natural", "standard", "ocr", "printing", "custom", "balanced"] {
            service.set_scan_mode(mode).expect("set mode should succeed");
            assert_eq!(service.scan_mode().expect("get mode failed"), mode);
        }
    }

    #[test]
    fn scan_mode_rejects_unknown_value() {
        let service = test_service();

        let result = service.set_scan_mode("turbo");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn network_config_rejects_invalid_values_without_committing() {
        let service = test_service();

        let result = service.set_network_config(
            "http://127.0.0.1:8000/scan-document".to_string(),
            0,
            8,
            10 * 1024 * 1024,
        );
        assert!(matches!(result, Err(AppError::Config(_))));

        // 失败的设置不应影响现有配置
        let config = service.config_snapshot().expect("snapshot failed");
        assert_eq!(config.request_timeout, 60);
    }

    #[tokio::test]
    async fn export_without_session_fails_with_session_error() {
        let service = test_service();

        assert!(matches!(
            service.export_original().await,
            Err(AppError::Session(_))
        ));
        assert!(matches!(
            service.export_result().await,
            Err(AppError::Session(_))
        ));
    }

    #[test]
    fn save_without_result_fails() {
        let service = test_service();
        let dir = tempfile::tempdir().expect("tempdir failed");

        assert!(matches!(
            service.save_result(dir.path()),
            Err(AppError::Session(_))
        ));
    }

    #[tokio::test]
    async fn validation_failure_keeps_session_idle() {
        let service = test_service();

        let result = service
            .acquire(SourceInput::Pasted {
                mime_type: "text/plain".to_string(),
                bytes: b"hello".to_vec(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(service.phase().expect("phase read failed"), Phase::Idle);
    }
}
