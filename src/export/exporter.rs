//! # 剪贴板导出器模块
//!
//! ## 设计思路
//!
//! 导出器负责执行策略表描述的回退链：逐条尝试，第一个被平台接受的
//! 格式即成功；全部被拒时把逐次拒绝原因聚合后一次性上报（只发生过
//! 一次实际尝试时按单次拒绝原样上报）。导出成功
//! 或失败都不触碰会话阶段——这是纯读操作加一次外设写入。
//!
//! ## 实现思路
//!
//! - 实际写入通过 `ClipboardSink` 特征进行，阻塞调用放进
//!   `tokio::task::spawn_blocking`，避免卡住异步运行时。
//! - 每次尝试记录为 `ClipboardWriteAttempt`，仅存活于单次导出调用，
//!   供日志与聚合诊断使用。
//! - 成功时返回带正确扩展名的导出文件名：扩展名对应实际写入的格式，
//!   而非来源格式。

use std::sync::Arc;

use super::naming::{ExportPrefix, export_file_name};
use super::sink::ClipboardSink;
use super::strategy::{ConversionPath, build_chain};

/// 剪贴板导出错误。
///
/// 均为本地可恢复错误：不改变会话阶段，以瞬时反馈形式呈现给用户。
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// 整条回退链只产生了一次实际写入尝试时的失败形态；
    /// 多次尝试的失败聚合为 `AllFormatsRejected`。
    #[error("剪贴板拒绝写入 {mime_type}：{reason}")]
    WriteRejected { mime_type: String, reason: String },

    #[error("所有格式均被剪贴板拒绝（{0}）；可尝试右键另存为")]
    AllFormatsRejected(String),

    #[error("导出任务执行失败：{0}")]
    TaskFailed(String),
}

/// 单次写入尝试的记录，仅在一次导出调用内存活。
#[derive(Debug, Clone)]
pub struct ClipboardWriteAttempt {
    pub target_mime: String,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Success,
    Rejected(String),
}

/// 剪贴板导出器。
///
/// 持有平台写入端；本身无会话状态，可被并发调用（幂等读 + 外设写）。
pub struct ClipboardExporter {
    sink: Arc<dyn ClipboardSink>,
}

impl ClipboardExporter {
    pub fn new(sink: Arc<dyn ClipboardSink>) -> Self {
        Self { sink }
    }

    /// 将图片字节以文件对象形式写入系统剪贴板。
    ///
    /// 按回退链逐格式尝试，返回成功写入的导出文件名。
    pub async fn export_as_file(
        &self,
        bytes: &[u8],
        source_mime: &str,
        prefix: ExportPrefix,
    ) -> Result<String, ClipboardError> {
        let sink = Arc::clone(&self.sink);
        let bytes = bytes.to_vec();
        let source_mime = source_mime.to_string();

        tokio::task::spawn_blocking(move || {
            Self::run_chain(sink.as_ref(), &bytes, &source_mime, prefix)
        })
        .await
        .map_err(|e| ClipboardError::TaskFailed(format!("线程执行失败：{}", e)))?
    }

    /// 在阻塞线程中执行完整回退链。
    fn run_chain(
        sink: &dyn ClipboardSink,
        bytes: &[u8],
        source_mime: &str,
        prefix: ExportPrefix,
    ) -> Result<String, ClipboardError> {
        let mut attempts: Vec<ClipboardWriteAttempt> = Vec::new();

        for strategy in build_chain(source_mime) {
            let payload: Vec<u8> = match &strategy.path {
                ConversionPath::Passthrough => bytes.to_vec(),
                ConversionPath::Reencode(encode) => match encode(bytes) {
                    Ok(converted) => converted,
                    Err(reason) => {
                        log::warn!(
                            "⚠️ 转换到 {} 失败：{}",
                            strategy.target_mime,
                            reason
                        );
                        attempts.push(ClipboardWriteAttempt {
                            target_mime: strategy.target_mime.clone(),
                            outcome: AttemptOutcome::Rejected(format!("转换失败：{}", reason)),
                        });
                        continue;
                    }
                },
                ConversionPath::Unavailable => {
                    // 扩展位：该格式暂无转换路径，显式记录而非静默丢弃
                    log::debug!(
                        "⏭️ 跳过 {}：暂无转换路径（预留扩展位）",
                        strategy.target_mime
                    );
                    continue;
                }
            };

            match sink.write(&strategy.target_mime, &payload) {
                Ok(()) => {
                    let name = export_file_name(prefix, strategy.extension);
                    log::info!(
                        "✅ 剪贴板导出成功 - 格式: {} 文件名: {}",
                        strategy.target_mime,
                        name
                    );
                    attempts.push(ClipboardWriteAttempt {
                        target_mime: strategy.target_mime,
                        outcome: AttemptOutcome::Success,
                    });
                    return Ok(name);
                }
                Err(rejection) => {
                    log::warn!(
                        "❌ 剪贴板拒绝 {}：{}",
                        rejection.mime_type,
                        rejection.reason
                    );
                    attempts.push(ClipboardWriteAttempt {
                        target_mime: strategy.target_mime,
                        outcome: AttemptOutcome::Rejected(rejection.reason),
                    });
                }
            }
        }

        // 仅一次实际尝试时按单次拒绝上报，保留具体 MIME 与原因
        if let [
            ClipboardWriteAttempt {
                target_mime,
                outcome: AttemptOutcome::Rejected(reason),
            },
        ] = attempts.as_slice()
        {
            return Err(ClipboardError::WriteRejected {
                mime_type: target_mime.clone(),
                reason: reason.clone(),
            });
        }

        Err(ClipboardError::AllFormatsRejected(aggregate_reasons(
            &attempts,
        )))
    }
}

/// 把逐次拒绝原因聚合为一条诊断信息。
fn aggregate_reasons(attempts: &[ClipboardWriteAttempt]) -> String {
    if attempts.is_empty() {
        return "没有可尝试的格式".to_string();
    }

    attempts
        .iter()
        .map(|attempt| match &attempt.outcome {
            AttemptOutcome::Success => format!("{}: 成功", attempt.target_mime),
            AttemptOutcome::Rejected(reason) => {
                format!("{}: {}", attempt.target_mime, reason)
            }
        })
        .collect::<Vec<_>>()
        .join("；")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::sink::WriteRejection;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::collections::HashSet;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// 脚本化写入端：按允许集合接受/拒绝，并记录所有被尝试的 MIME。
    struct ScriptedSink {
        accepted: HashSet<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSink {
        fn accepting(mimes: &[&'static str]) -> Self {
            Self {
                accepted: mimes.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn attempted(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock failed").clone()
        }
    }

    impl ClipboardSink for ScriptedSink {
        fn write(&self, mime_type: &str, _bytes: &[u8]) -> Result<(), WriteRejection> {
            self.calls
                .lock()
                .expect("calls lock failed")
                .push(mime_type.to_string());

            if self.accepted.contains(mime_type) {
                Ok(())
            } else {
                Err(WriteRejection {
                    mime_type: mime_type.to_string(),
                    reason: "scripted rejection".to_string(),
                })
            }
        }
    }

    fn jpeg_bytes() -> Vec<u8> {
        let img = ImageBuffer::from_fn(16, 16, |x, y| {
            Rgba([(x * 16) as u8, (y * 16) as u8, 64, 255])
        });

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .write_to(&mut cursor, ImageFormat::Jpeg)
            .expect("failed to encode test jpeg");
        cursor.into_inner()
    }

    #[tokio::test]
    async fn native_accept_short_circuits_the_chain() {
        let sink = Arc::new(ScriptedSink::accepting(&["image/jpeg"]));
        let exporter = ClipboardExporter::new(Arc::clone(&sink) as Arc<dyn ClipboardSink>);

        let name = exporter
            .export_as_file(&jpeg_bytes(), "image/jpeg", ExportPrefix::Processed)
            .await
            .expect("native attempt should succeed");

        assert!(name.ends_with(".jpg"), "name was: {}", name);
        assert_eq!(sink.attempted(), ["image/jpeg"]);
    }

    #[tokio::test]
    async fn jpeg_rejection_falls_back_to_png_with_png_extension() {
        let sink = Arc::new(ScriptedSink::accepting(&["image/png"]));
        let exporter = ClipboardExporter::new(Arc::clone(&sink) as Arc<dyn ClipboardSink>);

        let name = exporter
            .export_as_file(&jpeg_bytes(), "image/jpeg", ExportPrefix::Processed)
            .await
            .expect("png fallback should succeed");

        assert!(name.starts_with("processed_"), "name was: {}", name);
        assert!(name.ends_with(".png"), "name was: {}", name);
        assert_eq!(sink.attempted(), ["image/jpeg", "image/png"]);
    }

    #[tokio::test]
    async fn all_rejections_are_aggregated() {
        let sink = Arc::new(ScriptedSink::accepting(&[]));
        let exporter = ClipboardExporter::new(Arc::clone(&sink) as Arc<dyn ClipboardSink>);

        let error = exporter
            .export_as_file(&jpeg_bytes(), "image/jpeg", ExportPrefix::Image)
            .await
            .expect_err("exhausted chain must fail");

        match error {
            ClipboardError::AllFormatsRejected(summary) => {
                assert!(summary.contains("image/jpeg"), "summary was: {}", summary);
                assert!(summary.contains("image/png"), "summary was: {}", summary);
            }
            other => panic!("expected AllFormatsRejected, got {:?}", other),
        }

        // 扫尾格式暂无转换路径，不应产生实际写入尝试
        assert_eq!(sink.attempted(), ["image/jpeg", "image/png"]);
    }

    #[tokio::test]
    async fn single_attempt_rejection_surfaces_as_write_rejected() {
        let sink = Arc::new(ScriptedSink::accepting(&[]));
        let exporter = ClipboardExporter::new(Arc::clone(&sink) as Arc<dyn ClipboardSink>);

        // PNG 来源的回退链只有一次实际写入尝试（其余条目均为扩展位）
        let error = exporter
            .export_as_file(b"fake png payload", "image/png", ExportPrefix::Original)
            .await
            .expect_err("rejected single attempt must fail");

        match error {
            ClipboardError::WriteRejected { mime_type, reason } => {
                assert_eq!(mime_type, "image/png");
                assert_eq!(reason, "scripted rejection");
            }
            other => panic!("expected WriteRejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn png_source_never_reencodes() {
        let sink = Arc::new(ScriptedSink::accepting(&[]));
        let exporter = ClipboardExporter::new(Arc::clone(&sink) as Arc<dyn ClipboardSink>);

        let _ = exporter
            .export_as_file(b"fake png payload", "image/png", ExportPrefix::Original)
            .await;

        // 来源已是 PNG：只有原生尝试，回退链里没有第二次 PNG 写入
        assert_eq!(sink.attempted(), ["image/png"]);
    }

    #[tokio::test]
    async fn undecodable_bytes_record_conversion_failure() {
        let sink = Arc::new(ScriptedSink::accepting(&[]));
        let exporter = ClipboardExporter::new(Arc::clone(&sink) as Arc<dyn ClipboardSink>);

        let error = exporter
            .export_as_file(b"garbage", "image/jpeg", ExportPrefix::Image)
            .await
            .expect_err("chain must fail");

        match error {
            ClipboardError::AllFormatsRejected(summary) => {
                assert!(summary.contains("转换失败"), "summary was: {}", summary);
            }
            other => panic!("expected AllFormatsRejected, got {:?}", other),
        }
    }

    #[test]
    fn aggregate_reasons_handles_empty_attempts() {
        assert_eq!(aggregate_reasons(&[]), "没有可尝试的格式");
    }
}
