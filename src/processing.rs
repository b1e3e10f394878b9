//! # 远端处理客户端模块
//!
//! ## 设计思路
//!
//! 把一次远端增强请求封装为单个可等待的操作：输入原图，输出带类型标记的
//! 结果或失败原因，替代“成功/失败/完成”三段式回调。客户端本身无状态，
//! 单飞约束由会话状态机在发起侧保证。
//!
//! ## 实现思路
//!
//! - 请求体为 JSON `{ img, mode, config? }`，`img` 是 MIME 标记的
//!   Data URL（与 DocuScan 服务端 `/scan-document` 约定一致）。
//! - 固定客户端超时（默认 60 秒），超时即失败，不自动重试。
//! - 传输层与 HTTP 状态统一映射到小而稳定的错误分类。
//! - 成功时把结果字节一次性转换为 Data URL，预览与导出共用。

use base64::{Engine as _, engine::general_purpose};
use serde::Serialize;
use std::time::Duration;

use crate::acquire::AcquiredImage;
use crate::config::ClientConfig;

/// 远端处理产物。写入会话后不再修改。
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// 结果图片原始字节。
    pub bytes: Vec<u8>,
    /// 服务端声明的结果类型（缺省按 `image/jpeg` 处理）。
    pub mime_type: String,
    /// 结果的 Data URL 表示，预览渲染与导出共用，只构建一次。
    pub data_uri: String,
}

/// 远端处理统一错误类型。
///
/// 所有变体对本次请求都是终态；恢复手段是用户重新采集，绝不静默重试。
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProcessingError {
    #[error("处理超时：{0}")]
    Timeout(String),

    #[error("网络错误：{0}")]
    NetworkFailure(String),

    #[error("服务拒绝处理：{0}")]
    ServerRejected(String),

    #[error("服务暂不可用：{0}")]
    ServerUnavailable(String),
}

impl ProcessingError {
    /// 稳定错误码，供结构化反馈与日志聚合使用。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "E_TIMEOUT",
            Self::NetworkFailure(_) => "E_NETWORK",
            Self::ServerRejected(_) => "E_SERVER_REJECTED",
            Self::ServerUnavailable(_) => "E_SERVER_UNAVAILABLE",
        }
    }
}

#[derive(Debug, Serialize)]
struct ScanRequest<'a> {
    img: String,
    mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<&'a serde_json::Value>,
}

/// 远端处理客户端。
pub struct ProcessingClient;

impl Default for ProcessingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingClient {
    pub fn new() -> Self {
        Self
    }

    /// 发送一次处理请求并等待结果。
    ///
    /// 不触碰任何会话状态；调用方（状态机编排层）观察返回值后自行迁移。
    pub async fn process(
        &self,
        image: &AcquiredImage,
        config: &ClientConfig,
    ) -> Result<ProcessedImage, ProcessingError> {
        log::info!(
            "🚀 发起远端处理 - mode={} 原图体积: {}",
            config.scan_mode.as_str(),
            crate::acquire::format_size(image.size_bytes)
        );

        let request = ScanRequest {
            img: encode_data_uri(&image.mime_type, &image.bytes),
            mode: config.scan_mode.as_str(),
            config: config.custom_config.as_ref(),
        };

        let client = Self::build_client(config)?;
        let response = client
            .post(&config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, config))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::map_error_status(status, response).await);
        }

        let mime_type = mime_from_content_type(response.headers());
        Self::log_scan_headers(response.headers());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_transport_error(e, config))?
            .to_vec();

        log::info!(
            "✅ 远端处理完成 - 类型: {} 结果体积: {}",
            mime_type,
            crate::acquire::format_size(bytes.len() as u64)
        );

        let data_uri = encode_data_uri(&mime_type, &bytes);
        Ok(ProcessedImage {
            bytes,
            mime_type,
            data_uri,
        })
    }

    fn build_client(config: &ClientConfig) -> Result<reqwest::Client, ProcessingError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .build()
            .map_err(|e| ProcessingError::NetworkFailure(format!("无法创建 HTTP 客户端：{}", e)))
    }

    /// 统一映射传输层错误。
    fn map_transport_error(e: reqwest::Error, config: &ClientConfig) -> ProcessingError {
        if e.is_timeout() {
            ProcessingError::Timeout(format!("请求超过 {} 秒未完成", config.request_timeout))
        } else if e.is_connect() {
            ProcessingError::NetworkFailure(format!("无法连接：{}", e))
        } else {
            ProcessingError::NetworkFailure(format!("请求失败：{}", e))
        }
    }

    /// 按状态码归类服务端错误；400 的 `detail` 原样透出给用户。
    async fn map_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ProcessingError {
        let code = status.as_u16();
        let body = response.bytes().await.ok();
        let detail = body.as_deref().and_then(extract_detail);

        match code {
            400 => ProcessingError::ServerRejected(
                detail.unwrap_or_else(|| "输入无法被识别或不受支持".to_string()),
            ),
            413 => ProcessingError::ServerRejected("图片体积超过服务端限制".to_string()),
            500..=599 => {
                // 5xx 的 detail 只进日志，不作为用户可见文案
                if let Some(detail) = detail {
                    log::warn!("⚠️ 服务端错误详情（HTTP {}）：{}", code, detail);
                }
                ProcessingError::ServerUnavailable(format!("HTTP {}", code))
            }
            _ => ProcessingError::ServerRejected(
                detail.unwrap_or_else(|| format!("HTTP {}", code)),
            ),
        }
    }

    /// 记录服务端附带的扫描信息头（可选，仅用于诊断）。
    fn log_scan_headers(headers: &reqwest::header::HeaderMap) {
        for name in ["x-scan-mode", "x-original-size", "x-final-size"] {
            if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
                log::debug!("🔍 {}: {}", name, value);
            }
        }
    }
}

/// 构建 MIME 标记的 Data URL。
pub(crate) fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(bytes)
    )
}

/// 从 `Content-Type` 推断结果类型；缺省按服务端固定输出的 JPEG 处理。
fn mime_from_content_type(headers: &reqwest::header::HeaderMap) -> String {
    headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "image/jpeg".to_string())
}

/// 从错误响应体提取 `{"detail": ...}` 字段。
fn extract_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value.get("detail")?.as_str().map(|s| s.to_string())
}
