//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ClientConfig`，保证运行时行为可观测、可调整、可测试。
//! 其中扫描模式（natural / balanced / standard / ocr / printing / custom）
//! 作为高层语义直接透传给远端服务，客户端不解释其内部含义。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的默认配置（10MB 上传上限、60 秒请求超时）。
//! - `ScanMode` 负责模式字符串解析与反向输出。
//! - 超时与体积上限的范围校验集中在 `validate` 中，供服务层设置接口复用。

use serde_json::Value;

/// 客户端配置。
///
/// 字段覆盖了采集校验、远端请求与导出链路三个阶段。
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 远端扫描服务地址（`POST` 接口）。
    pub endpoint: String,
    /// 单次采集允许的最大图片体积（字节）。
    pub max_upload_bytes: u64,
    /// 允许的 MIME 类型前缀。
    pub allowed_mime_prefix: &'static str,
    /// 远端处理请求超时时间（秒），超时后不自动重试。
    pub request_timeout: u64,
    /// 建立连接（TCP/TLS）超时时间（秒）。
    pub connect_timeout: u64,
    /// 扫描模式，随请求发送给远端服务。
    pub scan_mode: ScanMode,
    /// 自定义处理配置（透传给远端，客户端不解释）。
    pub custom_config: Option<Value>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/scan-document".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            allowed_mime_prefix: "image/",
            request_timeout: 60,
            connect_timeout: 8,
            scan_mode: ScanMode::Balanced,
            custom_config: None,
        }
    }
}

/// 配置层错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("未知扫描模式：{0}（可选：natural / balanced / standard / ocr / printing / custom）")]
    UnknownScanMode(String),

    #[error("配置取值越界：{0}")]
    OutOfRange(String),

    #[error("配置锁已中毒")]
    Poisoned,
}

/// 文档扫描模式（面向产品/用户语义）。
///
/// - `Natural`：最大程度保留原图特征
/// - `Balanced`：温和处理，避免过度增白（默认）
/// - `Standard`：标准扫描
/// - `Ocr`：二值化输出，便于文字识别
/// - `Printing`：高质量输出，适合打印
/// - `Custom`：配合 `custom_config` 使用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Natural,
    Balanced,
    Standard,
    Ocr,
    Printing,
    Custom,
}

impl ScanMode {
    /// 从外部字符串解析模式。
    pub fn parse(mode: &str) -> Result<Self, ConfigError> {
        match mode.trim().to_lowercase().as_str() {
            "natural" => Ok(Self::Natural),
            "balanced" => Ok(Self::Balanced),
            "standard" => Ok(Self::Standard),
            "ocr" => Ok(Self::Ocr),
            "printing" => Ok(Self::Printing),
            "custom" => Ok(Self::Custom),
            other => Err(ConfigError::UnknownScanMode(other.to_string())),
        }
    }

    /// 将模式输出为稳定字符串，即请求体中的 `mode` 字段取值。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::Balanced => "balanced",
            Self::Standard => "standard",
            Self::Ocr => "ocr",
            Self::Printing => "printing",
            Self::Custom => "custom",
        }
    }
}

impl ClientConfig {
    /// 校验当前配置是否落在允许范围内。
    ///
    /// 服务层的设置接口在写入前统一调用，避免运行中出现不可用配置。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::OutOfRange("endpoint 不能为空".to_string()));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::OutOfRange(
                "endpoint 仅支持 HTTP/HTTPS".to_string(),
            ));
        }
        if !(1..=600).contains(&self.request_timeout) {
            return Err(ConfigError::OutOfRange(
                "request_timeout 必须在 1~600 秒之间".to_string(),
            ));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(ConfigError::OutOfRange(
                "connect_timeout 必须在 1~120 秒之间".to_string(),
            ));
        }
        if self.max_upload_bytes < 64 * 1024 {
            return Err(ConfigError::OutOfRange(
                "max_upload_bytes 不能小于 64KB".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_mode_parse_and_as_str_roundtrip() {
        for mode in ["natural", "balanced", "standard", "ocr", "printing", "custom"] {
            let parsed = ScanMode::parse(mode).expect("mode should parse");
            assert_eq!(parsed.as_str(), mode);
        }
    }

    #[test]
    fn scan_mode_parse_is_case_insensitive() {
        assert_eq!(ScanMode::parse("  Balanced ").expect("parse failed"), ScanMode::Balanced);
        assert_eq!(ScanMode::parse("OCR").expect("parse failed"), ScanMode::Ocr);
    }

    #[test]
    fn scan_mode_rejects_unknown_value() {
        assert!(matches!(
            ScanMode::parse("ultra"),
            Err(ConfigError::UnknownScanMode(_))
        ));
    }

    #[test]
    fn default_config_passes_validation() {
        ClientConfig::default().validate().expect("default config should be valid");
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = ClientConfig::default();
        config.request_timeout = 0;

        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange(_))));
    }

    #[test]
    fn validate_rejects_non_http_endpoint() {
        let mut config = ClientConfig::default();
        config.endpoint = "ftp://example.com/scan".to_string();

        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange(_))));
    }
}
