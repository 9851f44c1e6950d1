//! # 导出配置

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// 剪贴板投递策略。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// 写入剪贴板失败时最大尝试次数。
    pub clipboard_retries: u32,
    /// 首次重试的基础间隔（毫秒）。
    pub clipboard_retry_delay: u64,
    /// 单次投递允许的总重试预算（毫秒）。
    pub clipboard_retry_max_total_ms: u64,
    /// 单次退避延迟上限（毫秒）。
    pub clipboard_retry_max_delay_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            clipboard_retries: 3,
            clipboard_retry_delay: 100,
            clipboard_retry_max_total_ms: 1_800,
            clipboard_retry_max_delay_ms: 900,
        }
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<(), ExportError> {
        if !(1..=10).contains(&self.clipboard_retries) {
            return Err(ExportError::Config("clipboard_retries 必须在 1~10 之间".to_string()));
        }
        if self.clipboard_retry_delay == 0 {
            return Err(ExportError::Config("clipboard_retry_delay 必须大于 0".to_string()));
        }
        if self.clipboard_retry_max_delay_ms < self.clipboard_retry_delay {
            return Err(ExportError::Config(
                "clipboard_retry_max_delay_ms 不能小于 clipboard_retry_delay".to_string(),
            ));
        }
        if self.clipboard_retry_max_total_ms == 0 {
            return Err(ExportError::Config("clipboard_retry_max_total_ms 必须大于 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ExportConfig::default().validate().is_ok());
    }

    #[test]
    fn max_delay_below_base_is_rejected() {
        let config = ExportConfig {
            clipboard_retry_delay: 500,
            clipboard_retry_max_delay_ms: 100,
            ..ExportConfig::default()
        };
        assert!(matches!(config.validate(), Err(ExportError::Config(_))));
    }
}
