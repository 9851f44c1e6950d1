//! # 头像链路配置
//!
//! 加载与解码阶段的可调策略集中在 `HeadshotConfig`，
//! 保证运行时行为可观测、可调整、可测试。

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// 头像加载与解码配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadshotConfig {
    /// 读取原始字节时允许的最大体积（字节）。
    pub max_source_bytes: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 远程图片下载总超时（秒）。
    pub download_timeout: u64,
    /// 建立连接超时（秒）。
    pub connect_timeout: u64,
}

impl Default for HeadshotConfig {
    fn default() -> Self {
        Self {
            max_source_bytes: 20 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            download_timeout: 30,
            connect_timeout: 8,
        }
    }
}

impl HeadshotConfig {
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.max_source_bytes == 0 {
            return Err(ExportError::Config("max_source_bytes 必须大于 0".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(ExportError::Config("max_decoded_pixels 必须大于 0".to_string()));
        }
        if !(1..=300).contains(&self.download_timeout) {
            return Err(ExportError::Config("download_timeout 必须在 1~300 秒之间".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(ExportError::Config("connect_timeout 必须在 1~120 秒之间".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(HeadshotConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = HeadshotConfig {
            download_timeout: 0,
            ..HeadshotConfig::default()
        };
        assert!(matches!(config.validate(), Err(ExportError::Config(_))));
    }
}
