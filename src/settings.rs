//! # 应用设置
//!
//! 设置文件是一份 pretty JSON，按职责分为四段：
//!
//! | 段 | 类型 | 内容 |
//! |----|------|------|
//! | `headshot` | [`HeadshotConfig`] | 源图体积、像素上限、下载超时 |
//! | `object_store` | [`ObjectStoreConfig`] | 上传地址、cloud name、上传预设、超时 |
//! | `export` | [`ExportConfig`] | 剪贴板重试次数、退避与预算 |
//! | `brand` | [`BrandConfig`] | 品牌标识地址与替代文本 |
//!
//! 文件不存在时使用默认值；缺失的字段同样回落到默认值。
//! 对象存储相关的三项可以再被环境变量覆盖，便于在不同环境间切换上传目标。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::export::ExportConfig;
use crate::headshot::HeadshotConfig;
use crate::publish::ObjectStoreConfig;
use crate::signature::BrandConfig;

pub const ENV_CLOUD_NAME: &str = "SIGNATURE_CLOUD_NAME";
pub const ENV_UPLOAD_PRESET: &str = "SIGNATURE_UPLOAD_PRESET";
pub const ENV_UPLOAD_ENDPOINT: &str = "SIGNATURE_UPLOAD_ENDPOINT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub headshot: HeadshotConfig,
    pub object_store: ObjectStoreConfig,
    pub export: ExportConfig,
    pub brand: BrandConfig,
}

impl AppSettings {
    /// 读取设置文件并应用环境变量覆盖。
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let mut settings = Self::load_file(path)?;
        settings.apply_overrides_from(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// 仅读取设置文件，不应用环境变量。
    pub fn load_file(path: &Path) -> Result<Self, ExportError> {
        if !path.exists() {
            log::info!("⚙️ 设置文件不存在，使用默认设置: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ExportError::Config(format!("读取设置文件失败 {}: {}", path.display(), e)))?;
        let settings = serde_json::from_str::<Self>(&content)
            .map_err(|e| ExportError::Config(format!("解析设置文件失败: {}", e)))?;

        log::info!("⚙️ 已加载设置文件: {}", path.display());
        Ok(settings)
    }

    /// 用查找函数覆盖对象存储配置，空值忽略。
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(cloud_name) = non_empty(ENV_CLOUD_NAME) {
            log::debug!("⚙️ {} 覆盖 cloud_name", ENV_CLOUD_NAME);
            self.object_store.cloud_name = cloud_name;
        }
        if let Some(preset) = non_empty(ENV_UPLOAD_PRESET) {
            log::debug!("⚙️ {} 覆盖 upload_preset", ENV_UPLOAD_PRESET);
            self.object_store.upload_preset = preset;
        }
        if let Some(endpoint) = non_empty(ENV_UPLOAD_ENDPOINT) {
            log::debug!("⚙️ {} 覆盖 endpoint", ENV_UPLOAD_ENDPOINT);
            self.object_store.endpoint = endpoint;
        }
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        self.headshot.validate()?;
        self.object_store.validate()?;
        self.export.validate()?;
        self.brand.validate()
    }
}
