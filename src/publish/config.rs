//! # 对象存储配置

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

const DEFAULT_ENDPOINT: &str = "https://api.cloudinary.com";

/// 对象存储（无签名上传）配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    /// 服务根地址，上传地址为 `{endpoint}/v1_1/{cloud_name}/image/upload`。
    pub endpoint: String,
    pub cloud_name: String,
    /// 无签名上传预设名。
    pub upload_preset: String,
    /// 单次上传总超时（秒）。
    pub upload_timeout: u64,
    /// 建立连接超时（秒）。
    pub connect_timeout: u64,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            cloud_name: "da2gi6rwv".to_string(),
            upload_preset: "MedLead Signature Generator".to_string(),
            upload_timeout: 60,
            connect_timeout: 10,
        }
    }
}

impl ObjectStoreConfig {
    pub fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.endpoint.trim_end_matches('/'),
            self.cloud_name
        )
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        let endpoint = self.endpoint.to_ascii_lowercase();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ExportError::Config(format!(
                "对象存储地址必须是 http/https：{}",
                self.endpoint
            )));
        }
        if self.cloud_name.trim().is_empty() {
            return Err(ExportError::Config("cloud_name 不能为空".to_string()));
        }
        if self.upload_preset.trim().is_empty() {
            return Err(ExportError::Config("upload_preset 不能为空".to_string()));
        }
        if !(1..=600).contains(&self.upload_timeout) {
            return Err(ExportError::Config("upload_timeout 必须在 1~600 秒之间".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(ExportError::Config("connect_timeout 必须在 1~120 秒之间".to_string()));
        }
        Ok(())
    }
}
