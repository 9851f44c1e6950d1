//! # 品牌标识配置

use serde::{Deserialize, Serialize};

use super::BrandMark;
use crate::error::ExportError;

/// 品牌标识的公开地址与替代文本。
///
/// 签名会被粘贴到收件人的邮件客户端中，地址必须是可公开访问的绝对地址。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
    pub primary_mark_url: String,
    pub secondary_mark_url: String,
    /// 选择“品牌标识作为头像”时的源图地址，与上传照片走同一条合成链路。
    pub headshot_mark_url: String,
    pub alt_text: String,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            primary_mark_url: "https://www.medleadconvert.com/assets/logo1.png".to_string(),
            secondary_mark_url: "https://www.medleadconvert.com/assets/logo2.png".to_string(),
            headshot_mark_url:
                "https://res.cloudinary.com/da2gi6rwv/image/upload/v1764966256/lcqxq8smdn39ds6mjvwj.png"
                    .to_string(),
            alt_text: "MedLead Convert".to_string(),
        }
    }
}

impl BrandConfig {
    /// 选择器对应的标识地址，`None` 选择器不渲染标识行内容。
    pub fn mark_url(&self, mark: BrandMark) -> Option<&str> {
        match mark {
            BrandMark::Primary => Some(self.primary_mark_url.as_str()),
            BrandMark::Secondary => Some(self.secondary_mark_url.as_str()),
            BrandMark::None => None,
        }
        .filter(|url| !url.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        for (field, url) in [
            ("primary_mark_url", &self.primary_mark_url),
            ("secondary_mark_url", &self.secondary_mark_url),
            ("headshot_mark_url", &self.headshot_mark_url),
        ] {
            let lower = url.to_ascii_lowercase();
            if !lower.starts_with("https://") && !lower.starts_with("http://") {
                return Err(ExportError::Config(format!(
                    "{} 必须是 http/https 绝对地址：{}",
                    field, url
                )));
            }
        }
        Ok(())
    }
}
