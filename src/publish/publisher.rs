//! # 发布者
//!
//! 把合成产物交给对象存储并包装为 [`PublishedAsset`]。
//! 不做缓存：同一产物发布两次就是两次上传，得到两个地址。

use std::sync::Arc;
use std::time::Instant;

use super::ObjectStore;
use crate::error::ExportError;
use crate::headshot::{CompositedAsset, PublishedAsset, redact_url_for_log};

#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn ObjectStore>,
}

impl Publisher {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn publish(&self, asset: &CompositedAsset) -> Result<PublishedAsset, ExportError> {
        let started = Instant::now();
        let url = self
            .store
            .upload(asset.png.clone(), CompositedAsset::FILE_NAME, CompositedAsset::MIME_TYPE)
            .await?;

        log::info!(
            "📤 头像已发布 - 后端: {} 地址: {} publish={}ms",
            self.store.name(),
            redact_url_for_log(&url),
            started.elapsed().as_millis()
        );

        Ok(PublishedAsset {
            asset: asset.clone(),
            url,
        })
    }
}
