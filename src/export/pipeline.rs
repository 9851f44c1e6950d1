//! # 导出编排
//!
//! ## 设计思路
//!
//! 一次导出严格按
//! `加载 → 解码 → 裁剪 → 几何 → 绘制 → 编码 → 发布 → 组装 → 投递` 顺序执行，
//! 前一步完成前后一步不会开始。任一阶段失败立即返回，剪贴板上不会出现半成品。
//!
//! ## 实现思路
//!
//! - 入口先占用 [`ExportGuard`]，同一流水线上的并发导出得到 `Busy`。
//! - 每个阶段单独公开：发布失败可用同一份 `CompositedAsset` 重新发布，
//!   投递失败可用同一份 `SignatureBundle` 重新投递，无需从头再来。
//! - 流水线不保存任何跨导出的状态，资料与照片每次显式传入。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, Local};

use super::{ClipboardSink, ExportGuard, ExportSink};
use crate::error::ExportError;
use crate::headshot::{
    CompositedAsset, Compositor, FramingParameters, PhotoSource, PublishedAsset, SourceImage, SourceLoader,
};
use crate::publish::{CloudinaryStore, ObjectStore, Publisher};
use crate::settings::AppSettings;
use crate::signature::{BrandConfig, HeadshotSource, ProfileFields, SignatureAssembler, SignatureBundle};

/// 一次成功导出的结果。
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub bundle: SignatureBundle,
    /// 未显示头像时为 `None`。
    pub published: Option<PublishedAsset>,
    pub exported_at: DateTime<Local>,
    pub total_ms: u128,
}

/// 导出流水线。
pub struct ExportPipeline {
    loader: SourceLoader,
    compositor: Compositor,
    publisher: Publisher,
    assembler: SignatureAssembler,
    sink: Arc<dyn ExportSink>,
    brand: BrandConfig,
    in_flight: Arc<AtomicBool>,
}

impl ExportPipeline {
    /// 使用自定义存储与终点构建（测试与替代后端使用）。
    pub fn new(
        settings: &AppSettings,
        store: Arc<dyn ObjectStore>,
        sink: Arc<dyn ExportSink>,
    ) -> Result<Self, ExportError> {
        settings.headshot.validate()?;
        settings.brand.validate()?;

        Ok(Self {
            loader: SourceLoader::new(settings.headshot.clone())?,
            compositor: Compositor::new(settings.headshot.clone()),
            publisher: Publisher::new(store),
            assembler: SignatureAssembler::new(settings.brand.alt_text.clone()),
            sink,
            brand: settings.brand.clone(),
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    /// 使用 Cloudinary 与系统剪贴板构建。
    pub fn from_settings(settings: &AppSettings) -> Result<Self, ExportError> {
        settings.validate()?;
        let store = Arc::new(CloudinaryStore::new(settings.object_store.clone())?);
        let sink = Arc::new(ClipboardSink::new(settings.export.clone()));
        Self::new(settings, store, sink)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// 决定本次导出要合成的头像来源，不显示头像时返回 `None`。
    ///
    /// 品牌标识作为头像时与上传照片走同一条合成链路。
    pub fn resolve_photo(&self, profile: &ProfileFields, photo: Option<&PhotoSource>) -> Option<PhotoSource> {
        if !profile.show_headshot {
            return None;
        }
        match profile.headshot_source {
            HeadshotSource::BrandMark => Some(PhotoSource::Url(self.brand.headshot_mark_url.clone())),
            HeadshotSource::Upload => photo.cloned().or_else(|| {
                let reference = profile.headshot_url.trim();
                (!reference.is_empty()).then(|| PhotoSource::infer(reference))
            }),
        }
    }

    pub async fn load(&self, photo: &PhotoSource) -> Result<SourceImage, ExportError> {
        self.loader.load(photo).await
    }

    pub async fn composite(
        &self,
        source: &SourceImage,
        params: &FramingParameters,
    ) -> Result<CompositedAsset, ExportError> {
        self.compositor.composite(source, params).await
    }

    pub async fn publish(&self, asset: &CompositedAsset) -> Result<PublishedAsset, ExportError> {
        self.publisher.publish(asset).await
    }

    pub fn assemble(&self, profile: &ProfileFields, headshot_url: Option<&str>) -> SignatureBundle {
        self.assembler
            .assemble(profile, self.brand.mark_url(profile.brand_mark), headshot_url)
    }

    /// 预览用组装：头像直接引用源图，由 CSS 完成取景，不经过合成与发布。
    pub fn assemble_preview(&self, profile: &ProfileFields, photo_url: Option<&str>) -> SignatureBundle {
        self.assembler
            .assemble_preview(profile, self.brand.mark_url(profile.brand_mark), photo_url)
    }

    pub async fn deliver(&self, bundle: &SignatureBundle) -> Result<(), ExportError> {
        self.sink.deliver(bundle).await
    }

    /// 完整导出。
    pub async fn export(
        &self,
        profile: &ProfileFields,
        photo: Option<&PhotoSource>,
    ) -> Result<ExportReport, ExportError> {
        let _guard = ExportGuard::try_acquire(&self.in_flight)?;
        let started = Instant::now();

        let published = match self.resolve_photo(profile, photo) {
            Some(source) => Some(self.produce_headshot(&source, &profile.framing).await?),
            None => {
                log::debug!("⏭️ 本次导出不包含头像");
                None
            }
        };

        let assemble_started = Instant::now();
        let bundle = self.assemble(profile, published.as_ref().map(|p| p.url.as_str()));
        let assemble_ms = assemble_started.elapsed().as_millis();

        let deliver_started = Instant::now();
        self.deliver(&bundle).await?;
        let deliver_ms = deliver_started.elapsed().as_millis();

        let total_ms = started.elapsed().as_millis();
        log::info!(
            "✅ 签名导出完成 - 头像: {} 终点: {} assemble={}ms deliver={}ms total={}ms",
            published.is_some(),
            self.sink.name(),
            assemble_ms,
            deliver_ms,
            total_ms
        );

        Ok(ExportReport {
            bundle,
            published,
            exported_at: Local::now(),
            total_ms,
        })
    }

    async fn produce_headshot(
        &self,
        source: &PhotoSource,
        params: &FramingParameters,
    ) -> Result<PublishedAsset, ExportError> {
        let load_started = Instant::now();
        let image = self.load(source).await?;
        let load_ms = load_started.elapsed().as_millis();

        let composite_started = Instant::now();
        let asset = self.composite(&image, params).await?;
        let composite_ms = composite_started.elapsed().as_millis();

        let publish_started = Instant::now();
        let published = self.publish(&asset).await?;
        let publish_ms = publish_started.elapsed().as_millis();

        log::info!(
            "🧩 头像阶段完成 - 来源: {} load={}ms composite={}ms publish={}ms",
            source.hint(),
            load_ms,
            composite_ms,
            publish_ms
        );
        Ok(published)
    }
}
