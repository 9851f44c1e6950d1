//! # 头像处理模块（headshot）
//!
//! ## 设计思路
//!
//! 把“取景参数 → 裁剪形状 → 实时预览 → 来源加载 → 离线合成”按职责拆分，
//! 预览与合成共享同一份几何推导，保证所见即所发。
//!
//! - `framing`：取景参数与坐标映射（纯函数）
//! - `clip`：裁剪形状描述，可转为 CSS 圆角或 tiny-skia 蒙版
//! - `preview`：基于 CSS 的实时预览样式
//! - `loader`：Data URL / 文件 / URL 加载与安全校验
//! - `compositor`：解码 + 裁剪 + 绘制 + PNG 编码
//! - `config/source`：配置与中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! PhotoSource
//!    ↓
//! loader.rs（来源加载 + 体积/签名校验）→ SourceImage
//!    ↓
//! compositor.rs
//!    ├─ framing.rs（map_geometry：绘制矩形）
//!    └─ clip.rs（clip_region：蒙版）
//!    ↓
//! CompositedAsset（size × size PNG）
//! ```
//!
//! 预览侧只走 `framing.rs + clip.rs → preview.rs`，不涉及像素。

mod clip;
mod compositor;
mod config;
mod framing;
mod loader;
mod preview;
mod source;

pub use clip::{ClipRegion, ROUNDED_CORNER_RADIUS, clip_region, css_border_radius};
pub use compositor::Compositor;
pub use config::HeadshotConfig;
pub use framing::{
    DEFAULT_CONTAINER_SIZE, DrawGeometry, FramingParameters, HeadshotShape, MAX_CONTAINER_SIZE, MAX_POSITION,
    MAX_SCALE_PERCENT, MIN_POSITION, MIN_SCALE_PERCENT, POSITION_CENTER, POSITION_STEP_PX, map_geometry,
};
pub use loader::SourceLoader;
pub use preview::PreviewStyle;
pub use source::{CompositedAsset, DecodedImage, PhotoSource, PublishedAsset, SourceImage};

pub(crate) use loader::redact_url_for_log;
