//! # 发布模块（publish）
//!
//! ## 设计思路
//!
//! 合成产物只有拿到公开地址后才能被签名引用。
//! 存储后端抽象为 [`ObjectStore`]，默认实现为 Cloudinary 无签名上传；
//! [`Publisher`] 只负责调用后端并包装结果，不缓存、不重试。
//!
//! ```text
//! CompositedAsset
//!    ↓
//! publisher.rs（计时 + 包装）
//!    ↓
//! ObjectStore::upload（cloudinary.rs / 测试替身）
//!    ↓
//! PublishedAsset { url }
//! ```

mod cloudinary;
mod config;
mod publisher;
mod store;

pub use cloudinary::CloudinaryStore;
pub use config::ObjectStoreConfig;
pub use publisher::Publisher;
pub use store::ObjectStore;
