//! # 对象存储抽象
//!
//! 发布者只依赖 `ObjectStore`，测试与替代后端实现同一个 trait 即可接入。

use bytes::Bytes;

use crate::error::ExportError;

/// 接收一段不可变字节并返回其公开 HTTPS 地址的存储后端。
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// 上传字节，成功时返回绝对地址。
    ///
    /// 每次调用都视为一次新的上传，后端不做去重。
    async fn upload(&self, body: Bytes, file_name: &str, mime_type: &str) -> Result<String, ExportError>;

    /// 后端名称（用于日志）。
    fn name(&self) -> &'static str;
}
