//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 导出流水线的每一个阶段（加载 → 合成 → 编码 → 发布 → 组装 → 投递）
//! 都把失败上抛给调用方，由调用方决定提示文案与是否重试。
//! 因此所有阶段共用一个 `ExportError` 枚举，而不是各自返回字符串。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - `code()` / `stage()` 提供稳定的机器可读字段，便于日志检索与上层分支处理。
//! - `is_retryable()` 表达重试语义：发布与投递可以用已有产物直接重试，
//!   加载与编码失败必须换一个来源重新开始。

/// 导出流水线统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// 源图片无法读取或解码（数据损坏、地址不可达、非图片内容）
    #[error("图片加载失败：{0}")]
    ImageLoad(String),

    /// 绘制表面无法序列化为位图
    #[error("图片编码失败：{0}")]
    Encode(String),

    /// 对象存储拒绝或未能完成上传
    #[error("图片发布失败：{0}")]
    Publish(String),

    /// 剪贴板等导出目标拒绝了最终签名
    #[error("签名投递失败：{0}")]
    Delivery(String),

    /// 取景参数越界（例如容器尺寸为 0）
    #[error("取景参数无效：{0}")]
    InvalidFraming(String),

    /// 已有导出操作正在进行
    #[error("已有导出任务正在进行，请稍后再试")]
    Busy,

    /// 配置缺失或取值非法
    #[error("配置错误：{0}")]
    Config(String),
}

impl ExportError {
    /// 稳定错误码，供日志聚合与调用方匹配。
    pub fn code(&self) -> &'static str {
        match self {
            Self::ImageLoad(_) => "E_IMAGE_LOAD",
            Self::Encode(_) => "E_ENCODE",
            Self::Publish(_) => "E_PUBLISH",
            Self::Delivery(_) => "E_DELIVERY",
            Self::InvalidFraming(_) => "E_INVALID_FRAMING",
            Self::Busy => "E_BUSY",
            Self::Config(_) => "E_CONFIG",
        }
    }

    /// 出错所在的流水线阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ImageLoad(_) => "load",
            Self::Encode(_) => "encode",
            Self::Publish(_) => "publish",
            Self::Delivery(_) => "deliver",
            Self::InvalidFraming(_) => "framing",
            Self::Busy => "guard",
            Self::Config(_) => "config",
        }
    }

    /// 是否可以在不重新合成的前提下直接重试。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Publish(_) | Self::Delivery(_) | Self::Busy)
    }
}

#[cfg(test)]
mod tests {
    use super::ExportError;

    #[test]
    fn codes_and_stages_are_stable() {
        let err = ExportError::Publish("quota".to_string());
        assert_eq!(err.code(), "E_PUBLISH");
        assert_eq!(err.stage(), "publish");
        assert!(err.to_string().contains("quota"));
    }

    #[test]
    fn only_publish_delivery_and_busy_are_retryable() {
        assert!(ExportError::Publish(String::new()).is_retryable());
        assert!(ExportError::Delivery(String::new()).is_retryable());
        assert!(ExportError::Busy.is_retryable());
        assert!(!ExportError::ImageLoad(String::new()).is_retryable());
        assert!(!ExportError::Encode(String::new()).is_retryable());
        assert!(!ExportError::InvalidFraming(String::new()).is_retryable());
    }
}
