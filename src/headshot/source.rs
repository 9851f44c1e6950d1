//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `PhotoSource` 表示头像来源语义（本地未发布图片 / 本地文件 / 远程地址）
//! - `SourceImage` 表示已加载但未解码的字节
//! - `DecodedImage` 表示已解码、带固有尺寸的 RGBA 像素
//! - `CompositedAsset` 表示烘焙了裁剪形状的最终 PNG
//! - `PublishedAsset` 表示已经拿到公开地址的产物

use std::path::PathBuf;

use bytes::Bytes;
use image::RgbaImage;

use super::HeadshotShape;

/// 头像输入来源。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    /// Data URL 或纯 Base64（表单中选择、尚未发布的本地图片）。
    Base64(String),
    /// 本地文件路径。
    FilePath(PathBuf),
    /// 远程 HTTP/HTTPS 地址（已发布的头像或品牌标识）。
    Url(String),
}

impl PhotoSource {
    /// 根据字符串形态推断来源类型。
    ///
    /// `data:` 前缀视为 Base64，`http(s)://` 视为远程地址，其余视为本地路径。
    pub fn infer(value: &str) -> Self {
        let trimmed = value.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("data:") {
            Self::Base64(trimmed.to_string())
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::FilePath(PathBuf::from(trimmed))
        }
    }

    /// 来源提示（用于日志与诊断）。
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Base64(_) => "base64",
            Self::FilePath(_) => "file",
            Self::Url(_) => "url",
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// 原始图片字节。
    pub bytes: Bytes,
    /// 来源提示（用于日志与诊断）。
    pub source_hint: &'static str,
}

impl SourceImage {
    pub fn from_bytes(bytes: impl Into<Bytes>, source_hint: &'static str) -> Self {
        Self {
            bytes: bytes.into(),
            source_hint,
        }
    }
}

/// 解码阶段输出：固有尺寸 + 直通 alpha 的 RGBA 像素。
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
}

/// 合成阶段输出：`size × size` 的 PNG，裁剪形状已烘焙，形状外为透明。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositedAsset {
    pub size: u32,
    pub shape: HeadshotShape,
    /// 无损、保留 alpha 的 PNG 字节。
    pub png: Bytes,
}

impl CompositedAsset {
    pub const FILE_NAME: &'static str = "headshot.png";
    pub const MIME_TYPE: &'static str = "image/png";
}

/// 发布阶段输出：合成产物与其公开地址（不可变）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedAsset {
    pub asset: CompositedAsset,
    pub url: String,
}
