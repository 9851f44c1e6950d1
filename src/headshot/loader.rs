//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（Data URL / 本地文件 / 远程地址）的原始字节加载，
//! 并在“尽可能早”的阶段执行输入校验，尽快失败。
//! 所有失败都归入 `ExportError::ImageLoad`：对调用方而言，
//! 无论是地址不可达、超时还是内容不是图片，都需要换一个来源重新开始。
//!
//! ## 实现思路
//!
//! - Base64：格式解析 + 解码前体积估算 + 解码后签名校验。
//! - 文件：存在性 + metadata 体积限制 + 读取 + 签名校验，在阻塞线程中执行。
//! - URL：协议校验 + 状态码 + 内容类型 + 体积校验 + 流式下载 + 签名探测。

use std::path::Path;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;

use super::{HeadshotConfig, PhotoSource, SourceImage};
use crate::error::ExportError;

const STREAM_SIGNATURE_PROBE_BYTES: usize = 4096;
const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

/// 头像源图加载器。
///
/// 持有复用型 HTTP 客户端，减少每次导出的初始化开销。
pub struct SourceLoader {
    config: HeadshotConfig,
    http_client: reqwest::Client,
}

impl SourceLoader {
    pub fn new(config: HeadshotConfig) -> Result<Self, ExportError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .build()
            .map_err(|e| ExportError::Config(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self { config, http_client })
    }

    /// 按来源加载原始字节。
    pub async fn load(&self, source: &PhotoSource) -> Result<SourceImage, ExportError> {
        match source {
            PhotoSource::Base64(data) => self.load_from_base64(data),
            PhotoSource::FilePath(path) => {
                let config = self.config.clone();
                let path = path.clone();
                tokio::task::spawn_blocking(move || read_file_source(&config, &path))
                    .await
                    .map_err(|e| ExportError::ImageLoad(format!("文件读取线程执行失败：{}", e)))?
            }
            PhotoSource::Url(url) => self.load_from_url(url).await,
        }
    }

    /// 从 Base64 / Data URL 加载图片原始字节。
    pub fn load_from_base64(&self, data: &str) -> Result<SourceImage, ExportError> {
        log::info!("📝 开始处理 base64 图片");

        let bytes = Self::parse_base64_with_limit(data, self.config.max_source_bytes)?;
        if bytes.len() as u64 > self.config.max_source_bytes {
            return Err(ExportError::ImageLoad(format!(
                "Base64 解码后体积过大：{}（限制：{}）",
                format_mb(bytes.len() as u64),
                format_mb(self.config.max_source_bytes)
            )));
        }
        Self::validate_image_signature(&bytes)?;

        Ok(SourceImage::from_bytes(bytes, "base64"))
    }

    /// 从远程地址下载图片原始字节。
    ///
    /// 使用流式读取，避免一次性读入导致内存峰值过高。
    pub async fn load_from_url(&self, url: &str) -> Result<SourceImage, ExportError> {
        log::info!("🌐 开始下载图片 - URL: {}", redact_url_for_log(url));

        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ExportError::ImageLoad(format!("URL 格式错误：{}", e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ExportError::ImageLoad("仅支持 HTTP/HTTPS".to_string()));
        }

        let mut response = self
            .http_client
            .get(parsed)
            .header(reqwest::header::ACCEPT, "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::ImageLoad(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status_message(status.as_u16())
            )));
        }

        if let Some(ct) = response.headers().get(reqwest::header::CONTENT_TYPE) {
            if let Ok(ct_str) = ct.to_str() {
                if !is_image_content_type(ct_str) {
                    return Err(ExportError::ImageLoad(format!("不是图片类型：{}", ct_str)));
                }
            }
        }

        let total_len = response.content_length();
        if let Some(size) = total_len {
            if size > self.config.max_source_bytes {
                return Err(ExportError::ImageLoad(format!(
                    "文件过大：{}（限制：{}）",
                    format_mb(size),
                    format_mb(self.config.max_source_bytes)
                )));
            }
        }

        let initial_capacity = total_len
            .map(|len| len.min(self.config.max_source_bytes) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = Vec::with_capacity(initial_capacity);
        let mut signature_validated = false;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.map_reqwest_error(e, url))?
        {
            if (buffer.len() + chunk.len()) as u64 > self.config.max_source_bytes {
                return Err(ExportError::ImageLoad("下载后文件超过大小限制".to_string()));
            }
            buffer.extend_from_slice(&chunk);

            if !signature_validated {
                signature_validated =
                    Self::validate_stream_signature_probe(&buffer, STREAM_SIGNATURE_PROBE_BYTES)?;
            }
        }

        if !signature_validated {
            Self::validate_image_signature(&buffer)?;
        }

        log::debug!("✅ 下载完成 - {} bytes", buffer.len());
        Ok(SourceImage::from_bytes(Bytes::from(buffer), "url"))
    }

    /// 解析 Base64 输入（支持 Data URL / 纯 Base64），解码前按长度估算体积。
    pub(crate) fn parse_base64_with_limit(data: &str, max_bytes: u64) -> Result<Vec<u8>, ExportError> {
        let normalized = data.trim();

        let payload = if normalized.starts_with("data:") {
            if !normalized.starts_with("data:image/") {
                return Err(ExportError::ImageLoad("Data URL 不是图片类型".to_string()));
            }
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| ExportError::ImageLoad("缺少 base64 标记".to_string()))?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        let estimated_len = estimate_base64_decoded_upper_bound_len(payload);
        if estimated_len > max_bytes {
            return Err(ExportError::ImageLoad(format!(
                "Base64 预计解码体积过大：{}（限制：{}）",
                format_mb(estimated_len),
                format_mb(max_bytes)
            )));
        }

        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ExportError::ImageLoad(format!("Base64 解码失败：{}", e)))
    }

    /// 通过文件签名（magic bytes）校验输入是否为图片。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), ExportError> {
        if bytes.is_empty() {
            return Err(ExportError::ImageLoad("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| ExportError::ImageLoad("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(ExportError::ImageLoad(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }

    /// 流式下载阶段的签名探测：尽早识别并拒绝非图片内容。
    ///
    /// 返回值：
    /// - `Ok(true)`：已识别为图片
    /// - `Ok(false)`：当前字节不足以判断，继续下载
    /// - `Err(...)`：已识别为非图片，或达到探测上限仍无法识别
    fn validate_stream_signature_probe(bytes: &[u8], probe_limit: usize) -> Result<bool, ExportError> {
        if bytes.is_empty() {
            return Ok(false);
        }

        if let Some(kind) = infer::get(bytes) {
            if kind.matcher_type() != infer::MatcherType::Image {
                return Err(ExportError::ImageLoad(format!(
                    "下载内容不是图片类型：{}",
                    kind.mime_type()
                )));
            }
            return Ok(true);
        }

        if bytes.len() >= probe_limit {
            return Err(ExportError::ImageLoad(format!(
                "下载前 {} 字节内无法识别图片类型",
                probe_limit
            )));
        }

        Ok(false)
    }

    /// 统一映射 reqwest 错误；超时等价于加载失败。
    fn map_reqwest_error(&self, e: reqwest::Error, url: &str) -> ExportError {
        let err_msg = e.to_string().replace(url, &redact_url_for_log(url));

        if e.is_timeout() {
            ExportError::ImageLoad(format!("下载超时（{}秒）", self.config.download_timeout))
        } else if e.is_connect() {
            ExportError::ImageLoad(format!("无法连接：{}", err_msg))
        } else {
            ExportError::ImageLoad(format!("请求失败：{}", err_msg))
        }
    }
}

/// 从本地路径加载图片原始字节。阻塞调用，由 [`SourceLoader::load`] 放到阻塞线程中执行。
fn read_file_source(config: &HeadshotConfig, path: &Path) -> Result<SourceImage, ExportError> {
    log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

    if !path.exists() {
        return Err(ExportError::ImageLoad(format!("文件不存在：{}", path.display())));
    }

    let metadata =
        std::fs::metadata(path).map_err(|e| ExportError::ImageLoad(format!("无法读取文件信息：{}", e)))?;
    if metadata.len() > config.max_source_bytes {
        return Err(ExportError::ImageLoad(format!(
            "文件过大：{}（限制：{}）",
            format_mb(metadata.len()),
            format_mb(config.max_source_bytes)
        )));
    }

    let bytes = std::fs::read(path).map_err(|e| ExportError::ImageLoad(format!("无法读取图片文件：{}", e)))?;
    SourceLoader::validate_image_signature(&bytes)?;

    Ok(SourceImage::from_bytes(bytes, "file"))
}

fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> u64 {
    let len = base64_data.trim().len() as u64;
    len.saturating_add(3) / 4 * 3
}

fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

pub(crate) fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

/// 去掉查询串与片段后再写入日志，避免泄露签名参数。
pub(crate) fn redact_url_for_log(url: &str) -> String {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return "<invalid-url>".to_string();
    };

    let host = parsed.host_str().unwrap_or("<unknown-host>");
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

    format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
}

/// 常见 HTTP 状态码本地化文案。
fn status_message(code: u16) -> &'static str {
    match code {
        404 => "未找到",
        403 => "访问被拒绝",
        500..=599 => "服务器错误",
        _ => "请求失败",
    }
}
