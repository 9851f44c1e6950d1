//! # Cloudinary 无签名上传
//!
//! ## 实现思路
//!
//! - 以 multipart 表单 POST 到 `{endpoint}/v1_1/{cloud_name}/image/upload`，
//!   字段 `file`（`headshot.png`）与 `upload_preset`。
//! - 2xx：读取 JSON 中的 `secure_url`，缺失或不是 http/https 绝对地址即失败。
//! - 非 2xx：优先使用响应中的 `error.message`，否则统一为 `Upload failed`。
//! - 超时、连接失败都归入 `ExportError::Publish`，由调用方决定是否重试。

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{ObjectStore, ObjectStoreConfig};
use crate::error::ExportError;
use crate::headshot::redact_url_for_log;

const GENERIC_UPLOAD_FAILURE: &str = "Upload failed";

#[derive(Debug, Default, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// Cloudinary 对象存储客户端。
pub struct CloudinaryStore {
    config: ObjectStoreConfig,
    http_client: reqwest::Client,
}

impl CloudinaryStore {
    pub fn new(config: ObjectStoreConfig) -> Result<Self, ExportError> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upload_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .build()
            .map_err(|e| ExportError::Config(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self { config, http_client })
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> ExportError {
        if e.is_timeout() {
            ExportError::Publish(format!("上传超时（{}秒）", self.config.upload_timeout))
        } else if e.is_connect() {
            ExportError::Publish(format!("无法连接对象存储：{}", e))
        } else {
            ExportError::Publish(format!("上传请求失败：{}", e))
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for CloudinaryStore {
    async fn upload(&self, body: Bytes, file_name: &str, mime_type: &str) -> Result<String, ExportError> {
        let started = Instant::now();
        let url = self.config.upload_url();
        let size = body.len();

        let part = Part::bytes(body.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| ExportError::Publish(format!("无效的 MIME 类型 {}：{}", mime_type, e)))?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.config.upload_preset.clone());

        log::info!("☁️ 开始上传 {} ({} bytes) 到 {}", file_name, size, redact_url_for_log(&url));

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_reqwest_error(e))?;
        // 错误响应不一定是 JSON，解析失败时按空响应处理
        let parsed: UploadResponse = serde_json::from_str(&text).unwrap_or_default();

        if !status.is_success() {
            let message = parsed
                .error
                .and_then(|err| err.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_UPLOAD_FAILURE.to_string());
            log::warn!("⚠️ 上传失败 - HTTP {}：{}", status.as_u16(), message);
            return Err(ExportError::Publish(message));
        }

        let secure_url = parsed
            .secure_url
            .ok_or_else(|| ExportError::Publish("上传响应缺少 secure_url".to_string()))?;
        validate_public_url(&secure_url)?;

        log::info!(
            "✅ 上传完成 - {} total={}ms",
            redact_url_for_log(&secure_url),
            started.elapsed().as_millis()
        );
        Ok(secure_url)
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}

/// 公开地址必须是 http/https 绝对地址。
pub(crate) fn validate_public_url(url: &str) -> Result<(), ExportError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ExportError::Publish(format!("返回的地址不是绝对地址：{}（{}）", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ExportError::Publish(format!("返回的地址协议不受支持：{}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// 读取完整请求后返回固定响应，线程结束时交还请求原文。
    fn serve_once(status_line: &'static str, body: &'static str) -> (u16, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind test listener");
        let port = listener.local_addr().expect("failed to read local addr").port();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("failed to accept");
            let request = read_request(&mut stream);
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
            request
        });

        (port, handle)
    }

    fn read_request(stream: &mut std::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// 读完请求后一直不响应，直到测试发出释放信号。
    fn serve_silently() -> (u16, mpsc::Sender<()>, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind test listener");
        let port = listener.local_addr().expect("failed to read local addr").port();
        let (release, released) = mpsc::channel();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("failed to accept");
            let _ = read_request(&mut stream);
            let _ = released.recv_timeout(Duration::from_secs(10));
        });

        (port, release, handle)
    }

    fn store_with_timeout(port: u16, upload_timeout: u64) -> CloudinaryStore {
        CloudinaryStore::new(ObjectStoreConfig {
            endpoint: format!("http://127.0.0.1:{port}"),
            cloud_name: "demo".to_string(),
            upload_preset: "signature preset".to_string(),
            upload_timeout,
            connect_timeout: 2,
        })
        .expect("store should build")
    }

    fn store_for(port: u16) -> CloudinaryStore {
        store_with_timeout(port, 5)
    }

    #[tokio::test]
    async fn upload_returns_secure_url_and_sends_expected_form() {
        let (port, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"secure_url":"https://res.cloudinary.com/demo/image/upload/v1/abc.png"}"#,
        );

        let url = store_for(port)
            .upload(Bytes::from_static(b"\x89PNG\r\n\x1a\nrest"), "headshot.png", "image/png")
            .await
            .expect("upload should succeed");
        let request = server.join().expect("server thread panicked");

        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/v1/abc.png");
        assert!(request.starts_with("POST /v1_1/demo/image/upload"));
        assert!(request.contains("name=\"file\"; filename=\"headshot.png\""));
        assert!(request.contains("name=\"upload_preset\""));
        assert!(request.contains("signature preset"));
    }

    #[tokio::test]
    async fn upload_surfaces_service_error_message() {
        let (port, server) = serve_once(
            "HTTP/1.1 400 Bad Request",
            r#"{"error":{"message":"Upload preset not found"}}"#,
        );

        let result = store_for(port)
            .upload(Bytes::from_static(b"png"), "headshot.png", "image/png")
            .await;
        server.join().expect("server thread panicked");

        match result {
            Err(ExportError::Publish(message)) => assert_eq!(message, "Upload preset not found"),
            other => panic!("expected publish error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upload_falls_back_to_generic_message() {
        let (port, server) = serve_once("HTTP/1.1 502 Bad Gateway", "<html>bad gateway</html>");

        let result = store_for(port)
            .upload(Bytes::from_static(b"png"), "headshot.png", "image/png")
            .await;
        server.join().expect("server thread panicked");

        match result {
            Err(ExportError::Publish(message)) => assert_eq!(message, GENERIC_UPLOAD_FAILURE),
            other => panic!("expected publish error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upload_rejects_missing_secure_url() {
        let (port, server) = serve_once("HTTP/1.1 200 OK", r#"{"public_id":"abc"}"#);

        let result = store_for(port)
            .upload(Bytes::from_static(b"png"), "headshot.png", "image/png")
            .await;
        server.join().expect("server thread panicked");

        assert!(matches!(result, Err(ExportError::Publish(_))));
    }

    #[tokio::test]
    async fn unresponsive_service_times_out_as_publish_error() {
        let (port, release, server) = serve_silently();

        let started = Instant::now();
        let result = store_with_timeout(port, 1)
            .upload(Bytes::from_static(b"png"), "headshot.png", "image/png")
            .await;
        let elapsed = started.elapsed();
        let _ = release.send(());
        server.join().expect("server thread panicked");

        match result {
            Err(ExportError::Publish(message)) => assert!(message.contains("超时"), "message: {message}"),
            other => panic!("expected publish timeout, got {other:?}"),
        }
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn public_url_must_be_absolute_http() {
        assert!(validate_public_url("https://cdn.example.com/a.png").is_ok());
        assert!(validate_public_url("/relative/a.png").is_err());
        assert!(validate_public_url("ftp://cdn.example.com/a.png").is_err());
    }
}
