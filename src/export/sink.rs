//! # 导出终点
//!
//! ## 设计思路
//!
//! 把组装好的签名以“HTML + 纯文本”双格式放到系统剪贴板：
//! 富文本目标（邮件客户端签名设置）粘贴 HTML，纯文本目标粘贴回退文本。
//! 终点抽象为 [`ExportSink`]，测试与其他终点实现同一个 trait 即可接入。
//!
//! ## 实现思路
//!
//! 剪贴板访问是同步阻塞调用，放到 `spawn_blocking` 中执行，
//! 失败按 Busy / Transient / Fatal 分类后进入退避重试。
//!
//! Linux（X11 / Wayland）上剪贴板内容由持有者进程按需提供，进程退出内容即消失。
//! 因此在 Linux 上写入会阻塞到剪贴板管理器或其他程序接管内容为止，
//! `deliver` 返回成功时内容已经不依赖本进程存活。

use std::time::Instant;

use super::ExportConfig;
use super::retry::{DeliveryFailure, run_with_retry};
use crate::error::ExportError;
use crate::signature::SignatureBundle;

/// 接收最终签名的终点。
#[async_trait::async_trait]
pub trait ExportSink: Send + Sync {
    /// 投递签名；失败时调用方可用同一份 bundle 重新投递。
    async fn deliver(&self, bundle: &SignatureBundle) -> Result<(), ExportError>;

    fn name(&self) -> &'static str;
}

/// 系统剪贴板终点。
#[derive(Debug, Clone, Default)]
pub struct ClipboardSink {
    config: ExportConfig,
}

impl ClipboardSink {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    fn write_once(bundle: &SignatureBundle) -> Result<(), DeliveryFailure> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| DeliveryFailure::busy(format!("无法访问剪贴板：{}", e)))?;

        Self::set_signature(&mut clipboard, bundle).map_err(classify_clipboard_error)
    }

    #[cfg(target_os = "linux")]
    fn set_signature(clipboard: &mut arboard::Clipboard, bundle: &SignatureBundle) -> Result<(), arboard::Error> {
        use arboard::SetExtLinux;

        log::info!("⏳ 等待剪贴板管理器或其他程序接管签名内容");
        clipboard
            .set()
            .wait()
            .html(bundle.html.as_str(), Some(bundle.plain_text.as_str()))
    }

    #[cfg(not(target_os = "linux"))]
    fn set_signature(clipboard: &mut arboard::Clipboard, bundle: &SignatureBundle) -> Result<(), arboard::Error> {
        clipboard.set_html(bundle.html.as_str(), Some(bundle.plain_text.as_str()))
    }
}

fn classify_clipboard_error(err: arboard::Error) -> DeliveryFailure {
    match err {
        arboard::Error::ClipboardOccupied => DeliveryFailure::busy(format!("剪贴板被占用：{}", err)),
        arboard::Error::ClipboardNotSupported | arboard::Error::ConversionFailure => {
            DeliveryFailure::fatal(format!("剪贴板不支持该内容：{}", err))
        }
        other => DeliveryFailure::transient(format!("写入剪贴板失败：{}", other)),
    }
}

#[async_trait::async_trait]
impl ExportSink for ClipboardSink {
    async fn deliver(&self, bundle: &SignatureBundle) -> Result<(), ExportError> {
        let started = Instant::now();
        let config = self.config.clone();
        let bundle = bundle.clone();
        let html_len = bundle.html.len();

        let attempts = tokio::task::spawn_blocking(move || {
            run_with_retry(&config, || Self::write_once(&bundle))
        })
        .await
        .map_err(|e| ExportError::Delivery(format!("线程执行失败：{}", e)))?
        .map_err(|failure| ExportError::Delivery(failure.message))?;

        log::info!(
            "📋 签名已写入剪贴板 - html={} bytes 尝试 {} 次 deliver={}ms",
            html_len,
            attempts,
            started.elapsed().as_millis()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "clipboard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::retry::DeliveryFailureKind;

    #[test]
    fn occupied_clipboard_is_retryable_busy() {
        let failure = classify_clipboard_error(arboard::Error::ClipboardOccupied);
        assert_eq!(failure.kind, DeliveryFailureKind::Busy);
    }

    #[test]
    fn unsupported_clipboard_is_fatal() {
        let failure = classify_clipboard_error(arboard::Error::ClipboardNotSupported);
        assert_eq!(failure.kind, DeliveryFailureKind::Fatal);
    }

    fn bundle() -> SignatureBundle {
        SignatureBundle {
            html: "<b>Jane Roe</b>".to_string(),
            plain_text: "Jane Roe".to_string(),
        }
    }

    #[cfg(not(target_os = "linux"))]
    #[tokio::test]
    #[ignore = "requires system clipboard access"]
    async fn clipboard_sink_round_trips_plain_text() {
        let sink = ClipboardSink::default();

        sink.deliver(&bundle()).await.expect("clipboard write failed");

        let mut clipboard = arboard::Clipboard::new().expect("clipboard unavailable");
        assert_eq!(clipboard.get_text().expect("read failed"), "Jane Roe");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "requires system clipboard access"]
    async fn linux_delivery_holds_content_until_replaced() {
        let sink = ClipboardSink::default();
        let delivery = tokio::spawn(async move { sink.deliver(&bundle()).await });

        // 写入方仍在提供内容时，另一个剪贴板实例能读到签名
        let mut reader = None;
        for _ in 0..50 {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            let mut clipboard = arboard::Clipboard::new().expect("clipboard unavailable");
            if clipboard.get_text().ok().as_deref() == Some("Jane Roe") {
                reader = Some(clipboard);
                break;
            }
        }
        let mut reader = reader.expect("signature never reached the clipboard");

        // 其他程序接管剪贴板后写入方才返回
        reader.set_text("replaced").expect("replace failed");
        delivery
            .await
            .expect("delivery task panicked")
            .expect("clipboard write failed");
    }
}
