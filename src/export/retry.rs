//! # 投递重试
//!
//! 系统剪贴板常被其他进程短暂占用，写入失败按类型区分：
//! - `Busy`：被占用，稍后重试
//! - `Transient`：偶发错误，稍后重试
//! - `Fatal`：平台不支持或内容无法转换，立即放弃
//!
//! 重试采用指数退避 + 抖动，并受总预算约束，超出预算即停止。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use super::ExportConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeliveryFailureKind {
    Busy,
    Transient,
    Fatal,
}

#[derive(Debug, Clone)]
pub(crate) struct DeliveryFailure {
    pub kind: DeliveryFailureKind,
    pub message: String,
}

impl DeliveryFailure {
    pub fn busy(message: impl Into<String>) -> Self {
        Self {
            kind: DeliveryFailureKind::Busy,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: DeliveryFailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: DeliveryFailureKind::Fatal,
            message: message.into(),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self.kind, DeliveryFailureKind::Busy | DeliveryFailureKind::Transient)
    }
}

static JITTER_STATE: AtomicU64 = AtomicU64::new(0);

fn seed_jitter_state() -> u64 {
    let time_seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let state = time_seed ^ ((std::process::id() as u64) << 32) ^ 0x9E37_79B9_7F4A_7C15;
    if state == 0 { 0xA5A5_5A5A_0123_4567 } else { state }
}

/// xorshift64，状态全局共享，多线程下用 CAS 推进。
fn next_jitter_u64() -> u64 {
    let mut current = JITTER_STATE.load(Ordering::Relaxed);
    loop {
        let mut next = if current == 0 { seed_jitter_state() } else { current };
        next ^= next << 13;
        next ^= next >> 7;
        next ^= next << 17;

        match JITTER_STATE.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(observed) => current = observed,
        }
    }
}

pub(crate) fn compute_backoff_delay_with_jitter(base_delay_ms: u64, attempt: u32, max_delay_ms: u64) -> u64 {
    let exp = base_delay_ms.saturating_mul(1_u64 << attempt.saturating_sub(1).min(8));
    let capped = exp.min(max_delay_ms.max(base_delay_ms));
    let jitter_bound = (capped / 3).max(1);
    let jitter = next_jitter_u64() % (jitter_bound + 1);
    capped.saturating_add(jitter)
}

pub(crate) fn would_exceed_retry_budget(elapsed_ms: u64, wait_ms: u64, budget_ms: u64) -> bool {
    elapsed_ms.saturating_add(wait_ms) > budget_ms
}

/// 在阻塞线程中执行写入 + 重试，返回最后一次失败。
pub(crate) fn run_with_retry<F>(config: &ExportConfig, mut attempt_write: F) -> Result<u32, DeliveryFailure>
where
    F: FnMut() -> Result<(), DeliveryFailure>,
{
    let retry_count = config.clipboard_retries.max(1);
    let started = Instant::now();
    let mut last_failure = None;

    for attempt in 1..=retry_count {
        if attempt > 1 {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let wait_ms = compute_backoff_delay_with_jitter(
                config.clipboard_retry_delay.max(1),
                attempt - 1,
                config.clipboard_retry_max_delay_ms,
            );

            if would_exceed_retry_budget(elapsed_ms, wait_ms, config.clipboard_retry_max_total_ms) {
                log::warn!(
                    "⏱️ 跳过第 {} 次重试：等待 {}ms 会超过预算 {}ms",
                    attempt,
                    wait_ms,
                    config.clipboard_retry_max_total_ms
                );
                break;
            }

            log::debug!("🔄 重试 {}/{}，等待 {}ms（指数退避+抖动）", attempt, retry_count, wait_ms);
            std::thread::sleep(Duration::from_millis(wait_ms));
        }

        match attempt_write() {
            Ok(()) => return Ok(attempt),
            Err(failure) => {
                let retryable = failure.is_retryable();
                log::warn!(
                    "❌ 尝试 {} 失败: {}（kind={:?}, retryable={}）",
                    attempt,
                    failure.message,
                    failure.kind,
                    retryable
                );
                last_failure = Some(failure);

                if !retryable {
                    log::warn!("🛑 非可重试错误，提前终止重试");
                    break;
                }
            }
        }
    }

    Err(last_failure.unwrap_or_else(|| DeliveryFailure::transient("未知错误")))
}
