//! # 单飞守卫
//!
//! 同一时刻最多只允许一次导出在进行中，第二次导出直接得到 `Busy`，
//! 而不是排队或与前一次竞争。
//!
//! `ExportGuard` 采用 RAII 模式：获取时置位，`Drop` 时复位，
//! 任一阶段失败提前返回或发生 panic 都会释放。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ExportError;

/// 进行中导出的 RAII 守卫。
#[derive(Debug)]
pub struct ExportGuard {
    in_flight: Arc<AtomicBool>,
}

impl ExportGuard {
    /// 尝试占用导出槽位，已被占用时返回 `ExportError::Busy`。
    pub fn try_acquire(in_flight: &Arc<AtomicBool>) -> Result<Self, ExportError> {
        in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::Busy)?;
        log::debug!("🔒 已占用导出槽位");
        Ok(Self {
            in_flight: Arc::clone(in_flight),
        })
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
        log::debug!("🔓 已释放导出槽位");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_busy_until_first_drops() {
        let slot = Arc::new(AtomicBool::new(false));

        let first = ExportGuard::try_acquire(&slot).expect("first acquire should succeed");
        assert!(matches!(ExportGuard::try_acquire(&slot), Err(ExportError::Busy)));

        drop(first);
        assert!(ExportGuard::try_acquire(&slot).is_ok());
    }

    #[test]
    fn guard_is_released_on_panic() {
        let slot = Arc::new(AtomicBool::new(false));
        let cloned = Arc::clone(&slot);

        let result = std::panic::catch_unwind(move || {
            let _guard = ExportGuard::try_acquire(&cloned).expect("acquire failed");
            panic!("stage blew up");
        });

        assert!(result.is_err());
        assert!(!slot.load(Ordering::Acquire));
    }
}
