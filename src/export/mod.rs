//! # 导出模块（export）
//!
//! ## 新同事快速上手
//!
//! ```text
//! ExportPipeline::export
//!    ↓
//! guard.rs（单飞守卫，占用失败即 Busy）
//!    ↓
//! headshot（加载 + 合成）→ publish（上传）
//!    ↓
//! signature（组装 HTML + 纯文本）
//!    ↓
//! sink.rs（写剪贴板 + retry.rs 退避重试）
//! ```
//!
//! - 编排顺序变更优先改 `pipeline.rs`
//! - 重试策略变更优先改 `config.rs` 与 `retry.rs`
//! - 新的投递终点实现 `ExportSink` 即可

mod config;
mod guard;
mod pipeline;
mod retry;
mod sink;

pub use config::ExportConfig;
pub use guard::ExportGuard;
pub use pipeline::{ExportPipeline, ExportReport};
pub use sink::{ClipboardSink, ExportSink};
