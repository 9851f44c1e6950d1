//! # 邮件签名工作室 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            调用方（CLI / 表单 / 其他前端）                 │
//! │   ProfileFields（扁平资料）+ PhotoSource（头像来源）       │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ Result<ExportReport, ExportError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓            核心（Rust）                           │
//! │                                                          │
//! │  ┌─ error ────── ExportError（阶段化错误分类）             │
//! │  ├─ settings ─── AppSettings（JSON + 环境变量）           │
//! │  │                                                       │
//! │  ├─ headshot ─── 取景 → 裁剪 → 合成 PNG                   │
//! │  │   ├─ framing / clip   预览与合成共享的几何来源          │
//! │  │   ├─ preview          CSS 实时预览样式                 │
//! │  │   └─ loader / compositor  加载校验 / 离线合成          │
//! │  │                                                       │
//! │  ├─ publish ──── ObjectStore 上传 → 公开地址              │
//! │  ├─ signature ── 资料转换 + HTML/纯文本组装               │
//! │  └─ export ───── 单飞守卫 + 编排 + 剪贴板投递             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `ExportError`，附带错误码、所属阶段与可重试标记 |
//! | [`settings`] | 应用设置的加载、保存、校验与环境变量覆盖 |
//! | [`headshot`] | 头像取景参数、裁剪形状、预览样式、源图加载与离线合成 |
//! | [`publish`] | 对象存储抽象与 Cloudinary 无签名上传 |
//! | [`signature`] | 表单资料宽松转换、品牌标识、签名 HTML 与纯文本组装 |
//! | [`export`] | 导出编排、单次导出守卫、剪贴板投递与重试 |

pub mod error;
pub mod export;
pub mod headshot;
pub mod publish;
pub mod settings;
pub mod signature;
