//! # 签名模块（signature）
//!
//! - `profile`：表单资料的宽松转换
//! - `brand`：品牌标识地址与替代文本
//! - `assemble`：HTML + 纯文本组装

mod assemble;
mod brand;
mod profile;

pub use assemble::{SignatureAssembler, SignatureBundle, escape_html};
pub use brand::BrandConfig;
pub use profile::{BrandMark, HeadshotSource, ProfileFields};
