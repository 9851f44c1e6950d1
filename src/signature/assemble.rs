//! # 签名组装
//!
//! ## 设计思路
//!
//! 邮件客户端普遍不支持外部样式表，输出必须是表格布局 + 内联样式的自包含片段。
//! 同一份资料同时产出 HTML 与纯文本两种表示，分别供富文本与纯文本粘贴目标使用。
//!
//! ## 实现思路
//!
//! - 左列头像单元格仅在“显示头像”开启且有头像地址时输出，分隔线随之出现或消失。
//! - 导出时头像是已烘焙好取景与裁剪的 PNG，按容器尺寸原样显示；
//!   预览时头像是未处理的源图，通过 [`PreviewStyle`] 用 CSS 完成同样的取景。
//! - 联系方式按 电话 → 邮箱 → 网站 → 地址 的顺序逐项输出，空字段整行省略。
//! - 所有插入 HTML 的文本与地址都经过转义。

use std::fmt::Write as _;

use serde::Serialize;

use super::ProfileFields;
use crate::headshot::{FramingParameters, PreviewStyle, css_border_radius};

const ACCENT_COLOR: &str = "#06b6d4";
const MUTED_COLOR: &str = "#64748b";
const NAME_COLOR: &str = "#0f172a";

/// 组装结果：HTML 片段 + 纯文本回退。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureBundle {
    pub html: String,
    pub plain_text: String,
}

/// 头像单元格的渲染方式。
#[derive(Debug, Clone, Copy)]
enum HeadshotCell<'a> {
    /// 已合成的资源：取景与裁剪已烘焙进像素。
    Composited(&'a str),
    /// 原始照片：通过 CSS 取景（实时预览）。
    Framed(&'a str),
}

impl<'a> HeadshotCell<'a> {
    fn url(&self) -> &'a str {
        match self {
            Self::Composited(url) | Self::Framed(url) => url,
        }
    }
}

/// 签名组装器。
#[derive(Debug, Clone)]
pub struct SignatureAssembler {
    brand_alt_text: String,
}

impl Default for SignatureAssembler {
    fn default() -> Self {
        Self::new("MedLead Convert")
    }
}

impl SignatureAssembler {
    pub fn new(brand_alt_text: impl Into<String>) -> Self {
        Self {
            brand_alt_text: brand_alt_text.into(),
        }
    }

    /// 组装导出用签名，`headshot_url` 指向已发布的合成头像。
    pub fn assemble(
        &self,
        profile: &ProfileFields,
        brand_url: Option<&str>,
        headshot_url: Option<&str>,
    ) -> SignatureBundle {
        self.render(profile, brand_url, headshot_url.map(HeadshotCell::Composited))
    }

    /// 组装预览用签名，`photo_url` 指向未经处理的源图。
    pub fn assemble_preview(
        &self,
        profile: &ProfileFields,
        brand_url: Option<&str>,
        photo_url: Option<&str>,
    ) -> SignatureBundle {
        self.render(profile, brand_url, photo_url.map(HeadshotCell::Framed))
    }

    fn render(&self, profile: &ProfileFields, brand_url: Option<&str>, headshot: Option<HeadshotCell<'_>>) -> SignatureBundle {
        let headshot = headshot
            .filter(|cell| !cell.url().trim().is_empty())
            .filter(|_| profile.show_headshot);
        let brand_url = brand_url.filter(|url| !url.trim().is_empty());

        SignatureBundle {
            html: self.render_html(profile, brand_url, headshot),
            plain_text: render_plain_text(profile),
        }
    }

    fn render_html(&self, profile: &ProfileFields, brand_url: Option<&str>, headshot: Option<HeadshotCell<'_>>) -> String {
        let mut html = String::with_capacity(2048);
        html.push_str("<div style=\"font-family:Arial, sans-serif;color:#333;line-height:1.4;\">");
        html.push_str("<table cellpadding=\"0\" cellspacing=\"0\" border=\"0\" style=\"border-collapse:collapse;\"><tbody><tr>");

        let info_style = match headshot {
            Some(cell) => {
                html.push_str("<td style=\"padding-right:20px;vertical-align:top;\">");
                render_headshot(&mut html, cell, &profile.framing, &profile.full_name);
                html.push_str("</td>");
                format!("vertical-align:top;border-left:2px solid {ACCENT_COLOR};padding-left:20px;")
            }
            None => "vertical-align:top;padding-left:0;".to_string(),
        };

        let _ = write!(html, "<td style=\"{info_style}\">");
        html.push_str("<table cellpadding=\"0\" cellspacing=\"0\" border=\"0\"><tbody>");

        let _ = write!(
            html,
            "<tr><td style=\"padding-bottom:5px;\"><strong style=\"font-size:18px;color:{NAME_COLOR};display:block;\">{}</strong><span style=\"font-size:14px;color:{ACCENT_COLOR};font-weight:bold;text-transform:uppercase;\">{}</span></td></tr>",
            escape_html(&profile.full_name),
            escape_html(&profile.title)
        );

        html.push_str("<tr><td style=\"padding-bottom:15px;\">");
        if let Some(url) = brand_url {
            let _ = write!(
                html,
                "<img src=\"{}\" alt=\"{}\" style=\"height:30px;display:block;\" />",
                escape_html(url),
                escape_html(&self.brand_alt_text)
            );
        }
        html.push_str("</td></tr>");

        let _ = write!(html, "<tr><td style=\"font-size:13px;color:{MUTED_COLOR};\">");
        if let Some(phone) = present(&profile.phone) {
            push_link_row(&mut html, "P:", &format!("tel:{phone}"), phone);
        }
        if let Some(email) = present(&profile.email) {
            push_link_row(&mut html, "E:", &format!("mailto:{email}"), email);
        }
        if let Some(website) = present(&profile.website) {
            push_link_row(&mut html, "W:", &format!("https://{website}"), website);
        }
        if let Some(address) = present(&profile.address) {
            let _ = write!(
                html,
                "<div><span style=\"color:{ACCENT_COLOR};font-weight:bold;\">A:</span> {}</div>",
                escape_html(address)
            );
        }
        html.push_str("</td></tr>");

        html.push_str("</tbody></table></td></tr></tbody></table></div>");
        html
    }
}

fn render_headshot(html: &mut String, cell: HeadshotCell<'_>, framing: &FramingParameters, alt: &str) {
    match cell {
        HeadshotCell::Composited(url) => {
            let size = framing.container_size;
            let _ = write!(
                html,
                "<img src=\"{}\" alt=\"{}\" width=\"{size}\" height=\"{size}\" style=\"width:{size}px;height:{size}px;display:block;border-radius:{};\" />",
                escape_html(url),
                escape_html(alt),
                css_border_radius(framing.shape)
            );
        }
        HeadshotCell::Framed(url) => {
            let style = PreviewStyle::from_params(framing);
            let _ = write!(
                html,
                "<div style=\"{}\"><img src=\"{}\" alt=\"{}\" style=\"{}\" /></div>",
                style.container,
                escape_html(url),
                escape_html(alt),
                style.image
            );
        }
    }
}

fn push_link_row(html: &mut String, label: &str, href: &str, text: &str) {
    let _ = write!(
        html,
        "<div style=\"margin-bottom:2px;\"><span style=\"color:{ACCENT_COLOR};font-weight:bold;\">{label}</span> <a href=\"{}\" style=\"color:{MUTED_COLOR};text-decoration:none;\">{}</a></div>",
        escape_html(href),
        escape_html(text)
    );
}

/// 纯文本回退：逐行输出，空字段省略。
fn render_plain_text(profile: &ProfileFields) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(6);
    if let Some(name) = present(&profile.full_name) {
        lines.push(name.to_string());
    }
    if let Some(title) = present(&profile.title) {
        lines.push(title.to_string());
    }
    for (label, value) in [
        ("P", &profile.phone),
        ("E", &profile.email),
        ("W", &profile.website),
        ("A", &profile.address),
    ] {
        if let Some(value) = present(value) {
            lines.push(format!("{label}: {value}"));
        }
    }
    lines.join("\n")
}

fn present(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// 转义 HTML 文本与属性值中的特殊字符。
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headshot::HeadshotShape;

    fn full_profile() -> ProfileFields {
        ProfileFields {
            full_name: "John Doe".to_string(),
            title: "Sales Representative".to_string(),
            email: "john.doe@medleadconvert.com".to_string(),
            phone: "555-0123".to_string(),
            website: "www.medleadconvert.com".to_string(),
            address: "123 Medical Plaza, Suite 100".to_string(),
            ..ProfileFields::default()
        }
    }

    const HEADSHOT: &str = "https://res.cloudinary.com/demo/image/upload/v1/headshot.png";
    const BRAND: &str = "https://cdn.example.com/logo1.png";

    #[test]
    fn empty_contacts_still_render_name_and_title() {
        let profile = ProfileFields {
            email: String::new(),
            phone: String::new(),
            website: String::new(),
            address: String::new(),
            ..full_profile()
        };

        let bundle = SignatureAssembler::default().assemble(&profile, Some(BRAND), Some(HEADSHOT));

        assert!(bundle.html.contains("John Doe"));
        assert!(bundle.html.contains("Sales Representative"));
        assert!(!bundle.html.contains("tel:"));
        assert!(!bundle.html.contains("mailto:"));
        assert!(!bundle.html.contains("A:</span>"));
        assert_eq!(bundle.plain_text, "John Doe\nSales Representative");
    }

    #[test]
    fn missing_headshot_drops_cell_and_divider() {
        let assembler = SignatureAssembler::default();
        let hidden = ProfileFields {
            show_headshot: false,
            ..full_profile()
        };

        for bundle in [
            assembler.assemble(&full_profile(), Some(BRAND), None),
            assembler.assemble(&hidden, Some(BRAND), Some(HEADSHOT)),
            assembler.assemble(&full_profile(), Some(BRAND), Some("  ")),
        ] {
            assert!(!bundle.html.contains("border-left"));
            assert!(!bundle.html.contains("padding-right:20px"));
            assert!(!bundle.html.contains(HEADSHOT));
        }
    }

    #[test]
    fn headshot_cell_and_divider_appear_together() {
        let bundle = SignatureAssembler::default().assemble(&full_profile(), None, Some(HEADSHOT));

        assert!(bundle.html.contains("border-left:2px solid #06b6d4;padding-left:20px;"));
        assert!(bundle.html.contains(&format!("<img src=\"{HEADSHOT}\" alt=\"John Doe\" width=\"130\" height=\"130\"")));
        assert!(bundle.html.contains("border-radius:50%;"));
    }

    #[test]
    fn contacts_keep_order_and_link_targets() {
        let bundle = SignatureAssembler::default().assemble(&full_profile(), Some(BRAND), None);
        let html = &bundle.html;

        let phone = html.find("href=\"tel:555-0123\"").expect("phone link missing");
        let email = html.find("href=\"mailto:john.doe@medleadconvert.com\"").expect("email link missing");
        let website = html.find("href=\"https://www.medleadconvert.com\"").expect("website link missing");
        let address = html.find("123 Medical Plaza, Suite 100").expect("address missing");
        assert!(phone < email && email < website && website < address);
        assert!(html.contains(">www.medleadconvert.com</a>"));

        assert_eq!(
            bundle.plain_text,
            "John Doe\nSales Representative\nP: 555-0123\nE: john.doe@medleadconvert.com\nW: www.medleadconvert.com\nA: 123 Medical Plaza, Suite 100"
        );
    }

    #[test]
    fn brand_row_uses_alt_text_and_fixed_height() {
        let bundle = SignatureAssembler::new("Acme").assemble(&full_profile(), Some(BRAND), None);
        assert!(bundle.html.contains(&format!("<img src=\"{BRAND}\" alt=\"Acme\" style=\"height:30px;display:block;\" />")));

        let without = SignatureAssembler::new("Acme").assemble(&full_profile(), None, None);
        assert!(!without.html.contains("alt=\"Acme\""));
    }

    #[test]
    fn user_text_is_escaped() {
        let profile = ProfileFields {
            full_name: "<script>alert(1)</script>".to_string(),
            address: "Tom & Jerry \"HQ\"".to_string(),
            ..full_profile()
        };

        let bundle = SignatureAssembler::default().assemble(&profile, None, None);

        assert!(!bundle.html.contains("<script>"));
        assert!(bundle.html.contains("&lt;script&gt;"));
        assert!(bundle.html.contains("Tom &amp; Jerry &quot;HQ&quot;"));
    }

    #[test]
    fn preview_frames_raw_photo_with_css() {
        let profile = ProfileFields {
            framing: FramingParameters::new(130, 150, 70, 30, HeadshotShape::Rounded).expect("valid"),
            ..full_profile()
        };

        let bundle = SignatureAssembler::default().assemble_preview(&profile, None, Some("https://cdn.example.com/raw.jpg"));

        assert!(bundle.html.contains("overflow:hidden;border-radius:10px;"));
        assert!(bundle.html.contains("width:150%;"));
        assert!(bundle.html.contains("left:100px;top:-100px;"));
    }
}
