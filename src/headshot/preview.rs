//! # 实时预览样式
//!
//! 预览通过 CSS 完成裁剪：固定尺寸的 `overflow: hidden` 容器 + 相对定位的图片。
//! 这里从与合成器相同的取景参数与裁剪描述推导内联样式，
//! 保证“所见”与“所发布”使用同一份几何来源。

use super::clip::css_border_radius;
use super::FramingParameters;

/// 预览容器与图片的内联样式。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewStyle {
    pub container: String,
    pub image: String,
}

impl PreviewStyle {
    pub fn from_params(params: &FramingParameters) -> Self {
        let size = params.container_size;
        let container = format!(
            "width:{size}px;height:{size}px;overflow:hidden;border-radius:{};position:relative;display:inline-block;text-align:center;vertical-align:middle;",
            css_border_radius(params.shape)
        );
        let image = format!(
            "width:{}%;height:auto;max-width:none;position:relative;left:{}px;top:{}px;display:inline-block;",
            params.image_scale_percent,
            params.offset_x(),
            params.offset_y()
        );

        Self { container, image }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headshot::HeadshotShape;

    #[test]
    fn preview_uses_same_offsets_and_radius_as_compositor() {
        let params = FramingParameters::new(130, 150, 70, 30, HeadshotShape::Circle)
            .expect("params should be valid");
        let style = PreviewStyle::from_params(&params);

        assert!(style.container.contains("width:130px;height:130px;"));
        assert!(style.container.contains("border-radius:50%;"));
        assert!(style.image.contains("width:150%;"));
        assert!(style.image.contains("left:100px;"));
        assert!(style.image.contains("top:-100px;"));
    }

    #[test]
    fn square_preview_has_zero_radius() {
        let params = FramingParameters::new(175, 100, 50, 50, HeadshotShape::Square)
            .expect("params should be valid");
        let style = PreviewStyle::from_params(&params);

        assert!(style.container.contains("border-radius:0;"));
        assert!(style.image.contains("left:0px;top:0px;"));
    }
}
