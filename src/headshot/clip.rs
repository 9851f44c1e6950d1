//! # 形状裁剪
//!
//! 根据裁剪形状生成两份描述：
//! - 合成器在绘制前使用的裁剪区域（tiny-skia 路径 / 蒙版）
//! - 实时预览使用的 CSS `border-radius`
//!
//! 三种形状的对应关系固定为：圆形 `50%`、圆角 `10px`、方形 `0`。
//! 圆角半径是固定像素值，不随容器尺寸缩放。

use tiny_skia::{FillRule, Mask, Path, PathBuilder, Rect, Transform};

use super::HeadshotShape;

/// 圆角矩形的固定圆角半径（像素）。
pub const ROUNDED_CORNER_RADIUS: f32 = 10.0;

/// 三次贝塞尔逼近四分之一圆弧的控制点系数。
const KAPPA: f32 = 0.552_284_8;

/// 裁剪区域描述（纯数据，无副作用）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClipRegion {
    /// 以 `(cx, cy)` 为圆心、`radius` 为半径的圆。
    Circle { cx: f32, cy: f32, radius: f32 },
    /// `(0, 0, size, size)` 的圆角矩形。
    RoundedRect { size: f32, radius: f32 },
    /// 整个画布，等价于不裁剪。
    FullRect { size: f32 },
}

/// 根据容器尺寸与形状生成裁剪区域。
pub fn clip_region(container_size: u32, shape: HeadshotShape) -> ClipRegion {
    let size = container_size as f32;
    match shape {
        HeadshotShape::Circle => ClipRegion::Circle {
            cx: size / 2.0,
            cy: size / 2.0,
            radius: size / 2.0,
        },
        HeadshotShape::Rounded => ClipRegion::RoundedRect {
            size,
            radius: ROUNDED_CORNER_RADIUS,
        },
        HeadshotShape::Square => ClipRegion::FullRect { size },
    }
}

/// 预览使用的 CSS `border-radius`，与 [`clip_region`] 一一对应。
pub fn css_border_radius(shape: HeadshotShape) -> &'static str {
    match shape {
        HeadshotShape::Circle => "50%",
        HeadshotShape::Rounded => "10px",
        HeadshotShape::Square => "0",
    }
}

impl ClipRegion {
    /// 裁剪区域对应的形状。
    pub fn shape(&self) -> HeadshotShape {
        match self {
            Self::Circle { .. } => HeadshotShape::Circle,
            Self::RoundedRect { .. } => HeadshotShape::Rounded,
            Self::FullRect { .. } => HeadshotShape::Square,
        }
    }

    pub fn css_border_radius(&self) -> &'static str {
        css_border_radius(self.shape())
    }

    /// 是否真正需要裁剪。方形覆盖整个画布，不需要蒙版。
    pub fn needs_mask(&self) -> bool {
        !matches!(self, Self::FullRect { .. })
    }

    /// 判断点是否落在区域内。
    #[cfg(test)]
    fn contains(&self, x: f32, y: f32) -> bool {
        match *self {
            Self::Circle { cx, cy, radius } => {
                let dx = x - cx;
                let dy = y - cy;
                dx * dx + dy * dy <= radius * radius
            }
            Self::RoundedRect { size, radius } => {
                if x < 0.0 || y < 0.0 || x > size || y > size {
                    return false;
                }
                let r = effective_radius(size, radius);
                let nearest_x = x.clamp(r, size - r);
                let nearest_y = y.clamp(r, size - r);
                let dx = x - nearest_x;
                let dy = y - nearest_y;
                dx * dx + dy * dy <= r * r
            }
            Self::FullRect { size } => x >= 0.0 && y >= 0.0 && x <= size && y <= size,
        }
    }

    fn to_path(&self) -> Option<Path> {
        match *self {
            Self::Circle { cx, cy, radius } => PathBuilder::from_circle(cx, cy, radius),
            Self::RoundedRect { size, radius } => rounded_rect_path(size, radius),
            Self::FullRect { size } => Some(PathBuilder::from_rect(Rect::from_xywh(0.0, 0.0, size, size)?)),
        }
    }

    /// 生成抗锯齿裁剪蒙版；方形返回 `None`，表示不裁剪。
    pub fn to_mask(&self, width: u32, height: u32) -> Option<Mask> {
        if !self.needs_mask() {
            return None;
        }
        let path = self.to_path()?;
        let mut mask = Mask::new(width, height)?;
        mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
        Some(mask)
    }
}

/// 半径超过边长一半时按 canvas `roundRect` 的规则等比收缩。
fn effective_radius(size: f32, radius: f32) -> f32 {
    radius.max(0.0).min(size / 2.0)
}

fn rounded_rect_path(size: f32, radius: f32) -> Option<Path> {
    let r = effective_radius(size, radius);
    if r <= 0.0 {
        return Some(PathBuilder::from_rect(Rect::from_xywh(0.0, 0.0, size, size)?));
    }
    let k = r * KAPPA;

    let mut pb = PathBuilder::new();
    pb.move_to(r, 0.0);
    pb.line_to(size - r, 0.0);
    pb.cubic_to(size - r + k, 0.0, size, r - k, size, r);
    pb.line_to(size, size - r);
    pb.cubic_to(size, size - r + k, size - r + k, size, size - r, size);
    pb.line_to(r, size);
    pb.cubic_to(r - k, size, 0.0, size - r + k, 0.0, size - r);
    pb.line_to(0.0, r);
    pb.cubic_to(0.0, r - k, r - k, 0.0, r, 0.0);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_is_centered_with_half_size_radius() {
        let region = clip_region(130, HeadshotShape::Circle);
        assert_eq!(
            region,
            ClipRegion::Circle {
                cx: 65.0,
                cy: 65.0,
                radius: 65.0
            }
        );
        assert!(region.contains(65.0, 1.0));
        assert!(!region.contains(2.0, 2.0));
    }

    #[test]
    fn rounded_radius_is_fixed_regardless_of_size() {
        for size in [40, 130, 175, 600] {
            match clip_region(size, HeadshotShape::Rounded) {
                ClipRegion::RoundedRect { radius, .. } => assert_eq!(radius, 10.0),
                other => panic!("unexpected region {other:?}"),
            }
        }
    }

    #[test]
    fn rounded_corner_excludes_extreme_corner_only() {
        let region = clip_region(175, HeadshotShape::Rounded);
        assert!(!region.contains(0.5, 0.5));
        assert!(region.contains(10.0, 0.5));
        assert!(region.contains(87.0, 87.0));
    }

    #[test]
    fn css_descriptor_matches_region_for_every_shape() {
        for (shape, css) in [
            (HeadshotShape::Circle, "50%"),
            (HeadshotShape::Rounded, "10px"),
            (HeadshotShape::Square, "0"),
        ] {
            let region = clip_region(150, shape);
            assert_eq!(region.shape(), shape);
            assert_eq!(region.css_border_radius(), css);
        }
    }

    #[test]
    fn square_needs_no_mask() {
        let region = clip_region(64, HeadshotShape::Square);
        assert!(!region.needs_mask());
        assert!(region.to_mask(64, 64).is_none());
        assert!(region.to_path().is_some());
    }

    #[test]
    fn circle_mask_is_transparent_in_corners_and_opaque_in_center() {
        let region = clip_region(64, HeadshotShape::Circle);
        let mask = region.to_mask(64, 64).expect("mask should be created");
        let data = mask.data();

        assert_eq!(data[0], 0);
        assert_eq!(data[32 * 64 + 32], 255);
    }

    #[test]
    fn tiny_container_clamps_rounded_radius() {
        let region = clip_region(8, HeadshotShape::Rounded);
        assert!(region.to_path().is_some());
        assert!(region.contains(4.0, 4.0));
    }
}
