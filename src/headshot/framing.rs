//! # 取景参数与坐标映射
//!
//! ## 设计思路
//!
//! 实时预览（CSS）与离线合成（位图）是两个独立的渲染器，二者必须在几何上逐像素一致。
//! 这里把“取景参数 → 绘制几何”的换算收敛为一个纯函数 [`map_geometry`]，
//! 预览样式与合成器都只消费它的结果，不各自重复算术。
//!
//! ## 映射约定
//!
//! - 绘制宽度 = 容器边长 × 缩放百分比 / 100，高度按源图宽高比推导，从不单轴拉伸。
//! - 偏移量固定为 `(position - 50) * 5` 像素，与缩放无关。
//! - 水平方向先居中再偏移；垂直方向**顶部对齐**再偏移。
//!   这一不对称来自预览的 CSS 排版（`text-align: center` + `position: relative`），
//!   不要“修正”为垂直居中，否则发布出去的头像会整体下移。
//! - 不做越界钳制：图片可以被拖到无法覆盖整个容器的位置，露出透明区域。

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// 预览滑块每移动 1 个单位对应的像素偏移。
pub const POSITION_STEP_PX: f64 = 5.0;
/// 位置滑块的中点（居中）。
pub const POSITION_CENTER: i32 = 50;

pub const MIN_SCALE_PERCENT: u32 = 100;
pub const MAX_SCALE_PERCENT: u32 = 300;
pub const MIN_POSITION: i32 = 0;
pub const MAX_POSITION: i32 = 100;
/// 表单默认容器尺寸。
pub const DEFAULT_CONTAINER_SIZE: u32 = 130;
/// 容器边长上限。绘制表面与蒙版按边长平方申请内存，超出即拒绝。
pub const MAX_CONTAINER_SIZE: u32 = 1024;

/// 头像裁剪形状。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadshotShape {
    #[default]
    Circle,
    Rounded,
    Square,
}

impl HeadshotShape {
    /// 从表单字符串解析形状，未知值回退为方形（与预览中 `else` 分支一致）。
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "circle" => Self::Circle,
            "rounded" => Self::Rounded,
            _ => Self::Square,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Rounded => "rounded",
            Self::Square => "square",
        }
    }
}

/// 单次渲染的取景参数（不可变）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FramingParameters {
    /// 正方形输出的边长（像素），取值 [1, 1024]。
    pub container_size: u32,
    /// 缩放百分比，取值 [100, 300]；100 表示图片渲染宽度等于容器边长。
    pub image_scale_percent: u32,
    /// 水平位置，取值 [0, 100]，50 为居中。
    pub position_x: i32,
    /// 垂直位置，取值 [0, 100]，50 为居中。
    pub position_y: i32,
    pub shape: HeadshotShape,
}

impl Default for FramingParameters {
    fn default() -> Self {
        Self {
            container_size: DEFAULT_CONTAINER_SIZE,
            image_scale_percent: MIN_SCALE_PERCENT,
            position_x: POSITION_CENTER,
            position_y: POSITION_CENTER,
            shape: HeadshotShape::Circle,
        }
    }
}

impl FramingParameters {
    /// 构造并校验取景参数。
    ///
    /// # 示例
    /// ```rust
    /// use signature_studio::headshot::{FramingParameters, HeadshotShape};
    ///
    /// let params = FramingParameters::new(130, 150, 70, 30, HeadshotShape::Circle)?;
    /// assert_eq!(params.container_size, 130);
    /// # Ok::<(), signature_studio::error::ExportError>(())
    /// ```
    pub fn new(
        container_size: u32,
        image_scale_percent: u32,
        position_x: i32,
        position_y: i32,
        shape: HeadshotShape,
    ) -> Result<Self, ExportError> {
        let params = Self {
            container_size,
            image_scale_percent,
            position_x,
            position_y,
            shape,
        };
        params.validate()?;
        Ok(params)
    }

    /// 校验取值范围。
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.container_size == 0 {
            return Err(ExportError::InvalidFraming("容器尺寸必须大于 0".to_string()));
        }
        if self.container_size > MAX_CONTAINER_SIZE {
            return Err(ExportError::InvalidFraming(format!(
                "容器尺寸 {}px 超出上限 {}px",
                self.container_size, MAX_CONTAINER_SIZE
            )));
        }
        if !(MIN_SCALE_PERCENT..=MAX_SCALE_PERCENT).contains(&self.image_scale_percent) {
            return Err(ExportError::InvalidFraming(format!(
                "缩放比例 {}% 超出范围（{}~{}）",
                self.image_scale_percent, MIN_SCALE_PERCENT, MAX_SCALE_PERCENT
            )));
        }
        for (axis, value) in [("X", self.position_x), ("Y", self.position_y)] {
            if !(MIN_POSITION..=MAX_POSITION).contains(&value) {
                return Err(ExportError::InvalidFraming(format!(
                    "{} 位置 {} 超出范围（{}~{}）",
                    axis, value, MIN_POSITION, MAX_POSITION
                )));
            }
        }
        Ok(())
    }

    /// 缩放系数（百分比 / 100）。
    pub fn scale_factor(&self) -> f64 {
        self.image_scale_percent as f64 / 100.0
    }

    /// 水平像素偏移，与缩放无关。
    pub fn offset_x(&self) -> f64 {
        (self.position_x - POSITION_CENTER) as f64 * POSITION_STEP_PX
    }

    /// 垂直像素偏移，与缩放无关。
    pub fn offset_y(&self) -> f64 {
        (self.position_y - POSITION_CENTER) as f64 * POSITION_STEP_PX
    }
}

/// 输出画布中的绘制几何（可为负坐标或超出画布）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawGeometry {
    pub draw_x: f64,
    pub draw_y: f64,
    pub draw_width: f64,
    pub draw_height: f64,
}

/// 将取景参数与源图固有尺寸映射为绘制几何。
///
/// `source_width` 为 0 时没有可用的宽高比，调用方应在解码阶段拒绝此类图片；
/// 这里按正方形处理以保持函数全域可用。
pub fn map_geometry(source_width: u32, source_height: u32, params: &FramingParameters) -> DrawGeometry {
    let container = params.container_size as f64;
    let draw_width = container * params.scale_factor();
    let aspect = if source_width == 0 {
        1.0
    } else {
        source_height as f64 / source_width as f64
    };
    let draw_height = draw_width * aspect;

    // 水平居中后偏移；垂直从顶部开始后偏移
    let draw_x = (container - draw_width) / 2.0 + params.offset_x();
    let draw_y = 0.0 + params.offset_y();

    DrawGeometry {
        draw_x,
        draw_y,
        draw_width,
        draw_height,
    }
}
