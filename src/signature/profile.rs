//! # 签名资料
//!
//! ## 设计思路
//!
//! 表单侧提交的是一张扁平的键值表（字符串 / 数字 / 布尔混杂，滑块的值甚至是字符串）。
//! 这里只做类型宽松转换，不做业务校验：缺失字段取默认值，越界滑块值收敛到合法区间。
//! 唯一的硬性错误是容器尺寸不在 `1..=MAX_CONTAINER_SIZE` 内：
//! 不为正时无法构造绘制表面，过大时绘制表面的内存申请本身就会失败。
//!
//! 转换结果是不可变的 `ProfileFields`，每次导出显式传入，流水线本身不保存选择状态。

use serde_json::{Map, Value};

use crate::error::ExportError;
use crate::headshot::{
    FramingParameters, HeadshotShape, MAX_CONTAINER_SIZE, MAX_POSITION, MAX_SCALE_PERCENT, MIN_POSITION,
    MIN_SCALE_PERCENT,
};

/// 品牌标识选择器。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrandMark {
    #[default]
    Primary,
    Secondary,
    None,
}

impl BrandMark {
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "secondary" => Self::Secondary,
            "none" | "" => Self::None,
            _ => Self::Primary,
        }
    }
}

/// 头像来源选择器。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadshotSource {
    /// 用户上传的照片。
    #[default]
    Upload,
    /// 使用品牌标识作为头像。
    BrandMark,
}

impl HeadshotSource {
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "logo" | "brand" | "brand_mark" | "brandmark" => Self::BrandMark,
            _ => Self::Upload,
        }
    }
}

/// 一次导出所需的全部资料。
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileFields {
    pub full_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub address: String,
    pub brand_mark: BrandMark,
    pub headshot_source: HeadshotSource,
    /// 上传照片的引用（Data URL / 文件路径 / 远程地址），可为空。
    pub headshot_url: String,
    pub show_headshot: bool,
    pub framing: FramingParameters,
}

impl Default for ProfileFields {
    fn default() -> Self {
        Self {
            full_name: "John Doe".to_string(),
            title: "Sales Representative".to_string(),
            email: String::new(),
            phone: String::new(),
            website: String::new(),
            address: String::new(),
            brand_mark: BrandMark::Primary,
            headshot_source: HeadshotSource::Upload,
            headshot_url: String::new(),
            show_headshot: true,
            framing: FramingParameters::default(),
        }
    }
}

impl ProfileFields {
    pub fn from_json_str(json: &str) -> Result<Self, ExportError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ExportError::Config(format!("资料不是合法 JSON：{}", e)))?;
        Self::from_value(&value)
    }

    /// 从扁平键值表做宽松转换。
    ///
    /// # 示例
    /// ```rust
    /// use signature_studio::signature::ProfileFields;
    ///
    /// let profile = ProfileFields::from_value(&serde_json::json!({
    ///     "fullName": "Ada",
    ///     "headshotImageScale": "150",
    ///     "headshotX": 999,
    /// })).unwrap();
    /// assert_eq!(profile.framing.image_scale_percent, 150);
    /// assert_eq!(profile.framing.position_x, 100);
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, ExportError> {
        let map = value
            .as_object()
            .ok_or_else(|| ExportError::Config("资料必须是 JSON 对象".to_string()))?;
        let defaults = Self::default();
        let default_framing = defaults.framing;

        let container_size = match int_field(map, "headshotContainerSize") {
            Some(size) if size <= 0 => {
                return Err(ExportError::InvalidFraming(format!("容器尺寸必须大于 0，实际为 {}", size)));
            }
            Some(size) if size > MAX_CONTAINER_SIZE as i64 => {
                return Err(ExportError::InvalidFraming(format!(
                    "容器尺寸 {}px 超出上限 {}px",
                    size, MAX_CONTAINER_SIZE
                )));
            }
            Some(size) => size as u32,
            None => default_framing.container_size,
        };

        let image_scale_percent = int_field(map, "headshotImageScale")
            .map(|v| v.clamp(MIN_SCALE_PERCENT as i64, MAX_SCALE_PERCENT as i64) as u32)
            .unwrap_or(default_framing.image_scale_percent);
        let position_x = int_field(map, "headshotX")
            .map(clamp_position)
            .unwrap_or(default_framing.position_x);
        let position_y = int_field(map, "headshotY")
            .map(clamp_position)
            .unwrap_or(default_framing.position_y);
        let shape = string_field(map, "headshotShape")
            .map(|s| HeadshotShape::parse_lenient(&s))
            .unwrap_or(default_framing.shape);

        let framing = FramingParameters::new(container_size, image_scale_percent, position_x, position_y, shape)?;

        Ok(Self {
            full_name: string_field(map, "fullName").unwrap_or(defaults.full_name),
            title: string_field(map, "title").unwrap_or(defaults.title),
            email: string_field(map, "email").unwrap_or_default(),
            phone: string_field(map, "phone").unwrap_or_default(),
            website: string_field(map, "website").unwrap_or_default(),
            address: string_field(map, "address").unwrap_or_default(),
            brand_mark: string_field(map, "logo")
                .map(|s| BrandMark::parse_lenient(&s))
                .unwrap_or(defaults.brand_mark),
            headshot_source: string_field(map, "headshotType")
                .map(|s| HeadshotSource::parse_lenient(&s))
                .unwrap_or(defaults.headshot_source),
            headshot_url: string_field(map, "headshotUrl").unwrap_or_default(),
            show_headshot: bool_field(map, "showHeadshot").unwrap_or(defaults.show_headshot),
            framing,
        })
    }
}

fn clamp_position(value: i64) -> i32 {
    value.clamp(MIN_POSITION as i64, MAX_POSITION as i64) as i32
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn int_field(map: &Map<String, Value>, key: &str) -> Option<i64> {
    let number = match map.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then(|| number.round() as i64)
}

fn bool_field(map: &Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|v| v != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "1" | "yes" => Some(true),
            "false" | "off" | "0" | "no" | "" => Some(false),
            _ => None,
        },
        Value::Null => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_uses_form_defaults() {
        let profile = ProfileFields::from_value(&json!({})).expect("coercion failed");
        assert_eq!(profile, ProfileFields::default());
        assert_eq!(profile.framing.container_size, 130);
        assert_eq!(profile.framing.shape, HeadshotShape::Circle);
    }

    #[test]
    fn coerces_form_values() {
        let profile = ProfileFields::from_value(&json!({
            "fullName": "  Jane Roe ",
            "phone": 5550123,
            "logo": "none",
            "headshotType": "logo",
            "showHeadshot": "on",
            "headshotContainerSize": "175",
            "headshotImageScale": "150",
            "headshotX": "70",
            "headshotY": 30.4,
            "headshotShape": "rounded"
        }))
        .expect("coercion failed");

        assert_eq!(profile.full_name, "Jane Roe");
        assert_eq!(profile.phone, "5550123");
        assert_eq!(profile.brand_mark, BrandMark::None);
        assert_eq!(profile.headshot_source, HeadshotSource::BrandMark);
        assert!(profile.show_headshot);
        assert_eq!(
            profile.framing,
            FramingParameters::new(175, 150, 70, 30, HeadshotShape::Rounded).expect("valid")
        );
    }

    #[test]
    fn out_of_range_sliders_are_clamped() {
        let profile = ProfileFields::from_value(&json!({
            "headshotImageScale": 20,
            "headshotX": -40,
            "headshotY": 400
        }))
        .expect("coercion failed");

        assert_eq!(profile.framing.image_scale_percent, 100);
        assert_eq!(profile.framing.position_x, 0);
        assert_eq!(profile.framing.position_y, 100);
    }

    #[test]
    fn non_positive_container_size_is_rejected() {
        let result = ProfileFields::from_value(&json!({ "headshotContainerSize": 0 }));
        assert!(matches!(result, Err(ExportError::InvalidFraming(_))));
    }

    #[test]
    fn oversized_container_size_is_rejected() {
        for size in [json!(1025), json!(60000), json!("4294967296")] {
            let result = ProfileFields::from_value(&json!({ "headshotContainerSize": size }));
            assert!(matches!(result, Err(ExportError::InvalidFraming(_))), "size {size}");
        }

        let largest = ProfileFields::from_value(&json!({ "headshotContainerSize": 1024 })).expect("coercion failed");
        assert_eq!(largest.framing.container_size, MAX_CONTAINER_SIZE);
    }

    #[test]
    fn non_object_input_is_rejected() {
        assert!(matches!(ProfileFields::from_json_str("[1,2]"), Err(ExportError::Config(_))));
        assert!(matches!(ProfileFields::from_json_str("{"), Err(ExportError::Config(_))));
    }
}
