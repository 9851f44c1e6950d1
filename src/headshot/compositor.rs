//! # 离线合成器
//!
//! ## 设计思路
//!
//! 把“源图 + 取景参数”压平为一张固定尺寸的 PNG，结果必须与 CSS 预览一致。
//! 合成器本身不保存任何状态：绘制表面在每次调用开始时申请，
//! 在任何退出路径（解码失败、编码失败、成功）上随作用域一起释放，不跨调用复用。
//!
//! ## 实现思路
//!
//! 1. 校验头信息尺寸 → 完整解码（失败即 `ImageLoad`）
//! 2. 表面像素数不超过 `max_decoded_pixels` 时申请全透明的 `size × size` 表面
//! 3. 按裁剪区域生成蒙版（方形不需要）
//! 4. 通过 [`map_geometry`] 计算绘制几何
//! 5. 以平移 + 缩放变换绘制源图，蒙版外像素被丢弃
//! 6. 反预乘后编码为 PNG（空输出即 `Encode`）
//!
//! 解码与绘制是 CPU 密集操作，放到阻塞线程中执行，避免阻塞 async 运行时。

use std::io::Cursor;
use std::time::Instant;

use bytes::Bytes;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GenericImageView, ImageEncoder, RgbaImage};
use tiny_skia::{ColorU8, FilterQuality, IntSize, Pixmap, PixmapPaint, Transform};

use super::clip::clip_region;
use super::framing::{DrawGeometry, map_geometry};
use super::{CompositedAsset, DecodedImage, FramingParameters, HeadshotConfig, SourceImage};
use crate::error::ExportError;

/// 离线合成器。
#[derive(Debug, Clone)]
pub struct Compositor {
    config: HeadshotConfig,
}

/// 单次合成独占的绘制表面。
///
/// 只在 [`Compositor::composite_blocking`] 内部存在，离开作用域即释放。
struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    fn acquire(size: u32) -> Result<Self, ExportError> {
        let pixmap = Pixmap::new(size, size).ok_or_else(|| {
            ExportError::InvalidFraming(format!("无法申请 {}x{} 的绘制表面", size, size))
        })?;
        Ok(Self { pixmap })
    }

    /// 反预乘并编码为 PNG。
    fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        let width = self.pixmap.width();
        let height = self.pixmap.height();

        let mut rgba = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(&rgba, width, height, ExtendedColorType::Rgba8)
            .map_err(|e| ExportError::Encode(format!("PNG 编码失败：{}", e)))?;

        if buf.is_empty() {
            return Err(ExportError::Encode("PNG 编码结果为空".to_string()));
        }
        Ok(buf)
    }
}

impl Compositor {
    pub fn new(config: HeadshotConfig) -> Self {
        Self { config }
    }

    /// 异步合成入口：在阻塞线程中完成解码、绘制与编码。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use signature_studio::headshot::{Compositor, FramingParameters, HeadshotConfig, SourceImage};
    ///
    /// # async fn demo(bytes: Vec<u8>) -> Result<(), signature_studio::error::ExportError> {
    /// let compositor = Compositor::new(HeadshotConfig::default());
    /// let source = SourceImage::from_bytes(bytes, "file");
    /// let asset = compositor.composite(&source, &FramingParameters::default()).await?;
    /// assert_eq!(asset.size, 130);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn composite(
        &self,
        source: &SourceImage,
        params: &FramingParameters,
    ) -> Result<CompositedAsset, ExportError> {
        let compositor = self.clone();
        let source = source.clone();
        let params = *params;

        tokio::task::spawn_blocking(move || compositor.composite_blocking(&source, &params))
            .await
            .map_err(|e| ExportError::Encode(format!("合成线程执行失败：{}", e)))?
    }

    /// 同步合成实现。
    pub fn composite_blocking(
        &self,
        source: &SourceImage,
        params: &FramingParameters,
    ) -> Result<CompositedAsset, ExportError> {
        params.validate()?;
        let started = Instant::now();

        let decoded = self.decode(source)?;
        let decode_elapsed = started.elapsed();

        self.validate_surface_limits(params.container_size)?;
        let mut surface = Surface::acquire(params.container_size)?;
        let mask = clip_region(params.container_size, params.shape)
            .to_mask(params.container_size, params.container_size);

        let geometry = map_geometry(decoded.width, decoded.height, params);
        let source_pixmap = premultiplied_pixmap(&decoded)?;
        let transform = draw_transform(&geometry, decoded.width, decoded.height);
        let paint = PixmapPaint {
            quality: filter_quality(&geometry, decoded.width, decoded.height),
            ..PixmapPaint::default()
        };

        surface
            .pixmap
            .draw_pixmap(0, 0, source_pixmap.as_ref(), &paint, transform, mask.as_ref());

        let png = surface.encode_png()?;

        log::info!(
            "🖼️ 头像合成完成 - 来源: {} 源图: {}x{} 输出: {}px {} 几何: x={} y={} w={} h={} decode={}ms total={}ms",
            source.source_hint,
            decoded.width,
            decoded.height,
            params.container_size,
            params.shape.as_str(),
            geometry.draw_x,
            geometry.draw_y,
            geometry.draw_width,
            geometry.draw_height,
            decode_elapsed.as_millis(),
            started.elapsed().as_millis()
        );

        Ok(CompositedAsset {
            size: params.container_size,
            shape: params.shape,
            png: Bytes::from(png),
        })
    }

    /// 校验头信息尺寸后完整解码。
    pub fn decode(&self, source: &SourceImage) -> Result<DecodedImage, ExportError> {
        let (header_width, header_height) = inspect_dimensions_from_memory(&source.bytes)?;
        self.validate_pixel_limits(header_width, header_height)?;

        let decoded = image::load_from_memory(&source.bytes)
            .map_err(|e| ExportError::ImageLoad(format!("图片解码失败：{}", e)))?;
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(ExportError::ImageLoad("图片尺寸为 0".to_string()));
        }
        self.validate_pixel_limits(width, height)?;

        Ok(DecodedImage {
            width,
            height,
            pixels: decoded.to_rgba8(),
        })
    }

    /// 绘制表面与蒙版都按边长平方申请内存，申请前先按像素上限拦截。
    fn validate_surface_limits(&self, size: u32) -> Result<(), ExportError> {
        let pixels = size as u64 * size as u64;
        if pixels > self.config.max_decoded_pixels {
            return Err(ExportError::InvalidFraming(format!(
                "绘制表面过大：{}x{}（限制：{} 像素）",
                size, size, self.config.max_decoded_pixels
            )));
        }
        Ok(())
    }

    fn validate_pixel_limits(&self, width: u32, height: u32) -> Result<(), ExportError> {
        let pixels = width as u64 * height as u64;
        if pixels > self.config.max_decoded_pixels {
            return Err(ExportError::ImageLoad(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, self.config.max_decoded_pixels
            )));
        }
        Ok(())
    }
}

/// 仅通过内存中的图片头信息读取宽高，用于在完整解码前做像素限制检查。
fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ExportError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ExportError::ImageLoad(format!("无法识别图片格式：{}", e)))?
        .into_dimensions()
        .map_err(|e| ExportError::ImageLoad(format!("无法读取图片尺寸：{}", e)))
}

/// tiny-skia 使用预乘 alpha，绘制前先转换。
fn premultiplied_pixmap(decoded: &DecodedImage) -> Result<Pixmap, ExportError> {
    let pixels: &RgbaImage = &decoded.pixels;
    let mut data = Vec::with_capacity(pixels.as_raw().len());
    for px in pixels.pixels() {
        let [r, g, b, a] = px.0;
        let c = ColorU8::from_rgba(r, g, b, a).premultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let size = IntSize::from_wh(decoded.width, decoded.height)
        .ok_or_else(|| ExportError::ImageLoad("图片尺寸无效".to_string()))?;
    Pixmap::from_vec(data, size).ok_or_else(|| ExportError::ImageLoad("构建源图像缓冲失败".to_string()))
}

/// 平移到绘制原点，再把源图缩放到绘制尺寸。
fn draw_transform(geometry: &DrawGeometry, source_width: u32, source_height: u32) -> Transform {
    let scale_x = (geometry.draw_width / source_width as f64) as f32;
    let scale_y = (geometry.draw_height / source_height as f64) as f32;
    Transform::from_translate(geometry.draw_x as f32, geometry.draw_y as f32).pre_scale(scale_x, scale_y)
}

/// 1:1 且落在整数像素上时逐像素拷贝，其余情况使用双三次插值。
fn filter_quality(geometry: &DrawGeometry, source_width: u32, source_height: u32) -> FilterQuality {
    let unscaled = geometry.draw_width == source_width as f64 && geometry.draw_height == source_height as f64;
    let aligned = geometry.draw_x.fract() == 0.0 && geometry.draw_y.fract() == 0.0;
    if unscaled && aligned {
        FilterQuality::Nearest
    } else {
        FilterQuality::Bicubic
    }
}
