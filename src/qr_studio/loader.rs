//! # Logo 加载与校验模块
//!
//! ## 设计思路
//!
//! 上传的 Logo 在“尽可能早”的阶段校验：先看声明的 MIME 类型与文件体积，
//! 不通过则直接拒绝，不进入解码，也不改变会话状态。
//!
//! ## 实现思路
//!
//! 1. 声明类型必须以 `image/` 开头，体积不超过 2 MiB
//! 2. 通过文件签名（magic bytes）复核，防止扩展名/类型伪装
//! 3. 读取 header 尺寸，按像素与内存上限快速拒绝
//! 4. 在阻塞线程中完整解码，超大 Logo 用 `fast_image_resize` 预先降采样
//! 5. 转为预乘 alpha 的 `tiny-skia` 画布，并生成预览用 Data URL
//!
//! SVG（`image/svg+xml`）不经过位图解码器：用 `usvg` 解析后由 `resvg`
//! 直接栅格化到画布，长边对齐 `logo_max_dimension`。

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use fast_image_resize as fr;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba, RgbaImage};
use resvg::usvg;
use tiny_skia::{IntSize, Pixmap, Transform};

use super::{DecodedImage, LogoUpload, QrConfig, QrError, UploadRejection};

const SVG_MIME: &str = "image/svg+xml";

/// Logo 加载器，持有一次加载所用的配置快照。
pub struct LogoLoader<'a> {
    config: &'a QrConfig,
}

impl<'a> LogoLoader<'a> {
    pub fn new(config: &'a QrConfig) -> Self {
        Self { config }
    }

    /// 校验声明类型与体积。
    pub fn validate(&self, upload: &LogoUpload) -> Result<(), UploadRejection> {
        if !upload.mime_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(UploadRejection::NotAnImage {
                mime: upload.mime_type.clone(),
            });
        }

        if upload.size() > self.config.max_upload_bytes {
            return Err(UploadRejection::TooLarge {
                size: upload.size(),
                limit: self.config.max_upload_bytes,
            });
        }

        Self::validate_signature(&upload.bytes, Self::is_svg(upload))
    }

    /// 声明类型是否为 SVG（忽略大小写与参数部分）。
    fn is_svg(upload: &LogoUpload) -> bool {
        upload
            .mime_type
            .split(';')
            .next()
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(SVG_MIME))
    }

    /// 文件签名复核：能识别且不是图片时拒绝；无法识别时交给解码器判断。
    ///
    /// SVG 是文本格式，签名会被识别为 XML/HTML，此时放行给 SVG 解析器。
    fn validate_signature(bytes: &[u8], declared_svg: bool) -> Result<(), UploadRejection> {
        match infer::get(bytes) {
            Some(kind) if declared_svg && kind.matcher_type() == infer::MatcherType::Text => Ok(()),
            Some(kind) if kind.matcher_type() != infer::MatcherType::Image => {
                Err(UploadRejection::NotAnImage {
                    mime: kind.mime_type().to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// 校验并异步解码上传的 Logo。
    pub async fn load(&self, upload: LogoUpload) -> Result<DecodedImage, QrError> {
        self.validate(&upload)?;
        log::info!(
            "📁 开始解码 Logo - 文件: {} 类型: {} 体积: {}KB",
            upload.file_name,
            upload.mime_type,
            upload.size() / 1024
        );

        let config = self.config.clone();
        tokio::task::spawn_blocking(move || Self::decode_blocking(&upload, &config))
            .await
            .map_err(|e| QrError::Decode(format!("线程执行失败：{}", e)))?
    }

    /// 同步解码，供阻塞线程与测试使用。
    pub fn decode_blocking(upload: &LogoUpload, config: &QrConfig) -> Result<DecodedImage, QrError> {
        if Self::is_svg(upload) {
            return Self::rasterize_svg(upload, config);
        }

        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&upload.bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&upload.bytes)
            .map_err(|e| QrError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(QrError::Decode("图片尺寸为 0".to_string()));
        }
        Self::validate_pixel_limits(config, width, height)?;

        let drawable = Self::maybe_downscale(decoded, config.logo_max_dimension)?;
        let pixmap = rgba_to_pixmap(&drawable.to_rgba8())
            .ok_or_else(|| QrError::Decode("无法构建 Logo 画布".to_string()))?;

        log::info!(
            "✅ Logo 解码成功 - 原始尺寸: {}x{} 绘制尺寸: {}x{}",
            width,
            height,
            pixmap.width(),
            pixmap.height()
        );

        Ok(DecodedImage::new(width, height, pixmap, Self::preview_data_url(upload)))
    }

    /// 矢量 Logo：原始尺寸取 SVG 声明尺寸，绘制画布按长边 `logo_max_dimension` 栅格化。
    fn rasterize_svg(upload: &LogoUpload, config: &QrConfig) -> Result<DecodedImage, QrError> {
        let tree = usvg::Tree::from_data(&upload.bytes, &usvg::Options::default())
            .map_err(|e| QrError::Decode(format!("SVG 解析失败：{}", e)))?;

        let size = tree.size();
        let int_size = size.to_int_size();
        let (width, height) = (int_size.width(), int_size.height());

        let longest = size.width().max(size.height());
        let scale = if config.logo_max_dimension == 0 {
            1.0
        } else {
            config.logo_max_dimension as f32 / longest
        };
        let target_width = ((size.width() * scale).round() as u32).max(1);
        let target_height = ((size.height() * scale).round() as u32).max(1);
        Self::validate_pixel_limits(config, target_width, target_height)?;

        let mut pixmap = Pixmap::new(target_width, target_height)
            .ok_or_else(|| QrError::Decode("无法分配 SVG 画布".to_string()))?;
        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

        log::info!(
            "✅ SVG Logo 栅格化成功 - 声明尺寸: {}x{} 绘制尺寸: {}x{}",
            width,
            height,
            target_width,
            target_height
        );

        Ok(DecodedImage::new(width, height, pixmap, Self::preview_data_url(upload)))
    }

    fn preview_data_url(upload: &LogoUpload) -> String {
        format!(
            "data:{};base64,{}",
            upload.mime_type.trim(),
            general_purpose::STANDARD.encode(&upload.bytes)
        )
    }

    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), QrError> {
        image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| QrError::Decode(format!("无法识别图片格式：{}", e)))?
            .into_dimensions()
            .map_err(|e| QrError::Decode(format!("无法读取图片尺寸：{}", e)))
    }

    fn validate_pixel_limits(config: &QrConfig, width: u32, height: u32) -> Result<(), QrError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| QrError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(QrError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        let estimated = pixels
            .checked_mul(4)
            .ok_or_else(|| QrError::ResourceLimit("图片解码内存估算溢出".to_string()))?;
        if estimated > config.max_decoded_bytes {
            return Err(QrError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    /// 单边超过 `max_dimension` 时按比例降采样。
    ///
    /// 二维码中的 Logo 最终只占几十像素，保留原始分辨率只会拖慢每次合成。
    fn maybe_downscale(image: DynamicImage, max_dimension: u32) -> Result<DynamicImage, QrError> {
        let (width, height) = image.dimensions();
        if max_dimension == 0 || (width <= max_dimension && height <= max_dimension) {
            return Ok(image);
        }

        let scale = (max_dimension as f64 / width as f64).min(max_dimension as f64 / height as f64);
        let target_width = ((width as f64 * scale).round() as u32).max(1);
        let target_height = ((height as f64 * scale).round() as u32).max(1);

        log::info!(
            "🧩 Logo 降采样：{}x{} -> {}x{}",
            width,
            height,
            target_width,
            target_height
        );

        match Self::resize_with_fast_image_resize(&image, target_width, target_height) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::resize_exact：{}", err);
                Ok(image.resize_exact(
                    target_width,
                    target_height,
                    image::imageops::FilterType::Lanczos3,
                ))
            }
        }
    }

    fn resize_with_fast_image_resize(
        image: &DynamicImage,
        target_width: u32,
        target_height: u32,
    ) -> Result<DynamicImage, QrError> {
        let src = image.to_rgba8();
        let (src_width, src_height) = src.dimensions();

        let src_image =
            fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
                .map_err(|e| QrError::Decode(format!("构建源图像缓冲失败：{}", e)))?;
        let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3));
        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| QrError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

        let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
            target_width,
            target_height,
            dst_image.into_vec(),
        )
        .ok_or_else(|| QrError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))?;

        Ok(DynamicImage::ImageRgba8(rgba))
    }
}

/// 直通 RGBA → 预乘 alpha 的 `tiny-skia` 画布。
pub(crate) fn rgba_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let (width, height) = image.dimensions();
    let size = IntSize::from_wh(width, height)?;

    let mut data = Vec::with_capacity(image.as_raw().len());
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let premultiply = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        data.extend_from_slice(&[premultiply(r), premultiply(g), premultiply(b), a]);
    }

    Pixmap::from_vec(data, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, 200, 255])
        });
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn rejects_non_image_mime() {
        let config = QrConfig::default();
        let upload = LogoUpload::new("notes.txt", "text/plain", b"hello".to_vec());

        let result = LogoLoader::new(&config).validate(&upload);
        assert!(matches!(result, Err(UploadRejection::NotAnImage { .. })));
    }

    #[test]
    fn rejects_oversized_upload() {
        let config = QrConfig::default();
        let upload = LogoUpload::new("big.png", "image/png", vec![0u8; 2 * 1024 * 1024 + 1]);

        let result = LogoLoader::new(&config).validate(&upload);
        assert!(matches!(
            result,
            Err(UploadRejection::TooLarge { limit, .. }) if limit == 2 * 1024 * 1024
        ));
    }

    #[test]
    fn accepts_exactly_two_mebibytes() {
        let config = QrConfig::default();
        let mut bytes = png_bytes(4, 4);
        bytes.resize(2 * 1024 * 1024, 0);
        let upload = LogoUpload::new("edge.png", "image/png", bytes);

        assert!(LogoLoader::new(&config).validate(&upload).is_ok());
    }

    #[test]
    fn rejects_disguised_non_image_signature() {
        let config = QrConfig::default();
        // ZIP 签名伪装成 PNG
        let upload = LogoUpload::new("logo.png", "image/png", vec![0x50, 0x4B, 0x03, 0x04, 0, 0, 0, 0]);

        let result = LogoLoader::new(&config).validate(&upload);
        assert!(matches!(result, Err(UploadRejection::NotAnImage { mime }) if mime == "application/zip"));
    }

    #[test]
    fn decode_keeps_raw_dimensions_and_builds_preview() {
        let config = QrConfig::default();
        let upload = LogoUpload::new("logo.png", "image/png", png_bytes(100, 300));

        let decoded = LogoLoader::decode_blocking(&upload, &config).expect("decode should succeed");

        assert_eq!(decoded.width(), 100);
        assert_eq!(decoded.height(), 300);
        assert!(decoded.preview_data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn decode_downscales_large_logo_for_drawing_only() {
        let config = QrConfig::default();
        let upload = LogoUpload::new("wide.png", "image/png", png_bytes(2048, 1024));

        let decoded = LogoLoader::decode_blocking(&upload, &config).expect("decode should succeed");

        assert_eq!((decoded.width(), decoded.height()), (2048, 1024));
        assert_eq!(decoded.drawable().width(), 512);
        assert_eq!(decoded.drawable().height(), 256);
    }

    #[test]
    fn decode_rejects_garbage_bytes() {
        let config = QrConfig::default();
        let upload = LogoUpload::new("broken.png", "image/png", vec![1, 2, 3, 4, 5, 6]);

        let result = LogoLoader::decode_blocking(&upload, &config);
        assert!(matches!(result, Err(QrError::Decode(_))));
    }

    #[test]
    fn decode_rejects_too_many_pixels() {
        let mut config = QrConfig::default();
        config.max_decoded_pixels = 1_000;
        let upload = LogoUpload::new("logo.png", "image/png", png_bytes(100, 100));

        let result = LogoLoader::decode_blocking(&upload, &config);
        assert!(matches!(result, Err(QrError::ResourceLimit(_))));
    }

    const SVG_LOGO: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20" viewBox="0 0 40 20">
  <rect width="40" height="20" fill="#ff0000"/>
</svg>"##;

    #[test]
    fn accepts_svg_despite_xml_signature() {
        let config = QrConfig::default();
        let upload = LogoUpload::new("logo.svg", "image/svg+xml", SVG_LOGO.as_bytes().to_vec());

        assert!(LogoLoader::new(&config).validate(&upload).is_ok());
    }

    #[test]
    fn xml_declared_as_png_is_still_rejected() {
        let config = QrConfig::default();
        let upload = LogoUpload::new("logo.png", "image/png", SVG_LOGO.as_bytes().to_vec());

        let result = LogoLoader::new(&config).validate(&upload);
        assert!(matches!(result, Err(UploadRejection::NotAnImage { mime }) if mime == "text/xml"));
    }

    #[test]
    fn rasterizes_svg_logo() {
        let config = QrConfig::default();
        let upload = LogoUpload::new("logo.svg", "image/svg+xml", SVG_LOGO.as_bytes().to_vec());

        let decoded = LogoLoader::decode_blocking(&upload, &config).expect("svg should rasterize");

        assert_eq!((decoded.width(), decoded.height()), (40, 20));
        assert_eq!(decoded.drawable().width(), 512);
        assert_eq!(decoded.drawable().height(), 256);
        let center = decoded.drawable().pixel(256, 128).expect("center pixel");
        assert_eq!((center.red(), center.green(), center.blue(), center.alpha()), (255, 0, 0, 255));
        assert!(decoded.preview_data_url().starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn malformed_svg_is_a_decode_error() {
        let config = QrConfig::default();
        let upload = LogoUpload::new("logo.svg", "image/svg+xml", b"<svg".to_vec());

        let result = LogoLoader::decode_blocking(&upload, &config);
        assert!(matches!(result, Err(QrError::Decode(_))));
    }

    #[test]
    fn premultiplies_translucent_pixels() {
        let img = ImageBuffer::from_pixel(1, 1, Rgba([255, 100, 0, 128]));
        let pixmap = rgba_to_pixmap(&img).expect("pixmap should build");
        let pixel = pixmap.pixel(0, 0).expect("pixel exists");

        assert_eq!(pixel.alpha(), 128);
        assert_eq!(pixel.red(), 128);
        assert_eq!(pixel.green(), 50);
    }
}
