//! # Logo 合成模块
//!
//! ## 设计思路
//!
//! Logo 居中叠加在二维码画布上，下方垫一个纯白圆盘，保证中心区域的模块被完整遮住，
//! 依靠 H 级纠错仍可扫码。几何计算与绘制分离，几何部分可单独验证。
//!
//! ## 实现思路
//!
//! 1. 最大占位 = 画布边长 × 30%
//! 2. 保持长宽比：横向 Logo 约束宽度，其余约束高度
//! 3. 长宽比超过 1.5 的 Logo 按 `min(1.2, 1 + (ratio - 1.5) × 0.2)` 整体放大
//! 4. 圆盘半径 = 最大边 × √2 / 2 + 6
//! 5. 先画圆盘，再以双线性/双三次采样绘制 Logo

use tiny_skia::{Color, FillRule, FilterQuality, Paint, PathBuilder, PixmapPaint, Transform};

use super::{DecodedImage, QrConfig, RasterSurface};

/// Logo 在画布上的几何布局。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoGeometry {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
    /// 应用的放大系数（未放大时为 1）。
    pub boost: f64,
    pub backdrop_radius: f64,
}

impl LogoGeometry {
    /// 计算 Logo 尺寸与圆盘半径。
    ///
    /// 调用方保证 `logo_width`、`logo_height` 均不为 0。
    pub fn compute(
        surface_width: u32,
        surface_height: u32,
        logo_width: u32,
        logo_height: u32,
        config: &QrConfig,
    ) -> Self {
        let max_footprint = surface_width as f64 * config.logo_footprint_ratio;
        let logo_aspect = logo_width as f64 / logo_height as f64;

        let (mut width, mut height) = if logo_aspect > 1.0 {
            (max_footprint, max_footprint / logo_aspect)
        } else {
            (max_footprint * logo_aspect, max_footprint)
        };

        let aspect_ratio = logo_aspect.max(1.0 / logo_aspect);
        let threshold = config.logo_boost_threshold;
        let boost = if aspect_ratio > threshold {
            (1.0 + (aspect_ratio - threshold) * config.logo_boost_slope)
                .min(config.logo_boost_cap)
        } else {
            1.0
        };
        width *= boost;
        height *= boost;

        let backdrop_radius =
            (width.max(height) * std::f64::consts::SQRT_2) / 2.0 + config.backdrop_margin;

        Self {
            center_x: surface_width as f64 / 2.0,
            center_y: surface_height as f64 / 2.0,
            width,
            height,
            boost,
            backdrop_radius,
        }
    }

    /// Logo 左上角坐标。
    pub fn origin(&self) -> (f64, f64) {
        (self.center_x - self.width / 2.0, self.center_y - self.height / 2.0)
    }
}

/// 在画布上原地叠加 Logo，返回所用的几何布局。
///
/// 画布宽度为 0 时不做任何绘制。
pub fn composite_logo(
    surface: &mut RasterSurface,
    logo: &DecodedImage,
    config: &QrConfig,
) -> Option<LogoGeometry> {
    if surface.width() == 0 {
        log::warn!("⚠️ 画布尚未渲染，跳过 Logo 合成");
        return None;
    }

    let geometry = LogoGeometry::compute(
        surface.width(),
        surface.height(),
        logo.width(),
        logo.height(),
        config,
    );
    let pixmap = surface.pixmap_mut();

    let mut backdrop = Paint::default();
    backdrop.set_color(Color::WHITE);
    backdrop.anti_alias = true;
    if let Some(disc) = PathBuilder::from_circle(
        geometry.center_x as f32,
        geometry.center_y as f32,
        geometry.backdrop_radius as f32,
    ) {
        pixmap.fill_path(&disc, &backdrop, FillRule::Winding, Transform::identity(), None);
    }

    let drawable = logo.drawable();
    let scale_x = geometry.width as f32 / drawable.width() as f32;
    let scale_y = geometry.height as f32 / drawable.height() as f32;
    if !scale_x.is_finite() || !scale_y.is_finite() {
        log::warn!("⚠️ Logo 缩放比例异常，跳过绘制");
        return Some(geometry);
    }

    let (x, y) = geometry.origin();
    let paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(
        0,
        0,
        drawable.as_ref(),
        &paint,
        Transform::from_row(scale_x, 0.0, 0.0, scale_y, x as f32, y as f32),
        None,
    );

    log::debug!(
        "🎯 Logo 合成完成 - 尺寸 {:.2}x{:.2} 放大 {:.3} 圆盘半径 {:.2}",
        geometry.width,
        geometry.height,
        geometry.boost,
        geometry.backdrop_radius
    );

    Some(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr_studio::loader::rgba_to_pixmap;
    use image::{ImageBuffer, Rgba};
    use proptest::prelude::*;
    use tiny_skia::Pixmap;

    fn solid_logo(width: u32, height: u32, rgba: [u8; 4]) -> DecodedImage {
        let img = ImageBuffer::from_pixel(width, height, Rgba(rgba));
        let pixmap = rgba_to_pixmap(&img).expect("pixmap should build");
        DecodedImage::new(width, height, pixmap, String::new())
    }

    fn black_surface(size: u32) -> RasterSurface {
        let mut pixmap = Pixmap::new(size, size).expect("pixmap alloc failed");
        pixmap.fill(Color::BLACK);
        RasterSurface::from_pixmap(pixmap)
    }

    #[test]
    fn tall_logo_example_is_boosted_and_capped() {
        let geometry = LogoGeometry::compute(256, 256, 100, 300, &QrConfig::default());

        assert!((geometry.boost - 1.2).abs() < 1e-9);
        assert!((geometry.height - 92.16).abs() < 1e-9);
        assert!((geometry.width - 30.72).abs() < 1e-9);
        let expected_radius = 92.16 * std::f64::consts::SQRT_2 / 2.0 + 6.0;
        assert!((geometry.backdrop_radius - expected_radius).abs() < 1e-9);
    }

    #[test]
    fn square_logo_is_not_boosted() {
        let geometry = LogoGeometry::compute(256, 256, 64, 64, &QrConfig::default());

        assert_eq!(geometry.boost, 1.0);
        assert!((geometry.width - 76.8).abs() < 1e-9);
        assert!((geometry.height - 76.8).abs() < 1e-9);
        assert_eq!((geometry.center_x, geometry.center_y), (128.0, 128.0));
    }

    #[test]
    fn mildly_wide_logo_gets_partial_boost() {
        // 长宽比 2.0 → 放大 1.1
        let geometry = LogoGeometry::compute(200, 200, 400, 200, &QrConfig::default());

        assert!((geometry.boost - 1.1).abs() < 1e-9);
        assert!((geometry.width - 66.0).abs() < 1e-9);
        assert!((geometry.height - 33.0).abs() < 1e-9);
    }

    #[test]
    fn composite_draws_backdrop_and_logo() {
        let config = QrConfig::default();
        let mut surface = black_surface(256);
        let logo = solid_logo(40, 40, [255, 0, 0, 255]);

        let geometry = composite_logo(&mut surface, &logo, &config).expect("should composite");
        let pixmap = surface.pixmap();

        let center = pixmap.pixel(128, 128).expect("center pixel");
        assert_eq!((center.red(), center.green(), center.blue()), (255, 0, 0));

        // 圆盘内、Logo 外：白色
        let inside_disc = (128.0 + geometry.width / 2.0 + 3.0) as u32;
        let ring = pixmap.pixel(inside_disc, 128).expect("ring pixel");
        assert_eq!((ring.red(), ring.green(), ring.blue()), (255, 255, 255));

        // 圆盘外：保持原样
        let corner = pixmap.pixel(2, 2).expect("corner pixel");
        assert_eq!((corner.red(), corner.green(), corner.blue()), (0, 0, 0));
    }

    #[test]
    fn translucent_logo_shows_backdrop_through() {
        let config = QrConfig::default();
        let mut surface = black_surface(128);
        let logo = solid_logo(10, 10, [0, 0, 0, 0]);

        composite_logo(&mut surface, &logo, &config).expect("should composite");

        let center = surface.pixmap().pixel(64, 64).expect("center pixel");
        assert_eq!((center.red(), center.alpha()), (255, 255));
    }

    proptest! {
        #[test]
        fn logo_box_respects_footprint_and_aspect(
            logo_w in 1u32..4000,
            logo_h in 1u32..4000,
            size in 64u32..1024,
        ) {
            let config = QrConfig::default();
            let geometry = LogoGeometry::compute(size, size, logo_w, logo_h, &config);

            let footprint = 0.3 * size as f64;
            let area = geometry.width * geometry.height;
            prop_assert!(area <= footprint * footprint * 1.44 + 1e-6);
            prop_assert!(geometry.width.max(geometry.height) <= footprint * 1.2 + 1e-9);

            let expected_aspect = logo_w as f64 / logo_h as f64;
            let actual_aspect = geometry.width / geometry.height;
            prop_assert!((actual_aspect - expected_aspect).abs() <= expected_aspect * 1e-9);
        }

        #[test]
        fn backdrop_covers_logo_diagonal(
            logo_w in 1u32..4000,
            logo_h in 1u32..4000,
        ) {
            let geometry = LogoGeometry::compute(256, 256, logo_w, logo_h, &QrConfig::default());
            let half_diagonal = (geometry.width.powi(2) + geometry.height.powi(2)).sqrt() / 2.0;

            prop_assert!(geometry.backdrop_radius + 1e-9 >= half_diagonal + 6.0);
        }
    }
}
