//! # 矩阵渲染器
//!
//! ## 设计思路
//!
//! 对核心流程而言渲染器是黑盒：给定文本与像素尺寸，异步地在容器中放入一张画布。
//! 核心只依赖 `MatrixRenderer` trait，测试可注入延迟、丢帧或永不完成的实现。
//!
//! ## 实现思路
//!
//! `QrcodeRenderer` 使用 `qrcode` 计算模块矩阵，在阻塞线程中把模块绘制到
//! `tiny-skia` 画布，再按生成周期发布到容器。无运行时上下文时退化为同步绘制。

use tiny_skia::{Pixmap, PremultipliedColorU8};

use super::config::parse_hex_color;
use super::{ErrorCorrection, QrConfig, QrError, RasterSurface, SurfaceContainer};

/// 一次渲染请求。
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub text: String,
    pub width: u32,
    pub height: u32,
    pub color_dark: [u8; 3],
    pub color_light: [u8; 3],
    pub error_correction: ErrorCorrection,
}

impl RenderRequest {
    pub fn from_config(text: impl Into<String>, config: &QrConfig) -> Result<Self, QrError> {
        Ok(Self {
            text: text.into(),
            width: config.surface_size,
            height: config.surface_size,
            color_dark: parse_hex_color(&config.color_dark)?,
            color_light: parse_hex_color(&config.color_light)?,
            error_correction: config.error_correction,
        })
    }
}

/// 外部二维码矩阵渲染器契约。
///
/// 实现方负责在之后的某个时刻调用 `container.publish(generation, ..)`；
/// 调用本方法本身不等待渲染完成。
pub trait MatrixRenderer: Send + Sync {
    fn render(&self, container: &SurfaceContainer, generation: u64, request: RenderRequest);
}

/// 基于 `qrcode` + `tiny-skia` 的生产渲染器。
#[derive(Debug, Clone, Copy, Default)]
pub struct QrcodeRenderer;

impl QrcodeRenderer {
    pub fn new() -> Self {
        Self
    }

    /// 同步计算矩阵并绘制画布。
    pub fn paint(request: &RenderRequest) -> Result<RasterSurface, QrError> {
        let code = qrcode::QrCode::with_error_correction_level(
            request.text.as_bytes(),
            request.error_correction.into(),
        )
        .map_err(|e| QrError::Render(format!("二维码编码失败：{}", e)))?;

        let modules = code.width() as u64;
        let colors = code.to_colors();

        let mut pixmap = Pixmap::new(request.width, request.height).ok_or_else(|| {
            QrError::Render(format!(
                "无法分配画布：{}x{}",
                request.width, request.height
            ))
        })?;

        let [dr, dg, db] = request.color_dark;
        let [lr, lg, lb] = request.color_light;
        let dark = PremultipliedColorU8::from_rgba(dr, dg, db, 255)
            .ok_or_else(|| QrError::Render("深色模块颜色无效".to_string()))?;
        let light = PremultipliedColorU8::from_rgba(lr, lg, lb, 255)
            .ok_or_else(|| QrError::Render("浅色背景颜色无效".to_string()))?;

        let width = request.width as u64;
        let height = request.height as u64;
        let pixels = pixmap.pixels_mut();
        for y in 0..height {
            let module_y = (y * modules / height) as usize;
            for x in 0..width {
                let module_x = (x * modules / width) as usize;
                let is_dark = colors
                    .get(module_y * modules as usize + module_x)
                    .is_some_and(|c| *c == qrcode::Color::Dark);
                pixels[(y * width + x) as usize] = if is_dark { dark } else { light };
            }
        }

        log::debug!(
            "🔳 二维码矩阵绘制完成 - 模块 {}x{} 画布 {}x{}",
            modules,
            modules,
            request.width,
            request.height
        );

        Ok(RasterSurface::from_pixmap(pixmap))
    }

    fn publish_result(
        container: &SurfaceContainer,
        generation: u64,
        result: Result<RasterSurface, QrError>,
    ) {
        match result {
            Ok(surface) => {
                if let Err(err) = container.publish(generation, surface) {
                    log::error!("❌ 发布二维码画布失败：{}", err);
                }
            }
            Err(err) => log::error!("❌ 二维码渲染失败（周期 {}）：{}", generation, err),
        }
    }
}

impl MatrixRenderer for QrcodeRenderer {
    fn render(&self, container: &SurfaceContainer, generation: u64, request: RenderRequest) {
        if let Err(err) = container.mark_pending(generation) {
            log::error!("❌ 标记画布状态失败：{}", err);
            return;
        }

        let container = container.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let result = tokio::task::spawn_blocking(move || Self::paint(&request))
                        .await
                        .map_err(|e| QrError::Render(format!("线程执行失败：{}", e)))
                        .and_then(|inner| inner);
                    Self::publish_result(&container, generation, result);
                });
            }
            Err(_) => {
                log::debug!("🧵 无异步运行时，同步绘制二维码");
                Self::publish_result(&container, generation, Self::paint(&request));
            }
        }
    }
}
