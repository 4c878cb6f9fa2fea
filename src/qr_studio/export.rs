//! # 样式与导出模块
//!
//! ## 设计思路
//!
//! 滑块拖动时只更新容器的内边距/圆角与数值显示，属于纯展示行为；
//! 点击下载时才真正生成导出图：在画布外加内边距，按圆角裁剪，再编码为 PNG。
//!
//! ## 实现思路
//!
//! - 圆角矩形由四条直边 + 四段二次曲线组成，先填充白色，再作为裁剪蒙版。
//!   二次曲线在角点处离边缘只有 `r/4`，半径不小于 4px 时四个角像素才完全透明；
//!   1~3px 的半径只能让角像素部分透明（抗锯齿覆盖）。
//! - 二维码画布以最近邻采样绘制到 `(padding, padding)`，保持模块边缘锐利。
//! - 下载通过 `DownloadSink` 抽象：创建临时对象地址 → 触发导航 → 延迟释放。
//!   立即释放可能让尚未开始的下载失效，因此释放放到定时任务里。

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use tiny_skia::{
    Color, FillRule, FilterQuality, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect,
    Transform,
};

use super::{QrConfig, QrError, RasterSurface, StyleParameters};

/// 滑块变化后应写回页面的样式与数值显示。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStyle {
    pub padding_css: String,
    pub border_radius_css: String,
    pub padding_readout: String,
    pub radius_readout: String,
}

/// 按滑块自身的上下限收敛参数并生成样式。
pub fn apply_live_style(params: StyleParameters, config: &QrConfig) -> (StyleParameters, LiveStyle) {
    let clamped = StyleParameters::new(
        params.padding_px.min(config.max_padding_px),
        params.corner_radius_px.min(config.max_corner_radius_px),
    );

    let style = LiveStyle {
        padding_css: format!("{}px", clamped.padding_px),
        border_radius_css: format!("{}px", clamped.corner_radius_px),
        padding_readout: clamped.padding_px.to_string(),
        radius_readout: clamped.corner_radius_px.to_string(),
    };

    (clamped, style)
}

/// 构建覆盖 `width × height` 的圆角矩形路径（二次曲线圆角）。
pub(crate) fn rounded_rect_path(width: f32, height: f32, radius: f32) -> Option<Path> {
    let r = radius.min(width / 2.0).min(height / 2.0);

    let mut pb = PathBuilder::new();
    pb.move_to(r, 0.0);
    pb.line_to(width - r, 0.0);
    pb.quad_to(width, 0.0, width, r);
    pb.line_to(width, height - r);
    pb.quad_to(width, height, width - r, height);
    pb.line_to(r, height);
    pb.quad_to(0.0, height, 0.0, height - r);
    pb.line_to(0.0, r);
    pb.quad_to(0.0, 0.0, r, 0.0);
    pb.close();
    pb.finish()
}

/// 生成带内边距与圆角的导出画布。
pub fn render_export(surface: &RasterSurface, params: StyleParameters) -> Result<Pixmap, QrError> {
    let padding = params.padding_px;
    let width = surface
        .width()
        .checked_add(padding.saturating_mul(2))
        .ok_or_else(|| QrError::ResourceLimit("导出尺寸溢出".to_string()))?;
    let height = surface
        .height()
        .checked_add(padding.saturating_mul(2))
        .ok_or_else(|| QrError::ResourceLimit("导出尺寸溢出".to_string()))?;

    let mut output = Pixmap::new(width, height)
        .ok_or_else(|| QrError::Encode(format!("无法分配导出画布：{}x{}", width, height)))?;

    let mut background = Paint::default();
    background.set_color(Color::WHITE);
    background.anti_alias = true;

    let clip = if params.corner_radius_px > 0 {
        let path = rounded_rect_path(width as f32, height as f32, params.corner_radius_px as f32)
            .ok_or_else(|| QrError::Encode("无法构建圆角路径".to_string()))?;
        output.fill_path(&path, &background, FillRule::Winding, Transform::identity(), None);

        let mut mask = Mask::new(width, height)
            .ok_or_else(|| QrError::Encode("无法分配裁剪蒙版".to_string()))?;
        mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
        Some(mask)
    } else {
        let rect = Rect::from_xywh(0.0, 0.0, width as f32, height as f32)
            .ok_or_else(|| QrError::Encode("无法构建背景矩形".to_string()))?;
        output.fill_rect(rect, &background, Transform::identity(), None);
        None
    };

    let paint = PixmapPaint {
        quality: FilterQuality::Nearest,
        ..PixmapPaint::default()
    };
    output.draw_pixmap(
        padding as i32,
        padding as i32,
        surface.pixmap().as_ref(),
        &paint,
        Transform::identity(),
        clip.as_ref(),
    );

    Ok(output)
}

/// 将预乘画布编码为 PNG。
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, QrError> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            &rgba,
            pixmap.width(),
            pixmap.height(),
            image::ColorType::Rgba8.into(),
        )
        .map_err(|e| QrError::Encode(format!("PNG 编码失败：{}", e)))?;
    Ok(buf)
}

/// 导出最终图片字节（PNG）。
pub fn export_image(surface: &RasterSurface, params: StyleParameters) -> Result<Vec<u8>, QrError> {
    let output = render_export(surface, params)?;
    let bytes = encode_png(&output)?;
    log::info!(
        "📦 导出二维码 - 尺寸 {}x{} 内边距 {} 圆角 {} 体积 {}KB",
        output.width(),
        output.height(),
        params.padding_px,
        params.corner_radius_px,
        bytes.len() / 1024
    );
    Ok(bytes)
}

/// 临时对象地址（相当于浏览器中的 object URL）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(pub String);

/// 下载副作用的承接方。
pub trait DownloadSink: Send + Sync {
    fn create_object_url(&self, bytes: Vec<u8>, mime_type: &str) -> Result<ObjectUrl, QrError>;
    /// 以指定文件名发起下载导航。
    fn navigate(&self, url: &ObjectUrl, filename: &str) -> Result<(), QrError>;
    fn revoke(&self, url: &ObjectUrl);
}

/// 发起下载，并在 `revoke_delay` 后释放临时地址。
pub fn offer_download(
    sink: Arc<dyn DownloadSink>,
    bytes: Vec<u8>,
    filename: &str,
    revoke_delay: Duration,
) -> Result<ObjectUrl, QrError> {
    let url = sink.create_object_url(bytes, "image/png")?;
    if let Err(err) = sink.navigate(&url, filename) {
        sink.revoke(&url);
        return Err(err);
    }
    log::info!("⬇️ 已发起下载：{}", filename);

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let pending = url.clone();
            handle.spawn(async move {
                tokio::time::sleep(revoke_delay).await;
                sink.revoke(&pending);
                log::debug!("🧹 已释放下载地址：{}", pending.0);
            });
        }
        Err(_) => {
            // 无运行时时导航已同步完成
            sink.revoke(&url);
        }
    }

    Ok(url)
}

/// 把下载落盘到指定目录的实现，供命令行与测试使用。
#[derive(Debug)]
pub struct DirectoryDownloadSink {
    dir: PathBuf,
    next_id: AtomicU64,
    objects: Mutex<HashMap<ObjectUrl, Vec<u8>>>,
}

impl DirectoryDownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_id: AtomicU64::new(1),
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// 地址是否仍未释放。
    pub fn is_live(&self, url: &ObjectUrl) -> bool {
        self.objects
            .lock()
            .map(|objects| objects.contains_key(url))
            .unwrap_or(false)
    }
}

impl DownloadSink for DirectoryDownloadSink {
    fn create_object_url(&self, bytes: Vec<u8>, mime_type: &str) -> Result<ObjectUrl, QrError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let url = ObjectUrl(format!("blob:shortlink-studio/{}?type={}", id, mime_type));
        self.objects
            .lock()
            .map_err(|_| QrError::ResourceLimit("下载对象表锁已中毒".to_string()))?
            .insert(url.clone(), bytes);
        Ok(url)
    }

    fn navigate(&self, url: &ObjectUrl, filename: &str) -> Result<(), QrError> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| QrError::ResourceLimit("下载对象表锁已中毒".to_string()))?;
        let bytes = objects
            .get(url)
            .ok_or_else(|| QrError::Download(format!("下载地址已失效：{}", url.0)))?;

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| QrError::Download(format!("创建下载目录失败：{}", e)))?;
        std::fs::write(self.dir.join(filename), bytes)
            .map_err(|e| QrError::Download(format!("写入下载文件失败：{}", e)))
    }

    fn revoke(&self, url: &ObjectUrl) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.remove(url);
        }
    }
}
