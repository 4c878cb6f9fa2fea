//! # 数据模型
//!
//! ## 设计思路
//!
//! 将“外部输入”和“流水线中间结果”解耦：
//! - `LogoUpload` 表示文件输入框给出的原始文件
//! - `DecodedImage` 表示解码完成、可直接绘制的 Logo
//! - `RasterSurface` 表示渲染器产出的画布
//! - `StyleParameters` 表示两个滑块的实时取值

use tiny_skia::Pixmap;

/// 文件输入框产出的单个文件。
#[derive(Debug, Clone)]
pub struct LogoUpload {
    /// 原始文件名（仅用于日志）。
    pub file_name: String,
    /// 浏览器声明的 MIME 类型。
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl LogoUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// 解码完成的 Logo。
///
/// 创建后不可变；新上传时整体替换，移除时整体丢弃。
#[derive(Debug, Clone)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    drawable: Pixmap,
    preview_data_url: String,
}

impl DecodedImage {
    /// `width`/`height` 为原始像素尺寸；`drawable` 可能已被降采样，仅用于绘制。
    pub(crate) fn new(width: u32, height: u32, drawable: Pixmap, preview_data_url: String) -> Self {
        Self {
            width,
            height,
            drawable,
            preview_data_url,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn drawable(&self) -> &Pixmap {
        &self.drawable
    }

    /// 预览用的 Data URL。
    pub fn preview_data_url(&self) -> &str {
        &self.preview_data_url
    }
}

/// 渲染器产出的画布及其绘制上下文。
///
/// 每次重新生成都会拿到一张新画布，不做长期持有。
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixmap: Pixmap,
}

impl RasterSurface {
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self { pixmap }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// 渲染器总是产出方形画布，取宽度作为边长。
    pub fn size(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }
}

/// 导出样式参数，来自两个范围滑块。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleParameters {
    pub padding_px: u32,
    pub corner_radius_px: u32,
}

impl StyleParameters {
    pub fn new(padding_px: u32, corner_radius_px: u32) -> Self {
        Self {
            padding_px,
            corner_radius_px,
        }
    }
}
