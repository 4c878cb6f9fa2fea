//! # 配置模块
//!
//! ## 设计思路
//!
//! 将二维码生成、Logo 合成、上传校验与导出下载的所有“可调常量”集中到 `QrConfig`，
//! 保证行为可观测、可调整、可测试。
//!
//! ## 实现思路
//!
//! - `Default` 提供与线上仪表盘一致的参数。
//! - `validate` 在加载外部配置后执行，拒绝明显不合理的组合。
//! - `load_config_from_path` 文件缺失或损坏时回退默认值，仅记录警告。

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::QrError;

/// 纠错等级，对应渲染器的 `correctLevel`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCorrection {
    Low,
    Medium,
    Quartile,
    High,
}

impl From<ErrorCorrection> for qrcode::EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::Low => qrcode::EcLevel::L,
            ErrorCorrection::Medium => qrcode::EcLevel::M,
            ErrorCorrection::Quartile => qrcode::EcLevel::Q,
            ErrorCorrection::High => qrcode::EcLevel::H,
        }
    }
}

/// 二维码工作室配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// 渲染画布边长（像素），宽高一致。
    pub surface_size: u32,
    /// 深色模块颜色（`#rrggbb`）。
    pub color_dark: String,
    /// 浅色背景颜色（`#rrggbb`）。
    pub color_light: String,
    pub error_correction: ErrorCorrection,
    /// Logo 最大占位比例（相对画布边长）。
    pub logo_footprint_ratio: f64,
    /// 长宽比超过该阈值视为“强矩形” Logo。
    pub logo_boost_threshold: f64,
    /// 超出阈值部分每单位长宽比带来的放大量。
    pub logo_boost_slope: f64,
    /// 放大系数上限。
    pub logo_boost_cap: f64,
    /// 背景圆盘在 Logo 对角线之外的额外边距（像素）。
    pub backdrop_margin: f64,
    /// 上传文件体积上限（字节）。
    pub max_upload_bytes: u64,
    /// 解码后像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// Logo 解码后保留的单边最大尺寸，超出时预先降采样。
    pub logo_max_dimension: u32,
    /// 等待渲染器产出画布的最大帧数。
    pub acquire_max_frames: u32,
    /// 帧间隔（毫秒），对应显示刷新节奏。
    pub frame_interval_ms: u64,
    /// 下载链接释放前的延迟（毫秒）。
    pub download_revoke_delay_ms: u64,
    /// 内边距滑块上限（像素）。
    pub max_padding_px: u32,
    /// 圆角滑块上限（像素）。
    pub max_corner_radius_px: u32,
    /// 导出文件名。
    pub download_filename: String,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            surface_size: 256,
            color_dark: "#000000".to_string(),
            color_light: "#ffffff".to_string(),
            error_correction: ErrorCorrection::High,
            logo_footprint_ratio: 0.3,
            logo_boost_threshold: 1.5,
            logo_boost_slope: 0.2,
            logo_boost_cap: 1.2,
            backdrop_margin: 6.0,
            max_upload_bytes: 2 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            logo_max_dimension: 512,
            acquire_max_frames: 60,
            frame_interval_ms: 16,
            download_revoke_delay_ms: 100,
            max_padding_px: 64,
            max_corner_radius_px: 64,
            download_filename: "qr-code.png".to_string(),
        }
    }
}

impl QrConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn download_revoke_delay(&self) -> Duration {
        Duration::from_millis(self.download_revoke_delay_ms)
    }

    /// 校验配置组合是否可用。
    pub fn validate(&self) -> Result<(), QrError> {
        if !(21..=4096).contains(&self.surface_size) {
            return Err(QrError::ResourceLimit(format!(
                "surface_size 必须在 21~4096 之间，当前 {}",
                self.surface_size
            )));
        }
        if !(self.logo_footprint_ratio > 0.0 && self.logo_footprint_ratio <= 0.5) {
            return Err(QrError::ResourceLimit(
                "logo_footprint_ratio 必须在 (0, 0.5] 区间".to_string(),
            ));
        }
        if self.logo_boost_cap < 1.0 || self.logo_boost_slope < 0.0 || self.logo_boost_threshold < 1.0 {
            return Err(QrError::ResourceLimit("Logo 放大参数不合法".to_string()));
        }
        if self.backdrop_margin < 0.0 {
            return Err(QrError::ResourceLimit("backdrop_margin 不能为负".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(QrError::ResourceLimit("max_upload_bytes 不能为 0".to_string()));
        }
        if self.acquire_max_frames == 0 || !(1..=1_000).contains(&self.frame_interval_ms) {
            return Err(QrError::ResourceLimit("画布等待参数不合法".to_string()));
        }
        if self.download_filename.trim().is_empty() {
            return Err(QrError::ResourceLimit("download_filename 不能为空".to_string()));
        }
        parse_hex_color(&self.color_dark)?;
        parse_hex_color(&self.color_light)?;
        Ok(())
    }
}

/// 解析 `#rrggbb` 颜色。
pub(crate) fn parse_hex_color(value: &str) -> Result<[u8; 3], QrError> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(QrError::ResourceLimit(format!("无法识别的颜色：{}", value)));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|_| QrError::ResourceLimit(format!("无法识别的颜色：{}", value)))
    };

    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

/// 从 JSON 文件加载配置，缺失或损坏时回退默认值。
pub fn load_config_from_path(path: &Path) -> QrConfig {
    if !path.exists() {
        return QrConfig::default();
    }

    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str::<QrConfig>(&content).map_err(|e| e.to_string()));

    match parsed {
        Ok(config) => match config.validate() {
            Ok(()) => config,
            Err(err) => {
                log::warn!("⚠️ 配置文件参数不合法，使用默认配置：{}", err);
                QrConfig::default()
            }
        },
        Err(err) => {
            log::warn!("⚠️ 读取配置文件失败，使用默认配置：{}", err);
            QrConfig::default()
        }
    }
}
