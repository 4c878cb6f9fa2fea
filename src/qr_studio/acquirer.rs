//! # 画布获取模块
//!
//! ## 设计思路
//!
//! 渲染器创建画布是异步的，且没有可直接等待的完成信号。这里按帧轮询容器，
//! 直到出现宽度非 0 的画布；超过帧数预算即判定超时，放弃本周期的合成。
//!
//! ## 实现思路
//!
//! - 使用 `tokio::time::interval` 以固定帧间隔检查，不做退避。
//! - 每帧先检查生成周期令牌，被取代时立即结束，不再继续占用帧。
//! - 超时只记录日志并返回 `QrError::Timeout`，由调用方静默丢弃。

use tokio::time::{MissedTickBehavior, interval};

use super::{GenerationToken, QrConfig, QrError, RasterSurface, SurfaceContainer};

/// 等待渲染器产出可用画布。
///
/// 首次检查立即进行，之后每帧一次；共检查 `acquire_max_frames + 1` 次。
pub async fn acquire_surface(
    container: &SurfaceContainer,
    token: &GenerationToken,
    config: &QrConfig,
) -> Result<RasterSurface, QrError> {
    let max_frames = config.acquire_max_frames;
    let mut ticker = interval(config.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for frame in 0..=max_frames {
        ticker.tick().await;
        token.ensure_current()?;

        if let Some(surface) = container.ready_surface()? {
            log::debug!(
                "🖼️ 画布就绪 - 周期 {} 第 {} 帧 尺寸 {}x{}",
                token.id(),
                frame,
                surface.width(),
                surface.height()
            );
            return Ok(surface);
        }
    }

    log::error!(
        "❌ 二维码画布在 {} 帧内未完成渲染（周期 {}）",
        max_frames,
        token.id()
    );
    Err(QrError::Timeout { frames: max_frames })
}
