//! # 画布容器与生成周期
//!
//! ## 设计思路
//!
//! 渲染器异步地把画布放进容器，合成器稍后再取出使用。两者之间没有直接的等待关系，
//! 若用户连续触发多次重新生成，旧周期的渲染结果或 Logo 叠加可能落到新画布上。
//!
//! ## 实现思路
//!
//! - `GenerationCounter` 单调递增，每次重新生成领取一个 `GenerationToken`。
//! - `SurfaceContainer` 记录当前期望的周期号，旧周期的 `publish` 直接丢弃。
//! - 合成在快照副本上进行，仅当周期仍为最新时才通过 `replace_if_current` 写回。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{QrError, RasterSurface};

/// 生成周期计数器。
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开启新周期，之前领取的所有令牌随即失效。
    pub fn advance(&self) -> GenerationToken {
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        GenerationToken {
            id,
            current: Arc::clone(&self.current),
        }
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

/// 某一生成周期的令牌。
#[derive(Debug, Clone)]
pub struct GenerationToken {
    id: u64,
    current: Arc<AtomicU64>,
}

impl GenerationToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.id
    }

    pub fn ensure_current(&self) -> Result<(), QrError> {
        let current = self.current.load(Ordering::SeqCst);
        if current == self.id {
            Ok(())
        } else {
            Err(QrError::Superseded {
                stale: self.id,
                current,
            })
        }
    }
}

/// 容器内画布的状态。
#[derive(Debug, Clone, Default)]
pub enum SurfaceState {
    /// 容器已清空，渲染器尚未插入画布。
    #[default]
    Empty,
    /// 画布已插入但尚未完成绘制（宽度为 0）。
    Pending,
    Ready(RasterSurface),
}

#[derive(Debug, Default)]
struct ContainerSlot {
    generation: u64,
    state: SurfaceState,
}

/// 渲染器输出的承载容器（相当于页面上的二维码容器元素）。
#[derive(Debug, Clone, Default)]
pub struct SurfaceContainer {
    inner: Arc<Mutex<ContainerSlot>>,
}

impl SurfaceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> Result<MutexGuard<'_, ContainerSlot>, QrError> {
        self.inner
            .lock()
            .map_err(|_| QrError::ResourceLimit("画布容器锁已中毒".to_string()))
    }

    /// 清空容器并声明新的期望周期。
    pub fn clear(&self, generation: u64) -> Result<(), QrError> {
        let mut slot = self.slot()?;
        slot.generation = generation;
        slot.state = SurfaceState::Empty;
        Ok(())
    }

    /// 渲染器插入了尚未绘制的画布。
    pub fn mark_pending(&self, generation: u64) -> Result<bool, QrError> {
        let mut slot = self.slot()?;
        if slot.generation != generation {
            return Ok(false);
        }
        slot.state = SurfaceState::Pending;
        Ok(true)
    }

    /// 渲染器发布完成的画布；周期不匹配时丢弃并返回 `false`。
    pub fn publish(&self, generation: u64, surface: RasterSurface) -> Result<bool, QrError> {
        let mut slot = self.slot()?;
        if slot.generation != generation {
            log::debug!(
                "⏭️ 丢弃过期画布：周期 {}（当前 {}）",
                generation,
                slot.generation
            );
            return Ok(false);
        }
        slot.state = SurfaceState::Ready(surface);
        Ok(true)
    }

    /// 返回可用画布的副本；宽度为 0 或未就绪时返回 `None`。
    pub fn ready_surface(&self) -> Result<Option<RasterSurface>, QrError> {
        let slot = self.slot()?;
        Ok(match &slot.state {
            SurfaceState::Ready(surface) if surface.width() > 0 => Some(surface.clone()),
            _ => None,
        })
    }

    /// 仅当令牌仍为最新周期时写回画布。
    pub fn replace_if_current(
        &self,
        token: &GenerationToken,
        surface: RasterSurface,
    ) -> Result<(), QrError> {
        let mut slot = self.slot()?;
        token.ensure_current()?;
        if slot.generation != token.id() {
            return Err(QrError::Superseded {
                stale: token.id(),
                current: slot.generation,
            });
        }
        slot.state = SurfaceState::Ready(surface);
        Ok(())
    }
}
