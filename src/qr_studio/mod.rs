//! # 二维码工作室模块（qr_studio）
//!
//! ## 设计思路
//!
//! 把“生成二维码 → 等待渲染 → 叠加 Logo → 带样式导出”按职责拆分为多个子模块：
//!
//! - `renderer`：外部矩阵渲染器契约与基于 `qrcode` 的实现
//! - `surface`：渲染结果容器与生成周期令牌
//! - `acquirer`：按帧轮询等待画布就绪
//! - `loader`：Logo 上传校验与解码
//! - `compositor`：Logo 几何计算与叠加绘制
//! - `export`：实时样式、圆角裁剪导出与下载
//! - `handles/view`：元素句柄表与展示层边界
//! - `session`：弹窗状态机，编排以上全部
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! QrModal::open / upload_logo / remove_logo
//!    ↓
//! regenerate（领取新周期令牌，清空容器）
//!    ├─ MatrixRenderer::render（异步发布画布）
//!    └─ 有 Logo 时：acquire_surface → composite_logo → replace_if_current
//!    ↓
//! QrModal::download → export_image → offer_download（延迟释放）
//! ```

mod acquirer;
mod compositor;
mod config;
mod error;
mod export;
mod handles;
mod loader;
mod renderer;
mod session;
mod source;
mod surface;
mod view;

pub use acquirer::acquire_surface;
pub use compositor::{LogoGeometry, composite_logo};
pub use config::{ErrorCorrection, QrConfig, load_config_from_path};
pub use error::{QrError, UploadRejection};
pub use export::{
    DirectoryDownloadSink, DownloadSink, LiveStyle, ObjectUrl, apply_live_style, encode_png,
    export_image, offer_download, render_export,
};
pub use handles::{ElementHandle, ElementLookup, HandleTable, ModalElement, StaticPage};
pub use loader::LogoLoader;
pub use renderer::{MatrixRenderer, QrcodeRenderer, RenderRequest};
pub use session::{ClickEvent, ModalAction, ModalListener, ModalState, QrModal, SessionState};
pub use source::{DecodedImage, LogoUpload, RasterSurface, StyleParameters};
pub use surface::{GenerationCounter, GenerationToken, SurfaceContainer, SurfaceState};
pub use view::{ModalView, RecordingView, ViewOp};
