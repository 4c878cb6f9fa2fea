//! # 弹窗状态控制器
//!
//! ## 设计思路
//!
//! 状态机：Closed → Open(fresh) → Open(logo-loaded) ⇄ Open(fresh) → Closed。
//!
//! 会话状态（目标地址、已加载 Logo）由 `QrModal` 单独持有，每次 `open` 显式重置，
//! 不依赖全局变量。元素句柄在构造时查找一次，之后通过句柄表引用。
//!
//! ## 实现思路
//!
//! - 每次重新生成领取新的周期令牌并清空容器，再交给渲染器。
//! - 有 Logo 时启动后台叠加任务：等待画布 → 在快照上合成 → 仅当周期仍为最新时写回。
//!   旧周期的任务不取消，由令牌检查自然结束。
//! - 外部点击处理函数通过分发器注册，重复打开只替换，不叠加。

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::dashboard::EventDispatcher;

use super::{
    DecodedImage, DownloadSink, ElementHandle, ElementLookup, GenerationCounter, GenerationToken,
    HandleTable, LiveStyle, LogoGeometry, LogoLoader, LogoUpload, MatrixRenderer, ModalElement,
    ModalView, ObjectUrl, QrConfig, QrError, RenderRequest, StyleParameters, SurfaceContainer,
    acquire_surface, apply_live_style, composite_logo, export_image, offer_download,
};

/// 弹窗所处状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    Fresh,
    LogoLoaded,
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// 单次打开期间的会话状态。
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub target_url: String,
    pub logo: Option<DecodedImage>,
}

/// 弹窗上注册的监听器种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalListener {
    BackdropClick,
}

/// 点击事件：被点击的元素。
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub target: ElementHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    Close,
}

type OverlayTask = JoinHandle<Result<Option<LogoGeometry>, QrError>>;

/// 二维码弹窗控制器。
pub struct QrModal<R: MatrixRenderer, V: ModalView> {
    config: QrConfig,
    renderer: R,
    view: V,
    handles: HandleTable,
    container: SurfaceContainer,
    generations: GenerationCounter,
    listeners: EventDispatcher<ModalListener, ClickEvent, ModalAction>,
    state: ModalState,
    session: SessionState,
    style: StyleParameters,
    current_token: Option<GenerationToken>,
    pending_overlay: Option<OverlayTask>,
}

impl<R: MatrixRenderer, V: ModalView> QrModal<R, V> {
    pub fn new(
        config: QrConfig,
        renderer: R,
        view: V,
        lookup: &dyn ElementLookup,
    ) -> Result<Self, QrError> {
        config.validate()?;
        let handles = HandleTable::populate(lookup)?;

        Ok(Self {
            config,
            renderer,
            view,
            handles,
            container: SurfaceContainer::new(),
            generations: GenerationCounter::new(),
            listeners: EventDispatcher::new(),
            state: ModalState::Closed,
            session: SessionState::default(),
            style: StyleParameters::default(),
            current_token: None,
            pending_overlay: None,
        })
    }

    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn style(&self) -> StyleParameters {
        self.style
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn container(&self) -> &SurfaceContainer {
        &self.container
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn handle(&self, element: ModalElement) -> ElementHandle {
        self.handles.get(element).clone()
    }

    fn ensure_open(&self) -> Result<(), QrError> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(QrError::ModalClosed)
        }
    }

    /// 打开弹窗：重置会话、生成基础二维码、恢复默认样式、安装外部点击处理。
    pub fn open(&mut self, target_url: impl Into<String>) -> Result<(), QrError> {
        let target_url = target_url.into();
        log::info!("🔳 打开二维码弹窗：{}", target_url);

        self.session = SessionState {
            target_url,
            logo: None,
        };
        let url_display = self.handle(ModalElement::UrlDisplay);
        self.view.set_text(&url_display, &self.session.target_url);

        self.reset_logo_ui();
        self.regenerate()?;
        self.state = ModalState::Fresh;
        self.update_style(StyleParameters::default())?;

        let modal = self.handle(ModalElement::Modal);
        self.view.set_visible(&modal, true);

        let backdrop = modal.clone();
        self.listeners
            .register(ModalListener::BackdropClick, move |event: &ClickEvent| {
                (event.target == backdrop).then_some(ModalAction::Close)
            });

        Ok(())
    }

    /// 仅隐藏弹窗，会话在下次打开时重置。
    pub fn close(&mut self) {
        let modal = self.handle(ModalElement::Modal);
        self.view.set_visible(&modal, false);
        self.state = ModalState::Closed;
        log::debug!("🔳 二维码弹窗已关闭");
    }

    /// 把一次点击交给已注册的处理函数。
    pub fn handle_click(&mut self, target: &ElementHandle) -> Option<ModalAction> {
        let event = ClickEvent {
            target: target.clone(),
        };
        let action = self
            .listeners
            .dispatch(&ModalListener::BackdropClick, &event)?;
        match action {
            ModalAction::Close => self.close(),
        }
        Some(action)
    }

    /// 滑块变化：更新数值显示与容器样式。
    pub fn update_style(&mut self, params: StyleParameters) -> Result<LiveStyle, QrError> {
        self.ensure_open()?;
        let (clamped, live) = apply_live_style(params, &self.config);
        self.style = clamped;

        let padding_slider = self.handle(ModalElement::PaddingSlider);
        let radius_slider = self.handle(ModalElement::RadiusSlider);
        let padding_value = self.handle(ModalElement::PaddingValue);
        let radius_value = self.handle(ModalElement::RadiusValue);
        let container = self.handle(ModalElement::Container);
        self.view.set_slider(&padding_slider, clamped.padding_px);
        self.view.set_slider(&radius_slider, clamped.corner_radius_px);
        self.view.set_text(&padding_value, &live.padding_readout);
        self.view.set_text(&radius_value, &live.radius_readout);
        self.view.set_style(&container, "padding", &live.padding_css);
        self.view
            .set_style(&container, "border-radius", &live.border_radius_css);

        Ok(live)
    }

    /// 滑块输入事件：从两个滑块读取当前值后更新样式。读不到的滑块沿用当前值。
    pub fn on_slider_input(&mut self) -> Result<LiveStyle, QrError> {
        let padding_slider = self.handle(ModalElement::PaddingSlider);
        let radius_slider = self.handle(ModalElement::RadiusSlider);
        let params = StyleParameters::new(
            self.view
                .slider_value(&padding_slider)
                .unwrap_or(self.style.padding_px),
            self.view
                .slider_value(&radius_slider)
                .unwrap_or(self.style.corner_radius_px),
        );
        self.update_style(params)
    }

    /// 上传 Logo。校验失败时提示用户并清空文件输入框，会话状态不变。
    pub async fn upload_logo(&mut self, upload: LogoUpload) -> Result<(), QrError> {
        self.ensure_open()?;

        let loaded = LogoLoader::new(&self.config).load(upload).await;
        let logo = match loaded {
            Ok(logo) => logo,
            Err(err) => {
                let file_input = self.handle(ModalElement::FileInput);
                if let QrError::Validation(rejection) = &err {
                    self.view.alert(&rejection.to_string());
                } else {
                    log::error!("❌ Logo 解码失败：{}", err);
                }
                self.view.clear_file_input(&file_input);
                return Err(err);
            }
        };

        log::info!("🖼️ Logo 已加载：{}x{}", logo.width(), logo.height());
        let preview = self.handle(ModalElement::Preview);
        let remove_button = self.handle(ModalElement::RemoveButton);
        self.view.set_preview(&preview, Some(logo.preview_data_url()));
        self.view.set_visible(&remove_button, true);

        self.session.logo = Some(logo);
        self.state = ModalState::LogoLoaded;
        self.regenerate()
    }

    /// 移除 Logo 并重新生成不带 Logo 的二维码。
    pub fn remove_logo(&mut self) -> Result<(), QrError> {
        self.session.logo = None;
        self.reset_logo_ui();
        if self.state.is_open() {
            self.state = ModalState::Fresh;
        }
        if self.session.target_url.is_empty() {
            return Ok(());
        }
        self.regenerate()
    }

    fn reset_logo_ui(&mut self) {
        let file_input = self.handle(ModalElement::FileInput);
        let preview = self.handle(ModalElement::Preview);
        let remove_button = self.handle(ModalElement::RemoveButton);
        self.view.clear_file_input(&file_input);
        self.view.set_preview(&preview, None);
        self.view.set_visible(&remove_button, false);
    }

    /// 开启新的生成周期。有 Logo 时在后台等待画布并合成。
    pub fn regenerate(&mut self) -> Result<(), QrError> {
        let token = self.generations.advance();
        self.container.clear(token.id())?;

        let request = RenderRequest::from_config(self.session.target_url.clone(), &self.config)?;
        self.renderer.render(&self.container, token.id(), request);
        log::debug!("🔄 开始生成周期 {}", token.id());

        self.pending_overlay = match &self.session.logo {
            Some(logo) => {
                let handle = tokio::runtime::Handle::try_current().map_err(|_| {
                    QrError::Render("Logo 合成需要异步运行时".to_string())
                })?;
                Some(handle.spawn(overlay_cycle(
                    self.container.clone(),
                    token.clone(),
                    logo.clone(),
                    self.config.clone(),
                )))
            }
            None => None,
        };
        self.current_token = Some(token);
        Ok(())
    }

    /// 等待当前周期的 Logo 合成结束。超时或被取代时返回 `Ok(None)`。
    pub async fn settle(&mut self) -> Result<Option<LogoGeometry>, QrError> {
        let Some(task) = self.pending_overlay.take() else {
            return Ok(None);
        };

        let result = task
            .await
            .map_err(|e| QrError::Render(format!("合成任务执行失败：{}", e)))?;
        match result {
            Ok(geometry) => Ok(geometry),
            Err(err) if err.is_cycle_local() => {
                log::debug!("⏭️ 本周期合成已放弃：{}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// 导出当前画布并发起下载。
    pub async fn download(&mut self, sink: Arc<dyn DownloadSink>) -> Result<ObjectUrl, QrError> {
        self.ensure_open()?;
        self.settle().await?;

        let token = self
            .current_token
            .clone()
            .ok_or_else(|| QrError::Render("尚未生成二维码".to_string()))?;
        let surface = acquire_surface(&self.container, &token, &self.config).await?;
        let bytes = export_image(&surface, self.style)?;

        offer_download(
            sink,
            bytes,
            &self.config.download_filename,
            self.config.download_revoke_delay(),
        )
    }
}

/// 一个周期的 Logo 叠加：等待画布 → 快照上合成 → 周期仍为最新时写回。
async fn overlay_cycle(
    container: SurfaceContainer,
    token: GenerationToken,
    logo: DecodedImage,
    config: QrConfig,
) -> Result<Option<LogoGeometry>, QrError> {
    let mut surface = acquire_surface(&container, &token, &config).await?;
    let geometry = composite_logo(&mut surface, &logo, &config);
    container.replace_if_current(&token, surface)?;
    Ok(geometry)
}
