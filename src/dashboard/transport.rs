//! # 局部刷新事件处理
//!
//! ## 设计思路
//!
//! 局部刷新层被视为单一事件源：每个生命周期事件携带状态码、目标容器、成功标志，
//! 失败时还有响应正文。这里把事件翻译成 `UiEffect`，不直接操作页面。
//!
//! - 登录/注册页（`auth_dispatcher`）：≥300 的响应照常替换内容；<300 跳转到控制台；
//!   其余情况在目标容器或 `#response-message` 中渲染错误提示。
//! - 控制台（`dashboard_dispatcher`）：创建链接表单的结果提示、链接列表的
//!   超时/401/5xx 提示，以及列表刷新后的时间格式化。

use std::time::Duration;

use super::EventDispatcher;
use super::markup::{error_message, error_message_text};

pub const LINKS_CONTAINER: &str = "links-container";
pub const RESPONSE_MESSAGE: &str = "response-message";
pub const CREATE_RESPONSE: &str = "create-response";
pub const CREATE_LINK_FORM_CLASS: &str = "create-link-form";
pub const DASHBOARD_PATH: &str = "/dashboard";

const CREATE_SUCCESS_TEXT: &str = "Link created successfully!";
const CREATE_FAILURE_TEXT: &str = "Failed to create link. Please check your inputs and try again.";
const CREATE_MESSAGE_LIFETIME: Duration = Duration::from_secs(5);

const LINKS_TIMEOUT_HTML: &str = "Request timed out. Please <a href=\"#\" onclick=\"htmx.trigger('#links-container', 'refreshLinks'); return false;\">try again</a> or refresh the page.";
const LINKS_SESSION_EXPIRED_HTML: &str =
    "Session expired. Please <a href='/login'>log in again</a>.";
const LINKS_SERVER_ERROR_HTML: &str = "Server error. Please try again later.";
const LINKS_GENERIC_ERROR_HTML: &str = "Failed to load links.";

const AUTH_GENERIC_ERROR_TEXT: &str = "An error occurred. Please try again.";
const AUTH_SEND_ERROR_TEXT: &str = "Failed to send request. Please check your connection.";

/// 生命周期事件种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportEventKind {
    BeforeSwap,
    AfterSwap,
    AfterRequest,
    ResponseError,
    SendError,
    Timeout,
}

/// 一次生命周期通知。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub kind: TransportEventKind,
    /// HTTP 状态码；没有收到响应时为 0。
    pub status: u16,
    pub target_id: String,
    /// 发起请求的元素所带的 class。
    pub source_classes: Vec<String>,
    pub successful: bool,
    pub response_body: Option<String>,
    /// 替换后目标容器的文本内容（`AfterSwap` 使用）。
    pub target_text: Option<String>,
}

impl TransportEvent {
    pub fn new(kind: TransportEventKind, target_id: impl Into<String>) -> Self {
        Self {
            kind,
            status: 0,
            target_id: target_id.into(),
            source_classes: Vec::new(),
            successful: false,
            response_body: None,
            target_text: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self.successful = (200..300).contains(&status);
        self
    }

    pub fn with_source_class(mut self, class: impl Into<String>) -> Self {
        self.source_classes.push(class.into());
        self
    }

    pub fn with_response_body(mut self, body: impl Into<String>) -> Self {
        self.response_body = Some(body.into());
        self
    }

    pub fn with_target_text(mut self, text: impl Into<String>) -> Self {
        self.target_text = Some(text.into());
        self
    }

    fn source_has_class(&self, class: &str) -> bool {
        self.source_classes.iter().any(|c| c == class)
    }
}

/// 处理事件后需要执行的页面变更。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// 覆盖局部刷新层的替换决策。
    Swap { should_swap: bool, is_error: bool },
    Redirect(String),
    ReplaceHtml { target: String, html: String },
    SetClass { target: String, class: String },
    SetText { target: String, text: String },
    ClearValue { target: String },
    HideAfter { target: String, delay: Duration },
    /// 在目标上触发自定义事件（例如刷新链接列表）。
    Trigger { target: String, event: String },
    FormatTimestamps,
}

impl UiEffect {
    /// 重新加载链接列表。
    pub fn refresh_links() -> Self {
        Self::Trigger {
            target: format!("#{}", LINKS_CONTAINER),
            event: "refreshLinks".to_string(),
        }
    }
}

pub type TransportDispatcher = EventDispatcher<TransportEventKind, TransportEvent, Vec<UiEffect>>;

/// 把事件交给对应的处理函数；未处理时返回空列表。
pub fn route(dispatcher: &TransportDispatcher, event: &TransportEvent) -> Vec<UiEffect> {
    dispatcher.dispatch(&event.kind, event).unwrap_or_default()
}

/// 登录/注册页的事件处理。
pub fn auth_dispatcher() -> TransportDispatcher {
    let mut dispatcher = TransportDispatcher::new();

    dispatcher.register(TransportEventKind::BeforeSwap, |event| {
        (event.status >= 300).then(|| {
            vec![UiEffect::Swap {
                should_swap: true,
                is_error: false,
            }]
        })
    });

    dispatcher.register(TransportEventKind::AfterSwap, |event| {
        if event.status < 300 {
            log::info!("✅ 认证成功，跳转到 {}", DASHBOARD_PATH);
            return Some(vec![UiEffect::Redirect(DASHBOARD_PATH.to_string())]);
        }
        let text = event.target_text.as_deref().unwrap_or_default();
        Some(vec![UiEffect::ReplaceHtml {
            target: event.target_id.clone(),
            html: error_message_text(text),
        }])
    });

    dispatcher.register(TransportEventKind::ResponseError, |event| {
        let html = match event.response_body.as_deref().map(str::trim) {
            Some(body) if !body.is_empty() => error_message_text(body),
            _ => error_message(AUTH_GENERIC_ERROR_TEXT),
        };
        log::warn!("⚠️ 认证请求返回错误状态 {}", event.status);
        Some(vec![UiEffect::ReplaceHtml {
            target: RESPONSE_MESSAGE.to_string(),
            html,
        }])
    });

    dispatcher.register(TransportEventKind::SendError, |_| {
        log::warn!("⚠️ 认证请求未能发出");
        Some(vec![UiEffect::ReplaceHtml {
            target: RESPONSE_MESSAGE.to_string(),
            html: error_message(AUTH_SEND_ERROR_TEXT),
        }])
    });

    dispatcher
}

/// 控制台页的事件处理。
pub fn dashboard_dispatcher() -> TransportDispatcher {
    let mut dispatcher = TransportDispatcher::new();

    dispatcher.register(TransportEventKind::AfterRequest, |event| {
        let mut effects = Vec::new();

        if event.source_has_class(CREATE_LINK_FORM_CLASS) {
            let target = CREATE_RESPONSE.to_string();
            if event.successful {
                effects.push(UiEffect::SetClass {
                    target: target.clone(),
                    class: "response-message success".to_string(),
                });
                effects.push(UiEffect::SetText {
                    target: target.clone(),
                    text: CREATE_SUCCESS_TEXT.to_string(),
                });
                effects.push(UiEffect::ClearValue {
                    target: "slug".to_string(),
                });
                effects.push(UiEffect::ClearValue {
                    target: "url".to_string(),
                });
            } else {
                effects.push(UiEffect::SetClass {
                    target: target.clone(),
                    class: "response-message error".to_string(),
                });
                effects.push(UiEffect::SetText {
                    target: target.clone(),
                    text: CREATE_FAILURE_TEXT.to_string(),
                });
            }
            effects.push(UiEffect::HideAfter {
                target,
                delay: CREATE_MESSAGE_LIFETIME,
            });
        }

        if event.target_id == LINKS_CONTAINER {
            effects.push(UiEffect::FormatTimestamps);
        }

        (!effects.is_empty()).then_some(effects)
    });

    dispatcher.register(TransportEventKind::Timeout, |event| {
        (event.target_id == LINKS_CONTAINER).then(|| {
            log::warn!("⏱️ 链接列表加载超时");
            vec![UiEffect::ReplaceHtml {
                target: LINKS_CONTAINER.to_string(),
                html: error_message(LINKS_TIMEOUT_HTML),
            }]
        })
    });

    dispatcher.register(TransportEventKind::ResponseError, |event| {
        if event.target_id != LINKS_CONTAINER {
            return None;
        }
        let message = match event.status {
            401 => LINKS_SESSION_EXPIRED_HTML,
            s if s >= 500 => LINKS_SERVER_ERROR_HTML,
            _ => LINKS_GENERIC_ERROR_HTML,
        };
        log::warn!("⚠️ 链接列表加载失败，状态 {}", event.status);
        Some(vec![UiEffect::ReplaceHtml {
            target: LINKS_CONTAINER.to_string(),
            html: error_message(message),
        }])
    });

    dispatcher
}
