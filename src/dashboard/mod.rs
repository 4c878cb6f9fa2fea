//! # 控制台交互模块（dashboard）
//!
//! 控制台页面上除二维码弹窗之外的交互：
//!
//! - `dispatcher`：单注册点的事件分发器（二维码弹窗也复用）
//! - `transport`：局部刷新生命周期事件 → 页面变更
//! - `markup`：错误提示片段与 HTML 转义
//! - `timestamps`：本地化时间显示
//! - `clipboard`：复制短链接（异步写入 + 同步回退）
//! - `links`：删除短链接

mod clipboard;
mod dispatcher;
mod links;
mod markup;
mod timestamps;
mod transport;

pub use clipboard::{
    AsyncClipboard, COPIED_CLASS, COPIED_FEEDBACK, COPIED_LABEL, ClipboardError, CopyButton, CopyOutcome,
    CopyPath, FallbackCopier, SystemClipboard, TransientInput, copy_link, link_url,
};
pub use dispatcher::{EventDispatcher, Handler};
pub use links::{
    DELETE_FAILED_ALERT, DeleteOutcome, HttpLinkApi, LinkApi, LinkApiError, delete_confirmation,
    delete_link,
};
pub use markup::{error_message, error_message_text, escape_html};
pub use timestamps::{
    DEFAULT_FORMATTER, TimestampCell, TimestampDisplay, TimestampFormatter, format_timestamps,
    parse_timestamp,
};
pub use transport::{
    LINKS_CONTAINER, RESPONSE_MESSAGE, TransportDispatcher, TransportEvent, TransportEventKind,
    UiEffect, auth_dispatcher, dashboard_dispatcher, route,
};
