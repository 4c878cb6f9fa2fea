//! # 复制短链接
//!
//! ## 设计思路
//!
//! 先走异步剪贴板写入；被拒绝或不可用时，退回到同步的“临时输入框选中复制”；
//! 两条路径都失败才弹出阻塞提示，让用户手动复制。
//!
//! ## 实现思路
//!
//! - `AsyncClipboard` / `FallbackCopier` 两个 trait 隔离平台能力，测试可注入失败。
//! - `SystemClipboard` 基于 `arboard`：异步写入放到阻塞线程；同步回退在当前线程
//!   打开新的剪贴板句柄写入，再回读确认，回读结果即“复制命令是否成功”。
//! - 成功后按钮显示 `Copied!`，2 秒后恢复原文案，由 `CopyButton` 记录状态。

use std::future::Future;
use std::time::Duration;

/// 复制成功后的按钮提示时长。
pub const COPIED_FEEDBACK: Duration = Duration::from_secs(2);
pub const COPIED_LABEL: &str = "Copied!";
pub const COPIED_CLASS: &str = "copied";

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("剪贴板不可用：{0}")]
    Unavailable(String),

    #[error("剪贴板写入被拒绝：{0}")]
    Rejected(String),
}

/// 异步剪贴板写入。
pub trait AsyncClipboard {
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>> + Send;
}

/// 同步回退：把值放进屏幕外的临时输入框，选中后执行复制。
pub trait FallbackCopier {
    /// 返回复制命令是否成功。
    fn copy_via(&self, input: &TransientInput) -> Result<bool, ClipboardError>;
}

/// 回退复制用的临时输入框：固定定位、完全透明。
///
/// `position` / `opacity` 供页面宿主创建元素时使用；桌面实现只读取 `value`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientInput {
    pub value: String,
    pub position: &'static str,
    pub opacity: &'static str,
}

impl TransientInput {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            position: "fixed",
            opacity: "0",
        }
    }
}

/// 复制所走的路径。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPath {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied { url: String, via: CopyPath },
    /// 两条路径都失败，需要阻塞提示。
    ManualCopy { url: String, alert: String },
}

/// 短链接的完整地址。
pub fn link_url(origin: &str, slug: &str) -> String {
    format!("{}/{}", origin.trim_end_matches('/'), slug)
}

/// 复制 `origin/slug`。`primary` 为 `None` 表示异步剪贴板不可用。
pub async fn copy_link<P, F>(
    origin: &str,
    slug: &str,
    primary: Option<&P>,
    fallback: &F,
) -> CopyOutcome
where
    P: AsyncClipboard,
    F: FallbackCopier,
{
    let url = link_url(origin, slug);

    match primary {
        Some(clipboard) => match clipboard.write_text(&url).await {
            Ok(()) => {
                log::info!("📋 已复制链接：{}", url);
                return CopyOutcome::Copied {
                    url,
                    via: CopyPath::Primary,
                };
            }
            Err(err) => log::error!("❌ 复制失败，尝试回退方案：{}", err),
        },
        None => log::debug!("📋 异步剪贴板不可用，直接使用回退方案"),
    }

    match fallback.copy_via(&TransientInput::new(url.clone())) {
        Ok(true) => {
            log::info!("📋 已通过回退方案复制链接：{}", url);
            return CopyOutcome::Copied {
                url,
                via: CopyPath::Fallback,
            };
        }
        Ok(false) => log::warn!("⚠️ 回退复制命令未生效"),
        Err(err) => log::error!("❌ 回退复制失败：{}", err),
    }

    let alert = format!("Failed to copy to clipboard. Please copy manually: {}", url);
    CopyOutcome::ManualCopy { url, alert }
}

/// 复制按钮的展示状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyButton {
    pub text: String,
    pub copied: bool,
    original: Option<String>,
}

impl CopyButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            copied: false,
            original: None,
        }
    }

    /// 切换为 `Copied!`，记住原文案。
    pub fn show_copied(&mut self) {
        if self.original.is_none() {
            self.original = Some(std::mem::replace(&mut self.text, COPIED_LABEL.to_string()));
        }
        self.copied = true;
    }

    pub fn restore(&mut self) {
        if let Some(original) = self.original.take() {
            self.text = original;
        }
        self.copied = false;
    }

    /// 显示 `Copied!`，等待提示时长后恢复。
    pub async fn flash(&mut self) {
        self.show_copied();
        tokio::time::sleep(COPIED_FEEDBACK).await;
        self.restore();
    }
}

/// 基于 `arboard` 的系统剪贴板。
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    fn set_text_blocking(text: String) -> Result<(), ClipboardError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::Rejected(e.to_string()))
    }
}

impl AsyncClipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>> + Send {
        let text = text.to_string();
        async move {
            tokio::task::spawn_blocking(move || Self::set_text_blocking(text))
                .await
                .map_err(|e| ClipboardError::Unavailable(format!("线程执行失败：{}", e)))?
        }
    }
}

impl FallbackCopier for SystemClipboard {
    fn copy_via(&self, input: &TransientInput) -> Result<bool, ClipboardError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set()
            .text(input.value.as_str())
            .map_err(|e| ClipboardError::Rejected(e.to_string()))?;
        Ok(confirm_copied(clipboard.get_text(), &input.value))
    }
}

/// 回读结果与期望值一致才算复制成功。
fn confirm_copied(read_back: Result<String, arboard::Error>, expected: &str) -> bool {
    match read_back {
        Ok(text) => text == expected,
        Err(err) => {
            log::warn!("⚠️ 剪贴板回读失败：{}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeClipboard {
        fail: bool,
        written: Mutex<Vec<String>>,
    }

    impl AsyncClipboard for FakeClipboard {
        fn write_text(
            &self,
            text: &str,
        ) -> impl Future<Output = Result<(), ClipboardError>> + Send {
            let result = if self.fail {
                Err(ClipboardError::Rejected("not allowed".into()))
            } else {
                self.written
                    .lock()
                    .expect("lock poisoned")
                    .push(text.to_string());
                Ok(())
            };
            async move { result }
        }
    }

    struct FakeFallback {
        result: Result<bool, ()>,
        seen: Mutex<Vec<TransientInput>>,
    }

    impl FakeFallback {
        fn new(result: Result<bool, ()>) -> Self {
            Self {
                result,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl FallbackCopier for FakeFallback {
        fn copy_via(&self, input: &TransientInput) -> Result<bool, ClipboardError> {
            self.seen.lock().expect("lock poisoned").push(input.clone());
            self.result
                .map_err(|_| ClipboardError::Unavailable("no document".into()))
        }
    }

    #[test]
    fn fallback_copy_is_confirmed_by_read_back() {
        assert!(confirm_copied(Ok("https://sho.rt/a".to_string()), "https://sho.rt/a"));
        assert!(!confirm_copied(Ok("something else".to_string()), "https://sho.rt/a"));
        assert!(!confirm_copied(Err(arboard::Error::ContentNotAvailable), "https://sho.rt/a"));
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let primary = FakeClipboard::default();
        let fallback = FakeFallback::new(Ok(true));

        let outcome = copy_link("https://sho.rt/", "abc", Some(&primary), &fallback).await;

        assert_eq!(
            outcome,
            CopyOutcome::Copied {
                url: "https://sho.rt/abc".to_string(),
                via: CopyPath::Primary
            }
        );
        assert!(fallback.seen.lock().expect("lock poisoned").is_empty());
    }

    #[tokio::test]
    async fn rejected_primary_falls_back_to_transient_input() {
        let primary = FakeClipboard {
            fail: true,
            ..Default::default()
        };
        let fallback = FakeFallback::new(Ok(true));

        let outcome = copy_link("https://sho.rt", "abc", Some(&primary), &fallback).await;

        assert!(matches!(
            outcome,
            CopyOutcome::Copied {
                via: CopyPath::Fallback,
                ..
            }
        ));
        let seen = fallback.seen.lock().expect("lock poisoned");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].position, "fixed");
        assert_eq!(seen[0].opacity, "0");
    }

    #[tokio::test]
    async fn both_paths_failing_yields_manual_copy_alert() {
        let fallback = FakeFallback::new(Ok(false));

        let outcome =
            copy_link::<FakeClipboard, _>("https://sho.rt", "xyz", None, &fallback).await;

        assert_eq!(
            outcome,
            CopyOutcome::ManualCopy {
                url: "https://sho.rt/xyz".to_string(),
                alert: "Failed to copy to clipboard. Please copy manually: https://sho.rt/xyz"
                    .to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn button_shows_copied_for_two_seconds() {
        let mut button = CopyButton::new("Copy");
        let started = tokio::time::Instant::now();

        button.flash().await;

        assert_eq!(started.elapsed(), COPIED_FEEDBACK);
        assert_eq!(button.text, "Copy");
        assert!(!button.copied);
    }

    #[test]
    fn repeated_show_keeps_original_label() {
        let mut button = CopyButton::new("Copy");
        button.show_copied();
        button.show_copied();
        assert_eq!(button.text, "Copied!");

        button.restore();
        assert_eq!(button.text, "Copy");
    }
}
