//! # 删除短链接
//!
//! 先让用户确认，再调用后端 `POST /api/delete-link?slug=`。成功后刷新链接列表，
//! 失败（包括网络错误）统一提示 `Failed to delete link`。

use std::future::Future;
use std::time::Duration;

use super::UiEffect;

pub const DELETE_FAILED_ALERT: &str = "Failed to delete link";
const DELETE_PATH: &str = "/api/delete-link";

#[derive(Debug, thiserror::Error)]
pub enum LinkApiError {
    #[error("无效的服务地址：{0}")]
    InvalidBaseUrl(String),

    #[error("请求失败：{0}")]
    Network(String),

    #[error("服务返回状态 {0}")]
    Status(u16),
}

/// 后端链接管理接口。
pub trait LinkApi {
    fn delete_link(&self, slug: &str) -> impl Future<Output = Result<(), LinkApiError>> + Send;
}

/// 删除确认提示文案。
pub fn delete_confirmation(slug: &str) -> String {
    format!("Are you sure you want to delete the link \"{}\"?", slug)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// 用户取消，未发出请求。
    Cancelled,
    Deleted { refresh: UiEffect },
    Failed { alert: String },
}

/// 确认后删除链接。`confirm` 接收提示文案，返回用户是否同意。
pub async fn delete_link<A, C>(api: &A, slug: &str, confirm: C) -> DeleteOutcome
where
    A: LinkApi,
    C: FnOnce(&str) -> bool,
{
    if !confirm(&delete_confirmation(slug)) {
        log::debug!("🗑️ 用户取消删除：{}", slug);
        return DeleteOutcome::Cancelled;
    }

    match api.delete_link(slug).await {
        Ok(()) => {
            log::info!("🗑️ 已删除链接：{}", slug);
            DeleteOutcome::Deleted {
                refresh: UiEffect::refresh_links(),
            }
        }
        Err(err) => {
            log::error!("❌ 删除链接失败：{} - {}", slug, err);
            DeleteOutcome::Failed {
                alert: DELETE_FAILED_ALERT.to_string(),
            }
        }
    }
}

/// 基于 `reqwest` 的实现。
#[derive(Debug, Clone)]
pub struct HttpLinkApi {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl HttpLinkApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LinkApiError> {
        let base = reqwest::Url::parse(base_url)
            .map_err(|e| LinkApiError::InvalidBaseUrl(format!("{}：{}", base_url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LinkApiError::Network(format!("无法创建 HTTP 客户端：{}", e)))?;
        Ok(Self { client, base })
    }

    /// 删除接口的完整地址（slug 已做查询参数编码）。
    pub fn delete_url(&self, slug: &str) -> Result<reqwest::Url, LinkApiError> {
        let mut url = self
            .base
            .join(DELETE_PATH)
            .map_err(|e| LinkApiError::InvalidBaseUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("slug", slug);
        Ok(url)
    }
}

impl LinkApi for HttpLinkApi {
    fn delete_link(&self, slug: &str) -> impl Future<Output = Result<(), LinkApiError>> + Send {
        let client = self.client.clone();
        let url = self.delete_url(slug);
        async move {
            let response = client
                .post(url?)
                .send()
                .await
                .map_err(|e| LinkApiError::Network(e.to_string()))?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(LinkApiError::Status(status.as_u16()))
            }
        }
    }
}
