//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 各子系统有自己的错误枚举（`QrError`、`LinkApiError`、`ClipboardError`），
//! 在应用层统一上转为 `AppError`，调用侧只需处理一种类型。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 子系统错误通过 `#[from]` 自动转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，供页面侧直接展示。

use serde::Serialize;

use crate::dashboard::{ClipboardError, LinkApiError};
use crate::qr_studio::QrError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 二维码生成 / 合成 / 导出链路错误
    #[error("{0}")]
    Qr(#[from] QrError),

    /// 后端链接接口错误
    #[error("链接接口错误: {0}")]
    LinkApi(#[from] LinkApiError),

    #[error("{0}")]
    Clipboard(#[from] ClipboardError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 命令行参数无效
    #[error("参数错误: {0}")]
    Args(String),
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
