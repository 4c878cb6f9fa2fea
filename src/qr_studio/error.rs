//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 二维码生成、Logo 合成与导出链路共用一个错误枚举，调用侧可按分支匹配，
//! 不再依赖字符串判断。校验失败、渲染超时、生成周期被取代等情况各有独立分支，
//! 便于上层决定“提示用户 / 仅记录日志 / 静默放弃”。

/// 二维码工作室统一错误类型。
///
/// 该类型会在应用层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum QrError {
    /// 上传文件未通过本地校验（类型或体积），不改变会话状态。
    #[error("校验失败：{0}")]
    Validation(#[from] UploadRejection),

    #[error("解码错误：{0}")]
    Decode(String),

    /// 渲染器在重试预算内没有产出可用画布。
    #[error("渲染超时：等待 {frames} 帧后画布仍不可用")]
    Timeout { frames: u32 },

    /// 当前生成周期已被更新的周期取代。
    #[error("生成周期 {stale} 已被周期 {current} 取代")]
    Superseded { stale: u64, current: u64 },

    #[error("渲染错误：{0}")]
    Render(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("下载错误：{0}")]
    Download(String),

    /// 操作要求弹窗处于打开状态。
    #[error("二维码弹窗未打开")]
    ModalClosed,

    #[error("页面缺少元素：#{0}")]
    MissingElement(String),
}

/// 上传校验被拒绝的原因。
///
/// `Display` 输出即为面向用户的提示文案。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("Please select a valid image file")]
    NotAnImage { mime: String },

    #[error("Logo image is too large. Please select an image under 2MB.")]
    TooLarge { size: u64, limit: u64 },
}

impl QrError {
    /// 稳定的错误码，供 UI 层或日志聚合使用。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(UploadRejection::NotAnImage { .. }) => "upload_not_image",
            Self::Validation(UploadRejection::TooLarge { .. }) => "upload_too_large",
            Self::Decode(_) => "decode_failed",
            Self::Timeout { .. } => "surface_timeout",
            Self::Superseded { .. } => "generation_superseded",
            Self::Render(_) => "render_failed",
            Self::Encode(_) => "encode_failed",
            Self::ResourceLimit(_) => "resource_limit",
            Self::Download(_) => "download_failed",
            Self::ModalClosed => "modal_closed",
            Self::MissingElement(_) => "missing_element",
        }
    }

    /// 出错所处的阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Decode(_) | Self::ResourceLimit(_) => "upload",
            Self::Timeout { .. } | Self::Superseded { .. } | Self::Render(_) => "generate",
            Self::Encode(_) | Self::Download(_) => "export",
            Self::ModalClosed | Self::MissingElement(_) => "modal",
        }
    }

    /// 是否为“静默放弃”类错误：仅影响本次生成周期，不需要提示用户。
    pub fn is_cycle_local(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Superseded { .. })
    }
}
