//! # 短链接控制台交互层 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │             页面（局部刷新 + 模板 + 样式）                │
//! │                                                          │
//! │  生命周期事件 ── 点击/上传/滑块 ── 剪贴板/下载            │
//! └───────┬───────────────┬──────────────────┬───────────────┘
//!         ↓ TransportEvent ↓ QrModal 操作     ↓ trait 边界
//! ┌───────┼───────────────┼──────────────────┼───────────────┐
//! │       ↓               ↓     库 (Rust)    ↓               │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ qr_studio ── 二维码生成 · Logo 合成 · 导出            │
//! │  │   ├─ renderer/surface/acquirer  渲染 + 周期令牌 + 轮询 │
//! │  │   ├─ loader/compositor          Logo 校验解码与叠加    │
//! │  │   ├─ export                     圆角裁剪 PNG + 下载    │
//! │  │   └─ session                    弹窗状态机             │
//! │  │                                                       │
//! │  └─ dashboard ── 事件分发 · 错误提示 · 时间 · 复制 · 删除 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`qr_studio`] | 二维码弹窗：生成、等待渲染、叠加 Logo、带样式导出下载 |
//! | [`dashboard`] | 局部刷新事件处理、时间戳格式化、复制链接、删除链接 |

pub mod dashboard;
pub mod error;
pub mod qr_studio;
