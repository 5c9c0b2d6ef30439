//! panelsync - 把本地构建产物同步到面板托管的游戏服务器
//!
//! 核心流程：展开本地源 → 逐台服务器（可选清理 → 上传 → 归档后处理 →
//! 控制台命令 → 重启）。所有远程调用经由 [`panel::Panel`] trait。

pub mod cli;
pub mod config;
pub mod core;
pub mod logging;
pub mod panel;
pub mod sources;

pub use crate::config::Settings;
pub use crate::core::{SyncEngine, SyncOptions, SyncReport};
pub use crate::panel::{HttpPanel, Panel, PanelError, RemoteEntry};
pub use crate::sources::{SyncPlan, UploadTask};
