//! 面板 API 抽象层
//!
//! 所有远程操作都经由 [`Panel`] trait 发起，运行期实现是基于 reqwest 的
//! [`HttpPanel`]；核心逻辑只依赖 trait，测试用脚本化桩实现替换。

pub mod client;
#[cfg(test)]
pub(crate) mod mock;

pub use client::HttpPanel;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::path::Path;

/// 远程目录中的一个条目
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    #[serde(default)]
    pub is_directory: bool,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }
}

/// 面板 API 错误
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("列出远程目录失败: {directory} (HTTP {status})")]
    List {
        status: StatusCode,
        directory: String,
    },

    #[error("删除远程条目失败: root={root} (HTTP {status})")]
    Delete { status: StatusCode, root: String },

    #[error("服务器端解压失败: {file} (HTTP {status})")]
    Decompress { status: StatusCode, file: String },

    #[error("发送控制台命令失败 (HTTP {status})")]
    Command { status: StatusCode },

    #[error("发送电源信号失败: {signal} (HTTP {status})")]
    Power { status: StatusCode, signal: String },

    #[error("读取本地文件失败: {path}")]
    LocalRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("请求失败: {0}")]
    Http(#[from] reqwest::Error),
}

/// 面板文件与控制接口。
///
/// `write_file` 与 `delete_files` 把后端状态码原样交给调用方判定，
/// 重试策略（上传的有界重试、归档删除的 403 重试）都在核心层实现；
/// 其余操作在本层把非成功状态映射为 [`PanelError`]。
#[async_trait]
pub trait Panel: Send + Sync {
    /// 列出一个远程目录，单次调用返回全部条目；空目录返回空列表
    async fn list_directory(
        &self,
        server: &str,
        directory: &str,
    ) -> Result<Vec<RemoteEntry>, PanelError>;

    /// 把一个本地文件写入远程路径，返回后端状态码（204 为成功）
    async fn write_file(
        &self,
        server: &str,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<StatusCode, PanelError>;

    /// 在 root 下批量删除条目，返回后端状态码（204 为成功）
    async fn delete_files(
        &self,
        server: &str,
        root: &str,
        files: &[String],
    ) -> Result<StatusCode, PanelError>;

    /// 在服务器端解压 root 下的归档文件
    async fn decompress_file(
        &self,
        server: &str,
        root: &str,
        file: &str,
    ) -> Result<(), PanelError>;

    /// 向服务器控制台发送命令
    async fn send_command(&self, server: &str, command: &str) -> Result<(), PanelError>;

    /// 发送电源信号（如 "restart"）
    async fn set_power_state(&self, server: &str, signal: &str) -> Result<(), PanelError>;
}
