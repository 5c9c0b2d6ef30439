//! 上传后处理 - 服务器端解压与归档本体清理

use crate::panel::{Panel, PanelError};
use reqwest::StatusCode;
use tracing::{info, warn};

/// 可在服务器端解压的归档扩展名（大小写不敏感）
const ARCHIVE_EXTENSIONS: &[&str] = &[".zip", ".tar", ".tar.gz", ".tgz", ".rar"];

/// 归档删除的最大尝试次数
pub const DELETE_ATTEMPTS: u32 = 3;

/// 判断远程路径是否指向可解压的归档
pub fn is_archive(remote_path: &str) -> bool {
    let lower = remote_path.to_ascii_lowercase();
    ARCHIVE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// 归档删除的确认结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteConfirmation {
    /// 收到 204
    Confirmed { attempts: u32 },
    /// 既没有 204 也没有明确错误，放弃确认
    Unconfirmed { attempts: u32 },
}

/// 对已上传的归档执行解压，然后删除归档本体。
pub struct PostProcessor<'a> {
    panel: &'a dyn Panel,
    max_attempts: u32,
}

impl<'a> PostProcessor<'a> {
    pub fn new(panel: &'a dyn Panel) -> Self {
        Self {
            panel,
            max_attempts: DELETE_ATTEMPTS,
        }
    }

    /// 解压 `remote_path` 指向的归档并删除归档本体。
    /// 解压失败直接传播；删除步骤见 [`Self::delete_archive`]。
    pub async fn run(
        &self,
        server: &str,
        remote_path: &str,
    ) -> Result<DeleteConfirmation, PanelError> {
        let (root, file) = split_remote_path(remote_path);
        info!("解压归档: root={} file={}", root, file);
        self.panel.decompress_file(server, &root, &file).await?;
        self.delete_archive(server, remote_path).await
    }

    /// 从绝对根 `/` 删除归档本体。
    /// 只有 HTTP 403 触发重试；其他错误状态立即传播；非 204 的成功状态
    /// 视为结果不明确，计入尝试后继续。三次尝试后仍无 204 则放弃确认。
    async fn delete_archive(
        &self,
        server: &str,
        remote_path: &str,
    ) -> Result<DeleteConfirmation, PanelError> {
        let files = vec![remote_path.to_string()];

        for attempt in 1..=self.max_attempts {
            let status = self.panel.delete_files(server, "/", &files).await?;
            match status {
                StatusCode::NO_CONTENT => {
                    info!("归档已删除: {} (第 {} 次尝试)", remote_path, attempt);
                    return Ok(DeleteConfirmation::Confirmed { attempts: attempt });
                }
                StatusCode::FORBIDDEN => {
                    warn!(
                        "删除归档被拒绝 (HTTP 403)，重试 ({}/{}): {}",
                        attempt, self.max_attempts, remote_path
                    );
                }
                status if status.is_client_error() || status.is_server_error() => {
                    return Err(PanelError::Delete {
                        status,
                        root: "/".to_string(),
                    });
                }
                status => {
                    warn!(
                        "删除归档返回不明确的状态 HTTP {} ({}/{}): {}",
                        status, attempt, self.max_attempts, remote_path
                    );
                }
            }
        }

        warn!(
            "归档删除未获确认 (已尝试 {} 次): {}",
            self.max_attempts, remote_path
        );
        Ok(DeleteConfirmation::Unconfirmed {
            attempts: self.max_attempts,
        })
    }
}

/// 把远程路径拆成 (root, 文件名)；没有目录部分时根目录退化为 `/`
fn split_remote_path(remote_path: &str) -> (String, String) {
    match remote_path.rsplit_once('/') {
        Some(("", name)) => ("/".to_string(), name.to_string()),
        Some((root, name)) => (root.to_string(), name.to_string()),
        None => ("/".to_string(), remote_path.to_string()),
    }
}
