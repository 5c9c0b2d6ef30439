//! 上传执行器 - 对单个文件的有界重试上传

use crate::panel::Panel;
use reqwest::StatusCode;
use std::path::Path;
use tracing::{error, info, warn};

/// 每个文件最多尝试的上传次数
pub const UPLOAD_ATTEMPTS: u32 = 3;

/// 上传结果。重试耗尽不抛错，由调用方检查后决定如何处理。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// 后端返回 204
    Completed { attempts: u32 },
    /// 所有尝试都失败，附带最后一次失败的描述
    Exhausted { attempts: u32, last_error: String },
}

impl UploadOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, UploadOutcome::Completed { .. })
    }
}

pub struct UploadExecutor<'a> {
    panel: &'a dyn Panel,
    max_attempts: u32,
}

impl<'a> UploadExecutor<'a> {
    pub fn new(panel: &'a dyn Panel) -> Self {
        Self {
            panel,
            max_attempts: UPLOAD_ATTEMPTS,
        }
    }

    #[cfg(test)]
    fn with_attempts(panel: &'a dyn Panel, max_attempts: u32) -> Self {
        Self {
            panel,
            max_attempts,
        }
    }

    /// 上传一个本地文件到远程路径。
    /// 只有 HTTP 204 算成功；其余状态码和网络错误都记日志后立刻进入
    /// 下一次尝试，不退避。
    pub async fn upload(
        &self,
        server: &str,
        remote_path: &str,
        local_path: &Path,
    ) -> UploadOutcome {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.panel.write_file(server, remote_path, local_path).await {
                Ok(StatusCode::NO_CONTENT) => {
                    info!(
                        "上传完成: {} -> {} (第 {} 次尝试)",
                        local_path.display(),
                        remote_path,
                        attempt
                    );
                    return UploadOutcome::Completed { attempts: attempt };
                }
                Ok(status) => {
                    last_error = format!("HTTP {status}");
                    warn!(
                        "上传失败 ({}/{}): {} - {}",
                        attempt, self.max_attempts, remote_path, last_error
                    );
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        "上传失败 ({}/{}): {} - {}",
                        attempt, self.max_attempts, remote_path, last_error
                    );
                }
            }
        }

        error!(
            "上传最终失败 (已尝试 {} 次): {} - {}",
            self.max_attempts, remote_path, last_error
        );
        UploadOutcome::Exhausted {
            attempts: self.max_attempts,
            last_error,
        }
    }
}
