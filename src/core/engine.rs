//! 同步驱动 - 绑定源展开结果、服务器遍历与各步骤的执行顺序

use crate::core::archive::{self, DeleteConfirmation, PostProcessor};
use crate::core::cleaner::CleanupPlanner;
use crate::core::filter::FilterMode;
use crate::core::uploader::{UploadExecutor, UploadOutcome};
use crate::panel::Panel;
use crate::sources::SyncPlan;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// 同步行为开关（由配置层装配）
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// 上传前清理目录目标
    pub cleanup: bool,
    pub filter_mode: FilterMode,
    pub filter_patterns: Vec<String>,
    /// 上传完成后在服务器端解压归档并删除归档本体
    pub decompress: bool,
    /// 文件操作完成后发送的控制台命令
    pub command: Option<String>,
    /// 最后发送 restart 电源信号
    pub restart: bool,
}

/// 一次运行的汇总报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: String,
    pub start_time: i64,
    pub end_time: i64,
    pub servers: u32,
    pub files_uploaded: u32,
    pub uploads_exhausted: u32,
    pub archives_processed: u32,
    pub archive_deletes_unconfirmed: u32,
    pub entries_cleaned: u32,
    pub errors: Vec<String>,
}

impl SyncReport {
    fn begin(servers: u32) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            start_time: chrono::Utc::now().timestamp(),
            end_time: 0,
            servers,
            files_uploaded: 0,
            uploads_exhausted: 0,
            archives_processed: 0,
            archive_deletes_unconfirmed: 0,
            entries_cleaned: 0,
            errors: Vec::new(),
        }
    }

    pub fn duration_secs(&self) -> i64 {
        self.end_time - self.start_time
    }
}

/// 同步引擎。
///
/// 服务器按给定顺序逐台处理，单台内部的顺序固定：
/// 清理（仅目录目标）→ 逐文件上传（含归档后处理）→ 控制台命令 → 重启。
/// 所有远程调用严格顺序 await，不做并发。
pub struct SyncEngine<'a> {
    panel: &'a dyn Panel,
    options: SyncOptions,
}

impl<'a> SyncEngine<'a> {
    pub fn new(panel: &'a dyn Panel, options: SyncOptions) -> Self {
        Self { panel, options }
    }

    pub async fn run(&self, servers: &[String], plan: &SyncPlan) -> Result<SyncReport> {
        let mut report = SyncReport::begin(servers.len() as u32);
        info!(
            "开始同步: run={} {} 台服务器, {} 个文件",
            report.run_id,
            servers.len(),
            plan.tasks.len()
        );

        for server in servers {
            self.sync_server(server, plan, &mut report)
                .await
                .with_context(|| format!("服务器 {server} 同步失败"))?;
        }

        report.end_time = chrono::Utc::now().timestamp();
        Ok(report)
    }

    async fn sync_server(
        &self,
        server: &str,
        plan: &SyncPlan,
        report: &mut SyncReport,
    ) -> Result<()> {
        info!("同步服务器: {}", server);

        // 1. 可选清理，只对以 / 结尾的目录目标执行
        if self.options.cleanup {
            if plan.cleanup_dirs.is_empty() {
                debug!("没有目录目标，跳过清理");
            }
            let planner = CleanupPlanner::new(
                self.panel,
                self.options.filter_mode,
                self.options.filter_patterns.clone(),
            );
            for dir in &plan.cleanup_dirs {
                let cleaned = planner
                    .clean(server, dir)
                    .await
                    .with_context(|| format!("清理目录失败: {dir}"))?;
                report.entries_cleaned += cleaned as u32;
            }
        }

        // 2. 逐个上传。每次上传前做硬校验，违例中止整次运行而不是跳过
        let executor = UploadExecutor::new(self.panel);
        for task in &plan.tasks {
            validate_source(&task.local_path).await?;

            match executor
                .upload(server, &task.remote_path, &task.local_path)
                .await
            {
                UploadOutcome::Completed { .. } => {
                    report.files_uploaded += 1;
                    if self.options.decompress && archive::is_archive(&task.remote_path) {
                        let confirmation = PostProcessor::new(self.panel)
                            .run(server, &task.remote_path)
                            .await
                            .with_context(|| format!("归档处理失败: {}", task.remote_path))?;
                        report.archives_processed += 1;
                        if let DeleteConfirmation::Unconfirmed { .. } = confirmation {
                            report.archive_deletes_unconfirmed += 1;
                        }
                    }
                }
                // 重试耗尽只记录，继续后面的文件；归档后处理随之跳过
                UploadOutcome::Exhausted { last_error, .. } => {
                    report.uploads_exhausted += 1;
                    report.errors.push(format!(
                        "{server}: 上传 {} 失败: {last_error}",
                        task.remote_path
                    ));
                }
            }
        }

        // 3. 控制台命令
        if let Some(command) = &self.options.command {
            info!("发送控制台命令: {}", command);
            self.panel.send_command(server, command).await?;
        }

        // 4. 重启
        if self.options.restart {
            info!("重启服务器: {}", server);
            self.panel.set_power_state(server, "restart").await?;
        }

        Ok(())
    }
}

/// 上传前的源校验：必须存在且不是目录，违例是致命错误
async fn validate_source(path: &Path) -> Result<()> {
    let meta = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("源文件不存在: {}", path.display()))?;
    if meta.is_dir() {
        bail!("源路径是目录，无法上传: {}", path.display());
    }
    Ok(())
}
