//! 清理计划器 - 递归计算并删除目标目录中应清除的条目

use crate::core::filter::{self, FilterMode};
use crate::panel::{Panel, PanelError};
use futures::future::BoxFuture;
use tracing::{debug, info};

/// 对一个远程目录执行过滤清理。
///
/// 对每个条目，先用条目名和相对路径（目录路径去掉前导 `/` 后拼上条目名）
/// 去匹配过滤规则；被判定删除的子目录先递归清理其内容（同样的模式与规则，
/// 路径补上结尾 `/`），然后把目录名并入父级的批量删除。每层目录只发一次
/// 批量删除请求，批次为空时不发请求。
pub struct CleanupPlanner<'a> {
    panel: &'a dyn Panel,
    mode: FilterMode,
    patterns: Vec<String>,
}

impl<'a> CleanupPlanner<'a> {
    pub fn new(panel: &'a dyn Panel, mode: FilterMode, patterns: Vec<String>) -> Self {
        Self {
            panel,
            mode,
            patterns,
        }
    }

    /// 清理一个目录（路径需以 `/` 结尾），返回删除的条目总数。
    /// 列表失败会中止整个清理；删除请求返回非 204 视为删除失败。
    pub async fn clean(&self, server: &str, directory: &str) -> Result<usize, PanelError> {
        info!(
            "开始清理远程目录: {} (模式 {}, {} 条规则)",
            directory,
            self.mode,
            self.patterns.len()
        );
        self.clean_dir(server, directory.to_string()).await
    }

    fn clean_dir<'s>(
        &'s self,
        server: &'s str,
        directory: String,
    ) -> BoxFuture<'s, Result<usize, PanelError>> {
        Box::pin(async move {
            let entries = self.panel.list_directory(server, &directory).await?;
            let rel_base = directory.trim_start_matches('/').to_string();

            let mut batch = Vec::new();
            let mut deleted = 0usize;

            for entry in &entries {
                let relative = format!("{rel_base}{}", entry.name);
                if !filter::should_delete(self.mode, &self.patterns, &entry.name, &relative) {
                    continue;
                }
                if entry.is_directory {
                    // 先深入待删除的子目录，父级的删除调用才是最终清除
                    let sub = format!("{directory}{}/", entry.name);
                    deleted += self.clean_dir(server, sub).await?;
                }
                batch.push(entry.name.clone());
            }

            if batch.is_empty() {
                debug!("目录无需清理: {}", directory);
                return Ok(deleted);
            }

            let root = delete_root(&directory);
            info!("删除 {} 个条目: root={} files={:?}", batch.len(), root, batch);
            let status = self.panel.delete_files(server, root, &batch).await?;
            if !status.is_success() {
                return Err(PanelError::Delete {
                    status,
                    root: root.to_string(),
                });
            }
            Ok(deleted + batch.len())
        })
    }
}

/// 批量删除的 root 参数：目录路径去掉结尾 `/`，根目录本身保持 `/`
fn delete_root(directory: &str) -> &str {
    let trimmed = directory.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::mock::{Call, ScriptedPanel};
    use crate::panel::RemoteEntry;

    #[tokio::test]
    async fn blacklist_deletes_matching_files_only() {
        let panel = ScriptedPanel::new().with_listing(
            "/data/",
            vec![
                RemoteEntry::file("a.log"),
                RemoteEntry::file("b.txt"),
                RemoteEntry::directory("sub"),
            ],
        );
        let planner =
            CleanupPlanner::new(&panel, FilterMode::Blacklist, vec!["*.log".to_string()]);

        let deleted = planner.clean("s1", "/data/").await.unwrap();

        assert_eq!(deleted, 1);
        // sub 的名字不匹配 *.log，不删除也不深入
        assert_eq!(
            panel.calls(),
            vec![
                Call::List {
                    server: "s1".into(),
                    directory: "/data/".into()
                },
                Call::Delete {
                    server: "s1".into(),
                    root: "/data".into(),
                    files: vec!["a.log".into()]
                },
            ]
        );
    }

    #[tokio::test]
    async fn separate_pass_on_subdirectory() {
        let panel = ScriptedPanel::new()
            .with_listing("/data/sub/", vec![RemoteEntry::file("c.log")]);
        let planner =
            CleanupPlanner::new(&panel, FilterMode::Blacklist, vec!["*.log".to_string()]);

        let deleted = planner.clean("s1", "/data/sub/").await.unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(
            panel.calls()[1],
            Call::Delete {
                server: "s1".into(),
                root: "/data/sub".into(),
                files: vec!["c.log".into()]
            }
        );
    }

    #[tokio::test]
    async fn whitelist_keeps_matching_entries() {
        let panel = ScriptedPanel::new().with_listing(
            "/",
            vec![RemoteEntry::file("keep.txt"), RemoteEntry::file("drop.txt")],
        );
        let planner =
            CleanupPlanner::new(&panel, FilterMode::Whitelist, vec!["keep.txt".to_string()]);

        planner.clean("s1", "/").await.unwrap();

        assert_eq!(
            panel.calls()[1],
            Call::Delete {
                server: "s1".into(),
                root: "/".into(),
                files: vec!["drop.txt".into()]
            }
        );
    }

    #[tokio::test]
    async fn blacklist_with_empty_patterns_deletes_everything() {
        let panel = ScriptedPanel::new().with_listing(
            "/srv/",
            vec![RemoteEntry::file("x"), RemoteEntry::file("y")],
        );
        let planner = CleanupPlanner::new(&panel, FilterMode::Blacklist, vec![]);

        let deleted = planner.clean("s1", "/srv/").await.unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(
            panel.calls()[1],
            Call::Delete {
                server: "s1".into(),
                root: "/srv".into(),
                files: vec!["x".into(), "y".into()]
            }
        );
    }

    #[tokio::test]
    async fn whitelist_with_empty_patterns_deletes_nothing() {
        let panel = ScriptedPanel::new()
            .with_listing("/srv/", vec![RemoteEntry::file("x")]);
        let planner = CleanupPlanner::new(&panel, FilterMode::Whitelist, vec![]);

        let deleted = planner.clean("s1", "/srv/").await.unwrap();

        assert_eq!(deleted, 0);
        // 空批次不发删除请求
        assert_eq!(panel.calls().len(), 1);
    }

    #[tokio::test]
    async fn doomed_directory_is_listed_before_parent_delete() {
        let panel = ScriptedPanel::new()
            .with_listing(
                "/data/",
                vec![RemoteEntry::directory("temp"), RemoteEntry::file("app.jar")],
            )
            .with_listing("/data/temp/", vec![RemoteEntry::file("x.bin")]);
        let planner =
            CleanupPlanner::new(&panel, FilterMode::Blacklist, vec!["temp".to_string()]);

        let deleted = planner.clean("s1", "/data/").await.unwrap();

        // 子目录里没有条目命中 "temp"，深入只起探查作用；
        // 目录本身由父级的删除调用清除
        assert_eq!(deleted, 1);
        assert_eq!(
            panel.calls(),
            vec![
                Call::List {
                    server: "s1".into(),
                    directory: "/data/".into()
                },
                Call::List {
                    server: "s1".into(),
                    directory: "/data/temp/".into()
                },
                Call::Delete {
                    server: "s1".into(),
                    root: "/data".into(),
                    files: vec!["temp".into()]
                },
            ]
        );
    }

    #[tokio::test]
    async fn whitelist_cleans_doomed_directory_depth_first() {
        let panel = ScriptedPanel::new()
            .with_listing(
                "/data/",
                vec![RemoteEntry::directory("temp"), RemoteEntry::file("app.jar")],
            )
            .with_listing("/data/temp/", vec![RemoteEntry::file("x.bin")]);
        let planner =
            CleanupPlanner::new(&panel, FilterMode::Whitelist, vec!["app.jar".to_string()]);

        let deleted = planner.clean("s1", "/data/").await.unwrap();

        // temp 未被白名单保留：先清空其内容，再在父级删除目录名
        assert_eq!(deleted, 2);
        assert_eq!(
            panel.calls(),
            vec![
                Call::List {
                    server: "s1".into(),
                    directory: "/data/".into()
                },
                Call::List {
                    server: "s1".into(),
                    directory: "/data/temp/".into()
                },
                Call::Delete {
                    server: "s1".into(),
                    root: "/data/temp".into(),
                    files: vec!["x.bin".into()]
                },
                Call::Delete {
                    server: "s1".into(),
                    root: "/data".into(),
                    files: vec!["temp".into()]
                },
            ]
        );
    }

    #[tokio::test]
    async fn relative_path_patterns_match_from_api_root() {
        // 相对路径 = 目录去掉前导 / 再拼条目名
        let panel = ScriptedPanel::new().with_listing(
            "/logs/",
            vec![RemoteEntry::file("app.txt"), RemoteEntry::file("keep.me")],
        );
        let planner = CleanupPlanner::new(
            &panel,
            FilterMode::Blacklist,
            vec!["logs/app*".to_string()],
        );

        let deleted = planner.clean("s1", "/logs/").await.unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(
            panel.calls()[1],
            Call::Delete {
                server: "s1".into(),
                root: "/logs".into(),
                files: vec!["app.txt".into()]
            }
        );
    }

    #[test]
    fn delete_root_normalization() {
        assert_eq!(delete_root("/"), "/");
        assert_eq!(delete_root("/data/"), "/data");
        assert_eq!(delete_root("/data/sub/"), "/data/sub");
    }
}
