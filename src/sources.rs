//! 本地源文件枚举 - 通配符展开与符号链接开关

use crate::config::SourcePair;
use crate::core::filter;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};
use walkdir::WalkDir;

/// 一次文件上传任务：本地路径与最终的远程路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub local_path: PathBuf,
    pub remote_path: String,
}

/// 展开后的同步计划，对每台服务器复用
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub tasks: Vec<UploadTask>,
    /// 以 `/` 结尾的目录目标，按出现顺序去重；清理只对这些目标执行
    pub cleanup_dirs: Vec<String>,
}

/// 把所有 (源, 目标) 对展开成上传任务。源枚举只做一次，
/// 之后每台服务器都复用同一份计划。
pub fn build_plan(pairs: &[SourcePair], follow_symlinks: bool) -> Result<SyncPlan> {
    let mut plan = SyncPlan::default();

    for pair in pairs {
        let target = pair.target.as_str();
        let dir_target = target.ends_with('/');
        if dir_target && !plan.cleanup_dirs.iter().any(|d| d == target) {
            plan.cleanup_dirs.push(target.to_string());
        }

        let matched = expand_source(&pair.source, follow_symlinks)?;
        if matched.len() > 1 && !dir_target {
            bail!(
                "源 {} 匹配到 {} 个文件，但目标 {} 不是目录（目录需以 / 结尾）",
                pair.source,
                matched.len(),
                target
            );
        }

        for local_path in matched {
            let remote_path = if dir_target {
                let name = local_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .with_context(|| format!("无法取得文件名: {}", local_path.display()))?;
                format!("{target}{name}")
            } else {
                target.to_string()
            };
            debug!("计划上传: {} -> {}", local_path.display(), remote_path);
            plan.tasks.push(UploadTask {
                local_path,
                remote_path,
            });
        }
    }

    if plan.tasks.is_empty() {
        bail!("没有可上传的源文件");
    }
    info!("本地源展开完成: {} 个文件", plan.tasks.len());
    Ok(plan)
}

/// 展开一个源。不含通配符的路径原样返回（存在性在上传前校验）；
/// 含 `*` / `?` 的路径从通配符之前的目录开始遍历，对整个相对路径做匹配。
/// 是否跟随符号链接由 `follow_symlinks` 控制。
fn expand_source(source: &str, follow_symlinks: bool) -> Result<Vec<PathBuf>> {
    // 与遍历产物的写法对齐：去掉 ./ 前缀，反斜杠换成 /
    let source = source.replace('\\', "/");
    let source = source.strip_prefix("./").unwrap_or(&source);

    let Some(wildcard_pos) = source.find(['*', '?']) else {
        return Ok(vec![PathBuf::from(source)]);
    };

    let base = match source[..wildcard_pos].rfind('/') {
        Some(i) => &source[..i],
        None => ".",
    };

    let mut matched = Vec::new();
    for entry in WalkDir::new(base).follow_links(follow_symlinks) {
        let entry = entry.with_context(|| format!("扫描本地目录失败: {base}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path_str = entry.path().to_string_lossy().replace('\\', "/");
        let candidate = path_str.strip_prefix("./").unwrap_or(&path_str);
        if filter::glob_match(candidate, source) {
            matched.push(entry.into_path());
        }
    }

    if matched.is_empty() {
        bail!("源未匹配到任何文件: {source}");
    }
    matched.sort();
    Ok(matched)
}
