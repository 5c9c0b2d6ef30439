//! 应用配置模块 - 命令行、配置文件与默认值的合并

use crate::cli::Cli;
use crate::core::engine::SyncOptions;
use crate::core::filter::FilterMode;
use crate::logging::LogConfig;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// 一对 (源, 目标)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePair {
    pub source: String,
    pub target: String,
}

/// 过滤规则在配置文件里既可以是数组，也可以是逗号/换行分隔的字符串
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PatternSource {
    Text(String),
    List(Vec<String>),
}

impl PatternSource {
    fn into_patterns(self) -> Vec<String> {
        match self {
            PatternSource::Text(raw) => split_patterns(&raw),
            PatternSource::List(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// 按逗号或换行拆分规则串，去掉空白项
pub fn split_patterns(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 配置文件的原始形态，所有字段可缺省
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileSettings {
    pub panel_url: Option<String>,
    pub api_key: Option<String>,
    pub servers: Vec<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub pairs: Vec<SourcePair>,
    pub cleanup: Option<bool>,
    pub filter_mode: Option<String>,
    pub filter_patterns: Option<PatternSource>,
    pub decompress: Option<bool>,
    pub follow_symlinks: Option<bool>,
    pub command: Option<String>,
    pub restart: Option<bool>,
    pub proxy: Option<String>,
    pub log: LogConfig,
}

impl FileSettings {
    /// 加载配置文件。显式指定的路径必须存在；
    /// 默认路径（panelsync.json）不存在时按全缺省处理。
    fn load(path: &Path, explicit: bool) -> Result<Self> {
        if !path.exists() {
            if explicit {
                bail!("配置文件不存在: {}", path.display());
            }
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))
    }
}

/// 合并校验后的运行配置
#[derive(Debug, Clone)]
pub struct Settings {
    pub panel_url: String,
    pub api_key: String,
    pub servers: Vec<String>,
    pub pairs: Vec<SourcePair>,
    pub cleanup: bool,
    pub filter_mode: FilterMode,
    pub filter_patterns: Vec<String>,
    pub decompress: bool,
    pub follow_symlinks: bool,
    pub command: Option<String>,
    pub restart: bool,
    pub proxy: Option<String>,
    pub log: LogConfig,
}

impl Settings {
    /// 合并命令行与配置文件。命令行优先；布尔开关只能由命令行打开，
    /// 关闭状态回落到配置文件。任何必填项缺失都在发起网络请求前报错。
    pub fn resolve(cli: Cli) -> Result<Self> {
        let default_path = Path::new("panelsync.json");
        let file = match &cli.config {
            Some(path) => FileSettings::load(path, true)?,
            None => FileSettings::load(default_path, false)?,
        };

        let panel_url = cli
            .panel_url
            .or(file.panel_url)
            .context("缺少面板地址 (--panel-url)")?;
        let api_key = cli
            .api_key
            .or(file.api_key)
            .context("缺少 API 密钥 (--api-key 或 PANELSYNC_API_KEY)")?;

        let servers = if cli.servers.is_empty() {
            file.servers
        } else {
            cli.servers
        };
        if servers.is_empty() {
            bail!("至少需要一个服务器标识 (--server)");
        }

        let pairs = resolve_pairs(
            cli.source.or(file.source),
            cli.target.or(file.target),
            cli.pairs,
            file.pairs,
        )?;

        let filter_mode = match cli.filter_mode.or(file.filter_mode) {
            Some(raw) => raw.parse::<FilterMode>().map_err(anyhow::Error::msg)?,
            None => FilterMode::default(),
        };

        let filter_patterns = if cli.filters.is_empty() {
            file.filter_patterns
                .map(PatternSource::into_patterns)
                .unwrap_or_default()
        } else {
            // 每个命令行参数里仍允许逗号/换行分隔
            cli.filters.iter().flat_map(|s| split_patterns(s)).collect()
        };

        let mut log = file.log;
        if let Some(level) = cli.log_level {
            log.level = level;
        }

        Ok(Self {
            panel_url,
            api_key,
            servers,
            pairs,
            cleanup: cli.cleanup || file.cleanup.unwrap_or(false),
            filter_mode,
            filter_patterns,
            decompress: cli.decompress || file.decompress.unwrap_or(false),
            follow_symlinks: cli.follow_symlinks || file.follow_symlinks.unwrap_or(false),
            command: cli.command.or(file.command),
            restart: cli.restart || file.restart.unwrap_or(false),
            proxy: cli.proxy.or(file.proxy),
            log,
        })
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            cleanup: self.cleanup,
            filter_mode: self.filter_mode,
            filter_patterns: self.filter_patterns.clone(),
            decompress: self.decompress,
            command: self.command.clone(),
            restart: self.restart,
        }
    }
}

/// 组装 (源, 目标) 对：默认对在前，命令行追加对次之，配置文件追加对最后。
/// 远程目标统一成以 `/` 开头的绝对路径。
fn resolve_pairs(
    source: Option<String>,
    target: Option<String>,
    cli_pairs: Vec<SourcePair>,
    file_pairs: Vec<SourcePair>,
) -> Result<Vec<SourcePair>> {
    let mut pairs = Vec::new();

    match (source, target) {
        (Some(source), Some(target)) => pairs.push(SourcePair { source, target }),
        (Some(_), None) => bail!("指定了 --source 但缺少 --target"),
        (None, Some(_)) => bail!("指定了 --target 但缺少 --source"),
        (None, None) => {}
    }

    pairs.extend(cli_pairs);
    pairs.extend(file_pairs);

    if pairs.is_empty() {
        bail!("至少需要一对源和目标 (--source/--target 或 --pair)");
    }

    for pair in &mut pairs {
        if pair.source.trim().is_empty() || pair.target.trim().is_empty() {
            bail!("源和目标都不能为空");
        }
        if !pair.target.starts_with('/') {
            pair.target.insert(0, '/');
        }
    }

    Ok(pairs)
}
