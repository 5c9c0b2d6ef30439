//! 命令行参数定义

use crate::config::SourcePair;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "panelsync",
    version,
    about = "把本地构建产物同步到面板托管的游戏服务器"
)]
pub struct Cli {
    /// 面板地址，例如 https://panel.example.com
    #[arg(long)]
    pub panel_url: Option<String>,

    /// 面板客户端 API 密钥
    #[arg(long, env = "PANELSYNC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// 目标服务器标识（可重复）
    #[arg(long = "server")]
    pub servers: Vec<String>,

    /// 默认源路径，支持 * 与 ? 通配符
    #[arg(long)]
    pub source: Option<String>,

    /// 默认远程目标，以 / 结尾表示目录
    #[arg(long)]
    pub target: Option<String>,

    /// 追加的源目标对，格式 <source>=<target>（可重复）
    #[arg(long = "pair", value_parser = parse_pair)]
    pub pairs: Vec<SourcePair>,

    /// 上传前按过滤规则清理目录目标
    #[arg(long)]
    pub cleanup: bool,

    /// 过滤模式：whitelist 或 blacklist
    #[arg(long)]
    pub filter_mode: Option<String>,

    /// 过滤规则，逗号或换行分隔（可重复）
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// 上传后在服务器端解压归档并删除归档本体
    #[arg(long)]
    pub decompress: bool,

    /// 枚举本地源时跟随符号链接
    #[arg(long)]
    pub follow_symlinks: bool,

    /// 文件操作完成后发送的控制台命令
    #[arg(long)]
    pub command: Option<String>,

    /// 所有操作完成后重启服务器
    #[arg(long)]
    pub restart: bool,

    /// 正向代理，格式 user:pass@host:port
    #[arg(long)]
    pub proxy: Option<String>,

    /// JSON 配置文件路径（默认尝试 panelsync.json）
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 覆盖日志级别：error/warn/info/debug/trace
    #[arg(long)]
    pub log_level: Option<String>,
}

fn parse_pair(s: &str) -> Result<SourcePair, String> {
    match s.split_once('=') {
        Some((source, target)) if !source.is_empty() && !target.is_empty() => Ok(SourcePair {
            source: source.to_string(),
            target: target.to_string(),
        }),
        _ => Err("格式应为 <source>=<target>".to_string()),
    }
}
