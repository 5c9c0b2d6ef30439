//! 清理过滤规则 - 白名单/黑名单模式与通配符匹配

use regex::Regex;
use serde::{Deserialize, Serialize};

/// 过滤模式
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// 匹配规则的条目被删除，其余保留
    #[default]
    Blacklist,
    /// 匹配规则的条目被保留，其余删除
    Whitelist,
}

impl std::str::FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blacklist" => Ok(FilterMode::Blacklist),
            "whitelist" => Ok(FilterMode::Whitelist),
            other => Err(format!(
                "无效的过滤模式: {other} (应为 whitelist 或 blacklist)"
            )),
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterMode::Blacklist => write!(f, "blacklist"),
            FilterMode::Whitelist => write!(f, "whitelist"),
        }
    }
}

/// 把通配符模式翻译成锚定的正则。
/// `*` 匹配任意多个字符，`?` 恰好一个字符，其余字符（包括 `.`）按字面匹配。
fn wildcard_regex(pattern: &str) -> String {
    let mut re = String::with_capacity(pattern.len() + 8);
    let mut literal = String::new();
    re.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' | '?' => {
                if !literal.is_empty() {
                    re.push_str(&regex::escape(&literal));
                    literal.clear();
                }
                re.push_str(if ch == '*' { ".*" } else { "." });
            }
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        re.push_str(&regex::escape(&literal));
    }
    re.push('$');
    re
}

/// 整串通配符匹配（本地路径展开也复用这套语义）
pub fn glob_match(text: &str, pattern: &str) -> bool {
    match Regex::new(&wildcard_regex(pattern)) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// 条目名或相对路径任一匹配即视为命中。
/// 模式结尾允许带一个 `/` 表示目录（比较前去掉），匹配区分大小写。
pub fn matches(name: &str, relative_path: &str, pattern: &str) -> bool {
    let pattern = pattern.strip_suffix('/').unwrap_or(pattern);
    glob_match(name, pattern) || glob_match(relative_path, pattern)
}

/// 按过滤模式判定一个条目是否应当删除。
///
/// 规则列表为空时取各模式的固定默认值：黑名单删除全部条目，
/// 白名单保留全部条目。
pub fn should_delete(
    mode: FilterMode,
    patterns: &[String],
    name: &str,
    relative_path: &str,
) -> bool {
    if patterns.is_empty() {
        return matches!(mode, FilterMode::Blacklist);
    }
    let hit = patterns.iter().any(|p| matches(name, relative_path, p));
    match mode {
        FilterMode::Blacklist => hit,
        FilterMode::Whitelist => !hit,
    }
}
