//! 基于 reqwest 的面板 HTTP 客户端

use super::{Panel, PanelError, RemoteEntry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// 面板 HTTP 客户端。
///
/// 整个运行期只构建一次，之后以只读引用传给各个远程调用，
/// 鉴权、代理等配置在构建时固定。
pub struct HttpPanel {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPanel {
    /// 构建客户端。`proxy` 接受 `user:pass@host:port` 形式的正向代理，
    /// 对 http 与 https 上游都生效。
    pub fn new(base_url: &str, api_key: &str, proxy: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .context("API 密钥包含非法字符")?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);

        if let Some(proxy) = proxy {
            let url = if proxy.contains("://") {
                proxy.to_string()
            } else {
                format!("http://{proxy}")
            };
            let proxy = reqwest::Proxy::all(&url).context("无效的代理地址")?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            http: builder.build().context("构建 HTTP 客户端失败")?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn files_url(&self, server: &str, op: &str) -> String {
        format!("{}/api/client/servers/{}/files/{}", self.base_url, server, op)
    }

    fn server_url(&self, server: &str, op: &str) -> String {
        format!("{}/api/client/servers/{}/{}", self.base_url, server, op)
    }
}

/// 解开目录列表响应。
/// 条目数组可能直接就是响应体，也可能包在 `data` 字段下；
/// 每个条目的 `name` / `is_directory` 可能在顶层，也可能嵌在 `attributes` 里。
fn parse_listing(value: &Value) -> Vec<RemoteEntry> {
    let items = match value.as_array() {
        Some(items) => items,
        None => match value.get("data").and_then(Value::as_array) {
            Some(items) => items,
            None => return Vec::new(),
        },
    };

    items
        .iter()
        .filter_map(|item| {
            let fields = item.get("attributes").unwrap_or(item);
            let name = fields.get("name")?.as_str()?.to_string();
            let is_directory = fields
                .get("is_directory")
                .and_then(Value::as_bool)
                // 部分后端只给 is_file
                .or_else(|| fields.get("is_file").and_then(Value::as_bool).map(|f| !f))
                .unwrap_or(false);
            Some(RemoteEntry { name, is_directory })
        })
        .collect()
}

#[async_trait]
impl Panel for HttpPanel {
    async fn list_directory(
        &self,
        server: &str,
        directory: &str,
    ) -> Result<Vec<RemoteEntry>, PanelError> {
        let url = format!(
            "{}?directory={}",
            self.files_url(server, "list"),
            urlencoding::encode(directory)
        );
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PanelError::List {
                status,
                directory: directory.to_string(),
            });
        }
        let body: Value = resp.json().await?;
        Ok(parse_listing(&body))
    }

    async fn write_file(
        &self,
        server: &str,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<StatusCode, PanelError> {
        let file = tokio::fs::File::open(local_path).await.map_err(|source| {
            PanelError::LocalRead {
                path: local_path.display().to_string(),
                source,
            }
        })?;
        let total = file
            .metadata()
            .await
            .map_err(|source| PanelError::LocalRead {
                path: local_path.display().to_string(),
                source,
            })?
            .len();

        // 流式上传，顺带按 10% 步进记录进度（仅用于观测）
        let label = remote_path.to_string();
        let mut sent = 0u64;
        let mut next_mark = 10u64;
        let stream = ReaderStream::new(file).inspect(
            move |chunk: &Result<bytes::Bytes, std::io::Error>| {
                if let Ok(bytes) = chunk {
                    sent += bytes.len() as u64;
                    let pct = if total == 0 { 100 } else { sent * 100 / total };
                    if pct >= next_mark {
                        debug!("上传进度 {}: {}%", label, pct.min(100));
                        next_mark = (pct / 10 + 1) * 10;
                    }
                }
            },
        );

        let url = format!(
            "{}?file={}",
            self.files_url(server, "write"),
            urlencoding::encode(remote_path)
        );
        let resp = self
            .http
            .post(&url)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await?;
        Ok(resp.status())
    }

    async fn delete_files(
        &self,
        server: &str,
        root: &str,
        files: &[String],
    ) -> Result<StatusCode, PanelError> {
        let resp = self
            .http
            .post(self.files_url(server, "delete"))
            .json(&json!({ "root": root, "files": files }))
            .send()
            .await?;
        Ok(resp.status())
    }

    async fn decompress_file(
        &self,
        server: &str,
        root: &str,
        file: &str,
    ) -> Result<(), PanelError> {
        let resp = self
            .http
            .post(self.files_url(server, "decompress"))
            .json(&json!({ "root": root, "file": file }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PanelError::Decompress {
                status,
                file: file.to_string(),
            });
        }
        Ok(())
    }

    async fn send_command(&self, server: &str, command: &str) -> Result<(), PanelError> {
        let resp = self
            .http
            .post(self.server_url(server, "command"))
            .json(&json!({ "command": command }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PanelError::Command { status });
        }
        Ok(())
    }

    async fn set_power_state(&self, server: &str, signal: &str) -> Result<(), PanelError> {
        let resp = self
            .http
            .post(self.server_url(server, "power"))
            .json(&json!({ "signal": signal }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PanelError::Power {
                status,
                signal: signal.to_string(),
            });
        }
        Ok(())
    }
}
