//! 测试用的脚本化面板桩实现

use super::{Panel, PanelError, RemoteEntry};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

/// 记录的一次远程调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List {
        server: String,
        directory: String,
    },
    Write {
        server: String,
        remote_path: String,
    },
    Delete {
        server: String,
        root: String,
        files: Vec<String>,
    },
    Decompress {
        server: String,
        root: String,
        file: String,
    },
    Command {
        server: String,
        command: String,
    },
    Power {
        server: String,
        signal: String,
    },
}

/// 按脚本应答并记录全部调用的面板实现。
/// 写入/删除的状态码按队列弹出，队列耗尽后一律回 204。
#[derive(Default)]
pub(crate) struct ScriptedPanel {
    calls: Mutex<Vec<Call>>,
    listings: Mutex<HashMap<String, Vec<RemoteEntry>>>,
    write_statuses: Mutex<VecDeque<u16>>,
    delete_statuses: Mutex<VecDeque<u16>>,
    decompress_status: Mutex<Option<u16>>,
}

impl ScriptedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(self, directory: &str, entries: Vec<RemoteEntry>) -> Self {
        self.listings
            .lock()
            .unwrap()
            .insert(directory.to_string(), entries);
        self
    }

    pub fn with_write_statuses(self, codes: &[u16]) -> Self {
        self.write_statuses.lock().unwrap().extend(codes);
        self
    }

    pub fn with_delete_statuses(self, codes: &[u16]) -> Self {
        self.delete_statuses.lock().unwrap().extend(codes);
        self
    }

    pub fn with_decompress_status(self, code: u16) -> Self {
        *self.decompress_status.lock().unwrap() = Some(code);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn pop_status(queue: &Mutex<VecDeque<u16>>) -> StatusCode {
        let code = queue.lock().unwrap().pop_front().unwrap_or(204);
        StatusCode::from_u16(code).expect("脚本中的状态码无效")
    }
}

#[async_trait]
impl Panel for ScriptedPanel {
    async fn list_directory(
        &self,
        server: &str,
        directory: &str,
    ) -> Result<Vec<RemoteEntry>, PanelError> {
        self.record(Call::List {
            server: server.to_string(),
            directory: directory.to_string(),
        });
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(directory)
            .cloned()
            .unwrap_or_default())
    }

    async fn write_file(
        &self,
        server: &str,
        remote_path: &str,
        _local_path: &Path,
    ) -> Result<StatusCode, PanelError> {
        self.record(Call::Write {
            server: server.to_string(),
            remote_path: remote_path.to_string(),
        });
        Ok(Self::pop_status(&self.write_statuses))
    }

    async fn delete_files(
        &self,
        server: &str,
        root: &str,
        files: &[String],
    ) -> Result<StatusCode, PanelError> {
        self.record(Call::Delete {
            server: server.to_string(),
            root: root.to_string(),
            files: files.to_vec(),
        });
        Ok(Self::pop_status(&self.delete_statuses))
    }

    async fn decompress_file(
        &self,
        server: &str,
        root: &str,
        file: &str,
    ) -> Result<(), PanelError> {
        self.record(Call::Decompress {
            server: server.to_string(),
            root: root.to_string(),
            file: file.to_string(),
        });
        match *self.decompress_status.lock().unwrap() {
            Some(code) if !(200..300).contains(&code) => Err(PanelError::Decompress {
                status: StatusCode::from_u16(code).expect("脚本中的状态码无效"),
                file: file.to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn send_command(&self, server: &str, command: &str) -> Result<(), PanelError> {
        self.record(Call::Command {
            server: server.to_string(),
            command: command.to_string(),
        });
        Ok(())
    }

    async fn set_power_state(&self, server: &str, signal: &str) -> Result<(), PanelError> {
        self.record(Call::Power {
            server: server.to_string(),
            signal: signal.to_string(),
        });
        Ok(())
    }
}
