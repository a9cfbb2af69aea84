use crate::domain::ports::{StateStore, TemplateStore};
use crate::utils::error::{MonitorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// 檔案型狀態儲存：一個檔案放最後已知邊界（RFC 3339 往返字串），
/// 一個檔案做追加式歷史紀錄。
#[derive(Debug, Clone)]
pub struct LocalStateStore {
    dir: PathBuf,
    horizon_file: String,
    history_file: String,
}

impl LocalStateStore {
    pub fn new(dir: impl Into<PathBuf>, horizon_file: &str, history_file: &str) -> Self {
        Self {
            dir: dir.into(),
            horizon_file: horizon_file.to_string(),
            history_file: history_file.to_string(),
        }
    }

    fn horizon_path(&self) -> PathBuf {
        self.dir.join(&self.horizon_file)
    }

    fn history_path(&self) -> PathBuf {
        self.dir.join(&self.history_file)
    }

    async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MonitorError::StateStoreError {
                message: format!("failed to create state directory {}", self.dir.display()),
                source: Some(e),
            })
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load_horizon(&self) -> Result<Option<DateTime<Utc>>> {
        let path = self.horizon_path();
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MonitorError::StateStoreError {
                    message: format!("failed to read {}", path.display()),
                    source: Some(e),
                })
            }
        };

        // 無法解析的內容視同沒有紀錄，由呼叫端當成最早時間處理
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(parsed) => Ok(Some(parsed.with_timezone(&Utc))),
            Err(_) => {
                tracing::warn!("💾 Stored horizon is not a valid timestamp, ignoring it");
                Ok(None)
            }
        }
    }

    async fn store_horizon(&self, horizon: DateTime<Utc>) -> Result<()> {
        self.ensure_dir().await?;
        let path = self.horizon_path();
        tokio::fs::write(&path, horizon.to_rfc3339())
            .await
            .map_err(|e| MonitorError::StateStoreError {
                message: format!("failed to write {}", path.display()),
                source: Some(e),
            })
    }

    async fn append_history(
        &self,
        checked_at: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_dir().await?;
        let path = self.history_path();
        let line = format!(
            "Date={}, Time={}, Date of Latest Slot={}\n",
            checked_at.format("%A, %d %B %Y"),
            checked_at.format("%H:%M:%S"),
            horizon.to_rfc3339()
        );

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| MonitorError::StateStoreError {
                message: format!("failed to open {}", path.display()),
                source: Some(e),
            })?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| MonitorError::StateStoreError {
                message: format!("failed to append to {}", path.display()),
                source: Some(e),
            })
    }
}

/// 檔案型範本儲存：側錄下來的 header 範本與 body 範本。唯讀。
#[derive(Debug, Clone)]
pub struct LocalTemplateStore {
    dir: PathBuf,
    header_file: String,
    body_file: String,
}

impl LocalTemplateStore {
    pub fn new(dir: impl Into<PathBuf>, header_file: &str, body_file: &str) -> Self {
        Self {
            dir: dir.into(),
            header_file: header_file.to_string(),
            body_file: body_file.to_string(),
        }
    }

    async fn read_template(&self, file_name: &str) -> Result<String> {
        let path = self.dir.join(file_name);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| MonitorError::TemplateError {
                message: format!("failed to read template {}: {}", path.display(), e),
            })
    }
}

#[async_trait]
impl TemplateStore for LocalTemplateStore {
    async fn header_template(&self) -> Result<String> {
        self.read_template(&self.header_file).await
    }

    async fn body_template(&self) -> Result<String> {
        self.read_template(&self.body_file).await
    }
}
