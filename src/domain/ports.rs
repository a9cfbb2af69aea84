use crate::domain::model::OutboundMail;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 持久化的監控狀態：最後已知的時段邊界與追加式歷史紀錄。
#[async_trait]
pub trait StateStore: Send + Sync {
    /// 讀取前次紀錄的邊界。不存在時回傳 `Ok(None)`。
    async fn load_horizon(&self) -> Result<Option<DateTime<Utc>>>;
    async fn store_horizon(&self, horizon: DateTime<Utc>) -> Result<()>;
    /// 追加一筆歷史紀錄（檢查時間 + 當次邊界）。只寫不讀。
    async fn append_history(
        &self,
        checked_at: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> Result<()>;
}

/// 上游請求的重放素材：header 範本與 JSON body 範本。
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn header_template(&self) -> Result<String>;
    async fn body_template(&self) -> Result<String>;
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: OutboundMail) -> Result<()>;
}
