use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 上游發布的單一配送時段。每次抓取都重新產生，不做持久化。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverySlot {
    pub slot_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: String,
}

impl DeliverySlot {
    /// 只有字面上完全等於 `UNAVAILABLE` 才視為不可預約，大小寫敏感。
    pub fn is_available(&self) -> bool {
        self.status != "UNAVAILABLE"
    }
}

/// 要交給郵件傳輸的通知內容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub subject: String,
    pub body: String,
}

/// 單次監控循環的可觀測結果，由呼叫端決定記錄或告警。
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub slot_count: usize,
    pub free_count: usize,
    pub horizon: DateTime<Utc>,
    pub horizon_extended: bool,
}
