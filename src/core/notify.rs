use crate::domain::model::{DeliverySlot, OutboundMail};
use crate::domain::ports::MailTransport;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};

// 通知正文使用固定格式字串，不依賴環境地區設定
const FULL_FORMAT: &str = "%A, %d %B %Y %H:%M";
const SHORT_DATE_FORMAT: &str = "%d/%m/%Y";
const SHORT_TIME_FORMAT: &str = "%H:%M";

/// 把三種通知（有空位、全滿、邊界外推）組成主旨 + 純文字內容，
/// 交給郵件傳輸同步送出。全滿通知可由設定旗標停用。
pub struct Notifier<M: MailTransport> {
    transport: M,
    notify_unavailability: bool,
}

impl<M: MailTransport> Notifier<M> {
    pub fn new(transport: M, notify_unavailability: bool) -> Self {
        Self {
            transport,
            notify_unavailability,
        }
    }

    pub async fn notify_free_slots(&self, free_slots: &[DeliverySlot]) -> Result<()> {
        self.transport
            .send(free_slots_mail(free_slots, Utc::now()))
            .await
    }

    pub async fn notify_none_available(&self) -> Result<()> {
        if !self.notify_unavailability {
            tracing::debug!("📧 Unavailability notifications are disabled, staying silent");
            return Ok(());
        }
        self.transport.send(none_available_mail(Utc::now())).await
    }

    pub async fn notify_horizon_extended(
        &self,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    ) -> Result<()> {
        self.transport
            .send(horizon_extended_mail(previous, current, Utc::now()))
            .await
    }
}

fn free_slots_mail(free_slots: &[DeliverySlot], now: DateTime<Utc>) -> OutboundMail {
    let mut body = format!("There are free slots as of {}:\n", now.format(FULL_FORMAT));
    for slot in free_slots {
        body.push_str(&format!(
            "{}, Status = {}\n",
            slot.start.format(FULL_FORMAT),
            slot.status
        ));
    }

    OutboundMail {
        subject: "Slot monitor: free delivery slots are available!".to_string(),
        body,
    }
}

fn none_available_mail(now: DateTime<Utc>) -> OutboundMail {
    OutboundMail {
        subject: "Slot monitor: no slots available".to_string(),
        body: format!(
            "There are no free slots as of {} at {}\n",
            now.format(SHORT_DATE_FORMAT),
            now.format(SHORT_TIME_FORMAT)
        ),
    }
}

fn horizon_extended_mail(
    previous: DateTime<Utc>,
    current: DateTime<Utc>,
    now: DateTime<Utc>,
) -> OutboundMail {
    let previous_line = if previous == DateTime::<Utc>::MIN_UTC {
        "Previous horizon: none on record\n".to_string()
    } else {
        format!("Previous horizon was {}\n", previous.format(FULL_FORMAT))
    };

    OutboundMail {
        subject: format!(
            "Slots have been released up to {}",
            current.format(SHORT_DATE_FORMAT)
        ),
        body: format!(
            "The horizon for which slots have been published has been extended to {}\n{}This change was detected at {}\n",
            current.format(FULL_FORMAT),
            previous_line,
            now.format(SHORT_TIME_FORMAT)
        ),
    }
}
