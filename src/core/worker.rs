use crate::core::evaluator::evaluate;
use crate::core::fetch::SlotFetcher;
use crate::core::notify::Notifier;
use crate::core::parser::parse_slots;
use crate::domain::model::CycleReport;
use crate::domain::ports::{MailTransport, StateStore, TemplateStore};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// 一次監控循環：讀前次邊界 → 抓取 → 解析 → 評估 → 通知 → 持久化。
///
/// 抓取、解析、空結果的錯誤都在任何通知或狀態寫入之前中止循環；
/// 通知與歷史追加失敗只記錄，不影響已完成的狀態推進。
pub struct SlotMonitorWorker<T: TemplateStore, S: StateStore, M: MailTransport> {
    fetcher: SlotFetcher<T>,
    state: S,
    notifier: Notifier<M>,
    // 序列化重疊觸發（定時 + 手動），避免對 horizon 的讀改寫互相競爭
    cycle_lock: Mutex<()>,
}

impl<T: TemplateStore, S: StateStore, M: MailTransport> SlotMonitorWorker<T, S, M> {
    pub fn new(fetcher: SlotFetcher<T>, state: S, notifier: Notifier<M>) -> Self {
        Self {
            fetcher,
            state,
            notifier,
            cycle_lock: Mutex::new(()),
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let _guard = self.cycle_lock.lock().await;
        let checked_at = Utc::now();

        let prior_horizon = self.load_prior_horizon().await;

        let raw = self.fetcher.fetch().await?;
        let slots = parse_slots(&raw)?;
        let evaluation = evaluate(&slots)?;

        if evaluation.free_slots.is_empty() {
            tracing::info!(
                "There are no free slots in the period {} to {}",
                evaluation.covered_from.format("%d/%m/%Y"),
                evaluation.covered_to.format("%d/%m/%Y")
            );
            if let Err(e) = self.notifier.notify_none_available().await {
                tracing::warn!("📧 Failed to send the none-available notification: {}", e);
            }
        } else {
            tracing::info!("{} slots available", evaluation.free_slots.len());
            for slot in &evaluation.free_slots {
                tracing::debug!(
                    "SLOT: (status={}) {}",
                    slot.status,
                    slot.start.format("%A, %d %B %Y %H:%M")
                );
            }
            if let Err(e) = self.notifier.notify_free_slots(&evaluation.free_slots).await {
                tracing::warn!("📧 Failed to send the free-slots notification: {}", e);
            }
        }

        let horizon_extended = evaluation.new_horizon > prior_horizon;
        if horizon_extended {
            tracing::info!(
                "Date of the last slot has changed. It is now: {}",
                evaluation.new_horizon.format("%d/%m/%Y")
            );
            if let Err(e) = self
                .notifier
                .notify_horizon_extended(prior_horizon, evaluation.new_horizon)
                .await
            {
                tracing::warn!("📧 Failed to send the horizon notification: {}", e);
            }
        }

        // 邊界只往前走：上游重發較短的清單不會讓紀錄倒退
        let next_horizon = evaluation.new_horizon.max(prior_horizon);
        self.state.store_horizon(next_horizon).await?;

        if let Err(e) = self.state.append_history(checked_at, next_horizon).await {
            // 盡力而為：追加失敗不回滾已寫入的邊界
            tracing::warn!("💾 Failed to append the history record: {}", e);
        }

        Ok(CycleReport {
            slot_count: slots.len(),
            free_count: evaluation.free_slots.len(),
            horizon: next_horizon,
            horizon_extended,
        })
    }

    /// 讀取失敗或值無法解析都視為「沒有前次邊界」，用最早可表示的時間代替。
    async fn load_prior_horizon(&self) -> DateTime<Utc> {
        match self.state.load_horizon().await {
            Ok(Some(horizon)) => horizon,
            Ok(None) => {
                tracing::debug!("No prior horizon on record");
                DateTime::<Utc>::MIN_UTC
            }
            Err(e) => {
                tracing::warn!("💾 Could not read the prior horizon, assuming none: {}", e);
                DateTime::<Utc>::MIN_UTC
            }
        }
    }
}
