use crate::domain::model::DeliverySlot;
use crate::utils::error::{MonitorError, Result};
use chrono::{DateTime, Utc};

/// 對一次抓取結果的純評估：可預約子集、涵蓋區間、新的時段邊界。
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// 依文件順序保留的可預約時段（status != "UNAVAILABLE"）。
    pub free_slots: Vec<DeliverySlot>,
    pub covered_from: DateTime<Utc>,
    pub covered_to: DateTime<Utc>,
    /// 所有時段（含不可預約）最晚的結束時間。
    pub new_horizon: DateTime<Utc>,
}

/// 評估一批已解析的時段。空列表是錯誤：沒有資料就不能下任何結論，
/// 也不能讓邊界塌縮到哨兵值。
pub fn evaluate(slots: &[DeliverySlot]) -> Result<Evaluation> {
    if slots.is_empty() {
        return Err(MonitorError::EmptyResultError);
    }

    let free_slots: Vec<DeliverySlot> = slots
        .iter()
        .filter(|slot| slot.is_available())
        .cloned()
        .collect();

    // 非空已保證，min/max 一定存在
    let covered_from = slots.iter().map(|slot| slot.start).min().unwrap();
    let covered_to = slots.iter().map(|slot| slot.end).max().unwrap();

    Ok(Evaluation {
        free_slots,
        covered_from,
        covered_to,
        new_horizon: covered_to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn slot(slot_id: &str, start_hour: u32, end_hour: u32, status: &str) -> DeliverySlot {
        DeliverySlot {
            slot_id: slot_id.to_string(),
            start: Utc.with_ymd_and_hms(2024, 1, 10, start_hour, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 10, end_hour, 0, 0).unwrap(),
            status: status.to_string(),
        }
    }

    #[test]
    fn test_empty_slot_list_is_an_error() {
        let err = evaluate(&[]).unwrap_err();
        assert!(matches!(err, MonitorError::EmptyResultError));
    }

    #[test]
    fn test_free_slots_keep_document_order() {
        let slots = vec![
            slot("s1", 8, 9, "UNAVAILABLE"),
            slot("s2", 9, 10, "AVAILABLE"),
            slot("s3", 10, 11, "UNAVAILABLE"),
            slot("s4", 11, 12, "FULL"),
        ];

        let evaluation = evaluate(&slots).unwrap();

        let ids: Vec<&str> = evaluation
            .free_slots
            .iter()
            .map(|s| s.slot_id.as_str())
            .collect();
        assert_eq!(ids, vec!["s2", "s4"]);
    }

    #[test]
    fn test_unavailable_match_is_case_sensitive() {
        let slots = vec![slot("s1", 8, 9, "unavailable")];

        let evaluation = evaluate(&slots).unwrap();

        // 只有大寫的 UNAVAILABLE 才是不可預約
        assert_eq!(evaluation.free_slots.len(), 1);
    }

    #[test]
    fn test_span_covers_min_start_to_max_end() {
        let slots = vec![
            slot("s2", 10, 11, "UNAVAILABLE"),
            slot("s1", 8, 9, "UNAVAILABLE"),
            slot("s3", 12, 14, "UNAVAILABLE"),
        ];

        let evaluation = evaluate(&slots).unwrap();

        assert_eq!(
            evaluation.covered_from,
            Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap()
        );
        assert_eq!(
            evaluation.covered_to,
            Utc.with_ymd_and_hms(2024, 1, 10, 14, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_horizon_includes_unavailable_slots() {
        let slots = vec![
            slot("s1", 8, 9, "AVAILABLE"),
            slot("s2", 20, 22, "UNAVAILABLE"),
        ];

        let evaluation = evaluate(&slots).unwrap();

        assert_eq!(
            evaluation.new_horizon,
            Utc.with_ymd_and_hms(2024, 1, 10, 22, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_horizon_tie_uses_the_shared_value() {
        let slots = vec![
            slot("s1", 8, 12, "UNAVAILABLE"),
            slot("s2", 10, 12, "UNAVAILABLE"),
        ];

        let evaluation = evaluate(&slots).unwrap();

        assert_eq!(
            evaluation.new_horizon,
            Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
        );
    }
}
