use crate::domain::model::DeliverySlot;
use crate::utils::error::{MonitorError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// 把上游的巢狀時段回應攤平成依文件順序排列的 `DeliverySlot` 列表。
///
/// 回應必須含有 `data.slot_days` 陣列；往下經過 day group → slot group →
/// slot entry 三層，每個 entry 都要帶 `slot_info`。任何一筆時間解析失敗就
/// 整次作廢，不產生部分結果。
pub fn parse_slots(raw: &str) -> Result<Vec<DeliverySlot>> {
    let document: Value = serde_json::from_str(raw).map_err(|e| MonitorError::ParseError {
        message: "slot response is not valid JSON".to_string(),
        source: Some(e),
    })?;

    let slot_days = document
        .get("data")
        .and_then(|data| data.get("slot_days"))
        .and_then(Value::as_array)
        .ok_or_else(|| MonitorError::ParseError {
            message: "response is missing a data.slot_days array".to_string(),
            source: None,
        })?;

    let mut slots = Vec::new();
    for slot_day in slot_days {
        for slot_group in children(slot_day) {
            for entry in children(slot_group) {
                slots.push(slot_from_entry(entry)?);
            }
        }
    }

    Ok(slots)
}

/// 泛型下探：陣列取元素、物件取屬性值，純量沒有子節點。
fn children(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    }
}

fn slot_from_entry(entry: &Value) -> Result<DeliverySlot> {
    let info = entry
        .get("slot_info")
        .ok_or_else(|| MonitorError::ParseError {
            message: "slot entry is missing a slot_info object".to_string(),
            source: None,
        })?;

    let slot_id = string_field(info, "slot_id")?;

    let start = parse_slot_time(&string_field(info, "start_time")?).ok_or_else(|| {
        MonitorError::ParseError {
            message: format!("slot {} has an invalid start time", slot_id),
            source: None,
        }
    })?;

    let end = parse_slot_time(&string_field(info, "end_time")?).ok_or_else(|| {
        MonitorError::ParseError {
            message: format!("slot {} has an invalid end time", slot_id),
            source: None,
        }
    })?;

    let status = string_field(info, "status")?;

    Ok(DeliverySlot {
        slot_id,
        start,
        end,
        status,
    })
}

fn string_field(info: &Value, name: &str) -> Result<String> {
    info.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MonitorError::ParseError {
            message: format!("slot_info is missing the {} field", name),
            source: None,
        })
}

/// 只接受明確的格式：RFC 3339，或無時區的 `%Y-%m-%dT%H:%M:%S`（視為 UTC）。
/// 不依賴環境地區設定。
fn parse_slot_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
