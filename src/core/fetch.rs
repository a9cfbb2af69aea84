use crate::domain::ports::TemplateStore;
use crate::utils::error::{MonitorError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// 從範本重建上游請求並執行單次 POST，取回原始回應內容。
///
/// 不在這一層重試；排程端下一輪重新觸發整個循環就是重試。
pub struct SlotFetcher<T: TemplateStore> {
    templates: T,
    base_url: String,
    client: Client,
}

impl<T: TemplateStore> SlotFetcher<T> {
    pub fn new(templates: T, base_url: String, timeout: Duration) -> Result<Self> {
        // 顯式建構、有界逾時的 client；上游會回 gzip
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            templates,
            base_url,
            client,
        })
    }

    pub async fn fetch(&self) -> Result<String> {
        let header_template = self.templates.header_template().await?;
        let body_template = self.templates.body_template().await?;

        let body = rewrite_body_dates(&body_template, Utc::now())?;
        let url = format!("{}/api/v3/slot/view", self.base_url.trim_end_matches('/'));

        tracing::debug!("📡 Posting slot query to: {}", url);

        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in parse_header_template(&header_template)? {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        tracing::debug!("📡 Slot API response status: {}", status);

        if !status.is_success() {
            return Err(MonitorError::UpstreamError {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// 解析 `Name: Value` 格式的 header 範本。
///
/// 名稱含 `content-`（不分大小寫）的行一律丟棄：content type 與 content
/// length 必須按改寫後的實際 body 重算，不能沿用側錄時的舊值。
fn parse_header_template(raw: &str) -> Result<Vec<(String, String)>> {
    let mut headers = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| MonitorError::TemplateError {
                message: format!("header template line has no colon: {}", line),
            })?;

        let name = name.trim();
        if name.to_lowercase().contains("content-") {
            continue;
        }

        headers.push((name.to_string(), value.trim().to_string()));
    }

    Ok(headers)
}

/// 只改寫 `data.start_date` 與 `data.end_date` 兩個欄位（現在 / 現在 + 15 天，
/// ISO-8601 UTC），其餘 body 內容原樣保留。
fn rewrite_body_dates(template: &str, now: DateTime<Utc>) -> Result<String> {
    let mut body: Value =
        serde_json::from_str(template).map_err(|e| MonitorError::TemplateError {
            message: format!("body template is not valid JSON: {}", e),
        })?;

    let data = body
        .get_mut("data")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| MonitorError::TemplateError {
            message: "body template is missing a data object".to_string(),
        })?;

    let window_end = now + chrono::Duration::days(15);
    data.insert(
        "start_date".to_string(),
        Value::String(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    data.insert(
        "end_date".to_string(),
        Value::String(window_end.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );

    serde_json::to_string(&body).map_err(|e| MonitorError::TemplateError {
        message: format!("failed to serialize rewritten body: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use httpmock::prelude::*;

    struct FixedTemplates {
        headers: String,
        body: String,
    }

    #[async_trait]
    impl TemplateStore for FixedTemplates {
        async fn header_template(&self) -> Result<String> {
            Ok(self.headers.clone())
        }

        async fn body_template(&self) -> Result<String> {
            Ok(self.body.clone())
        }
    }

    #[test]
    fn test_rewrite_overwrites_only_the_two_date_fields() {
        let template = r#"{
            "data": {
                "start_date": "stale",
                "end_date": "stale",
                "service_info": { "fulfillment_type": "DELIVERY" }
            },
            "requestorigin": "gi"
        }"#;
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();

        let rewritten = rewrite_body_dates(template, now).unwrap();
        let value: Value = serde_json::from_str(&rewritten).unwrap();

        assert_eq!(value["data"]["start_date"], "2024-01-10T12:00:00Z");
        assert_eq!(value["data"]["end_date"], "2024-01-25T12:00:00Z");
        // 其餘內容不受影響
        assert_eq!(value["data"]["service_info"]["fulfillment_type"], "DELIVERY");
        assert_eq!(value["requestorigin"], "gi");
    }

    #[test]
    fn test_rewrite_requires_a_data_object() {
        let err = rewrite_body_dates(r#"{"no_data": true}"#, Utc::now()).unwrap_err();
        assert!(matches!(err, MonitorError::TemplateError { .. }));
    }

    #[test]
    fn test_rewrite_rejects_invalid_template_json() {
        let err = rewrite_body_dates("{ not json", Utc::now()).unwrap_err();
        assert!(matches!(err, MonitorError::TemplateError { .. }));
    }

    #[test]
    fn test_header_template_drops_content_headers() {
        let raw = "X-Api-Key: secret\r\nContent-Type: text/plain\r\ncontent-length: 999\r\nAccept: application/json\r\n";

        let headers = parse_header_template(raw).unwrap();

        assert_eq!(
            headers,
            vec![
                ("X-Api-Key".to_string(), "secret".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ]
        );
    }

    #[test]
    fn test_header_template_line_without_colon_fails() {
        let err = parse_header_template("this is not a header\n").unwrap_err();
        assert!(matches!(err, MonitorError::TemplateError { .. }));
    }

    #[tokio::test]
    async fn test_fetch_posts_rewritten_request() {
        let server = MockServer::start();

        let slot_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v3/slot/view")
                .header("x-api-key", "secret")
                // content type 來自改寫後的 body，不是範本裡的 text/plain
                .header("content-type", "application/json")
                .body_contains("start_date")
                .body_contains("end_date");
            then.status(200)
                .header("Content-Type", "application/json")
                .body(r#"{"data":{"slot_days":[]}}"#);
        });

        let templates = FixedTemplates {
            headers: "X-Api-Key: secret\r\nContent-Type: text/plain".to_string(),
            body: r#"{"data":{"start_date":"old","end_date":"old"}}"#.to_string(),
        };
        let fetcher =
            SlotFetcher::new(templates, server.base_url(), Duration::from_secs(5)).unwrap();

        let raw = fetcher.fetch().await.unwrap();

        slot_mock.assert();
        assert_eq!(raw, r#"{"data":{"slot_days":[]}}"#);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_fatal() {
        let server = MockServer::start();

        let slot_mock = server.mock(|when, then| {
            when.method(POST).path("/api/v3/slot/view");
            then.status(503);
        });

        let templates = FixedTemplates {
            headers: String::new(),
            body: r#"{"data":{}}"#.to_string(),
        };
        let fetcher =
            SlotFetcher::new(templates, server.base_url(), Duration::from_secs(5)).unwrap();

        let err = fetcher.fetch().await.unwrap_err();

        slot_mock.assert();
        assert!(matches!(err, MonitorError::UpstreamError { status: 503 }));
    }
}
