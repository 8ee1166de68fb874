//! Client for the Public Data Portal (data.go.kr) REST endpoints.

use crate::config::toml_config::ApiConfig;
use crate::domain::model::Record;
use crate::utils::error::{is_server_status, AccessError, Result};
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// One decoded response page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    pub total_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct PublicDataClient {
    client: Client,
    service_key: String,
    page_size: usize,
    max_pages: usize,
    retry_count: u32,
    retry_delay: Duration,
}

impl PublicDataClient {
    pub fn new(service_key: &str, api: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            service_key: decode_service_key(service_key),
            page_size: api.page_size,
            max_pages: api.max_pages,
            retry_count: api.retry_count,
            retry_delay: Duration::from_secs(api.retry_delay_seconds),
        })
    }

    /// Walks pages until one comes back empty, `totalCount` is reached or `max_pages` is hit.
    pub async fn fetch_all(&self, endpoint: &str, params: &[(String, String)]) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        for page_no in 1..=self.max_pages {
            let page = self.fetch_page(endpoint, params, page_no).await?;
            let received = page.records.len();
            tracing::debug!(
                "📄 Page {} from {}: {} records (total {:?})",
                page_no,
                endpoint,
                received,
                page.total_count
            );

            records.extend(page.records);

            if received == 0 {
                break;
            }
            if let Some(total) = page.total_count {
                if records.len() >= total {
                    break;
                }
            }
        }

        Ok(records)
    }

    /// Fetches one page, retrying transport failures and 5xx answers with a fixed delay.
    pub async fn fetch_page(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        page_no: usize,
    ) -> Result<Page> {
        let mut attempt = 0;
        loop {
            let result = match self.send(endpoint, params, page_no, self.page_size).await {
                Ok(body) => parse_response(&body),
                Err(e) => Err(e),
            };

            match result {
                Ok(page) => return Ok(page),
                Err(e) if attempt < self.retry_count && is_retryable(&e) => {
                    attempt += 1;
                    tracing::warn!(
                        "⚠️ Request to {} failed ({}), retry {}/{}",
                        endpoint,
                        e,
                        attempt,
                        self.retry_count
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Status code and raw body of a single small request, for diagnostics.
    pub async fn fetch_raw(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        rows: usize,
    ) -> Result<(u16, String)> {
        let response = self
            .client
            .get(endpoint)
            .query(&self.query(params, 1, rows))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    fn query(&self, params: &[(String, String)], page_no: usize, rows: usize) -> Vec<(String, String)> {
        let mut query = vec![
            ("serviceKey".to_string(), self.service_key.clone()),
            ("pageNo".to_string(), page_no.to_string()),
            ("numOfRows".to_string(), rows.to_string()),
            ("type".to_string(), "json".to_string()),
        ];
        query.extend(params.iter().cloned());
        query
    }

    async fn send(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        page_no: usize,
        rows: usize,
    ) -> Result<String> {
        tracing::debug!("Making API request to: {} (page {})", endpoint, page_no);
        let response = self
            .client
            .get(endpoint)
            .query(&self.query(params, page_no, rows))
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AccessError::ApiResponseError {
                code: status.as_u16().to_string(),
                message: error_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("HTTP error").to_string()),
            });
        }

        Ok(body)
    }
}

fn is_retryable(error: &AccessError) -> bool {
    match error {
        AccessError::ApiError(_) => true,
        AccessError::ApiResponseError { code, .. } => is_server_status(code),
        _ => false,
    }
}

/// Portal keys are handed out percent-encoded; decode once so the query encoder
/// does not encode them a second time.
pub fn decode_service_key(key: &str) -> String {
    let key = key.trim();
    if !key.contains('%') {
        return key.to_string();
    }
    url::form_urlencoded::parse(format!("k={}", key).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| key.to_string())
}

/// Accepts the portal's `response.header/body` envelope, a bare `{"items": ..}`
/// object or a top-level array.
pub fn parse_response(body: &str) -> Result<Page> {
    let trimmed = body.trim_start_matches('\u{feff}').trim();

    if trimmed.starts_with('<') {
        return Err(AccessError::ApiResponseError {
            code: xml_tag(trimmed, "returnReasonCode")
                .or_else(|| xml_tag(trimmed, "resultCode"))
                .unwrap_or_else(|| "XML".to_string()),
            message: error_message(trimmed)
                .unwrap_or_else(|| "unexpected XML response".to_string()),
        });
    }

    let value: Value = serde_json::from_str(trimmed).map_err(|e| AccessError::ApiResponseError {
        code: "INVALID_JSON".to_string(),
        message: format!("{} (body starts with {:?})", e, preview(trimmed)),
    })?;

    if let Value::Array(items) = value {
        return Ok(Page {
            records: objects(items),
            total_count: None,
        });
    }

    let root = value.get("response").unwrap_or(&value);

    if let Some(header) = root.get("header") {
        let code = header.get("resultCode").map(scalar_text).unwrap_or_default();
        if !code.is_empty() && code != "00" && code != "0" {
            return Err(AccessError::ApiResponseError {
                code,
                message: header
                    .get("resultMsg")
                    .map(scalar_text)
                    .unwrap_or_default(),
            });
        }
    }

    let body = root.get("body").unwrap_or(root);
    let total_count = body
        .get("totalCount")
        .map(scalar_text)
        .and_then(|t| t.parse::<usize>().ok());

    let records = match body.get("items") {
        Some(Value::Array(items)) => objects(items.clone()),
        Some(Value::Object(obj)) => match obj.get("item") {
            Some(Value::Array(items)) => objects(items.clone()),
            Some(Value::Object(item)) => vec![Record::from_object(item.clone())],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    Ok(Page {
        records,
        total_count,
    })
}

fn objects(items: Vec<Value>) -> Vec<Record> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(obj) => Some(Record::from_object(obj)),
            _ => None,
        })
        .collect()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn error_message(body: &str) -> Option<String> {
    xml_tag(body, "returnAuthMsg")
        .or_else(|| xml_tag(body, "resultMsg"))
        .or_else(|| xml_tag(body, "errMsg"))
}

fn xml_tag(body: &str, tag: &str) -> Option<String> {
    let re = Regex::new(&format!(r"<{tag}>\s*([^<]*?)\s*</{tag}>")).ok()?;
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}

fn preview(body: &str) -> String {
    body.chars().take(120).collect()
}
