//! In-memory transport shared by the unit tests.

use crate::core::{CallMethod, Record, RecordTransport, TenantRole, Token, TransportResponse};
use crate::utils::error::{MigrationError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, LINK};
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: CallMethod,
    pub url: String,
    pub zone_id: String,
    pub body: Option<Vec<Record>>,
}

#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, TransportResponse>>,
    failing_urls: Mutex<HashSet<String>>,
    failing_ids: Mutex<HashSet<i64>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn respond(&self, url: &str, response: TransportResponse) {
        self.responses.lock().await.insert(url.to_string(), response);
    }

    pub async fn fail(&self, url: &str) {
        self.failing_urls.lock().await.insert(url.to_string());
    }

    /// POST 的 body 含有此 id 時回傳失敗
    pub async fn fail_posts_with_id(&self, id: i64) {
        self.failing_ids.lock().await.insert(id);
    }

    pub async fn gets(&self) -> Vec<RecordedCall> {
        self.calls_with(CallMethod::Get).await
    }

    pub async fn posts(&self) -> Vec<RecordedCall> {
        self.calls_with(CallMethod::Post).await
    }

    async fn calls_with(&self, method: CallMethod) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RecordTransport for ScriptedTransport {
    async fn call(
        &self,
        url: &str,
        token: &Token,
        method: CallMethod,
        body: Option<&[Record]>,
    ) -> Result<TransportResponse> {
        self.calls.lock().await.push(RecordedCall {
            method,
            url: url.to_string(),
            zone_id: token.zone_id.clone(),
            body: body.map(|records| records.to_vec()),
        });

        if self.failing_urls.lock().await.contains(url) {
            return Err(MigrationError::transport(&method.to_string(), url, "status 500"));
        }

        match method {
            CallMethod::Get => self
                .responses
                .lock()
                .await
                .get(url)
                .cloned()
                .ok_or_else(|| MigrationError::transport("GET", url, "status 404")),
            CallMethod::Post => {
                let failing_ids = self.failing_ids.lock().await;
                let hit = body.unwrap_or_default().iter().any(|r| {
                    r.data
                        .get("id")
                        .and_then(|v| v.as_i64())
                        .is_some_and(|id| failing_ids.contains(&id))
                });
                if hit {
                    Err(MigrationError::transport("POST", url, "status 400"))
                } else {
                    Ok(TransportResponse::default())
                }
            }
        }
    }
}

pub fn token() -> Token {
    Token {
        tenant: TenantRole::Origin,
        access_token: "test-token".to_string(),
        zone_id: "zone-test".to_string(),
    }
}

pub fn records(ids: Range<i64>) -> Vec<Record> {
    ids.map(|id| {
        let mut data = serde_json::Map::new();
        data.insert("id".to_string(), serde_json::Value::from(id));
        Record { data }
    })
    .collect()
}

pub fn page(ids: Range<i64>, next: Option<&str>) -> TransportResponse {
    let mut headers = HeaderMap::new();
    if let Some(next) = next {
        let value = format!("<{}>; rel=\"next\"", next);
        headers.insert(LINK, HeaderValue::from_str(&value).unwrap());
    }
    TransportResponse {
        body: Some(serde_json::to_value(records(ids)).unwrap()),
        headers,
    }
}
