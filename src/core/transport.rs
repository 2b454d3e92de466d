use crate::core::{CallMethod, Record, RecordTransport, Token, TransportResponse};
use crate::utils::error::{MigrationError, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{redirect, Client};
use std::time::Duration;

pub const ZONE_ID_HEADER: &str = "Predix-Zone-Id";
pub const FORCE_WRITE_HEADER: &str = "Predix-Asset-Force-Write";

/// 共用的 HTTP client；不跟隨轉址，3xx 視為失敗
pub fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .redirect(redirect::Policy::none())
        .build()?)
}

/// reqwest 實作的 asset catalog 存取
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecordTransport for HttpTransport {
    async fn call(
        &self,
        url: &str,
        token: &Token,
        method: CallMethod,
        body: Option<&[Record]>,
    ) -> Result<TransportResponse> {
        let method_name = method.to_string();
        let fail = |reason: String| MigrationError::transport(&method_name, url, reason);

        let mut request = match method {
            CallMethod::Get => self.client.get(url),
            CallMethod::Post => self.client.post(url).header(FORCE_WRITE_HEADER, "true"),
        };
        request = request
            .header(ZONE_ID_HEADER, &token.zone_id)
            .header(AUTHORIZATION, format!("Bearer {}", token.access_token));

        if let Some(records) = body {
            request = request.json(records);
        }

        tracing::debug!("📡 {} {}", method_name, url);
        let response = request.send().await.map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        tracing::debug!("📡 {} {} -> {}", method_name, url, status);
        if !status.is_success() {
            return Err(fail(format!("status {}", status)));
        }

        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;

        // 沒有 body 不算錯誤
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(
                serde_json::from_slice(&bytes)
                    .map_err(|e| fail(format!("invalid JSON body: {}", e)))?,
            )
        };

        Ok(TransportResponse { body, headers })
    }
}
