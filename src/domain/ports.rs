use crate::domain::model::{Record, Token};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMethod {
    Get,
    Post,
}

impl fmt::Display for CallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallMethod::Get => f.write_str("GET"),
            CallMethod::Post => f.write_str("POST"),
        }
    }
}

/// 成功回應：解析後的 body（可能不存在）與 response headers
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub body: Option<serde_json::Value>,
    pub headers: HeaderMap,
}

/// Authenticated access to one tenant's asset catalog.
#[async_trait]
pub trait RecordTransport: Send + Sync {
    async fn call(
        &self,
        url: &str,
        token: &Token,
        method: CallMethod,
        body: Option<&[Record]>,
    ) -> Result<TransportResponse>;
}
