use crate::core::{Credential, TenantRole, Token};
use crate::utils::error::{MigrationError, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

const TOKEN_REQUEST_BODY: &str = "grant_type=client_credentials&response_type=token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// OAuth client-credentials 交換
#[derive(Debug, Clone)]
pub struct TokenService {
    client: Client,
}

impl TokenService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn acquire_token(
        &self,
        tenant: TenantRole,
        credential: &Credential,
        zone_id: &str,
    ) -> Result<Token> {
        let url = format!(
            "{}/oauth/token",
            credential.identity_provider_url.trim_end_matches('/')
        );
        let auth_error = |reason: String| MigrationError::AuthError {
            tenant: tenant.to_string(),
            reason,
        };

        tracing::debug!("🔑 Requesting {} token from {}", tenant, url);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Basic {}", credential.encoded))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(TOKEN_REQUEST_BODY)
            .send()
            .await
            .map_err(|e| auth_error(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(auth_error(format!("identity provider returned {}", status)));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| auth_error(format!("unreadable token response: {}", e)))?;

        match parsed.access_token {
            Some(access_token) if !access_token.is_empty() => {
                tracing::info!("🔑 Obtained {} token", tenant);
                Ok(Token {
                    tenant,
                    access_token,
                    zone_id: zone_id.to_string(),
                })
            }
            _ => Err(auth_error("response has no access_token".to_string())),
        }
    }
}
