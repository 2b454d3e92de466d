use crate::core::pagination::DEFAULT_MAX_PAGES;
use crate::core::upload::{DEFAULT_CHUNK_SIZE, DEFAULT_TIMESTAMP_FIELD};
use crate::core::Credential;
use crate::utils::error::{MigrationError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub origin: TenantConfig,
    pub destination: TenantConfig,
    #[serde(default)]
    pub migration: MigrationSettings,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    /// 身分提供者 (UAA) 的 base URL
    pub uaa_url: String,
    /// base64 編碼的 `client_id:client_secret`
    pub credential: String,
    pub asset_url: String,
    pub zone_id: String,
}

impl std::fmt::Debug for TenantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantConfig")
            .field("uaa_url", &self.uaa_url)
            .field("credential", &"<redacted>")
            .field("asset_url", &self.asset_url)
            .field("zone_id", &self.zone_id)
            .finish()
    }
}

impl TenantConfig {
    pub fn credential(&self) -> Credential {
        Credential {
            identity_provider_url: self.uaa_url.clone(),
            encoded: self.credential.clone(),
        }
    }

    /// 集合的完整 URL，名稱編碼成單一 path segment
    pub fn collection_url(&self, collection: &str) -> Result<Url> {
        let invalid = |reason: String| MigrationError::InvalidConfigValueError {
            field: "asset_url".to_string(),
            value: self.asset_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.asset_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot carry a collection path".to_string()))?
            .pop_if_empty()
            .push(collection.trim_start_matches('/'));
        Ok(url)
    }

    fn validate_as(&self, tenant: &str) -> Result<()> {
        validate_url(&format!("{}.uaa_url", tenant), &self.uaa_url)?;
        validate_url(&format!("{}.asset_url", tenant), &self.asset_url)?;
        validate_non_empty_string(&format!("{}.credential", tenant), &self.credential)?;
        validate_non_empty_string(&format!("{}.zone_id", tenant), &self.zone_id)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationSettings {
    pub page_size: Option<usize>,
    pub chunk_size: Option<usize>,
    pub max_pages: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub timestamp_field: Option<String>,
    /// 只遷移列出的集合；未設定時遷移全部
    pub collections: Option<Vec<String>>,
}

impl MigrationConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MigrationError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ORIGIN_CREDENTIAL})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MigrationError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn page_size(&self) -> usize {
        self.migration.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn chunk_size(&self) -> usize {
        self.migration.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    pub fn max_pages(&self) -> usize {
        self.migration.max_pages.unwrap_or(DEFAULT_MAX_PAGES)
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.migration.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn timestamp_field(&self) -> &str {
        self.migration
            .timestamp_field
            .as_deref()
            .unwrap_or(DEFAULT_TIMESTAMP_FIELD)
    }

    pub fn collection_filter(&self) -> Option<&[String]> {
        self.migration.collections.as_deref()
    }

    /// 來源查詢 URL，附帶固定的 pageSize 參數
    pub fn source_url(&self, collection: &str) -> Result<String> {
        let mut url = self.origin.collection_url(collection)?;
        url.query_pairs_mut()
            .append_pair("pageSize", &self.page_size().to_string());
        Ok(url.into())
    }

    pub fn destination_url(&self, collection: &str) -> Result<String> {
        Ok(self.destination.collection_url(collection)?.into())
    }
}

impl Validate for MigrationConfig {
    fn validate(&self) -> Result<()> {
        self.origin.validate_as("origin")?;
        self.destination.validate_as("destination")?;

        validate_positive_number("migration.page_size", self.page_size(), 1)?;
        validate_positive_number("migration.chunk_size", self.chunk_size(), 1)?;
        validate_positive_number("migration.max_pages", self.max_pages(), 1)?;
        validate_range("migration.timeout_seconds", self.timeout_seconds(), 1, 3600)?;
        validate_non_empty_string("migration.timestamp_field", self.timestamp_field())?;

        if let Some(filter) = self.collection_filter() {
            for name in filter {
                validate_non_empty_string("migration.collections", name)?;
            }
        }

        Ok(())
    }
}
