use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// 遷移的來源或目的租戶
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TenantRole {
    Origin,
    Destination,
}

impl fmt::Display for TenantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantRole::Origin => write!(f, "origin"),
            TenantRole::Destination => write!(f, "destination"),
        }
    }
}

/// 預先以 base64 編碼的 client credential 與身分提供者位址
#[derive(Clone)]
pub struct Credential {
    pub identity_provider_url: String,
    pub encoded: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identity_provider_url", &self.identity_provider_url)
            .field("encoded", &"<redacted>")
            .finish()
    }
}

/// 單一租戶的 bearer token，整個遷移期間不變
#[derive(Clone)]
pub struct Token {
    pub tenant: TenantRole,
    pub access_token: String,
    pub zone_id: String,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("tenant", &self.tenant)
            .field("access_token", &"<redacted>")
            .field("zone_id", &self.zone_id)
            .finish()
    }
}

/// Both tenant tokens, produced once by the token phase.
#[derive(Debug, Clone)]
pub struct TenantTokens {
    pub origin: Token,
    pub destination: Token,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionDescriptor {
    pub name: String,
    pub count: u64,
}

/// 清單項目可能同時帶 `collection` 與 `name`，以 `collection` 為準
impl<'de> Deserialize<'de> for CollectionDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            collection: Option<String>,
            name: Option<String>,
            #[serde(default)]
            count: u64,
        }

        let raw = Raw::deserialize(deserializer)?;
        let name = raw
            .collection
            .or(raw.name)
            .ok_or_else(|| <D::Error as de::Error>::missing_field("collection"))?;
        Ok(Self {
            name,
            count: raw.count,
        })
    }
}

impl CollectionDescriptor {
    /// 建立 URL 用的名稱（去掉開頭的 `/`）
    pub fn path_name(&self) -> &str {
        self.name.trim_start_matches('/')
    }
}

/// Opaque domain object instance. Only the migration timestamp is ever touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    pub fn stamp(&mut self, field: &str, timestamp: &str) {
        self.data.insert(
            field.to_string(),
            serde_json::Value::String(timestamp.to_string()),
        );
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Record {
    fn from(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    AcquiringTokens,
    ListingCollections,
    Paginating,
    Uploading,
    Done,
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationPhase::AcquiringTokens => "acquiring tokens",
            MigrationPhase::ListingCollections => "listing collections",
            MigrationPhase::Paginating => "paginating",
            MigrationPhase::Uploading => "uploading",
            MigrationPhase::Done => "done",
        };
        f.write_str(name)
    }
}
