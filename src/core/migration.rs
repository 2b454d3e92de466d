use crate::config::MigrationConfig;
use crate::core::pagination::Paginator;
use crate::core::token::TokenService;
use crate::core::transport::{build_client, HttpTransport};
use crate::core::upload::{BatchUploader, UploadSummary};
use crate::core::{
    CallMethod, CollectionDescriptor, MigrationPhase, RecordTransport, TenantRole, TenantTokens,
    Token,
};
use crate::utils::error::{MigrationError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::Instrument;

/// 單一集合的最終狀態
#[derive(Debug)]
pub enum CollectionOutcome {
    Migrated(UploadSummary),
    PaginationFailed(MigrationError),
    UploadFailed {
        fetched: usize,
        error: MigrationError,
    },
}

impl CollectionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CollectionOutcome::Migrated(_))
    }

    /// 與 log 相同的結果訊息
    pub fn message(&self) -> String {
        match self {
            CollectionOutcome::Migrated(summary) => summary.to_string(),
            CollectionOutcome::PaginationFailed(error) => {
                format!("Failed to read domain object instances: {}", error)
            }
            CollectionOutcome::UploadFailed { error, .. } => {
                format!("Failed to post domain object instances: {}", error)
            }
        }
    }

    /// Phase the collection was in when it settled.
    pub fn phase(&self) -> MigrationPhase {
        match self {
            CollectionOutcome::Migrated(_) => MigrationPhase::Done,
            CollectionOutcome::PaginationFailed(_) => MigrationPhase::Paginating,
            CollectionOutcome::UploadFailed { .. } => MigrationPhase::Uploading,
        }
    }
}

#[derive(Debug)]
pub struct CollectionReport {
    pub name: String,
    pub declared_count: u64,
    pub outcome: CollectionOutcome,
    pub duration: Duration,
}

#[derive(Debug, Default)]
pub struct MigrationReport {
    pub collections: Vec<CollectionReport>,
    pub duration: Duration,
}

impl MigrationReport {
    pub fn get(&self, name: &str) -> Option<&CollectionReport> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn succeeded(&self) -> usize {
        self.collections
            .iter()
            .filter(|c| c.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.collections.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn records_migrated(&self) -> usize {
        self.collections
            .iter()
            .map(|c| match &c.outcome {
                CollectionOutcome::Migrated(summary) => summary.records,
                _ => 0,
            })
            .sum()
    }
}

/// 取得 token 與集合清單的結果（dry run 用）
#[derive(Debug, Clone)]
pub struct Discovery {
    pub tokens: TenantTokens,
    pub collections: Vec<CollectionDescriptor>,
}

pub struct MigrationEngine<T: RecordTransport + ?Sized> {
    config: Arc<MigrationConfig>,
    token_service: TokenService,
    transport: Arc<T>,
}

impl MigrationEngine<HttpTransport> {
    /// 以設定的逾時建立共用的 HTTP client
    pub fn from_config(config: MigrationConfig) -> Result<Self> {
        let client = build_client(Duration::from_secs(config.timeout_seconds()))?;
        let token_service = TokenService::new(client.clone());
        let transport = Arc::new(HttpTransport::new(client));
        Ok(Self::new(config, token_service, transport))
    }
}

impl<T: RecordTransport + ?Sized + 'static> MigrationEngine<T> {
    pub fn new(config: MigrationConfig, token_service: TokenService, transport: Arc<T>) -> Self {
        Self {
            config: Arc::new(config),
            token_service,
            transport,
        }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// 同時向兩個身分提供者取得 token；任一失敗即中止
    pub async fn acquire_tokens(&self) -> Result<TenantTokens> {
        tracing::info!("🔑 Phase: {}", MigrationPhase::AcquiringTokens);
        let origin_credential = self.config.origin.credential();
        let destination_credential = self.config.destination.credential();

        let (origin, destination) = tokio::try_join!(
            self.token_service.acquire_token(
                TenantRole::Origin,
                &origin_credential,
                &self.config.origin.zone_id,
            ),
            self.token_service.acquire_token(
                TenantRole::Destination,
                &destination_credential,
                &self.config.destination.zone_id,
            ),
        )?;

        Ok(TenantTokens {
            origin,
            destination,
        })
    }

    pub async fn list_collections(&self, origin: &Token) -> Result<Vec<CollectionDescriptor>> {
        tracing::info!("📋 Phase: {}", MigrationPhase::ListingCollections);
        let url = &self.config.origin.asset_url;
        let response = self
            .transport
            .call(url, origin, CallMethod::Get, None)
            .await?;

        let mut collections: Vec<CollectionDescriptor> = match response.body {
            None => Vec::new(),
            Some(body) => serde_json::from_value(body).map_err(|e| {
                MigrationError::transport("GET", url, format!("unexpected collection listing: {}", e))
            })?,
        };

        if let Some(filter) = self.config.collection_filter() {
            let wanted: HashSet<&str> = filter.iter().map(|n| n.trim_start_matches('/')).collect();
            let found: HashSet<&str> = collections.iter().map(|c| c.path_name()).collect();
            for missing in wanted.difference(&found) {
                tracing::warn!("⚠️ Collection '{}' not found in origin tenant", missing);
            }
            collections.retain(|c| wanted.contains(c.path_name()));
        }

        tracing::info!("📋 Found {} collections to migrate", collections.len());
        for collection in &collections {
            tracing::debug!("📋 {} ({} records)", collection.name, collection.count);
        }
        Ok(collections)
    }

    pub async fn discover(&self) -> Result<Discovery> {
        let tokens = self.acquire_tokens().await?;
        let collections = self.list_collections(&tokens.origin).await?;
        Ok(Discovery {
            tokens,
            collections,
        })
    }

    /// 執行整個遷移；只有 token 或集合清單失敗會回傳 `Err`
    pub async fn run(&self) -> Result<MigrationReport> {
        let started = Instant::now();
        let Discovery {
            tokens,
            collections,
        } = self.discover().await?;

        let mut join_set: JoinSet<CollectionReport> = JoinSet::new();
        for descriptor in collections.iter().cloned() {
            let span = tracing::info_span!("collection", name = %descriptor.path_name());
            join_set.spawn(
                migrate_collection(
                    Arc::clone(&self.transport),
                    Arc::clone(&self.config),
                    tokens.clone(),
                    descriptor,
                )
                .instrument(span),
            );
        }

        let mut reports = Vec::with_capacity(collections.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!("❌ Collection task aborted: {}", e),
            }
        }

        // 中途崩潰的 task 沒有回報，補上失敗紀錄
        for descriptor in &collections {
            if !reports.iter().any(|r| r.name == descriptor.path_name()) {
                reports.push(CollectionReport {
                    name: descriptor.path_name().to_string(),
                    declared_count: descriptor.count,
                    outcome: CollectionOutcome::PaginationFailed(MigrationError::transport(
                        "GET",
                        descriptor.path_name(),
                        "collection task aborted",
                    )),
                    duration: Duration::ZERO,
                });
            }
        }
        reports.sort_by(|a, b| a.name.cmp(&b.name));

        let report = MigrationReport {
            collections: reports,
            duration: started.elapsed(),
        };
        tracing::info!(
            "🏁 Phase: {} ({} succeeded, {} failed, {} records in {:?})",
            MigrationPhase::Done,
            report.succeeded(),
            report.failed(),
            report.records_migrated(),
            report.duration
        );
        Ok(report)
    }
}

async fn migrate_collection<T: RecordTransport + ?Sized + 'static>(
    transport: Arc<T>,
    config: Arc<MigrationConfig>,
    tokens: TenantTokens,
    descriptor: CollectionDescriptor,
) -> CollectionReport {
    let started = Instant::now();
    let name = descriptor.path_name().to_string();

    let outcome = transfer(transport, &config, &tokens, &name, descriptor.count).await;
    if !outcome.is_success() {
        tracing::error!("❌ {}: {}", name, outcome.message());
    }

    CollectionReport {
        name,
        declared_count: descriptor.count,
        outcome,
        duration: started.elapsed(),
    }
}

/// 組不出 URL 時集合尚未讀取，算在分頁階段
async fn transfer<T: RecordTransport + ?Sized + 'static>(
    transport: Arc<T>,
    config: &MigrationConfig,
    tokens: &TenantTokens,
    name: &str,
    expected_count: u64,
) -> CollectionOutcome {
    let urls = config
        .source_url(name)
        .and_then(|source| Ok((source, config.destination_url(name)?)));
    let (source_url, destination_url) = match urls {
        Ok(urls) => urls,
        Err(error) => return CollectionOutcome::PaginationFailed(error),
    };

    let records = match Paginator::new(transport.as_ref(), config.max_pages())
        .fetch_all(&source_url, &tokens.origin, expected_count)
        .await
    {
        Ok(records) => records,
        Err(error) => return CollectionOutcome::PaginationFailed(error),
    };

    let fetched = records.len();
    let uploader = BatchUploader::new(transport, config.chunk_size(), config.timestamp_field());
    match uploader
        .upload(name, &destination_url, &tokens.destination, records)
        .await
    {
        Ok(summary) => CollectionOutcome::Migrated(summary),
        Err(error) => CollectionOutcome::UploadFailed { fetched, error },
    }
}
