use crate::core::{CallMethod, Record, RecordTransport, Token};
use crate::utils::error::{MigrationError, Result};
use chrono::{SecondsFormat, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_TIMESTAMP_FIELD: &str = "migrationTimestamp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub records: usize,
    pub chunks: usize,
}

impl fmt::Display for UploadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Finished posting {} domain object instances.", self.records)
    }
}

/// 將記錄切成固定大小的 chunk 並同時上傳
pub struct BatchUploader<T: RecordTransport + ?Sized> {
    transport: Arc<T>,
    chunk_size: usize,
    timestamp_field: String,
}

/// Contiguous chunks of at most `chunk_size` records, order preserved.
pub fn partition(records: Vec<Record>, chunk_size: usize) -> Vec<Vec<Record>> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(records.len().div_ceil(chunk_size));
    let mut iter = records.into_iter().peekable();
    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(chunk_size).collect());
    }
    chunks
}

pub fn migration_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl<T: RecordTransport + ?Sized + 'static> BatchUploader<T> {
    pub fn new(transport: Arc<T>, chunk_size: usize, timestamp_field: impl Into<String>) -> Self {
        Self {
            transport,
            chunk_size,
            timestamp_field: timestamp_field.into(),
        }
    }

    pub async fn upload(
        &self,
        collection: &str,
        destination_url: &str,
        token: &Token,
        records: Vec<Record>,
    ) -> Result<UploadSummary> {
        let total_records = records.len();
        let chunks = partition(records, self.chunk_size);
        let total_chunks = chunks.len();

        tracing::info!(
            "📤 {}: Posting {} domain object instances in {} chunks",
            collection,
            total_records,
            total_chunks
        );

        let mut join_set: JoinSet<(usize, Result<()>)> = JoinSet::new();
        for (index, mut chunk) in chunks.into_iter().enumerate() {
            let stamp = migration_timestamp();
            for record in chunk.iter_mut() {
                record.stamp(&self.timestamp_field, &stamp);
            }

            let transport = Arc::clone(&self.transport);
            let token = token.clone();
            let url = destination_url.to_string();
            join_set.spawn(async move {
                let result = transport
                    .call(&url, &token, CallMethod::Post, Some(chunk.as_slice()))
                    .await
                    .map(|_| ());
                (index, result)
            });
        }

        let mut failed_chunks = 0;
        let mut first_error: Option<String> = None;
        while let Some(joined) = join_set.join_next().await {
            let failure = match joined {
                Ok((index, Ok(()))) => {
                    tracing::debug!("📤 {}: chunk {}/{} posted", collection, index + 1, total_chunks);
                    None
                }
                Ok((index, Err(e))) => Some(format!("chunk {}: {}", index + 1, e)),
                Err(e) => Some(format!("upload task failed: {}", e)),
            };

            if let Some(message) = failure {
                tracing::warn!("❌ {}: {}", collection, message);
                failed_chunks += 1;
                first_error.get_or_insert(message);
            }
        }

        if let Some(first_error) = first_error {
            return Err(MigrationError::AggregateUploadError {
                collection: collection.to_string(),
                failed_chunks,
                total_chunks,
                first_error,
            });
        }

        let summary = UploadSummary {
            records: total_records,
            chunks: total_chunks,
        };
        tracing::info!("✅ {}: {}", collection, summary);
        Ok(summary)
    }
}
