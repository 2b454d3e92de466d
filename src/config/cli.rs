use crate::config::toml_config::MigrationConfig;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "asset-migrate")]
#[command(about = "Migrate asset catalog collections between two tenants")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "migration.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Acquire tokens and list collections without transferring records
    #[arg(long)]
    pub dry_run: bool,

    /// Override migration.page_size
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Override migration.chunk_size
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Only migrate these collections
    #[arg(long, value_delimiter = ',')]
    pub collections: Vec<String>,
}

impl CliConfig {
    /// 命令列參數優先於設定檔
    pub fn apply_overrides(&self, config: &mut MigrationConfig) {
        if let Some(page_size) = self.page_size {
            config.migration.page_size = Some(page_size);
            tracing::info!("🔧 page_size overridden to: {}", page_size);
        }
        if let Some(chunk_size) = self.chunk_size {
            config.migration.chunk_size = Some(chunk_size);
            tracing::info!("🔧 chunk_size overridden to: {}", chunk_size);
        }
        if !self.collections.is_empty() {
            config.migration.collections = Some(self.collections.clone());
            tracing::info!("🔧 collections limited to: {}", self.collections.join(", "));
        }
    }
}
