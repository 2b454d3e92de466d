use asset_migrate::core::migration::Discovery;
use asset_migrate::utils::error::ErrorSeverity;
use asset_migrate::utils::{logger, validation::Validate};
use asset_migrate::{
    CliConfig, CollectionOutcome, MigrationConfig, MigrationEngine, MigrationError,
    MigrationReport,
};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting asset-migrate");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match MigrationConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    args.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, args.dry_run);

    let engine = MigrationEngine::from_config(config)?;

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No records will be transferred");
        match engine.discover().await {
            Ok(discovery) => display_discovery(&discovery),
            Err(e) => exit_with(&e),
        }
        return Ok(());
    }

    match engine.run().await {
        Ok(report) => {
            display_report(&report);
            if !report.is_success() {
                std::process::exit(2);
            }
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

fn exit_with(e: &MigrationError) -> ! {
    tracing::error!(
        "❌ Migration failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn display_config_summary(config: &MigrationConfig, dry_run: bool) {
    println!("📋 Configuration Summary:");
    println!(
        "  Origin: {} (zone {})",
        config.origin.asset_url, config.origin.zone_id
    );
    println!(
        "  Destination: {} (zone {})",
        config.destination.asset_url, config.destination.zone_id
    );
    println!("  Page Size: {}", config.page_size());
    println!("  Chunk Size: {}", config.chunk_size());
    println!("  Timestamp Field: {}", config.timestamp_field());
    if let Some(filter) = config.collection_filter() {
        println!("  Collections: {}", filter.join(", "));
    }
    if dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
    println!();
}

fn display_discovery(discovery: &Discovery) {
    let total: u64 = discovery.collections.iter().map(|c| c.count).sum();
    println!("🔍 Dry Run Analysis:");
    println!("  ✅ Origin token acquired (zone {})", discovery.tokens.origin.zone_id);
    println!(
        "  ✅ Destination token acquired (zone {})",
        discovery.tokens.destination.zone_id
    );
    println!("  📦 {} collections, {} declared records", discovery.collections.len(), total);
    for collection in &discovery.collections {
        println!("    {} ({} records)", collection.path_name(), collection.count);
    }
}

fn display_report(report: &MigrationReport) {
    println!("📊 Migration Report:");
    for collection in &report.collections {
        match &collection.outcome {
            CollectionOutcome::Migrated(summary) => println!(
                "  ✅ {}: {} ({} chunks, {:?})",
                collection.name, summary, summary.chunks, collection.duration
            ),
            CollectionOutcome::PaginationFailed(_) => println!(
                "  ❌ {}: {}",
                collection.name,
                collection.outcome.message()
            ),
            CollectionOutcome::UploadFailed { fetched, .. } => println!(
                "  ❌ {}: fetched {} records. {}",
                collection.name,
                fetched,
                collection.outcome.message()
            ),
        }
    }
    println!(
        "🏁 {} succeeded, {} failed, {} records migrated in {:?}",
        report.succeeded(),
        report.failed(),
        report.records_migrated(),
        report.duration
    );
}
