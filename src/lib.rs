pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::MigrationConfig;
pub use crate::core::migration::{
    CollectionOutcome, CollectionReport, MigrationEngine, MigrationReport,
};
pub use crate::utils::error::{MigrationError, Result};
