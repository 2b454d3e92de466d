use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Token exchange failed for {tenant} tenant: {reason}")]
    AuthError { tenant: String, reason: String },

    #[error("{method} {url} failed: {reason}")]
    TransportError {
        method: String,
        url: String,
        reason: String,
    },

    #[error("{failed_chunks} of {total_chunks} chunks failed for collection '{collection}': {first_error}")]
    AggregateUploadError {
        collection: String,
        failed_chunks: usize,
        total_chunks: usize,
        first_error: String,
    },

    #[error("Pagination starting at {url} exceeded {max_pages} pages")]
    PaginationLimitError { url: String, max_pages: usize },

    #[error("HTTP client error: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Network,
    Upload,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl MigrationError {
    pub fn transport(method: &str, url: &str, reason: impl Into<String>) -> Self {
        Self::TransportError {
            method: method.to_string(),
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthError { .. } => ErrorCategory::Authentication,
            Self::TransportError { .. } | Self::PaginationLimitError { .. } | Self::ApiError(_) => {
                ErrorCategory::Network
            }
            Self::AggregateUploadError { .. } => ErrorCategory::Upload,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一 collection 的失敗不影響其他 collection
            ErrorCategory::Upload => ErrorSeverity::Medium,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Authentication | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::AuthError { .. } => {
                "Check the uaa_url and base64 credential of both tenants"
            }
            Self::TransportError { .. } => {
                "Check the asset_url, zone_id and network connectivity, then rerun"
            }
            Self::AggregateUploadError { .. } => {
                "Some chunks were already written; rerun the collection to overwrite them"
            }
            Self::PaginationLimitError { .. } => {
                "The server kept returning continuation links; raise migration.max_pages or inspect the Link header"
            }
            Self::ApiError(_) => "Check TLS and proxy settings",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the configuration file and try again",
            Self::IoError(_) => "Check file paths and permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::AuthError { tenant, .. } => {
                format!("Credentials error: could not obtain a token for the {} tenant", tenant)
            }
            Self::TransportError { method, url, .. } => {
                format!("Request {} {} did not succeed", method, url)
            }
            Self::AggregateUploadError {
                collection,
                failed_chunks,
                total_chunks,
                ..
            } => format!(
                "Upload of collection '{}' failed ({}/{} chunks)",
                collection, failed_chunks, total_chunks
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_is_high_severity() {
        let err = MigrationError::AuthError {
            tenant: "destination".to_string(),
            reason: "status 401".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("destination"));
    }

    #[test]
    fn test_transport_helper() {
        let err = MigrationError::transport("GET", "http://x/sensors", "status 500");
        assert_eq!(err.to_string(), "GET http://x/sensors failed: status 500");
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_severity_by_category() {
        let upload = MigrationError::AggregateUploadError {
            collection: "sensors".to_string(),
            failed_chunks: 1,
            total_chunks: 3,
            first_error: "status 400".to_string(),
        };
        let io = MigrationError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let config = MigrationError::MissingConfigError {
            field: "origin.zone_id".to_string(),
        };

        assert_eq!(upload.severity(), ErrorSeverity::Medium);
        assert_eq!(config.severity(), ErrorSeverity::High);
        assert_eq!(io.severity(), ErrorSeverity::Critical);
        assert!(ErrorSeverity::Medium < ErrorSeverity::High);
    }
}
