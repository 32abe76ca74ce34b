use thiserror::Error;

/// Main error type for the live match service
#[derive(Error, Debug)]
pub enum HardcourtError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Source errors
    #[error("Source unavailable: {source_name} - {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("All sources exhausted: {0}")]
    AllSourcesExhausted(String),

    // Write-path errors (absorbed and logged by callers)
    #[error("Persistence failure: {0}")]
    Persistence(String),

    // Scheduling errors
    #[error("Job failure: {job} - {reason}")]
    JobFailure { job: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl HardcourtError {
    pub fn source_unavailable(source_name: &str, reason: impl ToString) -> Self {
        HardcourtError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn job_failure(job: &str, reason: impl ToString) -> Self {
        HardcourtError::JobFailure {
            job: job.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for HardcourtError
pub type Result<T> = std::result::Result<T, HardcourtError>;
