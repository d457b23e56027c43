use thiserror::Error;

/// Engine-level error type.
///
/// Only infrastructure faults (storage or cache unreachable, unexpected
/// failures mid-computation) surface as errors. "Insufficient data" and
/// "nothing found" are legitimate business outcomes and are modeled as
/// explicit absent values by the services, never as an `Err`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{operation}: {message}")]
    Infrastructure {
        operation: &'static str,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl EngineError {
    pub fn infrastructure(
        operation: &'static str,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Infrastructure {
            operation,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn storage(operation: &'static str, err: sqlx::Error) -> Self {
        Self::infrastructure(operation, "storage query failed", err)
    }

    pub fn cache(operation: &'static str, err: redis::RedisError) -> Self {
        Self::infrastructure(operation, "cache operation failed", err)
    }

    pub fn serialization(operation: &'static str, err: serde_json::Error) -> Self {
        Self::infrastructure(operation, "serialization failed", err)
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Infrastructure { operation, .. } => operation,
        }
    }
}
