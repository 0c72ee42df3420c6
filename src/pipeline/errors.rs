//! Storage pipeline errors

use thiserror::Error;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Storage pipeline errors
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    // Construction
    #[error("Connection string is required for provider {0}")]
    MissingConnectionString(String),

    #[error("Pipeline mode {mode} is not supported by {pipeline}")]
    UnsupportedMode { pipeline: String, mode: String },

    // Registration
    #[error("Entity already registered: {0}")]
    DuplicateEntity(String),

    #[error("Entity {0} has no update columns, required by the pipeline mode")]
    UpdateColumnsRequired(String),

    #[error("Entity {0} needs a declared primary key or unique group for the pipeline mode")]
    ConflictKeyRequired(String),

    // Processing
    #[error("Entity not registered: {0}")]
    UnknownEntity(String),

    #[error("Column {column} of {entity} is NOT NULL but the record has no value")]
    NullColumn { entity: String, column: String },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    // Sink
    #[error("Storage sink error: {0}")]
    Sink(String),
}

impl PipelineError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::MissingConnectionString(_) => "SPIDER_PIPELINE_CONNECTION_STRING",
            PipelineError::UnsupportedMode { .. } => "SPIDER_PIPELINE_UNSUPPORTED_MODE",
            PipelineError::DuplicateEntity(_) => "SPIDER_PIPELINE_DUPLICATE_ENTITY",
            PipelineError::UpdateColumnsRequired(_) => "SPIDER_PIPELINE_UPDATE_COLUMNS",
            PipelineError::ConflictKeyRequired(_) => "SPIDER_PIPELINE_CONFLICT_KEY",
            PipelineError::UnknownEntity(_) => "SPIDER_PIPELINE_UNKNOWN_ENTITY",
            PipelineError::NullColumn { .. } => "SPIDER_PIPELINE_NULL_COLUMN",
            PipelineError::InvalidIdentifier(_) => "SPIDER_PIPELINE_INVALID_IDENTIFIER",
            PipelineError::Sink(_) => "SPIDER_PIPELINE_SINK",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = PipelineError::NullColumn {
            entity: "shop::Product".into(),
            column: "sku".into(),
        };
        assert!(err.to_string().contains("sku"));
        assert_eq!(err.code(), "SPIDER_PIPELINE_NULL_COLUMN");
    }
}
