//! Spider setup errors

use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::schema::SchemaError;

/// Result type for spider operations
pub type SpiderResult<T> = Result<T, SpiderError>;

/// Spider setup errors
#[derive(Debug, Clone, Error)]
pub enum SpiderError {
    // Entity compilation
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Type {0} is not a spider entity")]
    NotAnEntity(String),

    #[error("Entity already added: {0}")]
    DuplicateEntity(String),

    // Lifecycle
    #[error("Spider {0} is running, setup is closed")]
    Lifecycle(String),

    #[error("Spider {0} has no entities")]
    NoEntities(String),

    #[error("Spider {0} is not running")]
    NotRunning(String),

    // Processing
    #[error("Entity not added: {0}")]
    UnknownEntity(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl SpiderError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SpiderError::Schema(e) => e.code().code(),
            SpiderError::NotAnEntity(_) => "SPIDER_NOT_AN_ENTITY",
            SpiderError::DuplicateEntity(_) => "SPIDER_DUPLICATE_ENTITY",
            SpiderError::Lifecycle(_) => "SPIDER_LIFECYCLE",
            SpiderError::NoEntities(_) => "SPIDER_NO_ENTITIES",
            SpiderError::NotRunning(_) => "SPIDER_NOT_RUNNING",
            SpiderError::UnknownEntity(_) => "SPIDER_UNKNOWN_ENTITY",
            SpiderError::Pipeline(e) => e.code(),
        }
    }
}
