//! Storage pipelines
//!
//! A pipeline receives every validated entity during setup and persists the
//! records extracted for it during the crawl. The registry picks the default
//! pipeline from the configured data-source provider.

mod entity_pipeline;
mod errors;
mod mongo;
mod null;
mod provider;
mod registry;
mod sink;
mod sql;

pub use entity_pipeline::{EntityPipeline, PipelineMode};
pub use errors::{PipelineError, PipelineResult};
pub use mongo::{MongoEntityPipeline, DEFAULT_DATABASE};
pub use null::NullPipeline;
pub use provider::{DataProvider, PipelineKind};
pub use registry::{PipelineContext, PipelineFactory, PipelineRegistry};
pub use sink::{MemorySink, SqlStatement, StorageSink};
pub use sql::{SqlDialect, SqlEntityPipeline};
