//! Spider setup
//!
//! The entity spider owns the setup phase: entity types are compiled and
//! collected, pipelines chosen, and on start every entity is registered with
//! every pipeline. Afterwards entities are frozen and setup is closed.

mod catalog;
mod entity_spider;
mod errors;

pub use catalog::{DeclarationFn, EntityCatalog};
pub use entity_spider::{EntitySpider, SpiderStatus, SKIP_ARGUMENT};
pub use errors::{SpiderError, SpiderResult};
