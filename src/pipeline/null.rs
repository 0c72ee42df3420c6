//! No-op pipeline used when no storage provider is configured

use std::sync::Arc;

use super::entity_pipeline::{EntityPipeline, EntitySet};
use super::errors::PipelineResult;
use super::provider::PipelineKind;
use crate::schema::{EntityDefine, Record};

/// Accepts entities and records, persists nothing
#[derive(Debug, Default)]
pub struct NullPipeline {
    entities: EntitySet,
}

impl NullPipeline {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityPipeline for NullPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Null
    }

    fn add_entity(&mut self, entity: Arc<EntityDefine>) -> PipelineResult<()> {
        self.entities.insert(entity)
    }

    fn remove_entity(&mut self, entity: &str) -> bool {
        self.entities.remove(entity)
    }

    fn entities(&self) -> &[Arc<EntityDefine>] {
        self.entities.as_slice()
    }

    fn process(&self, entity: &str, _records: &[Record]) -> PipelineResult<usize> {
        self.entities.get(entity)?;
        Ok(0)
    }
}
