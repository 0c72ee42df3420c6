//! Document-store pipeline
//!
//! Each record becomes one JSON document in `database.collection`, where the
//! collection is the physical table name. Documents are stamped with the
//! creation timestamp column.

use chrono::{Local, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::entity_pipeline::{storable_values, EntityPipeline, EntitySet, PipelineMode};
use super::errors::{PipelineError, PipelineResult};
use super::provider::{DataProvider, PipelineKind};
use super::sink::StorageSink;
use crate::schema::{EntityDefine, Record, ReservedColumns};

/// Database used when neither the table nor the connection string names one
pub const DEFAULT_DATABASE: &str = "spider";

#[derive(Debug)]
pub struct MongoEntityPipeline {
    connection_string: String,
    reserved: ReservedColumns,
    entities: EntitySet,
    sink: Arc<dyn StorageSink>,
}

impl MongoEntityPipeline {
    /// Creates the pipeline.
    ///
    /// # Errors
    ///
    /// `MissingConnectionString` when the connection string is blank,
    /// `UnsupportedMode` for any mode other than `Insert`.
    pub fn new(
        connection_string: impl Into<String>,
        mode: PipelineMode,
        reserved: ReservedColumns,
        sink: Arc<dyn StorageSink>,
    ) -> PipelineResult<Self> {
        let connection_string = connection_string.into();
        if connection_string.trim().is_empty() {
            return Err(PipelineError::MissingConnectionString(
                DataProvider::MongoDb.identifier().to_string(),
            ));
        }
        if mode != PipelineMode::Insert {
            return Err(PipelineError::UnsupportedMode {
                pipeline: PipelineKind::MongoDb.to_string(),
                mode: mode.to_string(),
            });
        }
        Ok(Self {
            connection_string,
            reserved,
            entities: EntitySet::default(),
            sink,
        })
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Database named by the connection string path, if any
    fn default_database(&self) -> &str {
        self.connection_string
            .split_once("://")
            .and_then(|(_, rest)| rest.split_once('/'))
            .map(|(_, path)| path.split('?').next().unwrap_or_default())
            .filter(|db| !db.is_empty())
            .unwrap_or(DEFAULT_DATABASE)
    }
}

impl EntityPipeline for MongoEntityPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::MongoDb
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

    fn process(&self, entity: &str, records: &[Record]) -> PipelineResult<usize> {
        let entity = self.entities.get(entity)?;
        let Some(table) = &entity.table_info else {
            return Ok(0);
        };
        if records.is_empty() {
            return Ok(0);
        }

        let database = table.database.as_deref().unwrap_or_else(|| self.default_database());
        let collection = table.table_name_for(Local::now().date_naive());
        let created = Utc::now().to_rfc3339();

        let documents = records
            .iter()
            .map(|record| {
                let mut document = Map::new();
                for (column, value) in storable_values(entity, record)? {
                    document.insert(column.name.clone(), value);
                }
                document.insert(self.reserved.created().to_string(), Value::String(created.clone()));
                Ok(Value::Object(document))
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        let written = self.sink.insert_documents(database, &collection, &documents)?;
        Ok(written as usize)
    }
}
