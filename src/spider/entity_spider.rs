//! Entity spider
//!
//! Collects entity types during setup, compiles each into a frozen
//! `EntityDefine`, and on start registers every entity with every pipeline.
//! Setup is closed once the spider runs.

use std::sync::Arc;
use uuid::Uuid;

use super::catalog::EntityCatalog;
use super::errors::{SpiderError, SpiderResult};
use crate::config::SpiderConfig;
use crate::observability::{log_event_with_fields, Event};
use crate::pipeline::{
    EntityPipeline, MemorySink, PipelineContext, PipelineRegistry, StorageSink,
};
use crate::schema::{
    generate_entity_define, DataHandler, EntityDeclaration, EntityDefine, Record,
    ReservedColumns, SpiderEntity,
};

/// Argument of `start` that skips entity registration
pub const SKIP_ARGUMENT: &str = "skip";

/// Spider lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiderStatus {
    /// Accepting entities and pipelines
    Init,
    /// Started, setup closed
    Running,
}

#[derive(Debug)]
pub struct EntitySpider {
    name: String,
    identity: String,
    config: SpiderConfig,
    reserved: ReservedColumns,
    entities: Vec<Arc<EntityDefine>>,
    pipelines: Vec<Box<dyn EntityPipeline>>,
    catalog: EntityCatalog,
    registry: PipelineRegistry,
    sink: Arc<dyn StorageSink>,
    status: SpiderStatus,
}

impl EntitySpider {
    /// Creates a spider with the built-in pipelines and an in-memory sink
    pub fn new(name: impl Into<String>, config: SpiderConfig) -> Self {
        let reserved = config.reserved_columns();
        Self {
            name: name.into(),
            identity: Uuid::new_v4().to_string(),
            config,
            reserved,
            entities: Vec::new(),
            pipelines: Vec::new(),
            catalog: EntityCatalog::new(),
            registry: PipelineRegistry::with_defaults(),
            sink: Arc::new(MemorySink::new()),
            status: SpiderStatus::Init,
        }
    }

    /// Replaces the sink default pipelines write through
    pub fn with_sink(mut self, sink: Arc<dyn StorageSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces the catalog used by `add_entity_named`
    pub fn with_catalog(mut self, catalog: EntityCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_registry(mut self, registry: PipelineRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique id of this spider instance
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn config(&self) -> &SpiderConfig {
        &self.config
    }

    pub fn reserved_columns(&self) -> &ReservedColumns {
        &self.reserved
    }

    pub fn status(&self) -> SpiderStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SpiderStatus::Running
    }

    /// Compiled entities in the order they were added
    pub fn entities(&self) -> &[Arc<EntityDefine>] {
        &self.entities
    }

    pub fn entity(&self, name: &str) -> Option<&Arc<EntityDefine>> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn pipelines(&self) -> &[Box<dyn EntityPipeline>] {
        &self.pipelines
    }

    /// Adds entity type `T`. A non-empty `table_name` overrides the declared table name.
    pub fn add_entity<T: SpiderEntity>(&mut self, table_name: &str) -> SpiderResult<Arc<EntityDefine>> {
        self.add_entity_declaration(T::declaration(), None, table_name)
    }

    /// Adds entity type `T` with a handler applied to its records before storage
    pub fn add_entity_with_handler<T: SpiderEntity>(
        &mut self,
        handler: Arc<dyn DataHandler>,
    ) -> SpiderResult<Arc<EntityDefine>> {
        self.add_entity_declaration(T::declaration(), Some(handler), "")
    }

    /// Adds an entity type registered in the catalog under `type_name`.
    ///
    /// # Errors
    ///
    /// `NotAnEntity` when the catalog does not know the type.
    pub fn add_entity_named(&mut self, type_name: &str, table_name: &str) -> SpiderResult<Arc<EntityDefine>> {
        self.check_if_running()?;
        let declaration = self
            .catalog
            .declaration(type_name)
            .ok_or_else(|| SpiderError::NotAnEntity(type_name.to_string()))?;
        self.add_entity_declaration(declaration, None, table_name)
    }

    /// Compiles and adds an entity declaration.
    ///
    /// # Errors
    ///
    /// - `Lifecycle` once the spider has started
    /// - `DuplicateEntity` if an entity of the same name was added
    /// - `Schema` if the declaration fails validation
    pub fn add_entity_declaration(
        &mut self,
        mut declaration: EntityDeclaration,
        handler: Option<Arc<dyn DataHandler>>,
        table_name: &str,
    ) -> SpiderResult<Arc<EntityDefine>> {
        self.check_if_running()?;

        let table_name = table_name.trim();
        if !table_name.is_empty() {
            if let Some(table) = declaration.table.as_mut() {
                table.name = table_name.to_string();
            }
        }

        if self.entity(&declaration.name).is_some() {
            return Err(SpiderError::DuplicateEntity(declaration.name));
        }

        let mut entity = match generate_entity_define(&declaration, &self.reserved) {
            Ok(entity) => entity,
            Err(e) => {
                log_event_with_fields(
                    Event::EntityRejected,
                    &[
                        ("spider", self.name.as_str()),
                        ("entity", e.entity()),
                        ("code", e.code().code()),
                        ("message", e.message()),
                    ],
                );
                return Err(e.into());
            }
        };
        entity.data_handler = handler;

        let columns = entity.columns.len().to_string();
        let table = entity
            .table_info
            .as_ref()
            .map(|t| t.name.as_str())
            .unwrap_or_default();
        log_event_with_fields(
            Event::EntityRegistered,
            &[
                ("spider", self.name.as_str()),
                ("entity", entity.name.as_str()),
                ("columns", columns.as_str()),
                ("table", table),
            ],
        );

        let entity = Arc::new(entity);
        self.entities.push(Arc::clone(&entity));
        Ok(entity)
    }

    /// Adds a storage pipeline. Without any, `start` uses the default pipeline.
    pub fn add_pipeline(&mut self, pipeline: Box<dyn EntityPipeline>) -> SpiderResult<()> {
        self.check_if_running()?;
        self.pipelines.push(pipeline);
        Ok(())
    }

    /// Builds the pipeline of the configured data-source provider
    pub fn default_pipeline(&self) -> SpiderResult<Box<dyn EntityPipeline>> {
        let ctx = PipelineContext {
            connection_string: self.config.data_source.connection_string.clone(),
            mode: self.config.pipeline_mode,
            reserved: self.reserved.clone(),
            sink: Arc::clone(&self.sink),
        };
        Ok(self
            .registry
            .select(&self.config.data_source.provider_name, &ctx)?)
    }

    /// Completes setup.
    ///
    /// With the `skip` argument entities are not registered with pipelines and
    /// an empty spider may start. Otherwise at least one entity is required
    /// and every entity is registered with every pipeline. A failed start
    /// leaves the spider as it was, so it can be started again.
    pub fn start(&mut self, arguments: &[&str]) -> SpiderResult<()> {
        self.check_if_running()?;
        log_event_with_fields(
            Event::SpiderStarting,
            &[("spider", self.name.as_str()), ("identity", self.identity.as_str())],
        );

        let skip = arguments.contains(&SKIP_ARGUMENT);
        if !skip && self.entities.is_empty() {
            return Err(SpiderError::NoEntities(self.name.clone()));
        }

        // Pipelines change only when the whole start succeeds
        let mut pipelines = std::mem::take(&mut self.pipelines);
        let explicit = pipelines.len();
        if pipelines.is_empty() {
            pipelines.push(self.default_pipeline()?);
        }

        if !skip {
            if let Err(e) = register_entities(&self.entities, &mut pipelines) {
                pipelines.truncate(explicit);
                self.pipelines = pipelines;
                return Err(e);
            }
        }
        self.pipelines = pipelines;

        self.status = SpiderStatus::Running;

        let entities = self.entities.len().to_string();
        let pipelines = self.pipelines.len().to_string();
        log_event_with_fields(
            Event::SpiderStarted,
            &[
                ("spider", self.name.as_str()),
                ("entities", entities.as_str()),
                ("pipelines", pipelines.as_str()),
            ],
        );
        Ok(())
    }

    /// Hands extracted records of an entity to every pipeline.
    ///
    /// The entity's data handler runs first. Returns the number of records
    /// persisted, summed over pipelines.
    pub fn process(&self, entity_name: &str, records: Vec<Record>) -> SpiderResult<usize> {
        if !self.is_running() {
            return Err(SpiderError::NotRunning(self.name.clone()));
        }
        let entity = self
            .entity(entity_name)
            .ok_or_else(|| SpiderError::UnknownEntity(entity_name.to_string()))?;

        let records = match &entity.data_handler {
            Some(handler) => handler.handle(entity, records),
            None => records,
        };

        let mut persisted = 0;
        for pipeline in &self.pipelines {
            let written = pipeline.process(entity_name, &records)?;
            let count = written.to_string();
            log_event_with_fields(
                Event::RecordsPersisted,
                &[
                    ("entity", entity_name),
                    ("pipeline", pipeline.kind().as_str()),
                    ("count", count.as_str()),
                ],
            );
            persisted += written;
        }
        Ok(persisted)
    }

    fn check_if_running(&self) -> SpiderResult<()> {
        if self.is_running() {
            return Err(SpiderError::Lifecycle(self.name.clone()));
        }
        Ok(())
    }
}

/// Registers every entity with every pipeline, withdrawing all of them if
/// any registration fails
fn register_entities(
    entities: &[Arc<EntityDefine>],
    pipelines: &mut [Box<dyn EntityPipeline>],
) -> SpiderResult<()> {
    let mut added: Vec<(usize, &str)> = Vec::new();
    for entity in entities {
        for index in 0..pipelines.len() {
            if let Err(e) = pipelines[index].add_entity(Arc::clone(entity)) {
                for (index, name) in added {
                    pipelines[index].remove_entity(name);
                }
                return Err(e.into());
            }
            log_event_with_fields(
                Event::PipelineEntityAdded,
                &[
                    ("entity", entity.name.as_str()),
                    ("pipeline", pipelines[index].kind().as_str()),
                ],
            );
            added.push((index, entity.name.as_str()));
        }
    }
    Ok(())
}
