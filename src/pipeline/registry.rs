//! Pipeline selection
//!
//! Maps the configured data-source provider to a pipeline factory. Unknown
//! providers fall back to the no-op pipeline so a spider without storage
//! still runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::entity_pipeline::{EntityPipeline, PipelineMode};
use super::errors::PipelineResult;
use super::mongo::MongoEntityPipeline;
use super::null::NullPipeline;
use super::provider::DataProvider;
use super::sink::StorageSink;
use super::sql::{SqlDialect, SqlEntityPipeline};
use crate::observability::{log_event_with_fields, Event};
use crate::schema::ReservedColumns;

/// Everything a factory needs to build a pipeline
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub connection_string: String,
    pub mode: PipelineMode,
    pub reserved: ReservedColumns,
    pub sink: Arc<dyn StorageSink>,
}

/// Builds a pipeline for one provider
pub type PipelineFactory = fn(&PipelineContext) -> PipelineResult<Box<dyn EntityPipeline>>;

/// Provider to factory table
#[derive(Clone, Default)]
pub struct PipelineRegistry {
    factories: HashMap<DataProvider, PipelineFactory>,
}

impl fmt::Debug for PipelineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&str> = self.factories.keys().map(|p| p.identifier()).collect();
        providers.sort_unstable();
        f.debug_struct("PipelineRegistry")
            .field("providers", &providers)
            .finish()
    }
}

impl PipelineRegistry {
    /// Creates an empty registry. Every provider falls back to the no-op pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in pipelines of every provider
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DataProvider::MySql, mysql);
        registry.register(DataProvider::PostgreSql, postgresql);
        registry.register(DataProvider::SqlServer, sqlserver);
        registry.register(DataProvider::MongoDb, mongodb);
        registry
    }

    /// Registers or replaces the factory of a provider
    pub fn register(&mut self, provider: DataProvider, factory: PipelineFactory) {
        self.factories.insert(provider, factory);
    }

    /// Builds the pipeline for a configured provider identifier.
    ///
    /// # Errors
    ///
    /// Propagates the factory's error, e.g. `MissingConnectionString` for the
    /// document store. An unknown provider is not an error.
    pub fn select(
        &self,
        provider_name: &str,
        ctx: &PipelineContext,
    ) -> PipelineResult<Box<dyn EntityPipeline>> {
        let factory = DataProvider::from_identifier(provider_name)
            .and_then(|provider| self.factories.get(&provider));

        match factory {
            Some(factory) => {
                let pipeline = factory(ctx)?;
                log_event_with_fields(
                    Event::PipelineSelected,
                    &[
                        ("provider", provider_name),
                        ("pipeline", pipeline.kind().as_str()),
                        ("mode", ctx.mode.as_str()),
                    ],
                );
                Ok(pipeline)
            }
            None => {
                log_event_with_fields(Event::PipelineFallback, &[("provider", provider_name)]);
                Ok(Box::new(NullPipeline::new()))
            }
        }
    }
}

fn sql(dialect: SqlDialect, ctx: &PipelineContext) -> PipelineResult<Box<dyn EntityPipeline>> {
    Ok(Box::new(SqlEntityPipeline::new(
        dialect,
        ctx.mode,
        ctx.reserved.clone(),
        ctx.sink.clone(),
    )))
}

fn mysql(ctx: &PipelineContext) -> PipelineResult<Box<dyn EntityPipeline>> {
    sql(SqlDialect::MySql, ctx)
}

fn postgresql(ctx: &PipelineContext) -> PipelineResult<Box<dyn EntityPipeline>> {
    sql(SqlDialect::PostgreSql, ctx)
}

fn sqlserver(ctx: &PipelineContext) -> PipelineResult<Box<dyn EntityPipeline>> {
    sql(SqlDialect::SqlServer, ctx)
}

fn mongodb(ctx: &PipelineContext) -> PipelineResult<Box<dyn EntityPipeline>> {
    Ok(Box::new(MongoEntityPipeline::new(
        ctx.connection_string.clone(),
        ctx.mode,
        ctx.reserved.clone(),
        ctx.sink.clone(),
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::errors::PipelineError;
    use crate::pipeline::provider::PipelineKind;
    use crate::pipeline::sink::MemorySink;

    fn context(connection_string: &str) -> PipelineContext {
        PipelineContext {
            connection_string: connection_string.to_string(),
            mode: PipelineMode::Insert,
            reserved: ReservedColumns::default(),
            sink: Arc::new(MemorySink::new()),
        }
    }

    #[test]
    fn test_select_known_providers() {
        let registry = PipelineRegistry::with_defaults();
        let ctx = context("mongodb://localhost:27017");
        let cases = [
            ("MySql.Data.MySqlClient", PipelineKind::MySql),
            ("Npgsql", PipelineKind::PostgreSql),
            ("System.Data.SqlClient", PipelineKind::SqlServer),
            ("MongoDB", PipelineKind::MongoDb),
        ];
        for (name, kind) in cases {
            assert_eq!(registry.select(name, &ctx).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_unknown_provider_falls_back() {
        let registry = PipelineRegistry::with_defaults();
        let pipeline = registry.select("Unknown", &context("")).unwrap();
        assert_eq!(pipeline.kind(), PipelineKind::Null);
    }

    #[test]
    fn test_mongodb_requires_connection_string() {
        let registry = PipelineRegistry::with_defaults();
        let err = registry.select("MongoDB", &context("")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingConnectionString(_)));
    }

    #[test]
    fn test_empty_registry_falls_back() {
        let registry = PipelineRegistry::new();
        let pipeline = registry.select("Npgsql", &context("")).unwrap();
        assert_eq!(pipeline.kind(), PipelineKind::Null);
    }

    #[test]
    fn test_register_replaces_factory() {
        fn null(_: &PipelineContext) -> PipelineResult<Box<dyn EntityPipeline>> {
            Ok(Box::new(NullPipeline::new()))
        }
        let mut registry = PipelineRegistry::with_defaults();
        registry.register(DataProvider::MySql, null);
        let pipeline = registry.select("MySql.Data.MySqlClient", &context("")).unwrap();
        assert_eq!(pipeline.kind(), PipelineKind::Null);
    }
}
