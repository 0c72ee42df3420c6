//! Pipeline Selection Tests
//!
//! - Known provider identifiers select their pipeline
//! - Unknown identifiers fall back to the no-op pipeline without error
//! - The document store needs a connection string
//! - Selected pipelines persist through the configured sink

use std::sync::Arc;

use entityspider::pipeline::{
    DataProvider, MemorySink, PipelineContext, PipelineError, PipelineKind, PipelineMode,
    PipelineRegistry,
};
use entityspider::schema::{
    generate_entity_define, DataType, EntityDeclaration, EntityTable, FieldDeclaration,
    PropertyDefine, Record, ReservedColumns,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn context(connection_string: &str, mode: PipelineMode, sink: Arc<MemorySink>) -> PipelineContext {
    PipelineContext {
        connection_string: connection_string.to_string(),
        mode,
        reserved: ReservedColumns::default(),
        sink,
    }
}

fn person() -> EntityDeclaration {
    EntityDeclaration::new("people::Person")
        .table(EntityTable::new("person").primary("Id").update_columns(["Name"]))
        .field(FieldDeclaration::new("Id", DataType::String).property(PropertyDefine::new(".").length(50)))
        .field(FieldDeclaration::new("Name", DataType::String).property(PropertyDefine::new(".").length(10)))
}

fn record(id: &str, name: &str) -> Record {
    json!({ "Id": id, "Name": name }).as_object().cloned().unwrap_or_default()
}

// =============================================================================
// Selection Tests
// =============================================================================

/// The MySQL identifier selects the MySQL pipeline.
#[test]
fn test_mysql_identifier() {
    let registry = PipelineRegistry::with_defaults();
    let ctx = context("", PipelineMode::Insert, Arc::new(MemorySink::new()));
    let pipeline = registry.select("MySql.Data.MySqlClient", &ctx).unwrap();
    assert_eq!(pipeline.kind(), PipelineKind::MySql);
}

/// An unknown identifier yields the no-op pipeline, not an error.
#[test]
fn test_unknown_identifier_is_null_pipeline() {
    let registry = PipelineRegistry::with_defaults();
    let ctx = context("", PipelineMode::Insert, Arc::new(MemorySink::new()));
    for name in ["Unknown", "", "mysql"] {
        let pipeline = registry.select(name, &ctx).unwrap();
        assert_eq!(pipeline.kind(), PipelineKind::Null, "{:?}", name);
    }
}

/// Every provider maps to its own pipeline kind.
#[test]
fn test_every_provider_selectable() {
    let registry = PipelineRegistry::with_defaults();
    let ctx = context("mongodb://localhost:27017", PipelineMode::Insert, Arc::new(MemorySink::new()));
    for provider in DataProvider::ALL {
        let pipeline = registry.select(provider.identifier(), &ctx).unwrap();
        assert_eq!(pipeline.kind(), provider.pipeline_kind());
    }
}

/// The document store refuses an empty connection string.
#[test]
fn test_mongodb_without_connection_string() {
    let registry = PipelineRegistry::with_defaults();
    let ctx = context("", PipelineMode::Insert, Arc::new(MemorySink::new()));
    let err = registry.select("MongoDB", &ctx).unwrap_err();
    assert!(matches!(err, PipelineError::MissingConnectionString(_)));
    assert_eq!(err.code(), "SPIDER_PIPELINE_CONNECTION_STRING");
}

// =============================================================================
// Persistence Tests
// =============================================================================

/// PostgreSQL upserts on the declared primary.
#[test]
fn test_postgresql_upsert() {
    let sink = Arc::new(MemorySink::new());
    let registry = PipelineRegistry::with_defaults();
    let ctx = context("", PipelineMode::InsertNewAndUpdateOld, sink.clone());
    let mut pipeline = registry.select("Npgsql", &ctx).unwrap();

    let entity = generate_entity_define(&person(), &ReservedColumns::default()).unwrap();
    pipeline.add_entity(Arc::new(entity)).unwrap();
    let written = pipeline
        .process("people::Person", &[record("1", "Ada"), record("2", "Alan")])
        .unwrap();
    assert_eq!(written, 2);

    let statements = sink.statements();
    assert_eq!(statements.len(), 3);
    assert!(statements[0].sql.starts_with("CREATE TABLE IF NOT EXISTS \"person\""));
    assert_eq!(
        statements[1].sql,
        "INSERT INTO \"person\" (\"Id\", \"Name\") VALUES ($1, $2) \
         ON CONFLICT (\"Id\") DO UPDATE SET \"Name\" = EXCLUDED.\"Name\""
    );
    assert_eq!(statements[2].params, vec![json!("2"), json!("Alan")]);
}

/// The document store writes one document per record.
#[test]
fn test_mongodb_documents() {
    let sink = Arc::new(MemorySink::new());
    let registry = PipelineRegistry::with_defaults();
    let ctx = context("mongodb://localhost:27017/people", PipelineMode::Insert, sink.clone());
    let mut pipeline = registry.select("MongoDB", &ctx).unwrap();

    let entity = generate_entity_define(&person(), &ReservedColumns::default()).unwrap();
    pipeline.add_entity(Arc::new(entity)).unwrap();
    pipeline.process("people::Person", &[record("1", "Ada")]).unwrap();

    let documents = sink.documents("people", "person");
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["Name"], json!("Ada"));
    assert!(documents[0].get("cdate").is_some());
}

/// The no-op pipeline accepts records and stores nothing.
#[test]
fn test_null_pipeline_persists_nothing() {
    let sink = Arc::new(MemorySink::new());
    let registry = PipelineRegistry::with_defaults();
    let ctx = context("", PipelineMode::Insert, sink.clone());
    let mut pipeline = registry.select("Unknown", &ctx).unwrap();

    let entity = generate_entity_define(&person(), &ReservedColumns::default()).unwrap();
    pipeline.add_entity(Arc::new(entity)).unwrap();
    assert_eq!(pipeline.process("people::Person", &[record("1", "Ada")]).unwrap(), 0);
    assert!(sink.statements().is_empty());
}
