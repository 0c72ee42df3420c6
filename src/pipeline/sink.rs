//! Storage sink boundary
//!
//! Pipelines render statements and documents; a sink executes them against
//! a concrete store. Database drivers live behind this trait.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use super::errors::{PipelineError, PipelineResult};

/// A parameterized SQL statement
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// Executes rendered statements and documents
pub trait StorageSink: Send + Sync + fmt::Debug {
    /// Executes one statement, returning affected rows
    fn execute(&self, statement: &SqlStatement) -> PipelineResult<u64>;

    /// Inserts documents into a collection, returning how many were written
    fn insert_documents(
        &self,
        database: &str,
        collection: &str,
        documents: &[Value],
    ) -> PipelineResult<u64>;
}

/// In-memory sink keeping everything it receives
#[derive(Debug, Default)]
pub struct MemorySink {
    statements: Mutex<Vec<SqlStatement>>,
    documents: Mutex<BTreeMap<(String, String), Vec<Value>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the executed statements in execution order
    pub fn statements(&self) -> Vec<SqlStatement> {
        lock(&self.statements).map(|s| s.clone()).unwrap_or_default()
    }

    /// Returns the documents of a collection in insertion order
    pub fn documents(&self, database: &str, collection: &str) -> Vec<Value> {
        lock(&self.documents)
            .ok()
            .and_then(|d| d.get(&(database.to_string(), collection.to_string())).cloned())
            .unwrap_or_default()
    }
}

impl StorageSink for MemorySink {
    fn execute(&self, statement: &SqlStatement) -> PipelineResult<u64> {
        lock(&self.statements)?.push(statement.clone());
        Ok(1)
    }

    fn insert_documents(
        &self,
        database: &str,
        collection: &str,
        documents: &[Value],
    ) -> PipelineResult<u64> {
        lock(&self.documents)?
            .entry((database.to_string(), collection.to_string()))
            .or_default()
            .extend_from_slice(documents);
        Ok(documents.len() as u64)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> PipelineResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| PipelineError::Sink("memory sink lock poisoned".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_sink_records_statements() {
        let sink = MemorySink::new();
        sink.execute(&SqlStatement::new("SELECT 1")).unwrap();
        sink.execute(&SqlStatement::new("SELECT 2")).unwrap();
        let sql: Vec<_> = sink.statements().into_iter().map(|s| s.sql).collect();
        assert_eq!(sql, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_memory_sink_documents_by_collection() {
        let sink = MemorySink::new();
        assert_eq!(sink.insert_documents("shop", "product", &[json!({"a": 1}), json!({"a": 2})]).unwrap(), 2);
        assert_eq!(sink.documents("shop", "product").len(), 2);
        assert!(sink.documents("shop", "other").is_empty());
    }
}
