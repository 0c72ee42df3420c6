//! Storage pipeline capability
//!
//! A pipeline accepts the registration of frozen entity definitions during
//! setup and later persists records keyed to one of them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::errors::{PipelineError, PipelineResult};
use super::provider::PipelineKind;
use crate::schema::{Column, EntityDefine, Record, ReservedColumns};

/// How records are written to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineMode {
    /// Plain insert
    #[default]
    Insert,
    /// Insert, silently skipping records that hit a key
    InsertAndIgnoreDuplicate,
    /// Insert, updating the update columns of records that hit a key
    InsertNewAndUpdateOld,
    /// Update the update columns of existing records only
    Update,
}

impl PipelineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineMode::Insert => "Insert",
            PipelineMode::InsertAndIgnoreDuplicate => "InsertAndIgnoreDuplicate",
            PipelineMode::InsertNewAndUpdateOld => "InsertNewAndUpdateOld",
            PipelineMode::Update => "Update",
        }
    }

    /// Whether the mode writes the update columns of existing records
    pub fn updates(&self) -> bool {
        matches!(self, PipelineMode::InsertNewAndUpdateOld | PipelineMode::Update)
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A storage pipeline
pub trait EntityPipeline: Send + Sync + fmt::Debug {
    /// Returns the implementation kind
    fn kind(&self) -> PipelineKind;

    /// Registers a validated entity. Called during setup only.
    fn add_entity(&mut self, entity: Arc<EntityDefine>) -> PipelineResult<()>;

    /// Withdraws a registration made during setup, returning whether it existed
    fn remove_entity(&mut self, entity: &str) -> bool;

    /// Returns registered entities in registration order
    fn entities(&self) -> &[Arc<EntityDefine>];

    /// Persists records of a registered entity, returning how many were written
    fn process(&self, entity: &str, records: &[Record]) -> PipelineResult<usize>;
}

/// Registered entities of a pipeline
#[derive(Debug, Default)]
pub(crate) struct EntitySet {
    entities: Vec<Arc<EntityDefine>>,
}

impl EntitySet {
    pub(crate) fn insert(&mut self, entity: Arc<EntityDefine>) -> PipelineResult<()> {
        if self.entities.iter().any(|e| e.name == entity.name) {
            return Err(PipelineError::DuplicateEntity(entity.name.clone()));
        }
        self.entities.push(entity);
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> PipelineResult<&Arc<EntityDefine>> {
        self.entities
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| PipelineError::UnknownEntity(name.to_string()))
    }

    pub(crate) fn remove(&mut self, name: &str) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| e.name != name);
        self.entities.len() != before
    }

    pub(crate) fn as_slice(&self) -> &[Arc<EntityDefine>] {
        &self.entities
    }
}

/// Checks that an entity can be written in the given mode.
///
/// Entities without table metadata are never written and always pass.
pub(crate) fn check_mode(
    entity: &EntityDefine,
    mode: PipelineMode,
    reserved: &ReservedColumns,
) -> PipelineResult<()> {
    let Some(table) = &entity.table_info else {
        return Ok(());
    };

    if mode.updates() && table.update_columns.is_empty() {
        return Err(PipelineError::UpdateColumnsRequired(entity.name.clone()));
    }
    if mode != PipelineMode::Insert && conflict_key(entity, reserved).is_none() {
        return Err(PipelineError::ConflictKeyRequired(entity.name.clone()));
    }
    if mode == PipelineMode::Update && table.primary == reserved.identity() {
        return Err(PipelineError::ConflictKeyRequired(entity.name.clone()));
    }
    Ok(())
}

/// Columns identifying an existing row: the declared primary key, else the
/// first unique group.
pub(crate) fn conflict_key(entity: &EntityDefine, reserved: &ReservedColumns) -> Option<Vec<String>> {
    let table = entity.table_info.as_ref()?;
    if table.primary != reserved.identity() {
        return Some(table.primary_columns().into_iter().map(String::from).collect());
    }
    table
        .uniques
        .first()
        .map(|group| group.split(',').map(String::from).collect())
}

/// Extracts the storable values of a record in column order.
///
/// Missing values become `null`; a `null` in a NOT NULL column fails.
pub(crate) fn storable_values<'e>(
    entity: &'e EntityDefine,
    record: &Record,
) -> PipelineResult<Vec<(&'e Column, Value)>> {
    entity
        .storable_columns()
        .map(|column| {
            let value = record.get(&column.name).cloned().unwrap_or(Value::Null);
            if column.not_null && value.is_null() {
                return Err(PipelineError::NullColumn {
                    entity: entity.name.clone(),
                    column: column.name.clone(),
                });
            }
            Ok((column, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        generate_entity_define, DataType, EntityDeclaration, EntityTable, FieldDeclaration,
        PropertyDefine,
    };
    use serde_json::json;

    fn entity(table: EntityTable) -> EntityDefine {
        let decl = EntityDeclaration::new("shop::Product")
            .table(table)
            .field(FieldDeclaration::new("sku", DataType::String).property(PropertyDefine::new(".").length(32)))
            .field(FieldDeclaration::new("name", DataType::String).property(PropertyDefine::new(".").length(64)))
            .field(FieldDeclaration::new("html", DataType::String).property(PropertyDefine::new(".").ignore_store()));
        generate_entity_define(&decl, &ReservedColumns::default()).unwrap()
    }

    #[test]
    fn test_storable_values_skip_ignored_and_fill_null() {
        let entity = entity(EntityTable::new("product"));
        let record = json!({ "sku": "A-1", "html": "<li>" });
        let values = storable_values(&entity, record.as_object().unwrap()).unwrap();
        let names: Vec<_> = values.iter().map(|(c, _)| c.name.as_str()).collect();
        assert_eq!(names, vec!["sku", "name"]);
        assert!(values[1].1.is_null());
    }

    #[test]
    fn test_storable_values_not_null() {
        let entity = entity(EntityTable::new("product").primary("sku"));
        let record = json!({ "name": "Lamp" });
        let err = storable_values(&entity, record.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, PipelineError::NullColumn { ref column, .. } if column == "sku"));
    }

    #[test]
    fn test_check_mode() {
        let reserved = ReservedColumns::default();
        let plain = entity(EntityTable::new("product"));
        assert!(check_mode(&plain, PipelineMode::Insert, &reserved).is_ok());
        assert!(matches!(
            check_mode(&plain, PipelineMode::InsertNewAndUpdateOld, &reserved),
            Err(PipelineError::UpdateColumnsRequired(_))
        ));
        assert!(matches!(
            check_mode(&plain, PipelineMode::InsertAndIgnoreDuplicate, &reserved),
            Err(PipelineError::ConflictKeyRequired(_))
        ));

        let keyed = entity(EntityTable::new("product").primary("sku").update_columns(["name"]));
        assert!(check_mode(&keyed, PipelineMode::Update, &reserved).is_ok());

        let unique = entity(EntityTable::new("product").unique("sku").update_columns(["name"]));
        assert!(check_mode(&unique, PipelineMode::InsertNewAndUpdateOld, &reserved).is_ok());
        assert!(check_mode(&unique, PipelineMode::Update, &reserved).is_err());
    }

    #[test]
    fn test_entity_set_rejects_duplicates() {
        let mut set = EntitySet::default();
        set.insert(Arc::new(entity(EntityTable::new("product")))).unwrap();
        let err = set.insert(Arc::new(entity(EntityTable::new("product")))).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateEntity(_)));
        assert!(matches!(set.get("nope"), Err(PipelineError::UnknownEntity(_))));

        assert!(set.remove("shop::Product"));
        assert!(!set.remove("shop::Product"));
        assert!(set.as_slice().is_empty());
    }
}
