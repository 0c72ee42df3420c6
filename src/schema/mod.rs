//! Entity schema derivation and validation
//!
//! An entity type declares its fields and table metadata once
//! (`EntityDeclaration`). Setup compiles the declaration in two steps:
//!
//! 1. `ColumnBuilder` turns annotated fields into columns and rejects
//!    reserved names and misplaced lengths
//! 2. `TableSchemaValidator` resolves the primary key and normalizes update
//!    columns, indexes and uniques
//!
//! The result is an `EntityDefine`, frozen and shared by every pipeline.

mod builder;
mod declaration;
mod errors;
mod reserved;
mod types;
mod validator;

pub use builder::{ColumnBuilder, EntitySkeleton};
pub use declaration::{
    EntityDeclaration, EntitySelector, EntityTable, FieldDeclaration, PropertyDefine, Record,
    SpiderEntity,
};
pub use errors::{GroupKind, SchemaError, SchemaErrorCode, SchemaResult};
pub use reserved::{ReservedColumns, CREATED_COLUMN, ID_COLUMN};
pub use types::{
    Column, DataHandler, DataType, EntityDefine, Formatter, LinkToNext, PropertyOption,
    Selector, SelectorType, SharedValueSelector, TableInfo, TableNamePostfix,
    TargetUrlsSelector,
};
pub use validator::{split_group, TableSchemaValidator, MAX_KEY_LENGTH};

/// Compiles a declaration into a validated entity definition
pub fn generate_entity_define(
    declaration: &EntityDeclaration,
    reserved: &ReservedColumns,
) -> SchemaResult<EntityDefine> {
    let skeleton = ColumnBuilder::new(reserved).build(declaration)?;
    TableSchemaValidator::new(reserved).validate(skeleton)
}
