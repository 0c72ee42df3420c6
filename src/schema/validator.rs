//! Table schema validator
//!
//! Turns an `EntitySkeleton` into a validated `EntityDefine`. Validation is a
//! pure function: the skeleton is consumed and either a complete, normalized
//! entity comes back or a `SchemaError` does. There is no partially
//! normalized state.
//!
//! Rules, all fatal:
//! - At least one column is storable (not `ignore_store`)
//! - A declared primary key references storable columns only; string
//!   primary columns have a length in `1..=256`; primary columns are NOT NULL
//! - A missing or blank primary key resolves to the identity column
//! - Update columns exist, exclude the primary key and are not empty after
//!   the exclusion
//! - Index and unique groups have two or more distinct columns, or one column
//!   that is not the primary key; every column exists; string columns have a
//!   length in `1..=256`
//!
//! Groups and the primary key are rewritten to a canonical comma-joined form:
//! whitespace trimmed, duplicates removed, first occurrence order kept.

use super::builder::EntitySkeleton;
use super::declaration::EntityTable;
use super::errors::{GroupKind, SchemaError, SchemaResult};
use super::reserved::ReservedColumns;
use super::types::{Column, EntityDefine, TableInfo};

/// Upper bound on the length of a string column used in a key
pub const MAX_KEY_LENGTH: u32 = 256;

/// Validates and normalizes the table metadata of an entity
pub struct TableSchemaValidator<'a> {
    reserved: &'a ReservedColumns,
}

impl<'a> TableSchemaValidator<'a> {
    pub fn new(reserved: &'a ReservedColumns) -> Self {
        Self { reserved }
    }

    /// Validates a skeleton and produces the frozen entity definition.
    ///
    /// # Errors
    ///
    /// `EmptySchema`, `InvalidPrimary`, `InvalidUpdateColumns`,
    /// `InvalidIndex` or `InvalidUnique`, whichever rule fails first.
    pub fn validate(&self, skeleton: EntitySkeleton) -> SchemaResult<EntityDefine> {
        let EntitySkeleton {
            name,
            mut columns,
            multi,
            take,
            selector,
            target_urls_selectors,
            link_to_nexts,
            shared_values,
            table,
        } = skeleton;

        let storable: Vec<&Column> = columns.iter().filter(|c| !c.ignore_store).collect();
        if storable.is_empty() {
            return Err(SchemaError::empty_schema(&name));
        }

        let table_info = match table {
            Some(table) => Some(self.validate_table(&name, &storable, table)?),
            None => None,
        };

        if let Some(info) = &table_info {
            if info.primary != self.reserved.identity() {
                let primary = info.primary_columns();
                for column in columns.iter_mut().filter(|c| !c.ignore_store) {
                    if primary.contains(&column.name.as_str()) {
                        column.not_null = true;
                    }
                }
            }
        }

        Ok(EntityDefine {
            name,
            columns,
            multi,
            take,
            selector,
            target_urls_selectors,
            link_to_nexts,
            shared_values,
            table_info,
            data_handler: None,
        })
    }

    fn validate_table(
        &self,
        entity: &str,
        storable: &[&Column],
        table: EntityTable,
    ) -> SchemaResult<TableInfo> {
        let primary = self.resolve_primary(entity, storable, table.primary.as_deref())?;
        let primary_key = primary.join(",");

        let update_columns = resolve_update_columns(entity, storable, &table.update_columns, &primary)?;
        let indexs = normalize_groups(entity, GroupKind::Index, storable, &table.indexs, &primary_key)?;
        let uniques = normalize_groups(entity, GroupKind::Unique, storable, &table.uniques, &primary_key)?;

        Ok(TableInfo {
            database: table.database,
            name: table.name,
            postfix: table.postfix,
            primary: primary_key,
            update_columns,
            indexs,
            uniques,
        })
    }

    fn resolve_primary(
        &self,
        entity: &str,
        storable: &[&Column],
        declared: Option<&str>,
    ) -> SchemaResult<Vec<String>> {
        let identity = self.reserved.identity();
        let items = declared.map(split_group).unwrap_or_default();

        if items.is_empty() || (items.len() == 1 && items[0] == identity) {
            return Ok(vec![identity.to_string()]);
        }

        for item in &items {
            let column = find_column(storable, item)
                .ok_or_else(|| SchemaError::primary_not_found(entity, item.as_str()))?;
            if !key_length_ok(column) {
                return Err(SchemaError::primary_length(
                    entity,
                    item.as_str(),
                    column.length,
                    MAX_KEY_LENGTH,
                ));
            }
        }

        Ok(items)
    }
}

fn resolve_update_columns(
    entity: &str,
    storable: &[&Column],
    declared: &[String],
    primary: &[String],
) -> SchemaResult<Vec<String>> {
    if declared.is_empty() {
        return Ok(Vec::new());
    }

    let mut resolved: Vec<String> = Vec::with_capacity(declared.len());
    for name in declared {
        let name = name.trim();
        if find_column(storable, name).is_none() {
            return Err(SchemaError::update_column_not_found(entity, name));
        }
        if !resolved.iter().any(|r| r == name) {
            resolved.push(name.to_string());
        }
    }

    resolved.retain(|name| !primary.contains(name));
    if resolved.is_empty() {
        return Err(SchemaError::no_update_columns(entity));
    }

    Ok(resolved)
}

fn normalize_groups(
    entity: &str,
    kind: GroupKind,
    storable: &[&Column],
    groups: &[String],
    primary_key: &str,
) -> SchemaResult<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(groups.len());

    for group in groups {
        let items = split_group(group);

        if items.is_empty() {
            return Err(SchemaError::empty_group(entity, kind));
        }
        if items.len() == 1 && items[0] == primary_key {
            return Err(SchemaError::redundant_group(entity, kind, primary_key));
        }

        for item in &items {
            let column = find_column(storable, item)
                .ok_or_else(|| SchemaError::group_column_not_found(entity, kind, item.as_str()))?;
            if !key_length_ok(column) {
                return Err(SchemaError::group_length(
                    entity,
                    kind,
                    item.as_str(),
                    column.length,
                    MAX_KEY_LENGTH,
                ));
            }
        }

        let canonical = items.join(",");
        if !normalized.contains(&canonical) {
            normalized.push(canonical);
        }
    }

    Ok(normalized)
}

/// Splits a comma-separated group, trimming and deduplicating its items.
///
/// Order of first occurrence is kept; blank items are dropped.
pub fn split_group(group: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in group.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|i| i == item) {
            items.push(item.to_string());
        }
    }
    items
}

fn find_column<'c>(storable: &[&'c Column], name: &str) -> Option<&'c Column> {
    storable.iter().copied().find(|c| c.name == name)
}

fn key_length_ok(column: &Column) -> bool {
    !column.is_string() || (column.length > 0 && column.length <= MAX_KEY_LENGTH)
}
