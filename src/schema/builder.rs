//! Column builder
//!
//! Reads an `EntityDeclaration` and produces an unvalidated `EntitySkeleton`:
//! the entity name, one column per annotated field, follow-link directives
//! and the entity-level metadata copied as declared.

use regex::Regex;
use std::collections::BTreeMap;

use super::declaration::{EntityDeclaration, EntityTable, FieldDeclaration};
use super::errors::{SchemaError, SchemaResult};
use super::reserved::ReservedColumns;
use super::types::{Column, LinkToNext, Selector, SharedValueSelector, TargetUrlsSelector};

/// Entity with columns built but table metadata not yet validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySkeleton {
    pub name: String,
    pub columns: Vec<Column>,
    pub multi: bool,
    pub take: Option<usize>,
    pub selector: Option<Selector>,
    pub target_urls_selectors: Vec<TargetUrlsSelector>,
    pub link_to_nexts: BTreeMap<String, LinkToNext>,
    pub shared_values: Vec<SharedValueSelector>,
    pub table: Option<EntityTable>,
}

/// Converts declared fields into column descriptors
pub struct ColumnBuilder<'a> {
    reserved: &'a ReservedColumns,
}

impl<'a> ColumnBuilder<'a> {
    /// Creates a builder rejecting the given reserved names
    pub fn new(reserved: &'a ReservedColumns) -> Self {
        Self { reserved }
    }

    /// Builds the skeleton of an entity.
    ///
    /// # Errors
    ///
    /// - `ReservedName` if any declared field, annotated or not, uses a
    ///   reserved name. All offending fields are reported.
    /// - `InvalidLength` if a non-string field declares a positive length.
    /// - `InvalidTargetUrlPattern` if a follow-up URL pattern does not compile.
    pub fn build(&self, declaration: &EntityDeclaration) -> SchemaResult<EntitySkeleton> {
        let entity = declaration.name.as_str();

        let reserved: Vec<String> = declaration
            .fields
            .iter()
            .filter(|f| self.reserved.is_reserved(&f.name))
            .map(|f| f.name.clone())
            .collect();
        if !reserved.is_empty() {
            return Err(SchemaError::reserved_name(entity, reserved));
        }

        let mut columns = Vec::with_capacity(declaration.fields.len());
        let mut link_to_nexts = BTreeMap::new();

        for field in &declaration.fields {
            let Some(column) = build_column(entity, field)? else {
                continue;
            };

            if let Some(link) = &field.link_to_next {
                let mut link = link.clone();
                link.column = column.name.clone();
                link_to_nexts.insert(column.name.clone(), link);
            }

            columns.push(column);
        }

        for selector in &declaration.target_urls_selectors {
            for pattern in &selector.patterns {
                Regex::new(pattern).map_err(|e| {
                    SchemaError::invalid_target_url_pattern(entity, pattern.as_str(), e)
                })?;
            }
        }

        let (multi, take, selector) = match &declaration.selector {
            Some(s) => (
                true,
                s.take,
                Some(Selector::new(s.expression.clone(), s.selector_type)),
            ),
            None => (false, None, None),
        };

        Ok(EntitySkeleton {
            name: declaration.name.clone(),
            columns,
            multi,
            take,
            selector,
            target_urls_selectors: declaration.target_urls_selectors.clone(),
            link_to_nexts,
            shared_values: declaration.shared_values.clone(),
            table: declaration.table.clone(),
        })
    }
}

/// Builds the column of a field, `None` when the field has no property annotation
fn build_column(entity: &str, field: &FieldDeclaration) -> SchemaResult<Option<Column>> {
    let Some(property) = &field.property else {
        return Ok(None);
    };

    let column = Column {
        name: field.name.clone(),
        data_type: field.data_type,
        multi: field.multi,
        option: property.option,
        selector: Selector {
            expression: property.expression.clone(),
            selector_type: property.selector_type,
            argument: property.argument.clone(),
        },
        formatters: field.formatters.clone(),
        not_null: property.not_null,
        ignore_store: property.ignore_store,
        length: property.length,
    };

    if !column.is_string() && column.length > 0 {
        let declared = if column.multi {
            format!("List<{}>", column.data_type)
        } else {
            column.data_type.to_string()
        };
        return Err(SchemaError::invalid_length(entity, &field.name, declared));
    }

    Ok(Some(column))
}
