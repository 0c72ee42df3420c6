//! Schema error types
//!
//! Every schema error is fatal for the registration that raised it. The
//! caller fixes the declaration and registers again.
//!
//! Error codes:
//! - SPIDER_RESERVED_NAME
//! - SPIDER_INVALID_LENGTH
//! - SPIDER_EMPTY_SCHEMA
//! - SPIDER_INVALID_PRIMARY
//! - SPIDER_INVALID_UPDATE_COLUMNS
//! - SPIDER_INVALID_INDEX
//! - SPIDER_INVALID_UNIQUE
//! - SPIDER_INVALID_TARGET_URL_PATTERN

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Field name collides with a reserved default property
    ReservedName,
    /// Non-string field declares a positive length
    InvalidLength,
    /// No storable column
    EmptySchema,
    /// Primary column missing or violating the length bound
    InvalidPrimary,
    /// Update column missing, or nothing left after excluding the primary
    InvalidUpdateColumns,
    /// Index group degenerate, missing or violating the length bound
    InvalidIndex,
    /// Unique group degenerate, missing or violating the length bound
    InvalidUnique,
    /// Follow-up URL pattern is not a valid regular expression
    InvalidTargetUrlPattern,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::ReservedName => "SPIDER_RESERVED_NAME",
            SchemaErrorCode::InvalidLength => "SPIDER_INVALID_LENGTH",
            SchemaErrorCode::EmptySchema => "SPIDER_EMPTY_SCHEMA",
            SchemaErrorCode::InvalidPrimary => "SPIDER_INVALID_PRIMARY",
            SchemaErrorCode::InvalidUpdateColumns => "SPIDER_INVALID_UPDATE_COLUMNS",
            SchemaErrorCode::InvalidIndex => "SPIDER_INVALID_INDEX",
            SchemaErrorCode::InvalidUnique => "SPIDER_INVALID_UNIQUE",
            SchemaErrorCode::InvalidTargetUrlPattern => "SPIDER_INVALID_TARGET_URL_PATTERN",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Which kind of column group a group error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Index,
    Unique,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Index => "index",
            GroupKind::Unique => "unique",
        }
    }

    fn code(&self) -> SchemaErrorCode {
        match self {
            GroupKind::Index => SchemaErrorCode::InvalidIndex,
            GroupKind::Unique => SchemaErrorCode::InvalidUnique,
        }
    }
}

/// Schema error with the entity it was raised for
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    entity: String,
    message: String,
    /// Offending columns, when the error is about specific columns
    columns: Vec<String>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, entity: impl Into<String>, message: String) -> Self {
        Self {
            code,
            entity: entity.into(),
            message,
            columns: Vec::new(),
        }
    }

    fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Declared fields reuse reserved default properties
    pub fn reserved_name(entity: impl Into<String>, fields: Vec<String>) -> Self {
        let message = format!(
            "{} reserved for default properties and cannot be declared",
            fields.join(", ")
        );
        Self::new(SchemaErrorCode::ReservedName, entity, message).with_columns(fields)
    }

    /// Only string properties can set a length
    pub fn invalid_length(
        entity: impl Into<String>,
        field: impl Into<String>,
        data_type: impl fmt::Display,
    ) -> Self {
        let field = field.into();
        let message = format!(
            "only string properties can set length, '{}' is {}",
            field, data_type
        );
        Self::new(SchemaErrorCode::InvalidLength, entity, message).with_columns(vec![field])
    }

    /// Entity has no storable column
    pub fn empty_schema(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        let message = format!("columns are necessary for {}", entity);
        Self::new(SchemaErrorCode::EmptySchema, entity, message)
    }

    /// Primary column is not a storable property of the entity
    pub fn primary_not_found(entity: impl Into<String>, column: impl Into<String>) -> Self {
        let column = column.into();
        let message = format!("primary column '{}' is not a property of the entity", column);
        Self::new(SchemaErrorCode::InvalidPrimary, entity, message).with_columns(vec![column])
    }

    /// String primary column has no length or one over the bound
    pub fn primary_length(
        entity: impl Into<String>,
        column: impl Into<String>,
        length: u32,
        max: u32,
    ) -> Self {
        let column = column.into();
        let message = format!(
            "primary column '{}' has length {}, expected 1..={}",
            column, length, max
        );
        Self::new(SchemaErrorCode::InvalidPrimary, entity, message).with_columns(vec![column])
    }

    /// Update column is not a storable property of the entity
    pub fn update_column_not_found(entity: impl Into<String>, column: impl Into<String>) -> Self {
        let column = column.into();
        let message = format!("update column '{}' is not a property of the entity", column);
        Self::new(SchemaErrorCode::InvalidUpdateColumns, entity, message)
            .with_columns(vec![column])
    }

    /// Nothing left to update once the primary key is excluded
    pub fn no_update_columns(entity: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::InvalidUpdateColumns,
            entity,
            "there is no column to update once the primary key is excluded".into(),
        )
    }

    /// Group contains no column at all
    pub fn empty_group(entity: impl Into<String>, kind: GroupKind) -> Self {
        let message = format!("{} should contain at least one column", kind.as_str());
        Self::new(kind.code(), entity, message)
    }

    /// Single-column group equal to the primary key
    pub fn redundant_group(
        entity: impl Into<String>,
        kind: GroupKind,
        primary: impl Into<String>,
    ) -> Self {
        let primary = primary.into();
        let message = format!(
            "primary key '{}' needs no additional {}",
            primary,
            kind.as_str()
        );
        Self::new(kind.code(), entity, message).with_columns(vec![primary])
    }

    /// Group column is not a storable property of the entity
    pub fn group_column_not_found(
        entity: impl Into<String>,
        kind: GroupKind,
        column: impl Into<String>,
    ) -> Self {
        let column = column.into();
        let message = format!(
            "{} column '{}' is not a property of the entity",
            kind.as_str(),
            column
        );
        Self::new(kind.code(), entity, message).with_columns(vec![column])
    }

    /// String group column has no length or one over the bound
    pub fn group_length(
        entity: impl Into<String>,
        kind: GroupKind,
        column: impl Into<String>,
        length: u32,
        max: u32,
    ) -> Self {
        let column = column.into();
        let message = format!(
            "{} column '{}' has length {}, expected 1..={}",
            kind.as_str(),
            column,
            length,
            max
        );
        Self::new(kind.code(), entity, message).with_columns(vec![column])
    }

    /// Follow-up URL pattern does not compile
    pub fn invalid_target_url_pattern(
        entity: impl Into<String>,
        pattern: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        let message = format!("invalid target url pattern '{}': {}", pattern.into(), reason);
        Self::new(SchemaErrorCode::InvalidTargetUrlPattern, entity, message)
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the entity the error was raised for
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending columns, if any
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.code, self.entity, self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
