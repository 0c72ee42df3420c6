//! Compiled entity schema types
//!
//! An `EntityDefine` is produced once per entity type during spider setup and
//! is immutable afterwards. Pipelines receive it as `Arc<EntityDefine>`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::declaration::Record;

/// Semantic type of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    String,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    Boolean,
    DateTime,
    Date,
}

impl DataType {
    /// Returns the type name used in error messages and logs
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String => "String",
            DataType::Int32 => "Int32",
            DataType::Int64 => "Int64",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::Decimal => "Decimal",
            DataType::Boolean => "Boolean",
            DataType::DateTime => "DateTime",
            DataType::Date => "Date",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// How a selector expression is evaluated by the extraction engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorType {
    #[default]
    XPath,
    Css,
    Regex,
    JsonPath,
    /// Value comes from the crawl environment (request url, index, ...)
    Environment,
}

/// A rule locating data within a source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub expression: String,
    pub selector_type: SelectorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
}

impl Selector {
    pub fn new(expression: impl Into<String>, selector_type: SelectorType) -> Self {
        Self {
            expression: expression.into(),
            selector_type,
            argument: None,
        }
    }
}

/// Post-processing applied to the raw value of a property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyOption {
    #[default]
    None,
    /// Inner text instead of markup
    PlainText,
    /// Number of matched nodes instead of their values
    Count,
}

/// An ordered post-extraction transform, opaque to schema validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formatter {
    /// Formatter kind understood by the extraction engine
    pub name: String,
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,
}

impl Formatter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

/// Marks a column's extracted value as a URL to crawl next
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkToNext {
    /// Owning column, filled in by the column builder
    pub column: String,
    /// Extra values forwarded to the follow-up request
    #[serde(default)]
    pub extras: Vec<String>,
}

impl LinkToNext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extra(mut self, value: impl Into<String>) -> Self {
        self.extras.push(value.into());
        self
    }
}

/// Selector used to discover follow-up URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetUrlsSelector {
    pub expression: String,
    pub selector_type: SelectorType,
    /// Regular expressions a discovered URL must match
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl TargetUrlsSelector {
    pub fn new(expression: impl Into<String>, selector_type: SelectorType) -> Self {
        Self {
            expression: expression.into(),
            selector_type,
            patterns: Vec::new(),
        }
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }
}

/// A value propagated from the parent extraction context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedValueSelector {
    pub name: String,
    pub expression: String,
    pub selector_type: SelectorType,
}

impl SharedValueSelector {
    pub fn new(
        name: impl Into<String>,
        expression: impl Into<String>,
        selector_type: SelectorType,
    ) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            selector_type,
        }
    }
}

/// Time-based suffix appended to the table name at persistence time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableNamePostfix {
    #[default]
    None,
    /// `_yyyy_MM_dd` of the current day
    Today,
    /// `_yyyy_MM_dd` of the Monday of the current week
    Monday,
    /// `_yyyy_MM_01` of the current month
    Month,
}

/// One storable field of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub multi: bool,
    pub option: PropertyOption,
    pub selector: Selector,
    pub formatters: Vec<Formatter>,
    pub not_null: bool,
    pub ignore_store: bool,
    /// Declared maximum length, 0 when not declared
    pub length: u32,
}

impl Column {
    /// Whether the length constraint applies to this column.
    ///
    /// A list-valued column is never string-typed, even when its
    /// elements are strings.
    pub fn is_string(&self) -> bool {
        self.data_type == DataType::String && !self.multi
    }
}

/// Validated persistence metadata of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub name: String,
    pub postfix: TableNamePostfix,
    /// Canonical comma-joined primary key
    pub primary: String,
    pub update_columns: Vec<String>,
    pub indexs: Vec<String>,
    pub uniques: Vec<String>,
}

impl TableInfo {
    /// Returns the primary key split into its columns
    pub fn primary_columns(&self) -> Vec<&str> {
        self.primary.split(',').collect()
    }

    /// Returns the physical table name for the given day
    pub fn table_name_for(&self, day: NaiveDate) -> String {
        match self.postfix {
            TableNamePostfix::None => self.name.clone(),
            TableNamePostfix::Today => format!("{}_{}", self.name, day.format("%Y_%m_%d")),
            TableNamePostfix::Monday => {
                let offset = day.weekday().num_days_from_monday() as u64;
                let monday = day
                    .checked_sub_days(chrono::Days::new(offset))
                    .unwrap_or(day);
                format!("{}_{}", self.name, monday.format("%Y_%m_%d"))
            }
            TableNamePostfix::Month => format!("{}_{}", self.name, day.format("%Y_%m_01")),
        }
    }
}

/// Post-extraction transform applied to records before they reach pipelines
pub trait DataHandler: Send + Sync + fmt::Debug {
    fn handle(&self, entity: &EntityDefine, records: Vec<Record>) -> Vec<Record>;
}

/// The compiled, validated schema of one entity type
#[derive(Debug, Clone)]
pub struct EntityDefine {
    /// Fully-qualified type identifier
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<Column>,
    /// Whether a document yields zero or more matches
    pub multi: bool,
    /// Cap on the number of matches when `multi`
    pub take: Option<usize>,
    pub selector: Option<Selector>,
    pub target_urls_selectors: Vec<TargetUrlsSelector>,
    /// Follow-link directives keyed by column name
    pub link_to_nexts: BTreeMap<String, LinkToNext>,
    pub shared_values: Vec<SharedValueSelector>,
    pub table_info: Option<TableInfo>,
    pub data_handler: Option<Arc<dyn DataHandler>>,
}

impl EntityDefine {
    /// Returns the column with the given name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns columns that are persisted by pipelines
    pub fn storable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.ignore_store)
    }
}
