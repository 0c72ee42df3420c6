//! Declarative entity metadata
//!
//! Entity types describe themselves with an `EntityDeclaration` value built
//! once per type. Nothing here is validated; the column builder and the
//! table validator turn a declaration into an `EntityDefine`.
//!
//! ```ignore
//! let decl = EntityDeclaration::new("shop::Product")
//!     .table(EntityTable::new("product").primary("sku").unique("name"))
//!     .selector(EntitySelector::new("//li[@class='item']"))
//!     .field(FieldDeclaration::new("sku", DataType::String)
//!         .property(PropertyDefine::new("./@data-sku").length(32)))
//!     .field(FieldDeclaration::new("name", DataType::String)
//!         .property(PropertyDefine::new(".//h2").length(128)));
//! ```

use serde_json::{Map, Value};

use super::types::{
    DataType, Formatter, LinkToNext, PropertyOption, SelectorType, SharedValueSelector,
    TableNamePostfix, TargetUrlsSelector,
};

/// One extracted record, keyed by column name
pub type Record = Map<String, Value>;

/// Extraction and storage annotation of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDefine {
    pub expression: String,
    pub selector_type: SelectorType,
    pub argument: Option<String>,
    pub not_null: bool,
    pub ignore_store: bool,
    pub length: u32,
    pub option: PropertyOption,
}

impl PropertyDefine {
    /// XPath property, the common case
    pub fn new(expression: impl Into<String>) -> Self {
        Self::with_type(expression, SelectorType::XPath)
    }

    pub fn with_type(expression: impl Into<String>, selector_type: SelectorType) -> Self {
        Self {
            expression: expression.into(),
            selector_type,
            argument: None,
            not_null: false,
            ignore_store: false,
            length: 0,
            option: PropertyOption::None,
        }
    }

    pub fn argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn ignore_store(mut self) -> Self {
        self.ignore_store = true;
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn option(mut self, option: PropertyOption) -> Self {
        self.option = option;
        self
    }
}

/// A declared field of an entity type.
///
/// Only fields carrying a `PropertyDefine` become columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    pub name: String,
    pub data_type: DataType,
    /// List-valued field
    pub multi: bool,
    pub property: Option<PropertyDefine>,
    pub formatters: Vec<Formatter>,
    pub link_to_next: Option<LinkToNext>,
}

impl FieldDeclaration {
    /// Scalar field
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            multi: false,
            property: None,
            formatters: Vec::new(),
            link_to_next: None,
        }
    }

    /// List-valued field
    pub fn list(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            multi: true,
            ..Self::new(name, data_type)
        }
    }

    pub fn property(mut self, property: PropertyDefine) -> Self {
        self.property = Some(property);
        self
    }

    /// Appends a formatter; formatters run in the order they are added
    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatters.push(formatter);
        self
    }

    pub fn link_to_next(mut self, link: LinkToNext) -> Self {
        self.link_to_next = Some(link);
        self
    }
}

/// Raw table metadata as declared, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTable {
    pub database: Option<String>,
    pub name: String,
    pub postfix: TableNamePostfix,
    /// Free-form comma-separated primary key
    pub primary: Option<String>,
    pub update_columns: Vec<String>,
    /// Free-form comma-separated index groups
    pub indexs: Vec<String>,
    /// Free-form comma-separated unique groups
    pub uniques: Vec<String>,
}

impl EntityTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn postfix(mut self, postfix: TableNamePostfix) -> Self {
        self.postfix = postfix;
        self
    }

    pub fn primary(mut self, primary: impl Into<String>) -> Self {
        self.primary = Some(primary.into());
        self
    }

    pub fn update_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn index(mut self, group: impl Into<String>) -> Self {
        self.indexs.push(group.into());
        self
    }

    pub fn unique(mut self, group: impl Into<String>) -> Self {
        self.uniques.push(group.into());
        self
    }
}

/// Marks an entity as yielding zero or more matches per document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySelector {
    pub expression: String,
    pub selector_type: SelectorType,
    pub take: Option<usize>,
}

impl EntitySelector {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            selector_type: SelectorType::XPath,
            take: None,
        }
    }

    pub fn selector_type(mut self, selector_type: SelectorType) -> Self {
        self.selector_type = selector_type;
        self
    }

    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }
}

/// Everything an entity type declares about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDeclaration {
    /// Fully-qualified type identifier
    pub name: String,
    pub fields: Vec<FieldDeclaration>,
    pub table: Option<EntityTable>,
    pub selector: Option<EntitySelector>,
    pub target_urls_selectors: Vec<TargetUrlsSelector>,
    pub shared_values: Vec<SharedValueSelector>,
}

impl EntityDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            table: None,
            selector: None,
            target_urls_selectors: Vec::new(),
            shared_values: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    pub fn table(mut self, table: EntityTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn selector(mut self, selector: EntitySelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn target_urls(mut self, selector: TargetUrlsSelector) -> Self {
        self.target_urls_selectors.push(selector);
        self
    }

    pub fn shared_value(mut self, value: SharedValueSelector) -> Self {
        self.shared_values.push(value);
        self
    }
}

/// Capability of a type that can be registered as a crawl entity
pub trait SpiderEntity {
    fn declaration() -> EntityDeclaration;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_field_is_multi() {
        let field = FieldDeclaration::list("tags", DataType::String);
        assert!(field.multi);
        assert!(field.property.is_none());
    }

    #[test]
    fn test_formatters_keep_declaration_order() {
        let field = FieldDeclaration::new("price", DataType::Decimal)
            .formatter(Formatter::new("Trim"))
            .formatter(Formatter::new("Replace"))
            .formatter(Formatter::new("Number"));
        let names: Vec<_> = field.formatters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Trim", "Replace", "Number"]);
    }

    #[test]
    fn test_entity_table_builder() {
        let table = EntityTable::new("product")
            .database("shop")
            .primary("sku")
            .update_columns(["name", "price"])
            .index("name, price")
            .unique("sku");
        assert_eq!(table.database.as_deref(), Some("shop"));
        assert_eq!(table.update_columns, vec!["name", "price"]);
        assert_eq!(table.indexs, vec!["name, price"]);
        assert_eq!(table.uniques, vec!["sku"]);
    }
}
