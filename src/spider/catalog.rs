//! Entity catalog
//!
//! Resolves entity types by name, for spiders assembled from configuration
//! rather than code.

use std::collections::BTreeMap;

use crate::schema::{EntityDeclaration, SpiderEntity};

/// Produces the declaration of one entity type
pub type DeclarationFn = fn() -> EntityDeclaration;

/// Known entity types keyed by their declared name
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    declarations: BTreeMap<String, DeclarationFn>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `T` resolvable by its declared name
    pub fn register<T: SpiderEntity>(&mut self) -> &mut Self {
        let name = T::declaration().name;
        self.declarations.insert(name, T::declaration);
        self
    }

    /// Returns the declaration of a registered type
    pub fn declaration(&self, type_name: &str) -> Option<EntityDeclaration> {
        self.declarations.get(type_name).map(|declare| declare())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.declarations.contains_key(type_name)
    }

    /// Registered type names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declarations.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, FieldDeclaration, PropertyDefine};

    struct Product;

    impl SpiderEntity for Product {
        fn declaration() -> EntityDeclaration {
            EntityDeclaration::new("shop::Product")
                .field(FieldDeclaration::new("name", DataType::String).property(PropertyDefine::new(".")))
        }
    }

    #[test]
    fn test_lookup_by_declared_name() {
        let mut catalog = EntityCatalog::new();
        catalog.register::<Product>();

        assert!(catalog.contains("shop::Product"));
        assert_eq!(catalog.declaration("shop::Product").unwrap().fields.len(), 1);
        assert!(catalog.declaration("shop::Basket").is_none());
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["shop::Product"]);
    }
}
