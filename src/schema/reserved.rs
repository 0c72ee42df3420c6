//! Reserved default properties
//!
//! Pipelines add a creation timestamp and an identity column to every
//! table, so declared fields may not reuse those names. Deployments can
//! reserve more names through configuration.

/// Default identity column name
pub const ID_COLUMN: &str = "__id";

/// Default creation timestamp column name
pub const CREATED_COLUMN: &str = "cdate";

/// The set of column names declared fields may not use.
///
/// Names are compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedColumns {
    identity: String,
    created: String,
    extra: Vec<String>,
}

impl Default for ReservedColumns {
    fn default() -> Self {
        Self::new(ID_COLUMN, CREATED_COLUMN)
    }
}

impl ReservedColumns {
    pub fn new(identity: impl Into<String>, created: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            created: created.into(),
            extra: Vec::new(),
        }
    }

    /// Reserves an additional name
    pub fn with_extra(mut self, name: impl Into<String>) -> Self {
        self.extra.push(name.into());
        self
    }

    /// Identity column, used as primary key when none is declared
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Creation timestamp column
    pub fn created(&self) -> &str {
        &self.created
    }

    /// Returns whether `name` collides with a reserved name
    pub fn is_reserved(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.names().any(|reserved| reserved.to_lowercase() == lowered)
    }

    /// Iterates all reserved names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        [self.identity.as_str(), self.created.as_str()]
            .into_iter()
            .chain(self.extra.iter().map(String::as_str))
    }
}
