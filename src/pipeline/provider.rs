//! Data-source providers and pipeline kinds

use std::fmt;

/// Closed set of storage providers with a pipeline implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataProvider {
    MySql,
    PostgreSql,
    SqlServer,
    MongoDb,
}

impl DataProvider {
    pub const ALL: [DataProvider; 4] = [
        DataProvider::MySql,
        DataProvider::PostgreSql,
        DataProvider::SqlServer,
        DataProvider::MongoDb,
    ];

    /// Resolves a configured provider identifier.
    ///
    /// Identifiers are the data-source driver names and match exactly.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.identifier() == identifier)
    }

    /// Returns the provider identifier as written in configuration
    pub fn identifier(&self) -> &'static str {
        match self {
            DataProvider::MySql => "MySql.Data.MySqlClient",
            DataProvider::PostgreSql => "Npgsql",
            DataProvider::SqlServer => "System.Data.SqlClient",
            DataProvider::MongoDb => "MongoDB",
        }
    }

    /// Returns the pipeline kind serving this provider
    pub fn pipeline_kind(&self) -> PipelineKind {
        match self {
            DataProvider::MySql => PipelineKind::MySql,
            DataProvider::PostgreSql => PipelineKind::PostgreSql,
            DataProvider::SqlServer => PipelineKind::SqlServer,
            DataProvider::MongoDb => PipelineKind::MongoDb,
        }
    }
}

impl fmt::Display for DataProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

/// Concrete pipeline implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    MySql,
    PostgreSql,
    SqlServer,
    MongoDb,
    /// Performs no persistence
    Null,
}

impl PipelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::MySql => "mysql",
            PipelineKind::PostgreSql => "postgresql",
            PipelineKind::SqlServer => "sqlserver",
            PipelineKind::MongoDb => "mongodb",
            PipelineKind::Null => "null",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
