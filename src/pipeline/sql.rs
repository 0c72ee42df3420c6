//! Relational storage pipelines
//!
//! One implementation serves MySQL, PostgreSQL and SQL Server; the dialect
//! decides quoting, placeholders, column types and the shape of conflict
//! handling. Tables are created on the first write to each physical table
//! name, so date-suffixed tables roll over on their own.

use chrono::Local;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};

use super::entity_pipeline::{
    check_mode, conflict_key, storable_values, EntityPipeline, EntitySet, PipelineMode,
};
use super::errors::{PipelineError, PipelineResult};
use super::provider::PipelineKind;
use super::sink::{SqlStatement, StorageSink};
use crate::schema::{Column, DataType, EntityDefine, Record, ReservedColumns, TableInfo};

/// SQL flavour of a relational store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    MySql,
    PostgreSql,
    SqlServer,
}

impl SqlDialect {
    pub fn kind(&self) -> PipelineKind {
        match self {
            SqlDialect::MySql => PipelineKind::MySql,
            SqlDialect::PostgreSql => PipelineKind::PostgreSql,
            SqlDialect::SqlServer => PipelineKind::SqlServer,
        }
    }

    fn quote(&self, identifier: &str) -> String {
        match self {
            SqlDialect::MySql => format!("`{}`", identifier),
            SqlDialect::PostgreSql => format!("\"{}\"", identifier),
            SqlDialect::SqlServer => format!("[{}]", identifier),
        }
    }

    /// Placeholder of the `n`th parameter, 1-based
    fn placeholder(&self, n: usize) -> String {
        match self {
            SqlDialect::MySql => "?".to_string(),
            SqlDialect::PostgreSql => format!("${}", n),
            SqlDialect::SqlServer => format!("@p{}", n),
        }
    }

    fn qualified(&self, database: Option<&str>, table: &str) -> String {
        match (self, database) {
            (_, None) => self.quote(table),
            (SqlDialect::SqlServer, Some(db)) => {
                format!("{}.[dbo].{}", self.quote(db), self.quote(table))
            }
            (_, Some(db)) => format!("{}.{}", self.quote(db), self.quote(table)),
        }
    }

    fn column_type(&self, column: &Column) -> String {
        // Lists are stored as JSON text
        if column.multi || (column.data_type == DataType::String && column.length == 0) {
            return match self {
                SqlDialect::SqlServer => "nvarchar(max)".into(),
                _ => "text".into(),
            };
        }
        match (self, column.data_type) {
            (SqlDialect::SqlServer, DataType::String) => format!("nvarchar({})", column.length),
            (_, DataType::String) => format!("varchar({})", column.length),
            (SqlDialect::PostgreSql, DataType::Int32) => "integer".into(),
            (_, DataType::Int32) => "int".into(),
            (_, DataType::Int64) => "bigint".into(),
            (SqlDialect::MySql, DataType::Float) => "float".into(),
            (_, DataType::Float) => "real".into(),
            (SqlDialect::MySql, DataType::Double) => "double".into(),
            (SqlDialect::PostgreSql, DataType::Double) => "double precision".into(),
            (SqlDialect::SqlServer, DataType::Double) => "float".into(),
            (SqlDialect::PostgreSql, DataType::Decimal) => "numeric(18,2)".into(),
            (_, DataType::Decimal) => "decimal(18,2)".into(),
            (SqlDialect::MySql, DataType::Boolean) => "tinyint(1)".into(),
            (SqlDialect::PostgreSql, DataType::Boolean) => "boolean".into(),
            (SqlDialect::SqlServer, DataType::Boolean) => "bit".into(),
            (SqlDialect::PostgreSql, DataType::DateTime) => "timestamp".into(),
            (_, DataType::DateTime) => "datetime".into(),
            (_, DataType::Date) => "date".into(),
        }
    }

    fn identity_definition(&self, name: &str) -> String {
        match self {
            SqlDialect::MySql => format!("{} bigint NOT NULL AUTO_INCREMENT", self.quote(name)),
            SqlDialect::PostgreSql => format!("{} bigserial NOT NULL", self.quote(name)),
            SqlDialect::SqlServer => format!("{} bigint IDENTITY(1,1) NOT NULL", self.quote(name)),
        }
    }

    fn created_definition(&self, name: &str) -> String {
        match self {
            SqlDialect::SqlServer => format!("{} datetime DEFAULT(GETDATE())", self.quote(name)),
            _ => format!("{} timestamp DEFAULT CURRENT_TIMESTAMP", self.quote(name)),
        }
    }

    fn quote_list<'s>(&self, names: impl IntoIterator<Item = &'s str>) -> String {
        names
            .into_iter()
            .map(|n| self.quote(n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Statement text plus which storable column feeds each placeholder
#[derive(Debug, Clone, PartialEq)]
struct WriteTemplate {
    sql: String,
    params: Vec<usize>,
}

/// Builds statement text, numbering placeholders in order of appearance
struct TemplateBuilder {
    dialect: SqlDialect,
    sql: String,
    params: Vec<usize>,
}

impl TemplateBuilder {
    fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            sql: String::with_capacity(256),
            params: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) -> &mut Self {
        self.sql.push_str(text);
        self
    }

    fn param(&mut self, column: usize) -> &mut Self {
        self.params.push(column);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
        self
    }

    /// `a = ?, b = ?` or `a = ? AND b = ?`
    fn assignments(&mut self, columns: &[(usize, &str)], separator: &str) -> &mut Self {
        for (i, (index, name)) in columns.iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            let quoted = self.dialect.quote(name);
            self.push(&quoted).push(" = ").param(*index);
        }
        self
    }

    fn values(&mut self, count: usize) -> &mut Self {
        self.push("(");
        for index in 0..count {
            if index > 0 {
                self.push(", ");
            }
            self.param(index);
        }
        self.push(")")
    }

    fn build(self) -> WriteTemplate {
        WriteTemplate {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Relational storage pipeline
#[derive(Debug)]
pub struct SqlEntityPipeline {
    dialect: SqlDialect,
    mode: PipelineMode,
    reserved: ReservedColumns,
    entities: EntitySet,
    sink: Arc<dyn StorageSink>,
    created_tables: Mutex<HashSet<String>>,
}

impl SqlEntityPipeline {
    pub fn new(
        dialect: SqlDialect,
        mode: PipelineMode,
        reserved: ReservedColumns,
        sink: Arc<dyn StorageSink>,
    ) -> Self {
        Self {
            dialect,
            mode,
            reserved,
            entities: EntitySet::default(),
            sink,
            created_tables: Mutex::new(HashSet::new()),
        }
    }

    /// Statements creating the database (if declared) and the table
    fn create_table(&self, entity: &EntityDefine, table: &TableInfo, name: &str) -> Vec<SqlStatement> {
        let d = self.dialect;
        let mut statements = Vec::new();

        if let Some(db) = &table.database {
            let sql = match d {
                SqlDialect::MySql => format!("CREATE DATABASE IF NOT EXISTS {}", d.quote(db)),
                SqlDialect::PostgreSql => format!("CREATE SCHEMA IF NOT EXISTS {}", d.quote(db)),
                SqlDialect::SqlServer => {
                    format!("IF DB_ID(N'{}') IS NULL CREATE DATABASE {}", db, d.quote(db))
                }
            };
            statements.push(SqlStatement::new(sql));
        }

        let qualified = d.qualified(table.database.as_deref(), name);
        let identity = self.reserved.identity();

        let mut definitions = Vec::new();
        if table.primary == identity {
            definitions.push(d.identity_definition(identity));
        }
        for column in entity.storable_columns() {
            let null = if column.not_null { " NOT NULL" } else { "" };
            definitions.push(format!("{} {}{}", d.quote(&column.name), d.column_type(column), null));
        }
        definitions.push(d.created_definition(self.reserved.created()));
        definitions.push(format!("PRIMARY KEY ({})", d.quote_list(table.primary_columns())));

        for group in &table.uniques {
            let key = group_name("UNIQUE", name, group);
            let columns = d.quote_list(group.split(','));
            definitions.push(match d {
                SqlDialect::MySql => format!("UNIQUE KEY {} ({})", d.quote(&key), columns),
                _ => format!("CONSTRAINT {} UNIQUE ({})", d.quote(&key), columns),
            });
        }
        if d == SqlDialect::MySql {
            for group in &table.indexs {
                let key = group_name("INDEX", name, group);
                definitions.push(format!("KEY {} ({})", d.quote(&key), d.quote_list(group.split(','))));
            }
        }

        let body = definitions.join(", ");
        let create = match d {
            SqlDialect::MySql => format!(
                "CREATE TABLE IF NOT EXISTS {} ({}) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
                qualified, body
            ),
            SqlDialect::PostgreSql => format!("CREATE TABLE IF NOT EXISTS {} ({})", qualified, body),
            SqlDialect::SqlServer => format!(
                "IF OBJECT_ID(N'{}', N'U') IS NULL CREATE TABLE {} ({})",
                object_name(table.database.as_deref(), name),
                qualified,
                body
            ),
        };
        statements.push(SqlStatement::new(create));

        // MySQL indexes are part of the table definition
        if d != SqlDialect::MySql {
            for group in &table.indexs {
                let key = group_name("INDEX", name, group);
                let columns = d.quote_list(group.split(','));
                let sql = match d {
                    SqlDialect::SqlServer => format!(
                        "IF NOT EXISTS (SELECT * FROM sys.indexes WHERE name = N'{}') CREATE INDEX {} ON {} ({})",
                        key,
                        d.quote(&key),
                        qualified,
                        columns
                    ),
                    _ => format!(
                        "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                        d.quote(&key),
                        qualified,
                        columns
                    ),
                };
                statements.push(SqlStatement::new(sql));
            }
        }

        statements
    }

    /// Statement template writing one record of the entity
    fn write_template(&self, entity: &EntityDefine, table: &TableInfo, name: &str) -> WriteTemplate {
        let d = self.dialect;
        let qualified = d.qualified(table.database.as_deref(), name);

        let columns: Vec<&str> = entity.storable_columns().map(|c| c.name.as_str()).collect();
        let indexed = |names: &[String]| -> Vec<(usize, String)> {
            names
                .iter()
                .filter_map(|n| {
                    columns
                        .iter()
                        .position(|c| *c == n.as_str())
                        .map(|i| (i, n.clone()))
                })
                .collect()
        };
        let key = indexed(&conflict_key(entity, &self.reserved).unwrap_or_default());
        let updates = indexed(&table.update_columns);
        let key_refs: Vec<(usize, &str)> = key.iter().map(|(i, n)| (*i, n.as_str())).collect();
        let update_refs: Vec<(usize, &str)> = updates.iter().map(|(i, n)| (*i, n.as_str())).collect();
        let column_list = d.quote_list(columns.iter().copied());

        let mut t = TemplateBuilder::new(d);

        let insert = |t: &mut TemplateBuilder, verb: &str| {
            t.push(&format!("{} {} ({}) VALUES ", verb, qualified, column_list))
                .values(columns.len());
        };

        match (self.mode, d) {
            (PipelineMode::Update, _) => {
                t.push(&format!("UPDATE {} SET ", qualified))
                    .assignments(&update_refs, ", ")
                    .push(" WHERE ")
                    .assignments(&key_refs, " AND ");
            }
            (PipelineMode::Insert, _) => insert(&mut t, "INSERT INTO"),

            (PipelineMode::InsertAndIgnoreDuplicate, SqlDialect::MySql) => {
                insert(&mut t, "INSERT IGNORE INTO")
            }
            (PipelineMode::InsertAndIgnoreDuplicate, SqlDialect::PostgreSql) => {
                insert(&mut t, "INSERT INTO");
                let conflict = d.quote_list(key.iter().map(|(_, n)| n.as_str()));
                t.push(&format!(" ON CONFLICT ({}) DO NOTHING", conflict));
            }
            (PipelineMode::InsertAndIgnoreDuplicate, SqlDialect::SqlServer) => {
                t.push(&format!("IF NOT EXISTS (SELECT 1 FROM {} WHERE ", qualified))
                    .assignments(&key_refs, " AND ")
                    .push(") ");
                insert(&mut t, "INSERT INTO");
            }

            (PipelineMode::InsertNewAndUpdateOld, SqlDialect::MySql) => {
                insert(&mut t, "INSERT INTO");
                let sets: Vec<String> = updates
                    .iter()
                    .map(|(_, n)| format!("{0} = VALUES({0})", d.quote(n)))
                    .collect();
                t.push(&format!(" ON DUPLICATE KEY UPDATE {}", sets.join(", ")));
            }
            (PipelineMode::InsertNewAndUpdateOld, SqlDialect::PostgreSql) => {
                insert(&mut t, "INSERT INTO");
                let conflict = d.quote_list(key.iter().map(|(_, n)| n.as_str()));
                let sets: Vec<String> = updates
                    .iter()
                    .map(|(_, n)| format!("{0} = EXCLUDED.{0}", d.quote(n)))
                    .collect();
                t.push(&format!(" ON CONFLICT ({}) DO UPDATE SET {}", conflict, sets.join(", ")));
            }
            (PipelineMode::InsertNewAndUpdateOld, SqlDialect::SqlServer) => {
                t.push(&format!("UPDATE {} SET ", qualified))
                    .assignments(&update_refs, ", ")
                    .push(" WHERE ")
                    .assignments(&key_refs, " AND ")
                    .push("; IF @@ROWCOUNT = 0 ");
                insert(&mut t, "INSERT INTO");
            }
        }

        t.build()
    }

    /// Runs the DDL of a physical table once
    fn ensure_table(&self, entity: &EntityDefine, table: &TableInfo, name: &str) -> PipelineResult<()> {
        let mut created = self
            .created_tables
            .lock()
            .map_err(|_| PipelineError::Sink("table registry lock poisoned".into()))?;
        let qualified = self.dialect.qualified(table.database.as_deref(), name);
        if created.contains(&qualified) {
            return Ok(());
        }
        for statement in self.create_table(entity, table, name) {
            self.sink.execute(&statement)?;
        }
        created.insert(qualified);
        Ok(())
    }
}

impl EntityPipeline for SqlEntityPipeline {
    fn kind(&self) -> PipelineKind {
        self.dialect.kind()
    }

    fn add_entity(&mut self, entity: Arc<EntityDefine>) -> PipelineResult<()> {
        check_mode(&entity, self.mode, &self.reserved)?;
        if let Some(table) = &entity.table_info {
            check_identifier(&table.name)?;
            if let Some(db) = &table.database {
                check_identifier(db)?;
            }
            for column in entity.storable_columns() {
                check_identifier(&column.name)?;
            }
        }
        self.entities.insert(entity)
    }

    fn remove_entity(&mut self, entity: &str) -> bool {
        self.entities.remove(entity)
    }

    fn entities(&self) -> &[Arc<EntityDefine>] {
        self.entities.as_slice()
    }

    fn process(&self, entity: &str, records: &[Record]) -> PipelineResult<usize> {
        let entity = self.entities.get(entity)?;
        let Some(table) = &entity.table_info else {
            return Ok(0);
        };
        if records.is_empty() {
            return Ok(0);
        }

        // Every record is checked before anything reaches the store
        let rows = records
            .iter()
            .map(|record| {
                Ok(storable_values(entity, record)?
                    .into_iter()
                    .map(|(column, value)| sql_value(column, value))
                    .collect::<Vec<Value>>())
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        let name = table.table_name_for(Local::now().date_naive());
        self.ensure_table(entity, table, &name)?;
        let template = self.write_template(entity, table, &name);

        let mut written = 0;
        for values in &rows {
            let statement = SqlStatement {
                sql: template.sql.clone(),
                params: template.params.iter().map(|i| values[*i].clone()).collect(),
            };
            self.sink.execute(&statement)?;
            written += 1;
        }
        Ok(written)
    }
}

/// List values are stored as JSON text
fn sql_value(column: &Column, value: Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) if column.multi => Value::String(value.to_string()),
        other => other,
    }
}

fn group_name(prefix: &str, table: &str, group: &str) -> String {
    format!("{}_{}_{}", prefix, table, group.replace(',', "_"))
}

fn object_name(database: Option<&str>, table: &str) -> String {
    match database {
        Some(db) => format!("{}.dbo.{}", db, table),
        None => table.to_string(),
    }
}

fn check_identifier(name: &str) -> PipelineResult<()> {
    static IDENTIFIER: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    match IDENTIFIER.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")) {
        Ok(pattern) if pattern.is_match(name) => Ok(()),
        _ => Err(PipelineError::InvalidIdentifier(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sink::MemorySink;
    use crate::schema::{
        generate_entity_define, EntityDeclaration, EntityTable, FieldDeclaration, PropertyDefine,
    };
    use serde_json::json;

    fn product(table: EntityTable) -> Arc<EntityDefine> {
        let decl = EntityDeclaration::new("shop::Product")
            .table(table)
            .field(FieldDeclaration::new("sku", DataType::String).property(PropertyDefine::new(".").length(32)))
            .field(FieldDeclaration::new("name", DataType::String).property(PropertyDefine::new(".").length(64)))
            .field(FieldDeclaration::new("price", DataType::Decimal).property(PropertyDefine::new(".")))
            .field(FieldDeclaration::list("tags", DataType::String).property(PropertyDefine::new(".")));
        Arc::new(generate_entity_define(&decl, &ReservedColumns::default()).unwrap())
    }

    fn pipeline(dialect: SqlDialect, mode: PipelineMode) -> (Arc<MemorySink>, SqlEntityPipeline) {
        let sink = Arc::new(MemorySink::new());
        let pipeline = SqlEntityPipeline::new(dialect, mode, ReservedColumns::default(), sink.clone());
        (sink, pipeline)
    }

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_mysql_create_and_insert() {
        let (sink, mut p) = pipeline(SqlDialect::MySql, PipelineMode::Insert);
        p.add_entity(product(EntityTable::new("product").database("shop").unique("sku").index("name, price")))
            .unwrap();

        let written = p
            .process("shop::Product", &[record(json!({"sku": "A-1", "name": "Lamp", "price": 9.5, "tags": ["a", "b"]}))])
            .unwrap();
        assert_eq!(written, 1);

        let statements = sink.statements();
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0].sql, "CREATE DATABASE IF NOT EXISTS `shop`");
        assert_eq!(
            statements[1].sql,
            "CREATE TABLE IF NOT EXISTS `shop`.`product` (`__id` bigint NOT NULL AUTO_INCREMENT, \
             `sku` varchar(32), `name` varchar(64), `price` decimal(18,2), `tags` text, \
             `cdate` timestamp DEFAULT CURRENT_TIMESTAMP, PRIMARY KEY (`__id`), \
             UNIQUE KEY `UNIQUE_product_sku` (`sku`), KEY `INDEX_product_name_price` (`name`, `price`)) \
             ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
        );
        assert_eq!(
            statements[2].sql,
            "INSERT INTO `shop`.`product` (`sku`, `name`, `price`, `tags`) VALUES (?, ?, ?, ?)"
        );
        assert_eq!(statements[2].params[3], json!("[\"a\",\"b\"]"));
    }

    #[test]
    fn test_table_created_once() {
        let (sink, mut p) = pipeline(SqlDialect::MySql, PipelineMode::Insert);
        p.add_entity(product(EntityTable::new("product"))).unwrap();
        p.process("shop::Product", &[record(json!({"sku": "A-1"}))]).unwrap();
        p.process("shop::Product", &[record(json!({"sku": "A-2"})), record(json!({"sku": "A-3"}))])
            .unwrap();
        let creates = sink.statements().iter().filter(|s| s.sql.starts_with("CREATE")).count();
        assert_eq!(creates, 1);
        assert_eq!(sink.statements().len(), 4);
    }

    #[test]
    fn test_postgres_upsert() {
        let (sink, mut p) = pipeline(SqlDialect::PostgreSql, PipelineMode::InsertNewAndUpdateOld);
        p.add_entity(product(EntityTable::new("product").primary("sku").update_columns(["name", "price"])))
            .unwrap();
        p.process("shop::Product", &[record(json!({"sku": "A-1", "name": "Lamp"}))]).unwrap();

        let statements = sink.statements();
        assert!(statements[0].sql.contains("\"sku\" varchar(32) NOT NULL"));
        assert!(statements[0].sql.contains("PRIMARY KEY (\"sku\")"));
        assert_eq!(
            statements[1].sql,
            "INSERT INTO \"product\" (\"sku\", \"name\", \"price\", \"tags\") VALUES ($1, $2, $3, $4) \
             ON CONFLICT (\"sku\") DO UPDATE SET \"name\" = EXCLUDED.\"name\", \"price\" = EXCLUDED.\"price\""
        );
    }

    #[test]
    fn test_postgres_index_statement() {
        let (sink, mut p) = pipeline(SqlDialect::PostgreSql, PipelineMode::Insert);
        p.add_entity(product(EntityTable::new("product").index("name"))).unwrap();
        p.process("shop::Product", &[record(json!({"sku": "A-1"}))]).unwrap();
        assert_eq!(
            sink.statements()[1].sql,
            "CREATE INDEX IF NOT EXISTS \"INDEX_product_name\" ON \"product\" (\"name\")"
        );
    }

    #[test]
    fn test_sqlserver_update_params() {
        let (sink, mut p) = pipeline(SqlDialect::SqlServer, PipelineMode::Update);
        p.add_entity(product(EntityTable::new("product").primary("sku").update_columns(["price"])))
            .unwrap();
        p.process("shop::Product", &[record(json!({"sku": "A-1", "price": 3}))]).unwrap();

        let update = sink.statements().pop().unwrap();
        assert_eq!(update.sql, "UPDATE [product] SET [price] = @p1 WHERE [sku] = @p2");
        assert_eq!(update.params, vec![json!(3), json!("A-1")]);
    }

    #[test]
    fn test_sqlserver_ignore_duplicate() {
        let (sink, mut p) = pipeline(SqlDialect::SqlServer, PipelineMode::InsertAndIgnoreDuplicate);
        p.add_entity(product(EntityTable::new("product").unique("sku"))).unwrap();
        p.process("shop::Product", &[record(json!({"sku": "A-1"}))]).unwrap();

        let insert = sink.statements().pop().unwrap();
        assert_eq!(
            insert.sql,
            "IF NOT EXISTS (SELECT 1 FROM [product] WHERE [sku] = @p1) INSERT INTO [product] \
             ([sku], [name], [price], [tags]) VALUES (@p2, @p3, @p4, @p5)"
        );
        assert_eq!(insert.params[0], json!("A-1"));
        assert_eq!(insert.params[1], json!("A-1"));
    }

    #[test]
    fn test_mode_checked_at_registration() {
        let (_, mut p) = pipeline(SqlDialect::MySql, PipelineMode::Update);
        let err = p.add_entity(product(EntityTable::new("product"))).unwrap_err();
        assert!(matches!(err, PipelineError::UpdateColumnsRequired(_)));
        assert!(p.entities().is_empty());
    }

    #[test]
    fn test_invalid_table_identifier() {
        let (_, mut p) = pipeline(SqlDialect::MySql, PipelineMode::Insert);
        let err = p.add_entity(product(EntityTable::new("product; DROP"))).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_entity_without_table_is_not_written() {
        let decl = EntityDeclaration::new("shop::Breadcrumb")
            .field(FieldDeclaration::new("path", DataType::String).property(PropertyDefine::new(".")));
        let entity = Arc::new(generate_entity_define(&decl, &ReservedColumns::default()).unwrap());

        let (sink, mut p) = pipeline(SqlDialect::MySql, PipelineMode::Insert);
        p.add_entity(entity).unwrap();
        assert_eq!(p.process("shop::Breadcrumb", &[record(json!({"path": "/"}))]).unwrap(), 0);
        assert!(sink.statements().is_empty());
    }

    #[test]
    fn test_batch_with_null_key_writes_nothing() {
        let (sink, mut p) = pipeline(SqlDialect::MySql, PipelineMode::Insert);
        p.add_entity(product(EntityTable::new("product").primary("sku"))).unwrap();

        let err = p
            .process("shop::Product", &[record(json!({"sku": "a"})), record(json!({"name": "x"}))])
            .unwrap_err();
        assert!(matches!(err, PipelineError::NullColumn { ref column, .. } if column == "sku"));
        assert!(sink.statements().iter().all(|s| !s.sql.starts_with("INSERT")));

        assert_eq!(p.process("shop::Product", &[record(json!({"sku": "a"}))]).unwrap(), 1);
        let inserts = sink.statements().iter().filter(|s| s.sql.starts_with("INSERT")).count();
        assert_eq!(inserts, 1);
    }

    #[test]
    fn test_unknown_entity() {
        let (_, p) = pipeline(SqlDialect::MySql, PipelineMode::Insert);
        let err = p.process("shop::Missing", &[]).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownEntity(_)));
    }
}
