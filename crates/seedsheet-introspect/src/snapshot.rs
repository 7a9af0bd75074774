use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use seedsheet_core::{
    Column, Error, ForeignKeyRef, NativeTypeMapping, Result, SemanticType, StorageTag, Table,
};

use crate::options::EnumerateOptions;
use crate::reader::SchemaReader;

/// Reads tables from a JSON snapshot (`[Table, ...]`) on disk.
///
/// Snapshots let a workbook be produced without a live database, and make
/// schema reads reproducible in tests. Column types are resolved through the
/// reader's mapping the same way a catalog read resolves them.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    path: PathBuf,
    mapping: NativeTypeMapping,
}

impl SnapshotReader {
    /// Create a reader resolving native types with the SQL Server table.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_mapping(path, NativeTypeMapping::default_sql_server().clone())
    }

    pub fn with_mapping(path: impl Into<PathBuf>, mapping: NativeTypeMapping) -> Self {
        Self {
            path: path.into(),
            mapping,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl SchemaReader for SnapshotReader {
    fn engine(&self) -> &'static str {
        "snapshot"
    }

    async fn enumerate_tables(&self, opts: &EnumerateOptions) -> Result<Vec<Table>> {
        let text = fs::read_to_string(&self.path)?;
        let raw: Vec<SnapshotTable> = serde_json::from_str(&text)?;
        let tables = resolve_tables(raw, &self.mapping)?;
        let tables = apply_options(tables, opts)?;

        tracing::debug!(
            event = "schema_enumerated",
            engine = "snapshot",
            path = %self.path.display(),
            tables = tables.len()
        );
        Ok(tables)
    }
}

/// A table as written in a snapshot file.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotTable {
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<SnapshotColumn>,
}

/// A snapshot column. Only `name` and `native_type` are required; the type
/// fields are filled in from the mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotColumn {
    pub name: String,
    pub native_type: String,
    #[serde(default)]
    pub semantic_type: Option<SemanticType>,
    #[serde(default)]
    pub storage: Option<StorageTag>,
    #[serde(default)]
    pub max_length: u32,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default)]
    pub is_identity: bool,
    #[serde(default)]
    pub is_auto_generated: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub foreign_key: Option<ForeignKeyRef>,
}

/// Build tables from snapshot rows.
///
/// A native type the mapping knows always decides the column's type; stated
/// `semantic_type`/`storage` values only apply to types the mapping does not
/// know.
pub fn resolve_tables(raw: Vec<SnapshotTable>, mapping: &NativeTypeMapping) -> Result<Vec<Table>> {
    let mut tables = Vec::with_capacity(raw.len());

    for raw_table in raw {
        let mut table = Table::new(raw_table.schema, raw_table.name);
        for raw_column in raw_table.columns {
            let column = resolve_column(&table, raw_column, mapping)?;
            table.columns.push(column);
        }
        tables.push(table);
    }

    Ok(tables)
}

fn resolve_column(
    table: &Table,
    raw: SnapshotColumn,
    mapping: &NativeTypeMapping,
) -> Result<Column> {
    let mut column = Column::new(raw.name, raw.native_type, mapping).with_max_length(raw.max_length);

    match mapping.get(&column.native_type) {
        Some(known) => {
            if raw.storage.is_some_and(|storage| storage != known.storage) {
                tracing::warn!(
                    event = "snapshot_type_overridden",
                    table = %table.full_name(),
                    column = %column.name,
                    native_type = %column.native_type,
                    storage = %known.storage,
                    "stated storage contradicts the native type mapping"
                );
            }
        }
        None => {
            if let Some(semantic_type) = raw.semantic_type {
                column.semantic_type = semantic_type;
            }
            if let Some(storage) = raw.storage {
                column.storage = storage;
            }
        }
    }

    column.is_nullable = raw.is_nullable;
    column.is_identity = raw.is_identity;
    column.is_auto_generated = raw.is_auto_generated;
    column.is_primary_key = raw.is_primary_key;
    if let Some(target) = raw.foreign_key {
        column.set_foreign_key(target)?;
    }
    Ok(column)
}

/// Filter a snapshot the same way a catalog read would have been limited.
pub fn apply_options(tables: Vec<Table>, opts: &EnumerateOptions) -> Result<Vec<Table>> {
    let mut selected = Vec::with_capacity(tables.len());

    for mut table in tables {
        if !opts.includes_schema(&table.schema) {
            continue;
        }
        if !opts.include_columns {
            table.columns.clear();
        } else if !opts.include_foreign_keys {
            for column in &mut table.columns {
                column.take_foreign_key();
            }
        }
        if table.name.trim().is_empty() {
            return Err(Error::InvalidSchema(format!(
                "snapshot table with empty name in schema '{}'",
                table.schema
            )));
        }
        selected.push(table);
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> Vec<Table> {
        let mapping = NativeTypeMapping::sql_server();
        let mut customers = Table::new("sales", "Customers");
        customers.columns.push(Column::new("Id", "int", &mapping).primary_key());
        let mut orders = Table::new("sales", "Orders");
        orders.columns.push(
            Column::new("CustomerId", "int", &mapping)
                .references(ForeignKeyRef::new("sales", "Customers", "Id"))
                .expect("single reference"),
        );
        let audit = Table::new("audit", "Log");
        vec![customers, orders, audit]
    }

    #[test]
    fn filters_by_schema_case_insensitively() {
        let opts = EnumerateOptions {
            schemas: Some(vec!["SALES".to_string()]),
            ..EnumerateOptions::default()
        };
        let selected = apply_options(tables(), &opts).expect("apply options");
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|table| table.schema == "sales"));
    }

    #[test]
    fn foreign_keys_are_dropped_when_not_requested() {
        let opts = EnumerateOptions {
            include_foreign_keys: false,
            ..EnumerateOptions::default()
        };
        let selected = apply_options(tables(), &opts).expect("apply options");
        assert!(!selected[1].columns[0].is_foreign_key());
        assert_eq!(selected[1].columns.len(), 1);
    }

    fn snapshot(json: &str) -> Vec<SnapshotTable> {
        serde_json::from_str(json).expect("parse snapshot")
    }

    #[test]
    fn native_type_alone_resolves_through_the_mapping() {
        let raw = snapshot(
            r#"[{"schema":"dbo","name":"Tags","columns":[
                {"name":"Id","native_type":"int"},
                {"name":"Label","native_type":"nvarchar","max_length":40,"is_nullable":true}
            ]}]"#,
        );
        let tables = resolve_tables(raw, NativeTypeMapping::default_sql_server()).expect("resolve");

        let columns = &tables[0].columns;
        assert_eq!(columns[0].storage, StorageTag::Int32);
        assert_eq!(columns[0].semantic_type, SemanticType::Integer);
        assert_eq!(columns[1].storage, StorageTag::StringVariable);
        assert_eq!(columns[1].max_length, 40);
        assert!(columns[1].is_nullable);
    }

    #[test]
    fn mapping_wins_over_contradicting_storage() {
        let raw = snapshot(
            r#"[{"schema":"dbo","name":"Tags","columns":[
                {"name":"Label","native_type":"nvarchar","storage":"int32"},
                {"name":"Shape","native_type":"geography","semantic_type":"binary","storage":"binary"}
            ]}]"#,
        );
        let tables = resolve_tables(raw, NativeTypeMapping::default_sql_server()).expect("resolve");

        assert_eq!(tables[0].columns[0].storage, StorageTag::StringVariable);
        assert_eq!(tables[0].columns[1].storage, StorageTag::Binary);
        assert_eq!(tables[0].columns[1].semantic_type, SemanticType::Binary);
    }

    #[test]
    fn mapping_choice_changes_resolved_storage() {
        let json = r#"[{"schema":"public","name":"t","columns":[{"name":"flag","native_type":"bool"}]}]"#;
        let postgres = resolve_tables(snapshot(json), NativeTypeMapping::default_postgres())
            .expect("resolve");
        let sql_server = resolve_tables(snapshot(json), NativeTypeMapping::default_sql_server())
            .expect("resolve");

        assert_eq!(postgres[0].columns[0].storage, StorageTag::Boolean);
        assert_eq!(sql_server[0].columns[0].storage, StorageTag::Object);
    }

    #[test]
    fn columns_are_dropped_when_not_requested() {
        let opts = EnumerateOptions {
            include_columns: false,
            ..EnumerateOptions::default()
        };
        let selected = apply_options(tables(), &opts).expect("apply options");
        assert!(selected.iter().all(|table| table.columns.is_empty()));
    }
}
