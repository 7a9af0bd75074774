use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::schema::{fold_name, Table};

/// Validate internal consistency of a table set before it is exported.
///
/// This checks:
/// - duplicate tables/columns (identity is case-insensitive)
/// - foreign key targets exist, both table and column
pub fn validate_tables(tables: &[Table]) -> Result<()> {
    let mut catalog: BTreeMap<(String, String), BTreeSet<String>> = BTreeMap::new();

    for table in tables {
        if table.name.trim().is_empty() {
            return Err(Error::InvalidSchema(format!(
                "table with empty name in schema '{}'",
                table.schema
            )));
        }

        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if !columns.insert(fold_name(&column.name)) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {}.{}",
                    table.full_name(),
                    column.name
                )));
            }
        }

        if catalog.insert(table.key(), columns).is_some() {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}",
                table.full_name()
            )));
        }
    }

    for table in tables {
        for column in &table.columns {
            let Some(fk) = column.foreign_key() else {
                continue;
            };

            let ref_columns = catalog.get(&fk.table_key()).ok_or_else(|| {
                Error::SchemaInconsistency(format!(
                    "{}.{} references missing table {}",
                    table.full_name(),
                    column.name,
                    fk.table_full_name()
                ))
            })?;

            if !ref_columns.contains(&fold_name(&fk.column)) {
                return Err(Error::SchemaInconsistency(format!(
                    "{}.{} references missing column {}",
                    table.full_name(),
                    column.name,
                    fk
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ForeignKeyRef};
    use crate::types::NativeTypeMapping;

    fn customers() -> Table {
        let mapping = NativeTypeMapping::sql_server();
        let mut table = Table::new("dbo", "Customers");
        table.columns.push(Column::new("Id", "int", &mapping).primary_key());
        table
    }

    fn orders(target_column: &str) -> Table {
        let mapping = NativeTypeMapping::sql_server();
        let mut table = Table::new("dbo", "Orders");
        table.columns.push(Column::new("Id", "int", &mapping).primary_key());
        table.columns.push(
            Column::new("CustomerId", "int", &mapping)
                .references(ForeignKeyRef::new("dbo", "customers", target_column))
                .expect("single reference"),
        );
        table
    }

    #[test]
    fn accepts_resolvable_references() {
        validate_tables(&[customers(), orders("ID")]).expect("valid tables");
    }

    #[test]
    fn rejects_missing_reference_column() {
        let err = validate_tables(&[customers(), orders("Code")]).unwrap_err();
        assert!(matches!(err, Error::SchemaInconsistency(_)));
    }

    #[test]
    fn rejects_missing_reference_table() {
        let err = validate_tables(&[orders("Id")]).unwrap_err();
        assert!(matches!(err, Error::SchemaInconsistency(_)));
    }

    #[test]
    fn rejects_case_insensitive_duplicates() {
        let mut other = customers();
        other.name = "CUSTOMERS".to_string();
        let err = validate_tables(&[customers(), other]).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }
}
