use seedsheet_core::{Column, Error, ForeignKeyRef, NativeTypeMapping, Result, Table};

use crate::options::EnumerateOptions;

/// A table row as returned by a catalog query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawTable {
    pub schema: String,
    pub name: String,
}

/// A column row, already flattened to typed fields by the query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawColumn {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub native_type: String,
    pub max_length: Option<i32>,
    pub is_nullable: bool,
    pub is_identity: bool,
    pub is_generated: bool,
    pub is_primary_key: bool,
}

/// One referencing/referenced column pair of a foreign key constraint.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawReference {
    pub referencing_schema: String,
    pub referencing_table: String,
    pub referencing_column: String,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

pub fn filter_tables(raw: Vec<RawTable>, opts: &EnumerateOptions) -> Vec<RawTable> {
    raw.into_iter()
        .filter(|table| opts.includes_schema(&table.schema))
        .collect()
}

/// Build tables from raw rows. Columns and references are only attached when
/// the corresponding rows were read.
pub fn map_tables(
    raw_tables: Vec<RawTable>,
    raw_columns: Option<&[RawColumn]>,
    raw_references: Option<&[RawReference]>,
    mapping: &NativeTypeMapping,
) -> Result<Vec<Table>> {
    let mut tables = Vec::with_capacity(raw_tables.len());

    for raw in raw_tables {
        let mut table = Table::new(raw.schema, raw.name);
        if let Some(columns) = raw_columns {
            assign_columns(&mut table, columns, mapping);
        }
        if let Some(references) = raw_references {
            assign_references(&mut table, references)?;
        }
        tables.push(table);
    }

    Ok(tables)
}

pub fn assign_columns(table: &mut Table, columns: &[RawColumn], mapping: &NativeTypeMapping) {
    let owned = columns
        .iter()
        .filter(|column| column.schema == table.schema && column.table == table.name);

    for raw in owned {
        let mut column = Column::new(raw.name.clone(), raw.native_type.clone(), mapping)
            .with_max_length(
                raw.max_length
                    .and_then(|length| u32::try_from(length).ok())
                    .unwrap_or(0),
            );
        column.is_nullable = raw.is_nullable;
        column.is_identity = raw.is_identity;
        column.is_auto_generated = raw.is_generated;
        column.is_primary_key = raw.is_primary_key;
        table.columns.push(column);
    }
}

/// Attach foreign key targets to the table's columns.
///
/// A reference naming an unknown column, or a second reference on the same
/// column, means the schema read is inconsistent and fails the whole run.
pub fn assign_references(table: &mut Table, references: &[RawReference]) -> Result<()> {
    let owned = references.iter().filter(|reference| {
        reference.referencing_schema == table.schema && reference.referencing_table == table.name
    });

    for reference in owned {
        let full_name = table.full_name();
        let column = table
            .columns
            .iter_mut()
            .find(|column| column.name == reference.referencing_column)
            .ok_or_else(|| {
                Error::SchemaInconsistency(format!(
                    "foreign key column not found: {}.{}",
                    full_name, reference.referencing_column
                ))
            })?;

        column.set_foreign_key(ForeignKeyRef::new(
            reference.referenced_schema.clone(),
            reference.referenced_table.clone(),
            reference.referenced_column.clone(),
        ))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedsheet_core::StorageTag;

    fn raw_table(name: &str) -> RawTable {
        RawTable {
            schema: "public".to_string(),
            name: name.to_string(),
        }
    }

    fn raw_column(table: &str, name: &str, native_type: &str) -> RawColumn {
        RawColumn {
            schema: "public".to_string(),
            table: table.to_string(),
            name: name.to_string(),
            native_type: native_type.to_string(),
            max_length: None,
            is_nullable: false,
            is_identity: false,
            is_generated: false,
            is_primary_key: false,
        }
    }

    fn reference(column: &str, target: &str) -> RawReference {
        RawReference {
            referencing_schema: "public".to_string(),
            referencing_table: "orders".to_string(),
            referencing_column: column.to_string(),
            referenced_schema: "public".to_string(),
            referenced_table: target.to_string(),
            referenced_column: "id".to_string(),
        }
    }

    #[test]
    fn maps_columns_and_references() {
        let mut name = raw_column("customers", "name", "varchar");
        name.max_length = Some(120);
        name.is_nullable = true;
        let mut id = raw_column("customers", "id", "int4");
        id.is_primary_key = true;
        id.is_identity = true;
        let columns = vec![
            id,
            name,
            raw_column("orders", "id", "int4"),
            raw_column("orders", "customer_id", "int4"),
        ];
        let references = vec![reference("customer_id", "customers")];

        let tables = map_tables(
            vec![raw_table("customers"), raw_table("orders")],
            Some(columns.as_slice()),
            Some(references.as_slice()),
            &NativeTypeMapping::postgres(),
        )
        .expect("map tables");

        let customers = &tables[0];
        assert_eq!(customers.columns.len(), 2);
        assert!(customers.columns[0].is_primary_key && customers.columns[0].is_identity);
        assert_eq!(customers.columns[1].storage, StorageTag::StringVariable);
        assert_eq!(customers.columns[1].max_length, 120);

        let orders = &tables[1];
        let fk = orders.columns[1].foreign_key().expect("customer_id reference");
        assert_eq!(fk.table_full_name(), "public.customers");
    }

    #[test]
    fn duplicate_reference_on_a_column_is_fatal() {
        let columns = vec![raw_column("orders", "customer_id", "int4")];
        let references = vec![
            reference("customer_id", "customers"),
            reference("customer_id", "clients"),
        ];

        let err = map_tables(
            vec![raw_table("orders")],
            Some(columns.as_slice()),
            Some(references.as_slice()),
            &NativeTypeMapping::postgres(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaInconsistency(_)));
    }

    #[test]
    fn unknown_referencing_column_is_fatal() {
        let err = map_tables(
            vec![raw_table("orders")],
            Some(&[] as &[RawColumn]),
            Some(&[reference("customer_id", "customers")] as &[RawReference]),
            &NativeTypeMapping::postgres(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaInconsistency(_)));
    }

    #[test]
    fn unknown_native_types_do_not_fail() {
        let columns = vec![raw_column("orders", "route", "geometry")];
        let tables = map_tables(
            vec![raw_table("orders")],
            Some(columns.as_slice()),
            None,
            &NativeTypeMapping::postgres(),
        )
        .expect("map tables");
        assert_eq!(tables[0].columns[0].storage, StorageTag::Object);
    }
}
