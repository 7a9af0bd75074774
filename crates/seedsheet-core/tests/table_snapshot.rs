use schemars::schema_for;
use seedsheet_core::{Column, ForeignKeyRef, NativeTypeMapping, StorageTag, Table};

fn orders() -> Table {
    let mapping = NativeTypeMapping::sql_server();
    let mut table = Table::new("dbo", "Orders");
    table
        .columns
        .push(Column::new("Id", "int", &mapping).primary_key().identity());
    table.columns.push(
        Column::new("CustomerId", "int", &mapping)
            .references(ForeignKeyRef::new("dbo", "Customers", "Id"))
            .expect("single reference"),
    );
    table
}

#[test]
fn snapshot_round_trips_through_json() {
    let json = serde_json::to_string_pretty(&vec![orders()]).expect("serialize tables");
    let tables: Vec<Table> = serde_json::from_str(&json).expect("parse tables");

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].columns, orders().columns);
    assert_eq!(
        tables[0].columns[1].foreign_key().map(ForeignKeyRef::table_full_name),
        Some("dbo.Customers".to_string())
    );
}

#[test]
fn snapshot_fields_default_when_omitted() {
    let json = r#"[{
        "schema": "dbo",
        "name": "Tags",
        "columns": [
            { "name": "Label", "native_type": "nvarchar", "semantic_type": "string", "storage": "string_variable" }
        ]
    }]"#;
    let tables: Vec<Table> = serde_json::from_str(json).expect("parse tables");
    let label = &tables[0].columns[0];

    assert_eq!(label.storage, StorageTag::StringVariable);
    assert_eq!(label.max_length, 0);
    assert!(!label.is_nullable);
    assert!(!label.is_foreign_key());
}

#[test]
fn json_schema_describes_columns() {
    let schema = serde_json::to_value(schema_for!(Vec<Table>)).expect("serialize json schema");
    let column = &schema["definitions"]["Column"]["properties"];

    assert!(column.get("storage").is_some());
    assert!(column.get("foreign_key").is_some());
}
