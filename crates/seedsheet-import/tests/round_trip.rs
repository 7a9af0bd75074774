use std::env;
use std::fs;

use seedsheet_core::{
    Column, ForeignKeyRef, Literal, LiteralKind, NativeTypeMapping, ProgressEvent, StorageTag,
    Table, TypePolicy,
};
use seedsheet_export::{ExportOptions, ScaffoldBuilder};
use seedsheet_import::{BindingExtractor, Flavor, ImportOptions, SeedSourceGenerator};
use seedsheet_workbook::{read_xlsx, render_xlsx, CellRef, Document, ValidationKind, Workbook};

fn schema() -> Vec<Table> {
    let mapping = NativeTypeMapping::sql_server();

    let mut customers = Table::new("dbo", "Customers");
    customers
        .columns
        .push(Column::new("Id", "int", &mapping).primary_key().identity());
    customers
        .columns
        .push(Column::new("Name", "nvarchar", &mapping).with_max_length(100));
    customers
        .columns
        .push(Column::new("RowVersion", "timestamp", &mapping).auto_generated());

    let mut orders = Table::new("dbo", "Orders");
    orders
        .columns
        .push(Column::new("Id", "int", &mapping).primary_key().identity());
    orders.columns.push(
        Column::new("CustomerId", "int", &mapping)
            .references(ForeignKeyRef::new("dbo", "Customers", "Id"))
            .expect("single reference"),
    );
    orders
        .columns
        .push(Column::new("PlacedOn", "date", &mapping).nullable());

    vec![orders, customers]
}

fn exported_workbook() -> Workbook {
    let mut workbook = Workbook::new();
    let mut observer = |_: &ProgressEvent| {};
    ScaffoldBuilder::new(TypePolicy::sql_server(), &ExportOptions::default())
        .export(&mut workbook, schema(), &mut observer)
        .expect("export");
    workbook
}

fn fill(workbook: &mut Workbook) {
    let mut set = |sheet: &str, row: u32, col: u16, value: &str| {
        workbook
            .set_cell(sheet, CellRef { row, col }, value)
            .expect("fill cell");
    };
    set("dbo.Customers", 2, 1, "1");
    set("dbo.Customers", 2, 2, "Ada");
    set("dbo.Orders", 2, 1, "10");
    set("dbo.Orders", 2, 2, "1");
}

#[test]
fn customers_and_orders_round_trip() {
    let mut workbook = exported_workbook();
    assert_eq!(workbook.sheet_names(), vec!["dbo.Customers", "dbo.Orders"]);
    assert!(workbook.validations("dbo.Orders").iter().any(|validation| {
        validation.col == 2
            && validation.kind
                == ValidationKind::ListRange {
                    formula: "='dbo.Customers'!$A$2:$A$1048576".to_string(),
                }
    }));

    fill(&mut workbook);
    let path = env::temp_dir().join(format!("seedsheet-round-trip-{}.json", uuid::Uuid::new_v4()));
    workbook.save(&path).expect("save");
    let reloaded = Workbook::load(&path).expect("load");
    let _ = fs::remove_file(&path);

    let extraction = BindingExtractor::new(ImportOptions::default())
        .extract(&reloaded)
        .expect("extract");
    assert!(extraction.issues.is_empty());
    assert_eq!(extraction.tables.len(), 2);

    let customers = &extraction.tables[0];
    assert_eq!(customers.full_name(), "dbo.Customers");
    let names: Vec<&str> = customers.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Id", "Name"]);
    assert!(customers.columns[0].is_primary_key);
    assert!(customers.columns[0].is_identity);
    assert_eq!(customers.rows, vec![vec![Literal::expression("1"), Literal::text("Ada")]]);

    let orders = &extraction.tables[1];
    assert_eq!(orders.full_name(), "dbo.Orders");
    let customer_id = &orders.columns[1];
    assert!(customer_id.is_foreign_key);
    assert_eq!(
        customer_id.foreign_key,
        Some(ForeignKeyRef::new("dbo", "Customers", "Id"))
    );
    assert_eq!(orders.columns[2].storage, StorageTag::Date);
    assert_eq!(orders.rows.len(), 1);
    assert_eq!(orders.rows[0][2].kind, LiteralKind::Empty);
}

#[test]
fn filled_xlsx_reloads_and_extracts() {
    let mut workbook = exported_workbook();
    fill(&mut workbook);
    let path = env::temp_dir().join(format!("seedsheet-round-trip-{}.xlsx", uuid::Uuid::new_v4()));
    render_xlsx(&workbook, &path).expect("render xlsx");
    let reloaded = read_xlsx(&path).expect("read xlsx");
    let _ = fs::remove_file(&path);

    let extraction = BindingExtractor::new(ImportOptions::default())
        .extract(&reloaded)
        .expect("extract");
    assert!(extraction.issues.is_empty());
    assert_eq!(extraction.tables.len(), 2);
    assert_eq!(
        extraction.tables[0].rows,
        vec![vec![Literal::expression("1"), Literal::text("Ada")]]
    );
    let orders = &extraction.tables[1];
    assert_eq!(
        orders.columns[1].foreign_key,
        Some(ForeignKeyRef::new("dbo", "Customers", "Id"))
    );
    assert_eq!(orders.rows.len(), 1);
    assert_eq!(orders.rows[0][0], Literal::expression("10"));
}

#[test]
fn generates_one_module_per_flavor() {
    let mut workbook = exported_workbook();
    fill(&mut workbook);
    let empty = exported_workbook();

    let mut events = Vec::new();
    let mut observer = |event: &ProgressEvent| events.push(event.clone());
    let generated = SeedSourceGenerator::new(ImportOptions::default())
        .expect("templates")
        .generate(
            "Acme.Seed",
            &[Flavor::new("Smoke", workbook), Flavor::new("Empty", empty)],
            &mut observer,
        )
        .expect("generate");

    let source = &generated.source;
    assert_eq!(generated.tables, 4);
    assert!(source.starts_with("// @generated by seedsheet from Smoke, Empty."));
    assert!(source.contains("pub mod acme_seed {"));
    assert!(source.contains("pub mod smoke {"));
    assert!(source.contains("pub mod empty {"));
    assert!(source.contains("sink.begin_table(\"dbo\", \"Customers\", true)?;"));
    assert!(source.contains(
        "vec![SeedValue::Int32(1), SeedValue::Text(\"Ada\".to_string())]"
    ));
    assert!(source.contains(
        "vec![SeedValue::Int32(10), SeedValue::Int32(1), SeedValue::from(String::new())]"
    ));

    let customers = source
        .find("populate_dbo_customers(sink)?;")
        .expect("customers call");
    let orders = source.find("populate_dbo_orders(sink)?;").expect("orders call");
    assert!(customers < orders);

    assert_eq!(source.matches('{').count(), source.matches('}').count());
    assert!(source.ends_with("    }\n}\n"));

    assert_eq!(
        events,
        vec![
            ProgressEvent::FlavorStarted {
                flavor: "Smoke".to_string()
            },
            ProgressEvent::FlavorImported {
                flavor: "Smoke".to_string(),
                tables: 2
            },
            ProgressEvent::FlavorStarted {
                flavor: "Empty".to_string()
            },
            ProgressEvent::FlavorImported {
                flavor: "Empty".to_string(),
                tables: 2
            },
        ]
    );
}
