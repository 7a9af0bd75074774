use tracing::{debug, warn};

use seedsheet_core::{decode, Literal, LiteralError};
use seedsheet_workbook::{CellRef, Document, TableObject};

use crate::errors::ImportError;
use crate::model::{ColumnBinding, Extraction, ImportIssue, ImportOptions, TableBinding};

/// Rebuilds table bindings from a filled-in document.
#[derive(Debug, Clone, Default)]
pub struct BindingExtractor {
    options: ImportOptions,
}

impl BindingExtractor {
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    /// Read every sheet that carries a table object, in sheet order.
    pub fn extract<D: Document + ?Sized>(&self, document: &D) -> Result<Extraction, ImportError> {
        let mut extraction = Extraction::default();

        for sheet in document.sheet_names() {
            let Some(object) = document.table_objects(&sheet).into_iter().next() else {
                debug!(event = "sheet_ignored", sheet = %sheet);
                continue;
            };

            let table = self.extract_table(document, &sheet, &object, &mut extraction.issues)?;
            debug!(
                event = "sheet_extracted",
                sheet = %sheet,
                table = %table.full_name(),
                columns = table.columns.len(),
                rows = table.rows.len()
            );
            extraction.tables.push(table);
        }

        Ok(extraction)
    }

    fn extract_table<D: Document + ?Sized>(
        &self,
        document: &D,
        sheet: &str,
        object: &TableObject,
        issues: &mut Vec<ImportIssue>,
    ) -> Result<TableBinding, ImportError> {
        let (schema, name) = split_table_name(&object.name);
        let columns = read_columns(document, sheet, object, issues)
            .into_iter()
            .filter(|column| !column.is_auto_generated)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for row in (object.header_row() + 1)..=document.last_row(sheet) {
            if is_blank_row(document, sheet, object, row) {
                continue;
            }
            if let Some(literals) = self.render_row(document, sheet, row, &columns, issues)? {
                rows.push(literals);
            }
        }

        Ok(TableBinding {
            schema,
            name,
            sheet: sheet.to_string(),
            columns,
            rows,
        })
    }

    /// Render one row; `None` when a cell failed and the row was dropped.
    fn render_row<D: Document + ?Sized>(
        &self,
        document: &D,
        sheet: &str,
        row: u32,
        columns: &[ColumnBinding],
        issues: &mut Vec<ImportIssue>,
    ) -> Result<Option<Vec<Literal>>, ImportError> {
        let mut literals = Vec::with_capacity(columns.len());
        let mut dropped = false;

        for column in columns {
            let raw = cell_text(document, sheet, row, column.position);
            match column.literal_rule.render(raw.as_deref()) {
                Ok(literal) => literals.push(literal),
                Err(reason) => {
                    let error = LiteralError {
                        storage: column.storage,
                        raw: raw.unwrap_or_default(),
                        reason,
                    };
                    if self.options.strict {
                        return Err(ImportError::Literal {
                            sheet: sheet.to_string(),
                            row,
                            column: column.name.clone(),
                            source: error,
                        });
                    }
                    warn!(
                        event = "literal_unrenderable",
                        sheet = %sheet,
                        row,
                        column = %column.name,
                        error = %error
                    );
                    issues.push(ImportIssue::unrenderable_literal(
                        sheet,
                        row,
                        &column.name,
                        error.to_string(),
                    ));
                    dropped = true;
                }
            }
        }

        Ok((!dropped).then_some(literals))
    }
}

/// Split a table-object name at its first `.`; no dot means no schema.
pub fn split_table_name(name: &str) -> (String, String) {
    match name.split_once('.') {
        Some((schema, table)) => (schema.to_string(), table.to_string()),
        None => (String::new(), name.to_string()),
    }
}

fn read_columns<D: Document + ?Sized>(
    document: &D,
    sheet: &str,
    object: &TableObject,
    issues: &mut Vec<ImportIssue>,
) -> Vec<ColumnBinding> {
    let mut columns = Vec::new();

    for col in object.columns() {
        let Some(header) = cell_text(document, sheet, object.header_row(), col)
            .filter(|text| !text.trim().is_empty())
        else {
            continue;
        };

        let annotation = CellRef::new(object.header_row(), col)
            .ok()
            .and_then(|cell| document.annotation(sheet, cell));
        let Some(annotation) = annotation else {
            warn!(event = "metadata_missing", sheet = %sheet, column = %header);
            issues.push(ImportIssue::malformed_metadata(
                sheet,
                &header,
                "header cell has no metadata annotation",
            ));
            continue;
        };

        match decode(&annotation) {
            Ok(metadata) => columns.push(ColumnBinding::from_metadata(metadata, col)),
            Err(err) => {
                warn!(
                    event = "metadata_malformed",
                    sheet = %sheet,
                    column = %header,
                    error = %err
                );
                issues.push(ImportIssue::malformed_metadata(sheet, &header, err.to_string()));
            }
        }
    }

    columns
}

fn cell_text<D: Document + ?Sized>(document: &D, sheet: &str, row: u32, col: u16) -> Option<String> {
    CellRef::new(row, col)
        .ok()
        .and_then(|cell| document.cell_text(sheet, cell))
}

fn is_blank_row<D: Document + ?Sized>(
    document: &D,
    sheet: &str,
    object: &TableObject,
    row: u32,
) -> bool {
    object.columns().all(|col| {
        cell_text(document, sheet, row, col).is_none_or(|text| text.trim().is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedsheet_core::{encode, Column, LiteralKind, NativeTypeMapping, StorageTag};
    use seedsheet_workbook::Workbook;

    fn cell(row: u32, col: u16) -> CellRef {
        CellRef { row, col }
    }

    fn sheet_with(columns: &[Column]) -> Workbook {
        let mut workbook = Workbook::new();
        workbook.add_sheet("items").expect("sheet");
        for (index, column) in columns.iter().enumerate() {
            let col = u16::try_from(index + 1).expect("column index");
            workbook.write_header("items", col, &column.name).expect("header");
            workbook
                .set_annotation("items", cell(1, col), &encode(column).expect("encode"))
                .expect("annotation");
        }
        workbook
            .add_table_object(
                "items",
                TableObject::over_header(
                    "inv.Items",
                    1,
                    u16::try_from(columns.len()).expect("width"),
                ),
            )
            .expect("table");
        workbook
    }

    fn columns() -> Vec<Column> {
        let mapping = NativeTypeMapping::sql_server();
        vec![
            Column::new("Id", "int", &mapping).primary_key(),
            Column::new("Label", "nvarchar", &mapping).nullable(),
            Column::new("Version", "rowversion", &mapping).auto_generated(),
        ]
    }

    #[test]
    fn splits_at_first_dot_only() {
        assert_eq!(
            split_table_name("dbo.Order.Lines"),
            ("dbo".to_string(), "Order.Lines".to_string())
        );
        assert_eq!(split_table_name("Loose"), (String::new(), "Loose".to_string()));
    }

    #[test]
    fn drops_auto_generated_columns_and_blank_rows() {
        let mut workbook = sheet_with(&columns());
        workbook.set_cell("items", cell(2, 1), "1").expect("cell");
        workbook.set_cell("items", cell(2, 3), "0x00FF").expect("cell");
        workbook.set_cell("items", cell(3, 2), "   ").expect("cell");
        workbook.set_cell("items", cell(4, 1), "2").expect("cell");
        workbook.set_cell("items", cell(4, 2), "Bolt").expect("cell");

        let extraction = BindingExtractor::default()
            .extract(&workbook)
            .expect("extract");
        assert!(extraction.issues.is_empty());

        let table = &extraction.tables[0];
        assert_eq!((table.schema.as_str(), table.name.as_str()), ("inv", "Items"));
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Label"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0].text, "1");
        assert_eq!(table.rows[0][1].kind, LiteralKind::Empty);
        assert_eq!(table.rows[1][1], Literal::text("Bolt"));
    }

    #[test]
    fn malformed_metadata_drops_only_that_column() {
        let mut workbook = sheet_with(&columns());
        workbook
            .set_annotation("items", cell(1, 2), "edited by hand")
            .expect("annotation");
        workbook.set_cell("items", cell(2, 1), "5").expect("cell");

        let extraction = BindingExtractor::default()
            .extract(&workbook)
            .expect("extract");

        assert_eq!(extraction.tables[0].columns.len(), 1);
        assert_eq!(extraction.tables[0].columns[0].storage, StorageTag::Int32);
        assert_eq!(extraction.issues.len(), 1);
        assert_eq!(extraction.issues[0].code, ImportIssue::MALFORMED_METADATA);
        assert_eq!(extraction.issues[0].column.as_deref(), Some("Label"));
    }

    #[test]
    fn unrenderable_cell_drops_its_row_or_fails_in_strict_mode() {
        let mut workbook = sheet_with(&columns());
        workbook.set_cell("items", cell(2, 1), "twelve").expect("cell");
        workbook.set_cell("items", cell(3, 1), "12").expect("cell");

        let extraction = BindingExtractor::default()
            .extract(&workbook)
            .expect("extract");
        assert_eq!(extraction.tables[0].rows.len(), 1);
        let issue = &extraction.issues[0];
        assert_eq!(issue.code, ImportIssue::UNRENDERABLE_LITERAL);
        assert_eq!((issue.sheet.as_str(), issue.row), ("items", Some(2)));
        assert_eq!(issue.column.as_deref(), Some("Id"));

        let err = BindingExtractor::new(ImportOptions { strict: true })
            .extract(&workbook)
            .unwrap_err();
        assert!(matches!(err, ImportError::Literal { row: 2, .. }));
    }

    #[test]
    fn whitespace_in_a_numeric_cell_keeps_the_row() {
        let mapping = NativeTypeMapping::sql_server();
        let mut workbook = sheet_with(&[
            Column::new("Label", "nvarchar", &mapping),
            Column::new("Qty", "int", &mapping).nullable(),
        ]);
        workbook.set_cell("items", cell(2, 1), "Bolt").expect("cell");
        workbook.set_cell("items", cell(2, 2), " ").expect("cell");

        let extraction = BindingExtractor::default()
            .extract(&workbook)
            .expect("extract");

        assert!(extraction.issues.is_empty());
        let table = &extraction.tables[0];
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], Literal::text("Bolt"));
        assert_eq!(table.rows[0][1], Literal::empty());
    }

    #[test]
    fn sheets_without_table_objects_are_ignored() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("notes").expect("sheet");
        workbook.set_cell("notes", cell(1, 1), "scratch").expect("cell");

        let extraction = BindingExtractor::default()
            .extract(&workbook)
            .expect("extract");
        assert!(extraction.tables.is_empty());
    }
}
