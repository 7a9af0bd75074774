use tracing::{info, warn};

use seedsheet_core::{
    encode, order_tables, same_name, validate_tables, ProgressEvent, ProgressObserver, Table,
    TypePolicy, ValidationRule,
};
use seedsheet_workbook::{CellRef, Document, TableObject, Validation, ValidationKind, MAX_ROWS};

use crate::errors::ExportError;
use crate::model::{ExportOptions, ScaffoldReport, TableReport, UnresolvedReference};
use crate::naming::{sheet_name, SeededSheetNamer, SheetNamer};

const HEADER_ROW: u32 = 1;
const FIRST_DATA_ROW: u32 = 2;

/// Writes one sheet per table into a [`Document`].
pub struct ScaffoldBuilder {
    policy: TypePolicy,
    namer: Box<dyn SheetNamer>,
}

/// A pick-list waiting for its target table object to appear.
#[derive(Debug, Clone)]
struct PendingReference {
    sheet: String,
    col: u16,
    allow_blank: bool,
    table: String,
    column: String,
    target_table: String,
    target_column: String,
}

impl PendingReference {
    fn into_unresolved(self) -> UnresolvedReference {
        UnresolvedReference {
            table: self.table,
            column: self.column,
            target_table: self.target_table,
            target_column: self.target_column,
        }
    }
}

impl ScaffoldBuilder {
    pub fn new(policy: TypePolicy, options: &ExportOptions) -> Self {
        Self {
            policy,
            namer: Box::new(SeededSheetNamer::new(options.sheet_seed)),
        }
    }

    /// Replace the sheet-name suffix source.
    pub fn with_namer(mut self, namer: impl SheetNamer + 'static) -> Self {
        self.namer = Box::new(namer);
        self
    }

    /// Validate and order `tables`, then scaffold them into `document`.
    pub fn export<D: Document>(
        &mut self,
        document: &mut D,
        tables: Vec<Table>,
        observer: &mut dyn ProgressObserver,
    ) -> Result<ScaffoldReport, ExportError> {
        validate_tables(&tables)?;
        let ordered = order_tables(tables);

        info!(
            event = "export_started",
            tables = ordered.report.summary.nodes,
            edges = ordered.report.summary.edges,
            cycle_breaks = ordered.report.cycle_breaks.len()
        );
        for table in &ordered.report.cycle_breaks {
            warn!(event = "cycle_broken", table = %table);
        }

        let mut report = self.build(document, &ordered.tables, observer)?;
        report.cycle_breaks = ordered.report.cycle_breaks;
        Ok(report)
    }

    /// Scaffold tables that are already in dependency order.
    ///
    /// Tables whose table object is already present are skipped, so running
    /// twice over the same document adds nothing the second time.
    pub fn build<D: Document>(
        &mut self,
        document: &mut D,
        tables: &[Table],
        observer: &mut dyn ProgressObserver,
    ) -> Result<ScaffoldReport, ExportError> {
        let mut report = ScaffoldReport::default();
        let mut pending: Vec<PendingReference> = Vec::new();

        for table in tables {
            let full_name = table.full_name();
            if document.find_table_object(&full_name).is_some() {
                info!(event = "table_skipped", table = %full_name);
                observer.on_event(&ProgressEvent::TableSkipped {
                    table: full_name.clone(),
                });
                report.skipped.push(full_name);
                continue;
            }

            let table_report = self.export_table(document, table, &mut pending)?;
            info!(
                event = "table_exported",
                table = %full_name,
                sheet = %table_report.sheet,
                columns = table_report.columns
            );
            observer.on_event(&ProgressEvent::TableExported {
                table: full_name,
                sheet: table_report.sheet.clone(),
            });
            report.exported.push(table_report);

            pending = resolve_pending(document, pending)?;
        }

        for reference in pending {
            warn!(
                event = "reference_unresolved",
                table = %reference.table,
                column = %reference.column,
                target = %reference.target_table,
                "foreign key pick-list left without a source range"
            );
            report.unresolved_references.push(reference.into_unresolved());
        }

        Ok(report)
    }

    fn export_table<D: Document>(
        &mut self,
        document: &mut D,
        table: &Table,
        pending: &mut Vec<PendingReference>,
    ) -> Result<TableReport, ExportError> {
        let full_name = table.full_name();
        let sheet = sheet_name(&full_name, document, self.namer.as_mut());
        document.add_sheet(&sheet)?;

        let mut columns: u16 = 0;
        for (position, column) in table.editable_columns().enumerate() {
            let col = u16::try_from(position + 1)
                .map_err(|_| ExportError::TooManyColumns(full_name.clone()))?;
            columns = col;

            document.write_header(&sheet, col, &column.name)?;
            document.set_annotation(&sheet, CellRef::new(HEADER_ROW, col)?, &encode(column)?)?;

            let resolution = self.policy.resolve_column(column);
            let kind = match resolution.validation {
                ValidationRule::None => continue,
                ValidationRule::ForeignKeyList {
                    target_table,
                    target_column,
                } => {
                    pending.push(PendingReference {
                        sheet: sheet.clone(),
                        col,
                        allow_blank: resolution.allow_blank,
                        table: full_name.clone(),
                        column: column.name.clone(),
                        target_table,
                        target_column,
                    });
                    continue;
                }
                ValidationRule::BooleanList { values } => ValidationKind::ListValues { values },
                ValidationRule::BoundedInteger { min, max } => {
                    ValidationKind::WholeNumber { min, max }
                }
                ValidationRule::DateFormat => ValidationKind::Date,
                ValidationRule::TimeFormat => ValidationKind::Time,
                ValidationRule::TextLength { max } => ValidationKind::TextLength { max },
            };
            document.add_validation(&sheet, data_validation(col, kind, resolution.allow_blank))?;
        }

        document.add_table_object(
            &sheet,
            TableObject::over_header(full_name.clone(), 1, columns.max(1)),
        )?;

        Ok(TableReport {
            schema: table.schema.clone(),
            table: table.name.clone(),
            sheet,
            columns: usize::from(columns),
        })
    }
}

fn data_validation(col: u16, kind: ValidationKind, allow_blank: bool) -> Validation {
    Validation {
        col,
        first_row: FIRST_DATA_ROW,
        last_row: MAX_ROWS,
        kind,
        allow_blank,
    }
}

/// Attach every pick-list whose target table object now exists; return the rest.
fn resolve_pending<D: Document>(
    document: &mut D,
    pending: Vec<PendingReference>,
) -> Result<Vec<PendingReference>, ExportError> {
    let mut remaining = Vec::new();

    for reference in pending {
        let Some(formula) = source_range(document, &reference.target_table, &reference.target_column)
        else {
            remaining.push(reference);
            continue;
        };
        document.add_validation(
            &reference.sheet,
            data_validation(
                reference.col,
                ValidationKind::ListRange { formula },
                reference.allow_blank,
            ),
        )?;
    }

    Ok(remaining)
}

/// `='Sheet'!$C$2:$C$1048576` over the target column's data rows, when the
/// target table object and its header column exist.
fn source_range<D: Document>(document: &D, target_table: &str, target_column: &str) -> Option<String> {
    let (sheet, table) = document.find_table_object(target_table)?;
    let col = table.columns().find(|col| {
        CellRef::new(table.header_row(), *col)
            .ok()
            .and_then(|cell| document.cell_text(&sheet, cell))
            .is_some_and(|header| same_name(&header, target_column))
    })?;

    let first = CellRef {
        row: FIRST_DATA_ROW,
        col,
    };
    let last = CellRef { row: MAX_ROWS, col };
    Some(format!(
        "='{}'!{}:{}",
        sheet.replace('\'', "''"),
        first.absolute(),
        last.absolute()
    ))
}
