use std::path::Path;

use rust_xlsxwriter::{
    DataValidation, DataValidationRule, Format, Formula, Note, Table, TableColumn, Worksheet,
    XlsxError,
};

use crate::cell::{column_letters, CellRef};
use crate::document::{TableObject, Validation, ValidationKind};
use crate::error::{Result, WorkbookError};
use crate::workbook::{Sheet, Workbook};

const NOTE_AUTHOR: &str = "seedsheet";
const DATE_FORMAT: &str = "yyyy-mm-dd";
const TIME_FORMAT: &str = "hh:mm:ss";

/// Hidden sheet carrying what cell comments and table objects hold, since
/// those are not readable back from a saved file.
pub(crate) const METADATA_SHEET: &str = "_seedsheet";
pub(crate) const METADATA_HEADERS: [&str; 4] = ["kind", "sheet", "cell", "value"];
pub(crate) const KIND_NOTE: &str = "note";
pub(crate) const KIND_TABLE: &str = "table";
pub(crate) const KIND_VALIDATION: &str = "validation";

fn render_error(err: XlsxError) -> WorkbookError {
    WorkbookError::Render(err.to_string())
}

/// Write `workbook` as an `.xlsx` file: bold headers, metadata notes,
/// validations, date/time column formats and named tables, plus a hidden
/// sheet that lets [`crate::read_xlsx`] rebuild the document.
pub fn render_xlsx(workbook: &Workbook, path: impl AsRef<Path>) -> Result<()> {
    if workbook.sheet(METADATA_SHEET).is_some() {
        return Err(WorkbookError::Render(format!(
            "sheet name {METADATA_SHEET} is reserved"
        )));
    }

    let mut xlsx = rust_xlsxwriter::Workbook::new();
    let header_format = Format::new().set_bold();

    for sheet in workbook.sheets() {
        let worksheet = xlsx
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(render_error)?;

        for validation in &sheet.validations {
            apply_validation(worksheet, validation)?;
        }
        write_cells(worksheet, sheet, &header_format)?;
        for table in &sheet.tables {
            add_table(worksheet, sheet, table)?;
        }
    }

    if !workbook.sheets().is_empty() {
        write_metadata_sheet(xlsx.add_worksheet(), workbook, &header_format)?;
    }

    xlsx.save(path.as_ref()).map_err(render_error)?;
    Ok(())
}

fn write_metadata_sheet(
    worksheet: &mut Worksheet,
    workbook: &Workbook,
    header_format: &Format,
) -> Result<()> {
    worksheet
        .set_name(METADATA_SHEET)
        .map_err(render_error)?
        .set_hidden(true);
    for (col, header) in (0u16..).zip(METADATA_HEADERS) {
        worksheet
            .write_string_with_format(0, col, header, header_format)
            .map_err(render_error)?;
    }

    let mut row = 1u32;
    let mut write_row = |kind: &str, sheet: &str, cell: String, value: String| -> Result<()> {
        for (col, text) in (0u16..).zip([kind, sheet, cell.as_str(), value.as_str()]) {
            worksheet
                .write_string(row, col, text)
                .map_err(render_error)?;
        }
        row += 1;
        Ok(())
    };

    for sheet in workbook.sheets() {
        for (cell, content) in &sheet.cells {
            if let Some(note) = &content.note {
                write_row(KIND_NOTE, &sheet.name, cell.to_string(), note.clone())?;
            }
        }
        for table in &sheet.tables {
            let range = format!(
                "{}:{}",
                CellRef {
                    row: table.first_row,
                    col: table.first_col
                },
                CellRef {
                    row: table.last_row,
                    col: table.last_col
                }
            );
            write_row(KIND_TABLE, &sheet.name, range, table.name.clone())?;
        }
        for validation in &sheet.validations {
            write_row(
                KIND_VALIDATION,
                &sheet.name,
                String::new(),
                serde_json::to_string(validation)?,
            )?;
        }
    }
    Ok(())
}

fn write_cells(worksheet: &mut Worksheet, sheet: &Sheet, header_format: &Format) -> Result<()> {
    for (cell, content) in &sheet.cells {
        let row = cell.row - 1;
        let col = cell.col - 1;

        if let Some(value) = &content.value {
            if content.bold {
                worksheet
                    .write_string_with_format(row, col, value, header_format)
                    .map_err(render_error)?;
            } else {
                worksheet
                    .write_string(row, col, value)
                    .map_err(render_error)?;
            }
        }

        if let Some(text) = &content.note {
            let note = Note::new(text)
                .set_author(NOTE_AUTHOR)
                .add_author_prefix(false);
            worksheet
                .insert_note(row, col, &note)
                .map_err(render_error)?;
        }
    }
    Ok(())
}

fn apply_validation(worksheet: &mut Worksheet, validation: &Validation) -> Result<()> {
    let col = validation.col - 1;
    let data_validation = match &validation.kind {
        ValidationKind::Date => {
            worksheet
                .set_column_format(col, &Format::new().set_num_format(DATE_FORMAT))
                .map_err(render_error)?;
            return Ok(());
        }
        ValidationKind::Time => {
            worksheet
                .set_column_format(col, &Format::new().set_num_format(TIME_FORMAT))
                .map_err(render_error)?;
            return Ok(());
        }
        ValidationKind::ListValues { values } => {
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            DataValidation::new()
                .allow_list_strings(&values)
                .map_err(render_error)?
        }
        ValidationKind::ListRange { formula } => DataValidation::new()
            .allow_list_formula(Formula::new(formula))
            .set_error_message("The value must come from the referenced column.")
            .map_err(render_error)?,
        ValidationKind::WholeNumber { min, max } => {
            let min = i32::try_from(*min).map_err(|_| {
                WorkbookError::Render(format!("whole number bound {min} exceeds 32 bits"))
            })?;
            let max = i32::try_from(*max).map_err(|_| {
                WorkbookError::Render(format!("whole number bound {max} exceeds 32 bits"))
            })?;
            DataValidation::new()
                .allow_whole_number(DataValidationRule::Between(min, max))
                .set_error_message("The value must be an integer.")
                .map_err(render_error)?
        }
        ValidationKind::TextLength { max } => DataValidation::new()
            .allow_text_length(DataValidationRule::LessThanOrEqualTo(*max))
            .set_error_message(&format!("The value must be at most {max} characters."))
            .map_err(render_error)?,
    };

    worksheet
        .add_data_validation(
            validation.first_row - 1,
            col,
            validation.last_row - 1,
            col,
            &data_validation.ignore_blank(validation.allow_blank),
        )
        .map_err(render_error)?;
    Ok(())
}

fn add_table(worksheet: &mut Worksheet, sheet: &Sheet, table: &TableObject) -> Result<()> {
    let columns: Vec<TableColumn> = table
        .columns()
        .map(|col| {
            let header = CellRef::new(table.header_row(), col)
                .ok()
                .and_then(|cell| sheet.cells.get(&cell))
                .and_then(|cell| cell.value.clone())
                .unwrap_or_else(|| format!("Column{}", column_letters(col)));
            TableColumn::new().set_header(header)
        })
        .collect();

    let xlsx_table = Table::new()
        .set_name(table_name(&table.name))
        .set_columns(&columns);
    worksheet
        .add_table(
            table.first_row - 1,
            table.first_col - 1,
            table.last_row - 1,
            table.last_col - 1,
            &xlsx_table,
        )
        .map_err(render_error)?;
    Ok(())
}

/// Spreadsheet table names allow letters, digits, `_` and `.`, and must not
/// start with a digit or `.`.
fn table_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if !sanitized
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_')
    {
        sanitized.insert(0, '_');
    }
    sanitized
}
