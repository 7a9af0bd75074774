use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use calamine::{open_workbook, Data, ExcelDateTime, Range, Reader, Xlsx};

use crate::cell::CellRef;
use crate::document::{Document, TableObject, Validation};
use crate::error::{Result, WorkbookError};
use crate::workbook::Workbook;
use crate::xlsx::{KIND_NOTE, KIND_TABLE, KIND_VALIDATION, METADATA_SHEET};

fn read_error(err: impl std::fmt::Display) -> WorkbookError {
    WorkbookError::Read(err.to_string())
}

/// Load an `.xlsx` file written by [`crate::render_xlsx`] and filled in by hand.
///
/// Cell values come from the visible sheets; annotations, table objects and
/// validations come from the hidden metadata sheet.
pub fn read_xlsx(path: impl AsRef<Path>) -> Result<Workbook> {
    let path = path.as_ref();
    let mut xlsx: Xlsx<_> = open_workbook(path).map_err(read_error)?;

    let sheet_names = xlsx.sheet_names();
    if !sheet_names.iter().any(|name| name == METADATA_SHEET) {
        return Err(WorkbookError::Read(format!(
            "{} has no {METADATA_SHEET} sheet; it was not written by seedsheet",
            path.display()
        )));
    }

    let mut workbook = Workbook::new();
    for name in sheet_names.iter().filter(|name| *name != METADATA_SHEET) {
        workbook.add_sheet(name)?;
    }

    let metadata = xlsx.worksheet_range(METADATA_SHEET).map_err(read_error)?;
    apply_metadata(&mut workbook, &metadata)?;

    for name in sheet_names.iter().filter(|name| *name != METADATA_SHEET) {
        let range = xlsx.worksheet_range(name).map_err(read_error)?;
        let headers = header_cells(&workbook, name);
        for (cell, text) in range_cells(&range)? {
            if headers.contains(&cell) {
                workbook.write_header(name, cell.col, &text)?;
            } else {
                workbook.set_cell(name, cell, &text)?;
            }
        }
    }

    Ok(workbook)
}

fn apply_metadata(workbook: &mut Workbook, metadata: &Range<Data>) -> Result<()> {
    for (index, row) in metadata.rows().enumerate().skip(1) {
        let field = |col: usize| row.get(col).and_then(cell_text).unwrap_or_default();
        let (kind, sheet, cell, value) = (field(0), field(1), field(2), field(3));

        match kind.as_str() {
            "" => {}
            KIND_NOTE => workbook.set_annotation(&sheet, cell.parse()?, &value)?,
            KIND_TABLE => {
                let (first, last) = cell
                    .split_once(':')
                    .ok_or_else(|| WorkbookError::InvalidCellRef(cell.clone()))?;
                let first: CellRef = first.parse()?;
                let last: CellRef = last.parse()?;
                workbook.add_table_object(
                    &sheet,
                    TableObject {
                        name: value,
                        first_row: first.row,
                        first_col: first.col,
                        last_row: last.row,
                        last_col: last.col,
                    },
                )?;
            }
            KIND_VALIDATION => {
                let validation: Validation = serde_json::from_str(&value)?;
                workbook.add_validation(&sheet, validation)?;
            }
            other => {
                return Err(WorkbookError::Read(format!(
                    "unknown metadata kind '{other}' in row {}",
                    index + 1
                )));
            }
        }
    }
    Ok(())
}

/// Header cells of every table object on `sheet`.
fn header_cells(workbook: &Workbook, sheet: &str) -> BTreeSet<CellRef> {
    workbook
        .table_objects(sheet)
        .iter()
        .flat_map(|table| {
            table
                .columns()
                .map(|col| CellRef {
                    row: table.header_row(),
                    col,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn range_cells(range: &Range<Data>) -> Result<BTreeMap<CellRef, String>> {
    let mut cells = BTreeMap::new();
    let Some((start_row, start_col)) = range.start() else {
        return Ok(cells);
    };

    for (row, col, value) in range.cells() {
        let Some(text) = cell_text(value) else {
            continue;
        };
        let row = start_row + u32::try_from(row).map_err(read_error)? + 1;
        let col = u16::try_from(start_col as usize + col + 1).map_err(read_error)?;
        cells.insert(CellRef::new(row, col)?, text);
    }
    Ok(cells)
}

/// Text a cell would have been typed as; `None` for empty and error cells.
fn cell_text(value: &Data) -> Option<String> {
    match value {
        Data::Empty | Data::Error(_) => None,
        Data::String(text) => Some(text.clone()),
        Data::Int(value) => Some(value.to_string()),
        Data::Float(value) => Some(float_text(*value)),
        Data::Bool(value) => Some(if *value { "1" } else { "0" }.to_string()),
        Data::DateTime(value) => Some(date_time_text(value)),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Some(text.clone()),
    }
}

fn float_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Serials below 1 are times of day; whole serials are dates.
fn date_time_text(value: &ExcelDateTime) -> String {
    let Some(datetime) = value.as_datetime() else {
        return float_text(value.as_f64());
    };
    if value.as_f64() < 1.0 {
        datetime.format("%H:%M:%S").to_string()
    } else if datetime.time() == chrono::NaiveTime::MIN {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
