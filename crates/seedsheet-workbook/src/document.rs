use serde::{Deserialize, Serialize};

use crate::cell::CellRef;
use crate::error::Result;

/// Advisory constraint over a single-column cell range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub col: u16,
    pub first_row: u32,
    pub last_row: u32,
    pub kind: ValidationKind,
    /// Blank cells are accepted.
    #[serde(default)]
    pub allow_blank: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationKind {
    /// Explicit list of accepted values.
    ListValues { values: Vec<String> },
    /// Values drawn from a cell range formula such as `='Sheet'!$A$2:$A$1048576`.
    ListRange { formula: String },
    WholeNumber { min: i64, max: i64 },
    TextLength { max: u32 },
    /// Column is displayed with a date format.
    Date,
    /// Column is displayed with a time format.
    Time,
}

/// A named rectangular region (header row first) identifying a table's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableObject {
    pub name: String,
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl TableObject {
    /// Region whose first row holds `columns` headers starting at `first_col`.
    pub fn over_header(name: impl Into<String>, first_col: u16, columns: u16) -> Self {
        Self {
            name: name.into(),
            first_row: 1,
            first_col,
            last_row: 2,
            last_col: first_col + columns.saturating_sub(1),
        }
    }

    pub fn header_row(&self) -> u32 {
        self.first_row
    }

    pub fn columns(&self) -> impl Iterator<Item = u16> {
        self.first_col..=self.last_col
    }
}

/// Sheet and table-object names match under Unicode lowercase folding, the
/// same rule table identity uses.
pub fn same_name(left: &str, right: &str) -> bool {
    left == right || left.to_lowercase() == right.to_lowercase()
}

/// The operations the scaffold builder and binding extractor need from a
/// spreadsheet. Rows and columns are 1-based.
///
/// Sheet names and table-object names are compared case-insensitively.
pub trait Document {
    fn sheet_names(&self) -> Vec<String>;

    fn sheet_count(&self) -> usize {
        self.sheet_names().len()
    }

    fn has_sheet(&self, name: &str) -> bool {
        self.sheet_names()
            .iter()
            .any(|existing| same_name(existing, name))
    }

    fn add_sheet(&mut self, name: &str) -> Result<()>;

    /// Write a bold header cell in row 1.
    fn write_header(&mut self, sheet: &str, col: u16, text: &str) -> Result<()>;

    fn set_cell(&mut self, sheet: &str, cell: CellRef, text: &str) -> Result<()>;

    fn set_annotation(&mut self, sheet: &str, cell: CellRef, text: &str) -> Result<()>;

    fn add_validation(&mut self, sheet: &str, validation: Validation) -> Result<()>;

    fn validations(&self, sheet: &str) -> Vec<Validation>;

    /// Register a table object. Names are unique across the whole document.
    fn add_table_object(&mut self, sheet: &str, table: TableObject) -> Result<()>;

    fn table_objects(&self, sheet: &str) -> Vec<TableObject>;

    /// Find a table object anywhere in the document, returning its sheet.
    fn find_table_object(&self, name: &str) -> Option<(String, TableObject)> {
        self.sheet_names().into_iter().find_map(|sheet| {
            self.table_objects(&sheet)
                .into_iter()
                .find(|table| same_name(&table.name, name))
                .map(|table| (sheet, table))
        })
    }

    fn cell_text(&self, sheet: &str, cell: CellRef) -> Option<String>;

    fn annotation(&self, sheet: &str, cell: CellRef) -> Option<String>;

    /// Highest row holding any cell; 0 for an empty or unknown sheet.
    fn last_row(&self, sheet: &str) -> u32;
}
