//! Spreadsheet document model used by the export and import paths.
//!
//! [`Workbook`] is an in-memory document persisted as JSON; it keeps cell
//! annotations readable on the way back in. [`render_xlsx`] writes the same
//! document as an `.xlsx` file for people filling it in with a spreadsheet
//! application, and [`read_xlsx`] loads such a file back once it is filled in.

pub mod cell;
pub mod document;
pub mod error;
pub mod reader;
pub mod workbook;
pub mod xlsx;

pub use cell::{column_letters, CellRef};
pub use document::{same_name, Document, TableObject, Validation, ValidationKind};
pub use error::{Result, WorkbookError};
pub use reader::read_xlsx;
pub use workbook::{check_sheet_name, Cell, Sheet, Workbook};
pub use xlsx::render_xlsx;

/// Last addressable row of a worksheet (1-based).
pub const MAX_ROWS: u32 = 1_048_576;

/// Last addressable column of a worksheet (1-based).
pub const MAX_COLUMNS: u16 = 16_384;
