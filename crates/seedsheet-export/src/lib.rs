//! Workbook scaffolding for seedsheet.
//!
//! Tables, already in dependency order, become one sheet each: an annotated
//! bold header row, advisory validations over the data rows and a table
//! object naming the region. Foreign key columns get pick-lists pointing at
//! the referenced table's key column.

pub mod builder;
pub mod errors;
pub mod model;
pub mod naming;

pub use builder::ScaffoldBuilder;
pub use errors::ExportError;
pub use model::{ExportOptions, ScaffoldReport, TableReport, UnresolvedReference};
pub use naming::{SeededSheetNamer, SheetNamer};
