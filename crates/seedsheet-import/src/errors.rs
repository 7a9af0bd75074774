use thiserror::Error;

use seedsheet_core::LiteralError;

/// Errors emitted while importing workbooks.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Workbook(#[from] seedsheet_workbook::WorkbookError),
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sheet '{sheet}' row {row} column '{column}': {source}")]
    Literal {
        sheet: String,
        row: u32,
        column: String,
        #[source]
        source: LiteralError,
    },
    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),
}
