use thiserror::Error;

/// Errors raised while editing, loading, saving, rendering or reading a workbook.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("workbook json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sheet already exists: {0}")]
    SheetExists(String),
    #[error("unknown sheet: {0}")]
    UnknownSheet(String),
    #[error("invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: String },
    #[error("invalid cell reference: {0}")]
    InvalidCellRef(String),
    #[error("table object already exists: {0}")]
    TableExists(String),
    #[error("xlsx render error: {0}")]
    Render(String),
    #[error("xlsx read error: {0}")]
    Read(String),
}

pub type Result<T> = std::result::Result<T, WorkbookError>;
