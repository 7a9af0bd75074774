use thiserror::Error;

/// Errors emitted while scaffolding a workbook.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Schema(#[from] seedsheet_core::Error),
    #[error(transparent)]
    Workbook(#[from] seedsheet_workbook::WorkbookError),
    #[error("table {0} has more columns than a sheet can hold")]
    TooManyColumns(String),
    #[error("metadata error: {0}")]
    Metadata(#[from] seedsheet_core::CodecError),
}
