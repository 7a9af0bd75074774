use seedsheet_core::{Result, Table};

use crate::options::EnumerateOptions;

/// Common interface for schema sources.
#[async_trait::async_trait]
pub trait SchemaReader: Send + Sync {
    /// Engine identifier (e.g. "postgres").
    fn engine(&self) -> &'static str;

    /// Enumerate tables, with columns and foreign key targets when requested.
    ///
    /// Unknown native types never fail; a referencing column that is missing
    /// or already assigned fails with `SchemaInconsistency`.
    async fn enumerate_tables(&self, opts: &EnumerateOptions) -> Result<Vec<Table>>;
}
