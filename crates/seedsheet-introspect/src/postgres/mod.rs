use sqlx::PgPool;

use seedsheet_core::{NativeTypeMapping, Result, Table};

use crate::mapper;
use crate::options::EnumerateOptions;
use crate::reader::SchemaReader;

mod queries;

/// Reads tables from a PostgreSQL catalog.
#[derive(Debug, Clone)]
pub struct PostgresReader {
    pool: PgPool,
    mapping: NativeTypeMapping,
}

impl PostgresReader {
    /// Create a reader over a pre-configured pool, using the built-in type table.
    pub fn new(pool: PgPool) -> Self {
        Self::with_mapping(pool, NativeTypeMapping::postgres())
    }

    pub fn with_mapping(pool: PgPool, mapping: NativeTypeMapping) -> Self {
        Self { pool, mapping }
    }
}

#[async_trait::async_trait]
impl SchemaReader for PostgresReader {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn enumerate_tables(&self, opts: &EnumerateOptions) -> Result<Vec<Table>> {
        enumerate(&self.pool, &self.mapping, opts).await
    }
}

/// Enumerate tables according to the provided options.
pub async fn enumerate(
    pool: &PgPool,
    mapping: &NativeTypeMapping,
    opts: &EnumerateOptions,
) -> Result<Vec<Table>> {
    let raw_tables = mapper::filter_tables(queries::list_tables(pool).await?, opts);

    let raw_columns = if opts.include_columns {
        Some(queries::list_columns(pool).await?)
    } else {
        None
    };
    let raw_references = if opts.reads_foreign_keys() {
        Some(queries::list_references(pool).await?)
    } else {
        None
    };

    let tables = mapper::map_tables(
        raw_tables,
        raw_columns.as_deref(),
        raw_references.as_deref(),
        mapping,
    )?;

    tracing::debug!(
        event = "schema_enumerated",
        engine = "postgres",
        tables = tables.len()
    );
    Ok(tables)
}
