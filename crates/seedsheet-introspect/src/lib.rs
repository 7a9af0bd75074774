//! Schema readers producing [`seedsheet_core::Table`] sets.

pub mod mapper;
pub mod options;
pub mod postgres;
pub mod reader;
pub mod snapshot;

pub use options::EnumerateOptions;
pub use postgres::PostgresReader;
pub use reader::SchemaReader;
pub use snapshot::SnapshotReader;

pub use seedsheet_core::Table;
