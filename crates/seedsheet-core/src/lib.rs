//! Core contracts for seedsheet.
//!
//! This crate defines the schema model, the native type mapping, the FK
//! dependency orderer, the validation/literal policy, and the header metadata
//! codec shared by the export and import paths.

pub mod codec;
pub mod error;
pub mod graph;
pub mod policy;
pub mod progress;
pub mod schema;
pub mod types;
pub mod validation;

pub use codec::{decode, encode, CodecError, ColumnMetadata};
pub use error::{Error, Result};
pub use graph::{order_tables, FkGraphReport, FkGraphSummary, OrderedTables};
pub use policy::{
    render_literal, validation_rule, Literal, LiteralError, LiteralKind, LiteralRule, Resolution,
    TypePolicy, ValidationRule, EMPTY_LITERAL,
};
pub use progress::{NoopObserver, ProgressEvent, ProgressObserver};
pub use schema::{fold_name, full_name, same_name, Column, ForeignKeyRef, Table};
pub use types::{NativeTypeMapping, SemanticType, StorageTag, TypeMapping};
pub use validation::validate_tables;

/// Sheets get at most this many characters in their name.
pub const MAX_SHEET_NAME_LEN: usize = 31;
