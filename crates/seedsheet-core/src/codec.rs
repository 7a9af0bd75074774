//! Column metadata carried inside header-cell annotations.
//!
//! Once a workbook leaves the database, the annotation is the only place the
//! column's type and flags survive, so every field needed to rebuild a binding
//! is written out explicitly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{Column, ForeignKeyRef};
use crate::types::{SemanticType, StorageTag};

/// Reasons an annotation could not be turned back into column metadata.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("annotation is empty")]
    Empty,
    #[error("malformed metadata: {0}")]
    Json(#[from] serde_json::Error),
    #[error("inconsistent metadata: {0}")]
    Inconsistent(String),
}

/// Serialized form of a column descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub name: String,
    pub native_type: String,
    pub semantic_type: SemanticType,
    pub storage: StorageTag,
    pub max_length: u32,
    pub is_primary_key: bool,
    pub is_identity: bool,
    pub is_nullable: bool,
    pub is_auto_generated: bool,
    pub is_foreign_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
}

impl ColumnMetadata {
    pub fn from_column(column: &Column) -> Self {
        Self {
            name: column.name.clone(),
            native_type: column.native_type.clone(),
            semantic_type: column.semantic_type,
            storage: column.storage,
            max_length: column.max_length,
            is_primary_key: column.is_primary_key,
            is_identity: column.is_identity,
            is_nullable: column.is_nullable,
            is_auto_generated: column.is_auto_generated,
            is_foreign_key: column.is_foreign_key(),
            foreign_key: column.foreign_key().cloned(),
        }
    }
}

/// Encode a column as pretty-printed JSON.
pub fn encode(column: &Column) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(&ColumnMetadata::from_column(column))?)
}

/// Decode an annotation produced by [`encode`].
///
/// Older annotations may carry `isForeignKey` without the target; that is
/// accepted. A target without the flag is rejected.
pub fn decode(text: &str) -> Result<ColumnMetadata, CodecError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CodecError::Empty);
    }

    let metadata: ColumnMetadata = serde_json::from_str(text)?;
    if metadata.name.trim().is_empty() {
        return Err(CodecError::Inconsistent("column name is empty".to_string()));
    }
    if metadata.foreign_key.is_some() && !metadata.is_foreign_key {
        return Err(CodecError::Inconsistent(format!(
            "column '{}' has a foreign key target but isForeignKey is false",
            metadata.name
        )));
    }

    Ok(metadata)
}
