use serde::{Deserialize, Serialize};

use seedsheet_core::{
    full_name, ColumnMetadata, ForeignKeyRef, Literal, LiteralRule, SemanticType, StorageTag,
};

/// Options for the binding extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Abort on the first cell that cannot be rendered instead of dropping its row.
    pub strict: bool,
}

/// A column rebuilt from its header annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnBinding {
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
    pub foreign_key: Option<ForeignKeyRef>,
    pub literal_rule: LiteralRule,
    /// 1-based column in the sheet.
    pub position: u16,
}

impl ColumnBinding {
    pub fn from_metadata(metadata: ColumnMetadata, position: u16) -> Self {
        Self {
            literal_rule: LiteralRule::for_storage(metadata.storage),
            name: metadata.name,
            native_type: metadata.native_type,
            semantic_type: metadata.semantic_type,
            storage: metadata.storage,
            max_length: metadata.max_length,
            is_primary_key: metadata.is_primary_key,
            is_identity: metadata.is_identity,
            is_nullable: metadata.is_nullable,
            is_auto_generated: metadata.is_auto_generated,
            is_foreign_key: metadata.is_foreign_key,
            foreign_key: metadata.foreign_key,
            position,
        }
    }
}

/// One sheet's table: its columns and the rendered rows, one literal per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableBinding {
    pub schema: String,
    pub name: String,
    pub sheet: String,
    pub columns: Vec<ColumnBinding>,
    pub rows: Vec<Vec<Literal>>,
}

impl TableBinding {
    pub fn full_name(&self) -> String {
        full_name(&self.schema, &self.name)
    }

    /// Rows carry values for an identity column.
    pub fn has_identity(&self) -> bool {
        self.columns.iter().any(|column| column.is_identity)
    }
}

/// Structured import issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    pub sheet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl ImportIssue {
    pub const MALFORMED_METADATA: &'static str = "malformed_metadata";
    pub const UNRENDERABLE_LITERAL: &'static str = "unrenderable_literal";

    pub fn malformed_metadata(sheet: &str, column: &str, message: impl Into<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: Self::MALFORMED_METADATA.to_string(),
            message: message.into(),
            sheet: sheet.to_string(),
            row: None,
            column: Some(column.to_string()),
        }
    }

    pub fn unrenderable_literal(
        sheet: &str,
        row: u32,
        column: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level: "warning".to_string(),
            code: Self::UNRENDERABLE_LITERAL.to_string(),
            message: message.into(),
            sheet: sheet.to_string(),
            row: Some(row),
            column: Some(column.to_string()),
        }
    }
}

/// Everything read from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    /// Tables in sheet order.
    pub tables: Vec<TableBinding>,
    pub issues: Vec<ImportIssue>,
}
