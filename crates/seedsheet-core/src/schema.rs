use std::cmp::Ordering;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{NativeTypeMapping, SemanticType, StorageTag};

/// A table read from the schema source, with its columns in ordinal order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// `schema.name`, used as the document's table-object identifier.
    pub fn full_name(&self) -> String {
        full_name(&self.schema, &self.name)
    }

    /// Folded `(schema, name)` pair; table identity is case-insensitive.
    pub fn key(&self) -> (String, String) {
        (fold_name(&self.schema), fold_name(&self.name))
    }

    pub fn is_named(&self, schema: &str, name: &str) -> bool {
        same_name(&self.schema, schema) && same_name(&self.name, name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| same_name(&column.name, name))
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|column| same_name(&column.name, name))
    }

    /// Columns a user is expected to fill in, in table order.
    pub fn editable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| !column.is_auto_generated)
    }

    /// Compare by case-insensitive identity, then by the original spelling.
    pub fn cmp_identity(&self, other: &Table) -> Ordering {
        self.key()
            .cmp(&other.key())
            .then_with(|| self.schema.cmp(&other.schema))
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Case-folded form of a schema, table or column name. Every identifier
/// comparison goes through this, non-ASCII letters included.
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

pub fn same_name(left: &str, right: &str) -> bool {
    left == right || fold_name(left) == fold_name(right)
}

/// Join a schema and table name the way sheets and table objects are named.
pub fn full_name(schema: &str, name: &str) -> String {
    format!("{schema}.{name}")
}

/// Column facts for one table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub name: String,
    /// Raw database type name (e.g. `nvarchar`).
    pub native_type: String,
    pub semantic_type: SemanticType,
    pub storage: StorageTag,
    /// Maximum character/byte length; 0 when unbounded or not applicable.
    #[serde(default)]
    pub max_length: u32,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default)]
    pub is_identity: bool,
    /// Values produced by the database (rowversion, computed); never filled in by hand.
    #[serde(default)]
    pub is_auto_generated: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    foreign_key: Option<ForeignKeyRef>,
}

impl Column {
    /// Build a column, resolving its semantic type and storage tag through `mapping`.
    pub fn new(
        name: impl Into<String>,
        native_type: impl Into<String>,
        mapping: &NativeTypeMapping,
    ) -> Self {
        let native_type = native_type.into();
        let resolved = mapping.resolve(&native_type);
        Self {
            name: name.into(),
            native_type,
            semantic_type: resolved.semantic_type,
            storage: resolved.storage,
            max_length: 0,
            is_nullable: false,
            is_identity: false,
            is_auto_generated: false,
            is_primary_key: false,
            foreign_key: None,
        }
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self
    }

    pub fn auto_generated(mut self) -> Self {
        self.is_auto_generated = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Builder form of [`Column::set_foreign_key`].
    pub fn references(mut self, target: ForeignKeyRef) -> Result<Self> {
        self.set_foreign_key(target)?;
        Ok(self)
    }

    pub fn foreign_key(&self) -> Option<&ForeignKeyRef> {
        self.foreign_key.as_ref()
    }

    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key.is_some()
    }

    /// Detach the referenced column, returning it.
    pub fn take_foreign_key(&mut self) -> Option<ForeignKeyRef> {
        self.foreign_key.take()
    }

    /// Attach the referenced column. A second assignment signals an
    /// inconsistent schema read and is rejected.
    pub fn set_foreign_key(&mut self, target: ForeignKeyRef) -> Result<()> {
        if let Some(existing) = &self.foreign_key {
            return Err(Error::SchemaInconsistency(format!(
                "column '{}' already references {}, cannot also reference {}",
                self.name, existing, target
            )));
        }
        self.foreign_key = Some(target);
        Ok(())
    }
}

/// The column a foreign key points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyRef {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl ForeignKeyRef {
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn table_full_name(&self) -> String {
        full_name(&self.schema, &self.table)
    }

    pub fn table_key(&self) -> (String, String) {
        (fold_name(&self.schema), fold_name(&self.table))
    }
}

impl std::fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.schema, self.table, self.column)
    }
}
