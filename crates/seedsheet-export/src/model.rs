use serde::{Deserialize, Serialize};

/// Options for the scaffold builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Seed for the sheet-name suffix generator.
    pub sheet_seed: u64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { sheet_seed: 42 }
    }
}

/// Summary of one exported table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableReport {
    pub schema: String,
    pub table: String,
    pub sheet: String,
    /// Header columns written (auto-generated columns are left out).
    pub columns: usize,
}

/// A foreign key pick-list that could not be wired up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub table: String,
    pub column: String,
    pub target_table: String,
    pub target_column: String,
}

/// Report for an export run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaffoldReport {
    pub exported: Vec<TableReport>,
    /// Full names of tables whose table object already existed.
    pub skipped: Vec<String>,
    pub unresolved_references: Vec<UnresolvedReference>,
    /// Tables emitted while on a foreign key cycle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cycle_breaks: Vec<String>,
}

impl ScaffoldReport {
    pub fn sheet_for(&self, full_name: &str) -> Option<&str> {
        self.exported
            .iter()
            .find(|report| {
                seedsheet_core::same_name(
                    &seedsheet_core::full_name(&report.schema, &report.table),
                    full_name,
                )
            })
            .map(|report| report.sheet.as_str())
    }
}
