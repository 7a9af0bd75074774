use seedsheet_core::same_name;

/// Options that gate how much work a schema reader does.
#[derive(Debug, Clone)]
pub struct EnumerateOptions {
    pub include_columns: bool,
    /// Only honored together with `include_columns`.
    pub include_foreign_keys: bool,
    pub schemas: Option<Vec<String>>,
}

impl EnumerateOptions {
    pub fn includes_schema(&self, schema: &str) -> bool {
        match &self.schemas {
            Some(list) => list.iter().any(|item| same_name(item, schema)),
            None => true,
        }
    }

    pub fn reads_foreign_keys(&self) -> bool {
        self.include_columns && self.include_foreign_keys
    }
}

impl Default for EnumerateOptions {
    fn default() -> Self {
        Self {
            include_columns: true,
            include_foreign_keys: true,
            schemas: None,
        }
    }
}
