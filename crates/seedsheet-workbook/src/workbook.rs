use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cell::CellRef;
use crate::document::{same_name, Document, TableObject, Validation};
use crate::error::{Result, WorkbookError};

const MAX_SHEET_NAME_CHARS: usize = 31;
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// In-memory spreadsheet document, persisted as pretty JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    /// Cells keyed by A1 reference.
    #[serde(default)]
    pub cells: BTreeMap<CellRef, Cell>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<Validation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Serialize for CellRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl Sheet {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: BTreeMap::new(),
            validations: Vec::new(),
            tables: Vec::new(),
        }
    }
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let workbook: Workbook = serde_json::from_str(text)?;
        let mut seen: Vec<String> = Vec::with_capacity(workbook.sheets.len());
        for sheet in &workbook.sheets {
            check_sheet_name(&sheet.name)?;
            let key = sheet.name.to_lowercase();
            if seen.contains(&key) {
                return Err(WorkbookError::SheetExists(sheet.name.clone()));
            }
            seen.push(key);
        }
        Ok(workbook)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|sheet| same_name(&sheet.name, name))
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.sheets
            .iter_mut()
            .find(|sheet| same_name(&sheet.name, name))
            .ok_or_else(|| WorkbookError::UnknownSheet(name.to_string()))
    }

    fn cell_mut(&mut self, sheet: &str, cell: CellRef) -> Result<&mut Cell> {
        Ok(self.sheet_mut(sheet)?.cells.entry(cell).or_default())
    }
}

/// Reject names a spreadsheet application would refuse.
pub fn check_sheet_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| WorkbookError::InvalidSheetName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_CHARS {
        return Err(invalid("name is longer than 31 characters"));
    }
    if name.contains(FORBIDDEN_SHEET_CHARS) {
        return Err(invalid("name contains one of []:*?/\\"));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(invalid("name starts or ends with an apostrophe"));
    }
    Ok(())
}

impl Document for Workbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name.clone()).collect()
    }

    fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    fn add_sheet(&mut self, name: &str) -> Result<()> {
        check_sheet_name(name)?;
        if self.has_sheet(name) {
            return Err(WorkbookError::SheetExists(name.to_string()));
        }
        self.sheets.push(Sheet::new(name));
        Ok(())
    }

    fn write_header(&mut self, sheet: &str, col: u16, text: &str) -> Result<()> {
        let cell = self.cell_mut(sheet, CellRef::new(1, col)?)?;
        cell.value = Some(text.to_string());
        cell.bold = true;
        Ok(())
    }

    fn set_cell(&mut self, sheet: &str, cell: CellRef, text: &str) -> Result<()> {
        self.cell_mut(sheet, cell)?.value = Some(text.to_string());
        Ok(())
    }

    fn set_annotation(&mut self, sheet: &str, cell: CellRef, text: &str) -> Result<()> {
        self.cell_mut(sheet, cell)?.note = Some(text.to_string());
        Ok(())
    }

    fn add_validation(&mut self, sheet: &str, validation: Validation) -> Result<()> {
        CellRef::new(validation.first_row, validation.col)?;
        CellRef::new(validation.last_row, validation.col)?;
        self.sheet_mut(sheet)?.validations.push(validation);
        Ok(())
    }

    fn validations(&self, sheet: &str) -> Vec<Validation> {
        self.sheet(sheet)
            .map(|sheet| sheet.validations.clone())
            .unwrap_or_default()
    }

    fn add_table_object(&mut self, sheet: &str, table: TableObject) -> Result<()> {
        if self.find_table_object(&table.name).is_some() {
            return Err(WorkbookError::TableExists(table.name));
        }
        CellRef::new(table.first_row, table.first_col)?;
        CellRef::new(table.last_row, table.last_col)?;
        if table.last_row < table.first_row || table.last_col < table.first_col {
            return Err(WorkbookError::InvalidCellRef(format!(
                "table '{}' has an empty range",
                table.name
            )));
        }
        self.sheet_mut(sheet)?.tables.push(table);
        Ok(())
    }

    fn table_objects(&self, sheet: &str) -> Vec<TableObject> {
        self.sheet(sheet)
            .map(|sheet| sheet.tables.clone())
            .unwrap_or_default()
    }

    fn cell_text(&self, sheet: &str, cell: CellRef) -> Option<String> {
        self.sheet(sheet)?.cells.get(&cell)?.value.clone()
    }

    fn annotation(&self, sheet: &str, cell: CellRef) -> Option<String> {
        self.sheet(sheet)?.cells.get(&cell)?.note.clone()
    }

    fn last_row(&self, sheet: &str) -> u32 {
        self.sheet(sheet)
            .and_then(|sheet| sheet.cells.keys().map(|cell| cell.row).max())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ValidationKind;

    fn cell(text: &str) -> CellRef {
        text.parse().expect("cell reference")
    }

    #[test]
    fn sheet_names_are_unique_case_insensitively() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("dbo.Customers").expect("first sheet");
        let err = workbook.add_sheet("DBO.customers").unwrap_err();
        assert!(matches!(err, WorkbookError::SheetExists(_)));
        assert_eq!(workbook.sheet_count(), 1);
    }

    #[test]
    fn non_ascii_sheet_and_table_names_fold_like_table_identity() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("Büro.Ärger").expect("first sheet");
        assert!(matches!(
            workbook.add_sheet("BÜRO.ärger"),
            Err(WorkbookError::SheetExists(_))
        ));
        workbook
            .add_table_object("büro.ärger", TableObject::over_header("Büro.Ärger", 1, 1))
            .expect("table");

        assert!(workbook.sheet("BÜRO.ÄRGER").is_some());
        assert_eq!(
            workbook.find_table_object("büro.ÄRGER").map(|(sheet, _)| sheet),
            Some("Büro.Ärger".to_string())
        );
    }

    #[test]
    fn rejects_names_spreadsheets_refuse() {
        let mut workbook = Workbook::new();
        for name in ["", "a/b", "[x]", "'quoted'", "abcdefghijklmnopqrstuvwxyz012345"] {
            assert!(workbook.add_sheet(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn header_cells_are_bold_and_annotated() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("s").expect("sheet");
        workbook.write_header("s", 2, "Name").expect("header");
        workbook
            .set_annotation("s", cell("B1"), "{\"name\":\"Name\"}")
            .expect("annotation");

        let sheet = workbook.sheet("S").expect("sheet lookup");
        let header = &sheet.cells[&cell("B1")];
        assert!(header.bold);
        assert_eq!(header.value.as_deref(), Some("Name"));
        assert_eq!(
            workbook.annotation("s", cell("B1")).as_deref(),
            Some("{\"name\":\"Name\"}")
        );
    }

    #[test]
    fn last_row_tracks_highest_cell() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("s").expect("sheet");
        assert_eq!(workbook.last_row("s"), 0);
        workbook.set_cell("s", cell("A7"), "x").expect("cell");
        workbook.set_cell("s", cell("C3"), "y").expect("cell");
        assert_eq!(workbook.last_row("s"), 7);
        assert_eq!(workbook.last_row("missing"), 0);
    }

    #[test]
    fn table_object_names_are_document_wide() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("a").expect("sheet");
        workbook.add_sheet("b").expect("sheet");
        workbook
            .add_table_object("a", TableObject::over_header("dbo.Customers", 1, 2))
            .expect("table");
        let err = workbook
            .add_table_object("b", TableObject::over_header("DBO.CUSTOMERS", 1, 1))
            .unwrap_err();
        assert!(matches!(err, WorkbookError::TableExists(_)));

        let (sheet, table) = workbook
            .find_table_object("dbo.customers")
            .expect("table lookup");
        assert_eq!(sheet, "a");
        assert_eq!(table.columns().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn json_uses_a1_keys() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("s").expect("sheet");
        workbook.set_cell("s", cell("AA10"), "v").expect("cell");
        workbook
            .add_validation(
                "s",
                Validation {
                    col: 27,
                    first_row: 2,
                    last_row: crate::MAX_ROWS,
                    kind: ValidationKind::TextLength { max: 10 },
                    allow_blank: true,
                },
            )
            .expect("validation");

        let json = workbook.to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["sheets"][0]["cells"]["AA10"]["value"], "v");
        assert_eq!(value["sheets"][0]["validations"][0]["kind"]["type"], "text_length");

        assert_eq!(Workbook::from_json(&json).expect("reload"), workbook);
    }

    #[test]
    fn from_json_rejects_bad_cell_keys() {
        let json = r#"{"sheets":[{"name":"s","cells":{"B0":{"value":"x"}}}]}"#;
        assert!(matches!(
            Workbook::from_json(json),
            Err(WorkbookError::Json(_))
        ));
    }
}
