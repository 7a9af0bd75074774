use std::fmt;
use std::str::FromStr;

use crate::error::WorkbookError;
use crate::{MAX_COLUMNS, MAX_ROWS};

/// A 1-based cell position, displayed in A1 notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub fn new(row: u32, col: u16) -> Result<Self, WorkbookError> {
        if row == 0 || row > MAX_ROWS || col == 0 || col > MAX_COLUMNS {
            return Err(WorkbookError::InvalidCellRef(format!("row {row}, column {col}")));
        }
        Ok(Self { row, col })
    }

    /// Absolute reference (`$C$2`), as used inside formulas.
    pub fn absolute(&self) -> String {
        format!("${}${}", column_letters(self.col), self.row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = WorkbookError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || WorkbookError::InvalidCellRef(value.to_string());
        let split = value
            .find(|ch: char| ch.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = value.split_at(split);
        if letters.is_empty() || !letters.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let mut col: u32 = 0;
        for ch in letters.chars() {
            let digit = u32::from(ch.to_ascii_uppercase()) - u32::from('A') + 1;
            col = col * 26 + digit;
            if col > u32::from(MAX_COLUMNS) {
                return Err(invalid());
            }
        }
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        let col = u16::try_from(col).map_err(|_| invalid())?;
        CellRef::new(row, col).map_err(|_| invalid())
    }
}

/// Spreadsheet column letters for a 1-based column (`1` → `A`, `27` → `AA`).
pub fn column_letters(col: u16) -> String {
    let mut remaining = u32::from(col);
    let mut letters = Vec::new();
    while remaining > 0 {
        let rem = (remaining - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}
