use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved JSON key carrying a row's absolute position in the source sheet.
pub const ROW_INDEX_KEY: &str = "_rowIndex";

/// One spreadsheet row: column letter -> cell text.
///
/// `row_index` is only set when the row has been lifted out of a larger
/// collection (for example for a selective push), so the remote side knows
/// where to write it back.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    #[serde(flatten)]
    pub cells: BTreeMap<String, String>,

    #[serde(
        rename = "_rowIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub row_index: Option<usize>,
}

impl SheetRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row from positional values, assigning letters A, B, C, ...
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (col_to_letter(i + 1), v.into()))
            .collect();
        SheetRow {
            cells,
            row_index: None,
        }
    }

    /// Cell text, or "" for a column the row does not carry.
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.cells.insert(column.to_string(), value.into());
    }

    /// Non-empty (after trimming) cell values in column order.
    pub fn non_empty_values(&self) -> Vec<&str> {
        let mut entries: Vec<(&String, &String)> = self.cells.iter().collect();
        entries.sort_by_key(|(col, _)| letter_to_col(col));
        entries
            .into_iter()
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }

    /// Copy of this row tagged with its absolute position.
    pub fn with_row_index(&self, absolute: usize) -> SheetRow {
        SheetRow {
            cells: self.cells.clone(),
            row_index: Some(absolute),
        }
    }
}

/// Owned arena of raw rows addressed by absolute index.
///
/// Index 0 is the first row fetched from the remote sheet, banner and header
/// rows included.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetData {
    rows: Vec<SheetRow>,
}

impl SheetData {
    pub fn new(rows: Vec<SheetRow>) -> Self {
        SheetData { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, absolute: usize) -> Option<&SheetRow> {
        self.rows.get(absolute)
    }

    pub fn row_mut(&mut self, absolute: usize) -> Option<&mut SheetRow> {
        self.rows.get_mut(absolute)
    }

    /// Cell text at an absolute position, "" when out of range.
    pub fn value(&self, absolute: usize, column: &str) -> &str {
        self.rows.get(absolute).map(|r| r.get(column)).unwrap_or("")
    }

    /// Writes a cell, returning false when the row does not exist.
    pub fn set_value(&mut self, absolute: usize, column: &str, value: &str) -> bool {
        match self.rows.get_mut(absolute) {
            Some(row) => {
                row.set(column, value);
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }
}

/// Column number (1-based) to letters: 1 -> "A", 27 -> "AA".
pub fn col_to_letter(col: usize) -> String {
    let mut col = col;
    let mut result = String::new();
    while col > 0 {
        col -= 1;
        result.push(((col % 26) as u8 + b'A') as char);
        col /= 26;
    }
    result.chars().rev().collect()
}

/// Letters to column number (1-based). Anything that is not A-Z yields 0.
pub fn letter_to_col(letters: &str) -> usize {
    let mut col = 0usize;
    for c in letters.chars() {
        let c = c.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return 0;
        }
        col = col * 26 + (c as usize - 'A' as usize + 1);
    }
    col
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_round_trip_known_values() {
        assert_eq!(col_to_letter(1), "A");
        assert_eq!(col_to_letter(26), "Z");
        assert_eq!(col_to_letter(27), "AA");
        assert_eq!(col_to_letter(703), "AAA");
        assert_eq!(letter_to_col("AZ"), 52);
        assert_eq!(letter_to_col("b"), 2);
        assert_eq!(letter_to_col("A1"), 0);
    }

    #[test]
    fn row_index_uses_reserved_key() {
        let row = SheetRow::from_values(["A1", "S1"]).with_row_index(4);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["_rowIndex"], 4);
        assert_eq!(json["A"], "A1");

        let back: SheetRow = serde_json::from_value(json).unwrap();
        assert_eq!(back.row_index, Some(4));
        assert_eq!(back.get("B"), "S1");
        assert!(!back.cells.contains_key(ROW_INDEX_KEY));
    }

    #[test]
    fn non_empty_values_follow_column_order() {
        let mut row = SheetRow::new();
        row.set("AA", "last");
        row.set("B", "second");
        row.set("A", "first");
        row.set("C", "  ");
        assert_eq!(row.non_empty_values(), vec!["first", "second", "last"]);
    }
}
