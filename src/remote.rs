//! The remote spreadsheet as seen by the session: something that can hand
//! out raw rows and take edited rows back.
//!
//! Production talks to the spreadsheet provider; the implementations here
//! keep sheets in memory or in CSV files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::RemoteError;
use crate::export::rows_to_csv;
use crate::loader::from_csv;
use crate::row::SheetRow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushMode {
    /// Each row carries `_rowIndex` and is written at exactly that position.
    Selective,
    /// Rows replace the data range positionally, starting at `start_row`.
    Full { start_row: usize },
}

pub trait SheetRemote: Send {
    /// Raw rows, banners and header included.
    fn pull(&self, sheet_id: &str) -> Result<Vec<SheetRow>, RemoteError>;

    fn push(&mut self, sheet_id: &str, rows: &[SheetRow], mode: PushMode)
    -> Result<(), RemoteError>;

    /// Marks rows that were just written (the provider colours them and
    /// fans the change out to the other tabs). Best effort.
    fn highlight(&mut self, _sheet_id: &str, _absolute_rows: &[usize]) -> Result<(), RemoteError> {
        Ok(())
    }
}

/// Applies a push to a row vector. Selective writes never touch rows they do
/// not name; every row is validated before anything is written.
pub fn apply_push(
    target: &mut Vec<SheetRow>,
    rows: &[SheetRow],
    mode: PushMode,
) -> Result<(), RemoteError> {
    match mode {
        PushMode::Selective => {
            let mut positions = Vec::with_capacity(rows.len());
            for (i, row) in rows.iter().enumerate() {
                let index = row.row_index.ok_or(RemoteError::MissingRowIndex(i))?;
                positions.push(index);
            }
            for (row, index) in rows.iter().zip(positions) {
                if index >= target.len() {
                    target.resize_with(index + 1, SheetRow::new);
                }
                let mut stored = row.clone();
                stored.row_index = None;
                target[index] = stored;
            }
        }
        PushMode::Full { start_row } => {
            if start_row > target.len() {
                target.resize_with(start_row, SheetRow::new);
            }
            target.truncate(start_row);
            target.extend(rows.iter().map(|r| {
                let mut stored = r.clone();
                stored.row_index = None;
                stored
            }));
        }
    }
    Ok(())
}

/// Sheets held in memory. Used by tests and demos.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    sheets: HashMap<String, Vec<SheetRow>>,
    highlighted: Vec<usize>,
    fail_pushes: bool,
    push_count: usize,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_sheet(&mut self, sheet_id: &str, rows: Vec<SheetRow>) {
        self.sheets.insert(sheet_id.to_string(), rows);
    }

    pub fn sheet(&self, sheet_id: &str) -> Option<&[SheetRow]> {
        self.sheets.get(sheet_id).map(Vec::as_slice)
    }

    /// Makes every following push fail, as if the provider were unreachable.
    pub fn set_fail_pushes(&mut self, fail: bool) {
        self.fail_pushes = fail;
    }

    pub fn push_count(&self) -> usize {
        self.push_count
    }

    pub fn highlighted(&self) -> &[usize] {
        &self.highlighted
    }
}

impl SheetRemote for MemoryRemote {
    fn pull(&self, sheet_id: &str) -> Result<Vec<SheetRow>, RemoteError> {
        self.sheets
            .get(sheet_id)
            .cloned()
            .ok_or_else(|| RemoteError::SheetNotFound(sheet_id.to_string()))
    }

    fn push(
        &mut self,
        sheet_id: &str,
        rows: &[SheetRow],
        mode: PushMode,
    ) -> Result<(), RemoteError> {
        if self.fail_pushes {
            return Err(RemoteError::Rejected("remote unavailable".to_string()));
        }
        let target = self
            .sheets
            .get_mut(sheet_id)
            .ok_or_else(|| RemoteError::SheetNotFound(sheet_id.to_string()))?;
        apply_push(target, rows, mode)?;
        self.push_count += 1;
        Ok(())
    }

    fn highlight(&mut self, _sheet_id: &str, absolute_rows: &[usize]) -> Result<(), RemoteError> {
        self.highlighted.extend_from_slice(absolute_rows);
        Ok(())
    }
}

/// One `<sheet_id>.csv` file per sheet inside a directory.
#[derive(Debug, Clone)]
pub struct CsvRemote {
    dir: PathBuf,
}

impl CsvRemote {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        CsvRemote {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, sheet_id: &str) -> Result<PathBuf, RemoteError> {
        if sheet_id.is_empty()
            || !sheet_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        {
            return Err(RemoteError::SheetNotFound(sheet_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.csv", sheet_id)))
    }
}

impl SheetRemote for CsvRemote {
    fn pull(&self, sheet_id: &str) -> Result<Vec<SheetRow>, RemoteError> {
        let path = self.path_for(sheet_id)?;
        if !path.exists() {
            return Err(RemoteError::SheetNotFound(sheet_id.to_string()));
        }
        let rows = from_csv(&path)?;
        debug!("pulled {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }

    fn push(
        &mut self,
        sheet_id: &str,
        rows: &[SheetRow],
        mode: PushMode,
    ) -> Result<(), RemoteError> {
        let mut current = self.pull(sheet_id)?;
        apply_push(&mut current, rows, mode)?;
        let path = self.path_for(sheet_id)?;
        std::fs::write(&path, rows_to_csv(&current))?;
        info!("wrote {} rows to {}", rows.len(), path.display());
        Ok(())
    }
}
