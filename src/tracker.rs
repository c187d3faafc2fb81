//! Cell-level change tracking between the last-synced snapshot and the
//! in-memory grid.
//!
//! Only cells whose current value differs from the server value are kept,
//! so editing a cell back to what the server has drops it from the set.
//! Every mutation is written through to a [`ChangeStore`] so unsaved work
//! survives a crash or reload.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::row::{SheetData, SheetRow};
use crate::store::{unsaved_changes_key, warning_shown_key, ChangeStore};

/// One edited cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedCell {
    /// Position among data rows (header and banners excluded).
    pub relative_row_index: usize,
    pub column: String,
    /// Server value from the last-synced snapshot.
    pub old_value: String,
    pub new_value: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Position in the raw sheet, fixed when the change was recorded.
    pub absolute_row_index: usize,
}

/// Stored form of a change set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedChanges {
    pub sheet_id: String,
    pub timestamp: i64,
    pub header_offset: usize,
    pub changes: Vec<ChangedCell>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub cell_count: usize,
    pub row_count: usize,
    pub message: String,
}

type CellKey = (usize, String);

pub struct ChangeTracker {
    sheet_id: String,
    header_offset: usize,
    changes: BTreeMap<CellKey, ChangedCell>,
    changed_rows: BTreeSet<usize>,
    store: Box<dyn ChangeStore>,
}

impl ChangeTracker {
    pub fn new(sheet_id: &str, header_offset: usize, store: Box<dyn ChangeStore>) -> Self {
        ChangeTracker {
            sheet_id: sheet_id.to_string(),
            header_offset,
            changes: BTreeMap::new(),
            changed_rows: BTreeSet::new(),
            store,
        }
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    pub fn set_header_offset(&mut self, offset: usize) {
        self.header_offset = offset;
    }

    /// Records an edit of a data cell.
    ///
    /// `old_value` is what the grid held before this edit; it only serves to
    /// skip no-op edits. The tracked old value always comes from `snapshot`.
    /// Returns true when the change set was modified.
    pub fn track_cell_change(
        &mut self,
        relative_row: usize,
        column: &str,
        old_value: &str,
        new_value: &str,
        snapshot: &SheetData,
    ) -> bool {
        if old_value == new_value {
            return false;
        }

        let Some(absolute_row) = relative_row.checked_add(self.header_offset) else {
            debug!("{}: change to data row {} ignored", self.sheet_id, relative_row);
            return false;
        };
        let original = snapshot.value(absolute_row, column);
        let key = (relative_row, column.to_string());

        if new_value == original {
            if self.changes.remove(&key).is_none() {
                return false;
            }
            debug!(
                "{}: {}{} reverted to server value",
                self.sheet_id,
                column,
                absolute_row + 1
            );
            if !self.row_has_changes(relative_row) {
                self.changed_rows.remove(&relative_row);
            }
        } else {
            self.changes.insert(
                key,
                ChangedCell {
                    relative_row_index: relative_row,
                    column: column.to_string(),
                    old_value: original.to_string(),
                    new_value: new_value.to_string(),
                    timestamp: Utc::now().timestamp_millis(),
                    absolute_row_index: absolute_row,
                },
            );
            self.changed_rows.insert(relative_row);
        }

        self.persist();
        true
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn cell(&self, relative_row: usize, column: &str) -> Option<&ChangedCell> {
        self.changes.get(&(relative_row, column.to_string()))
    }

    pub fn changed_cells(&self) -> impl Iterator<Item = &ChangedCell> {
        self.changes.values()
    }

    /// Relative indices of rows with at least one change, ascending.
    pub fn changed_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.changed_rows.iter().copied()
    }

    pub fn is_row_changed(&self, relative_row: usize) -> bool {
        self.changed_rows.contains(&relative_row)
    }

    /// Full rows to push, each tagged with its absolute `_rowIndex`.
    pub fn changed_rows_for_sync(&self, working: &SheetData) -> Vec<SheetRow> {
        let mut rows = Vec::with_capacity(self.changed_rows.len());
        for &relative_row in &self.changed_rows {
            let Some(absolute_row) = self.absolute_row_of(relative_row) else {
                continue;
            };
            match working.row(absolute_row) {
                Some(row) => rows.push(row.with_row_index(absolute_row)),
                None => warn!(
                    "{}: changed row {} is outside the sheet ({} rows)",
                    self.sheet_id,
                    absolute_row,
                    working.len()
                ),
            }
        }
        rows
    }

    /// Drops every tracked change and its stored copy.
    pub fn clear_changes(&mut self) {
        self.changes.clear();
        self.changed_rows.clear();
        self.remove_entry(&unsaved_changes_key(&self.sheet_id));
        self.remove_entry(&warning_shown_key(&self.sheet_id));
    }

    pub fn change_summary(&self) -> ChangeSummary {
        let cell_count = self.changes.len();
        let row_count = self.changed_rows.len();
        let message = if cell_count == 0 {
            "No unsaved changes".to_string()
        } else {
            format!(
                "{} unsaved {} across {} {}",
                cell_count,
                if cell_count == 1 { "change" } else { "changes" },
                row_count,
                if row_count == 1 { "row" } else { "rows" }
            )
        };
        ChangeSummary {
            cell_count,
            row_count,
            message,
        }
    }

    /// Rebuilds the change set from storage and replays it onto a copy of
    /// `snapshot`.
    ///
    /// Cells land on the absolute row stored with them, not on
    /// `relative + current offset`: if banner rows were added above the
    /// header since the changes were saved, recomputing would shift every
    /// edit onto the wrong row. Any in-memory changes are replaced by the
    /// stored ones. Returns `None` when nothing was restored.
    pub fn restore(&mut self, snapshot: &SheetData) -> Option<SheetData> {
        self.changes.clear();
        self.changed_rows.clear();

        let key = unsaved_changes_key(&self.sheet_id);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("{}: failed to read unsaved changes: {}", self.sheet_id, e);
                self.remove_entry(&key);
                return None;
            }
        };

        let persisted: PersistedChanges = match serde_json::from_str(&raw) {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    "{}: discarding unreadable unsaved changes: {}",
                    self.sheet_id, e
                );
                self.remove_entry(&key);
                return None;
            }
        };
        if persisted.sheet_id != self.sheet_id {
            warn!(
                "{}: stored changes belong to sheet {}, discarding",
                self.sheet_id, persisted.sheet_id
            );
            self.remove_entry(&key);
            return None;
        }
        if persisted.header_offset != self.header_offset {
            info!(
                "{}: header offset moved from {} to {} since changes were saved",
                self.sheet_id, persisted.header_offset, self.header_offset
            );
        }

        let mut working = snapshot.clone();

        for mut cell in persisted.changes {
            let absolute_row = cell.absolute_row_index;
            if absolute_row < self.header_offset {
                warn!(
                    "{}: stored change {}{} now falls in the header area, skipping",
                    self.sheet_id,
                    cell.column,
                    absolute_row + 1
                );
                continue;
            }
            let Some(server_value) = snapshot.row(absolute_row).map(|r| r.get(&cell.column))
            else {
                warn!(
                    "{}: stored change {}{} is past the end of the sheet, skipping",
                    self.sheet_id,
                    cell.column,
                    absolute_row + 1
                );
                continue;
            };
            if server_value == cell.new_value {
                continue;
            }
            cell.old_value = server_value.to_string();
            cell.relative_row_index = absolute_row - self.header_offset;
            working.set_value(absolute_row, &cell.column, &cell.new_value);

            self.changed_rows.insert(cell.relative_row_index);
            self.changes
                .insert((cell.relative_row_index, cell.column.clone()), cell);
        }

        if self.changes.is_empty() {
            self.remove_entry(&key);
            return None;
        }

        info!(
            "{}: restored {} unsaved changes across {} rows",
            self.sheet_id,
            self.changes.len(),
            self.changed_rows.len()
        );
        self.persist();
        Some(working)
    }

    pub fn warning_shown(&self) -> bool {
        matches!(
            self.store.get(&warning_shown_key(&self.sheet_id)),
            Ok(Some(_))
        )
    }

    pub fn mark_warning_shown(&mut self) {
        let key = warning_shown_key(&self.sheet_id);
        if let Err(e) = self.store.set(&key, "true") {
            warn!("{}: failed to store warning flag: {}", self.sheet_id, e);
        }
    }

    /// Current change set in its stored form.
    pub fn to_persisted(&self) -> PersistedChanges {
        PersistedChanges {
            sheet_id: self.sheet_id.clone(),
            timestamp: Utc::now().timestamp_millis(),
            header_offset: self.header_offset,
            changes: self.changes.values().cloned().collect(),
        }
    }

    fn row_has_changes(&self, relative_row: usize) -> bool {
        self.changes
            .range((relative_row, String::new())..)
            .next()
            .is_some_and(|((row, _), _)| *row == relative_row)
    }

    fn absolute_row_of(&self, relative_row: usize) -> Option<usize> {
        self.changes
            .range((relative_row, String::new())..)
            .next()
            .filter(|((row, _), _)| *row == relative_row)
            .map(|(_, cell)| cell.absolute_row_index)
    }

    fn persist(&mut self) {
        let key = unsaved_changes_key(&self.sheet_id);
        if self.changes.is_empty() {
            self.remove_entry(&key);
            return;
        }
        let json = match serde_json::to_string(&self.to_persisted()) {
            Ok(json) => json,
            Err(e) => {
                warn!("{}: failed to serialize unsaved changes: {}", self.sheet_id, e);
                return;
            }
        };
        if let Err(e) = self.store.set(&key, &json) {
            warn!("{}: failed to persist unsaved changes: {}", self.sheet_id, e);
        }
    }

    fn remove_entry(&mut self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!("{}: failed to remove {}: {}", self.sheet_id, key, e);
        }
    }
}
