//! One open sheet and everything the grid needs to work on it.
//!
//! A [`SheetSession`] owns the last-synced snapshot, the working copy the
//! user edits, the header context, the view index and selection, and the
//! change tracker. Nothing is shared between sessions; two sheets open at
//! once have two independent trackers.

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;

use crate::classify::{RowType, classify_row, classify_rows};
use crate::dates::eastern_today;
use crate::editor::{CellEdit, EditContext, EditorConfig, SheetEditor};
use crate::error::RemoteError;
use crate::header::{HeaderContext, clean_rows, compute_header_context};
use crate::index_map::{RowFilter, SortSpec, ViewIndex};
use crate::mapping::{ColumnLayout, ColumnMapping, ColumnRole};
use crate::remote::{PushMode, SheetRemote};
use crate::row::{SheetData, SheetRow};
use crate::selection::{DragDelta, SelectionManager};
use crate::store::ChangeStore;
use crate::tracker::{ChangeSummary, ChangeTracker};
use crate::user::UserContext;

/// Where a scanned code was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHit {
    pub clean_row: usize,
    pub absolute_row: usize,
    /// `None` when the active filter hides the row.
    pub view_row: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub rows_written: usize,
    pub cells_written: usize,
}

pub struct SheetSession {
    sheet_id: String,
    mappings: Vec<ColumnMapping>,
    header: HeaderContext,
    snapshot: SheetData,
    working: SheetData,
    types: Vec<RowType>,
    filter: RowFilter,
    sort: Option<SortSpec>,
    view: ViewIndex,
    selection: SelectionManager,
    tracker: ChangeTracker,
    editor: SheetEditor,
    user: UserContext,
}

impl SheetSession {
    /// Pulls the sheet, finds its header, and replays any unsaved changes
    /// left in `store` by an earlier session.
    pub fn open(
        sheet_id: &str,
        mappings: Vec<ColumnMapping>,
        user: UserContext,
        config: EditorConfig,
        remote: &dyn SheetRemote,
        store: Box<dyn ChangeStore>,
    ) -> Result<Self, RemoteError> {
        let raw = remote.pull(sheet_id)?;
        let header = compute_header_context(&raw, &mappings, Some(sheet_id));
        let snapshot = SheetData::new(raw);
        let mut tracker = ChangeTracker::new(sheet_id, header.total_offset, store);
        let working = tracker
            .restore(&snapshot)
            .unwrap_or_else(|| snapshot.clone());
        let editor = SheetEditor::new(&mappings, config);

        let mut session = SheetSession {
            sheet_id: sheet_id.to_string(),
            mappings,
            header,
            snapshot,
            working,
            types: Vec::new(),
            filter: RowFilter::default(),
            sort: None,
            view: ViewIndex::identity(0, header.total_offset),
            selection: SelectionManager::new(0),
            tracker,
            editor,
            user,
        };
        session.reclassify();
        session.rebuild_view();

        info!(
            "{}: opened, header at row {}, {} data rows, {}",
            session.sheet_id,
            session.header.header_row_index + 1,
            session.clean_rows().len(),
            session.tracker.change_summary().message
        );
        Ok(session)
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    pub fn header(&self) -> HeaderContext {
        self.header
    }

    pub fn mappings(&self) -> &[ColumnMapping] {
        &self.mappings
    }

    pub fn layout(&self) -> &ColumnLayout {
        self.editor.layout()
    }

    pub fn user(&self) -> &UserContext {
        &self.user
    }

    /// Switches who later edits are attributed to.
    pub fn set_user(&mut self, user: UserContext) {
        self.user = user;
    }

    /// Last-synced server state, banners and header included.
    pub fn snapshot(&self) -> &SheetData {
        &self.snapshot
    }

    /// Current in-memory state, banners and header included.
    pub fn working(&self) -> &SheetData {
        &self.working
    }

    /// Data rows of the working copy.
    pub fn clean_rows(&self) -> &[SheetRow] {
        clean_rows(self.working.rows(), &self.header)
    }

    pub fn row_types(&self) -> &[RowType] {
        &self.types
    }

    pub fn view(&self) -> &ViewIndex {
        &self.view
    }

    /// Visible rows in view order.
    pub fn view_rows(&self) -> Vec<&SheetRow> {
        let clean = self.clean_rows();
        self.view
            .original_index_map()
            .iter()
            .filter_map(|&i| clean.get(i))
            .collect()
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn filter(&self) -> &RowFilter {
        &self.filter
    }

    /// Replaces the filter. The selection refers to view positions, so it
    /// is cleared.
    pub fn set_filter(&mut self, filter: RowFilter) {
        self.filter = filter;
        self.rebuild_view();
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.sort = sort;
        self.rebuild_view();
    }

    /// Edits the cell at a view position, stamping today's date.
    pub fn edit(&mut self, view_row: usize, column: &str, value: &str) -> Vec<CellEdit> {
        self.edit_on(view_row, column, value, eastern_today())
    }

    /// Edits the cell at a view position.
    ///
    /// When the row is part of a multi-row selection, every selected row
    /// gets the same value. Every resulting cell write, auto-filled ones
    /// included, goes through the tracker.
    pub fn edit_on(
        &mut self,
        view_row: usize,
        column: &str,
        value: &str,
        today: NaiveDate,
    ) -> Vec<CellEdit> {
        let Some(clean_row) = self.view.view_to_clean(view_row) else {
            debug!("{}: edit of view row {} ignored", self.sheet_id, view_row);
            return Vec::new();
        };

        let targets: Vec<usize> = if self.selection.len() > 1 && self.selection.contains(view_row) {
            self.selection
                .selected_rows()
                .into_iter()
                .filter_map(|v| self.view.view_to_clean(v))
                .collect()
        } else {
            vec![clean_row]
        };
        self.apply(&targets, column, value, today)
    }

    /// Edits one data row by clean index, ignoring the selection.
    pub fn edit_clean(
        &mut self,
        clean_row: usize,
        column: &str,
        value: &str,
        today: NaiveDate,
    ) -> Vec<CellEdit> {
        if clean_row >= self.clean_rows().len() {
            debug!("{}: edit of clean row {} ignored", self.sheet_id, clean_row);
            return Vec::new();
        }
        self.apply(&[clean_row], column, value, today)
    }

    fn apply(
        &mut self,
        clean_targets: &[usize],
        column: &str,
        value: &str,
        today: NaiveDate,
    ) -> Vec<CellEdit> {
        let ctx = EditContext {
            user: &self.user,
            today,
        };
        let outcome = self.editor.apply_edit_many(
            &self.working,
            &self.header,
            clean_targets,
            column,
            value,
            &ctx,
        );
        if outcome.is_noop() {
            return Vec::new();
        }

        for edit in &outcome.edits {
            self.tracker.track_cell_change(
                edit.relative_row,
                &edit.column,
                &edit.old_value,
                &edit.new_value,
                &self.snapshot,
            );
        }
        self.working = outcome.data;

        // Row types follow the data, but the view is left alone so rows do
        // not jump around while being edited.
        for &clean_row in clean_targets {
            if let Some(row) = self.working.row(clean_row + self.header.total_offset) {
                if let Some(slot) = self.types.get_mut(clean_row) {
                    *slot = classify_row(row, self.editor.layout());
                }
            }
        }
        outcome.edits
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn toggle_row(&mut self, view_row: usize, checked: bool) {
        self.selection.toggle(view_row, checked);
    }

    pub fn shift_toggle(&mut self, view_row: usize, checked: bool) {
        self.selection.shift_toggle(view_row, checked);
    }

    pub fn range_toggle(&mut self, anchor: usize, view_row: usize, checked: bool) {
        self.selection.range_toggle(anchor, view_row, checked);
    }

    pub fn toggle_all(&mut self, checked: bool) {
        self.selection.toggle_all(checked);
    }

    pub fn begin_drag(&mut self, view_row: usize, checked: bool) -> DragDelta {
        self.selection.begin_drag(view_row, checked)
    }

    pub fn drag_to(&mut self, view_row: usize) -> DragDelta {
        self.selection.drag_to(view_row)
    }

    pub fn end_drag(&mut self) {
        self.selection.end_drag();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Finds the first data row whose asset tag or serial number matches
    /// `code`, ignoring case and surrounding whitespace.
    pub fn scan(&self, code: &str) -> Option<ScanHit> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        let layout = self.editor.layout();
        let columns: Vec<&str> = [ColumnRole::AssetTag, ColumnRole::SerialNumber]
            .into_iter()
            .filter_map(|role| layout.column(role))
            .collect();

        let clean_row = self.clean_rows().iter().position(|row| {
            columns
                .iter()
                .any(|col| row.get(col).trim().eq_ignore_ascii_case(code))
        })?;
        Some(ScanHit {
            clean_row,
            absolute_row: clean_row + self.header.total_offset,
            view_row: self.view.clean_to_view(clean_row),
        })
    }

    pub fn summary(&self) -> ChangeSummary {
        self.tracker.change_summary()
    }

    /// The unsaved-changes summary, the first time it is asked for while
    /// changes are pending. Later calls return `None` until the next sync or
    /// discard.
    pub fn take_unsaved_warning(&mut self) -> Option<ChangeSummary> {
        if !self.tracker.has_changes() || self.tracker.warning_shown() {
            return None;
        }
        self.tracker.mark_warning_shown();
        Some(self.tracker.change_summary())
    }

    /// Pushes only the changed rows, each at its own absolute position.
    ///
    /// On failure nothing local changes, so the user can retry.
    pub fn sync(&mut self, remote: &mut dyn SheetRemote) -> Result<SyncReport, RemoteError> {
        let rows = self.tracker.changed_rows_for_sync(&self.working);
        if rows.is_empty() {
            debug!("{}: nothing to sync", self.sheet_id);
            return Ok(SyncReport::default());
        }
        let cells_written = self.tracker.change_summary().cell_count;

        if let Err(e) = remote.push(&self.sheet_id, &rows, PushMode::Selective) {
            warn!("{}: sync failed, keeping local changes: {}", self.sheet_id, e);
            return Err(e);
        }

        let written: Vec<usize> = rows.iter().filter_map(|r| r.row_index).collect();
        if let Err(e) = remote.highlight(&self.sheet_id, &written) {
            warn!("{}: highlight after sync failed: {}", self.sheet_id, e);
        }

        self.snapshot = self.working.clone();
        self.tracker.clear_changes();
        self.selection.clear();
        info!(
            "{}: synced {} cells across {} rows",
            self.sheet_id,
            cells_written,
            written.len()
        );
        Ok(SyncReport {
            rows_written: written.len(),
            cells_written,
        })
    }

    /// Rewrites the whole data range from the working copy.
    pub fn push_all(&mut self, remote: &mut dyn SheetRemote) -> Result<SyncReport, RemoteError> {
        let rows = self.clean_rows().to_vec();
        let cells_written = self.tracker.change_summary().cell_count;
        remote.push(
            &self.sheet_id,
            &rows,
            PushMode::Full {
                start_row: self.header.total_offset,
            },
        )?;

        self.snapshot = self.working.clone();
        self.tracker.clear_changes();
        self.selection.clear();
        info!("{}: pushed all {} data rows", self.sheet_id, rows.len());
        Ok(SyncReport {
            rows_written: rows.len(),
            cells_written,
        })
    }

    /// Pulls the sheet again and replays unsaved changes on top of it.
    ///
    /// The header is recomputed, so banner rows added above it since the
    /// last pull are picked up; stored changes keep their absolute rows.
    pub fn refresh(&mut self, remote: &dyn SheetRemote) -> Result<(), RemoteError> {
        let raw = remote.pull(&self.sheet_id)?;
        let header = compute_header_context(&raw, &self.mappings, Some(&self.sheet_id));
        if header != self.header {
            info!(
                "{}: header moved from row {} to row {}",
                self.sheet_id,
                self.header.header_row_index + 1,
                header.header_row_index + 1
            );
        }
        self.header = header;
        self.snapshot = SheetData::new(raw);
        self.tracker.set_header_offset(header.total_offset);
        self.working = self
            .tracker
            .restore(&self.snapshot)
            .unwrap_or_else(|| self.snapshot.clone());
        self.reclassify();
        self.rebuild_view();
        Ok(())
    }

    /// Throws away every unsaved change.
    pub fn discard(&mut self) {
        let summary = self.tracker.change_summary();
        self.tracker.clear_changes();
        self.working = self.snapshot.clone();
        self.reclassify();
        self.rebuild_view();
        info!("{}: discarded {}", self.sheet_id, summary.message);
    }

    fn reclassify(&mut self) {
        self.types = classify_rows(
            clean_rows(self.working.rows(), &self.header),
            self.editor.layout(),
        );
    }

    fn rebuild_view(&mut self) {
        let clean = clean_rows(self.working.rows(), &self.header);
        self.view = ViewIndex::build(
            clean,
            &self.types,
            self.editor.layout(),
            &self.filter,
            self.sort.as_ref(),
            self.header.total_offset,
        );
        self.selection.reset(self.view.len());
    }
}
