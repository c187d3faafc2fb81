//! Cell edits and the inventory rules that ride along with them.
//!
//! [`SheetEditor::apply_edit`] never mutates its input: it returns the new
//! rows together with every cell it touched, auto-filled ones included, so
//! the caller can hand the whole list to the change tracker.

use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::Serialize;

use crate::dates::format_us_date;
use crate::header::HeaderContext;
use crate::mapping::{ColumnLayout, ColumnMapping};
use crate::row::{SheetData, SheetRow};
use crate::user::UserContext;

/// Settings for the derived-field rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorConfig {
    /// Name used in the generated description text.
    pub project_name: String,
    /// Roles that are never auto-assigned as technician.
    pub privileged_roles: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            project_name: "Project Nova".to_string(),
            privileged_roles: vec!["admin".to_string()],
        }
    }
}

/// Who is editing, and what "today" is for the verified-date stamp.
#[derive(Clone, Copy, Debug)]
pub struct EditContext<'a> {
    pub user: &'a UserContext,
    pub today: NaiveDate,
}

/// A single cell write produced by an edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellEdit {
    pub relative_row: usize,
    pub absolute_row: usize,
    pub column: String,
    pub old_value: String,
    pub new_value: String,
    /// Filled in by a rule rather than typed by the user.
    pub auto: bool,
}

#[derive(Clone, Debug)]
pub struct EditOutcome {
    pub data: SheetData,
    pub edits: Vec<CellEdit>,
}

impl EditOutcome {
    pub fn is_noop(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Status values the rules react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Decommissioned,
    Missing,
    Damaged,
    Disconnected,
    Installed,
    Other,
}

impl StatusKind {
    pub fn parse(value: &str) -> Self {
        let s = value.trim().to_lowercase();
        if s.contains("decommission") {
            StatusKind::Decommissioned
        } else if s.contains("missing") {
            StatusKind::Missing
        } else if s.contains("damage") {
            StatusKind::Damaged
        } else if s.contains("disconnect") {
            StatusKind::Disconnected
        } else if s.contains("installed") && !s.contains("not installed") && !s.contains("uninstalled")
        {
            StatusKind::Installed
        } else {
            StatusKind::Other
        }
    }

    /// Equipment Move value implied by this status, if any.
    pub fn equipment_move(self) -> Option<&'static str> {
        match self {
            StatusKind::Decommissioned
            | StatusKind::Missing
            | StatusKind::Damaged
            | StatusKind::Disconnected => Some("Yes"),
            StatusKind::Installed => Some("No"),
            StatusKind::Other => None,
        }
    }
}

pub struct SheetEditor {
    layout: ColumnLayout,
    config: EditorConfig,
}

impl SheetEditor {
    pub fn new(mappings: &[ColumnMapping], config: EditorConfig) -> Self {
        SheetEditor {
            layout: ColumnLayout::resolve(mappings),
            config,
        }
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Edits one data row.
    pub fn apply_edit(
        &self,
        working: &SheetData,
        header: &HeaderContext,
        clean_row: usize,
        column: &str,
        new_value: &str,
        ctx: &EditContext<'_>,
    ) -> EditOutcome {
        self.apply_edit_many(working, header, &[clean_row], column, new_value, ctx)
    }

    /// Edits several data rows with the same value, running the full rule
    /// set on each. Rows outside the sheet are skipped.
    pub fn apply_edit_many(
        &self,
        working: &SheetData,
        header: &HeaderContext,
        clean_rows: &[usize],
        column: &str,
        new_value: &str,
        ctx: &EditContext<'_>,
    ) -> EditOutcome {
        let mut data = working.clone();
        let mut edits = Vec::new();
        for &clean_row in clean_rows {
            let Some(absolute_row) = clean_row.checked_add(header.total_offset) else {
                debug!("edit of data row {} ignored: outside the sheet", clean_row);
                continue;
            };
            let Some(row) = data.row_mut(absolute_row) else {
                debug!("edit of row {} ignored: outside the sheet", absolute_row);
                continue;
            };
            let mut writer = RowWriter {
                row,
                relative_row: clean_row,
                absolute_row,
                edits: Vec::new(),
            };
            self.edit_row(&mut writer, column, new_value, ctx);
            edits.append(&mut writer.edits);
        }
        EditOutcome { data, edits }
    }

    fn edit_row(&self, w: &mut RowWriter<'_>, column: &str, new_value: &str, ctx: &EditContext<'_>) {
        if w.row.get(column) == new_value {
            return;
        }
        let was_installed_in_place = self.installed_without_move(&*w.row);
        let year = ctx.today.year();

        w.write(column, new_value, false);

        if self.layout.status.as_deref() == Some(column) {
            let status = StatusKind::parse(new_value);

            if let (Some(move_col), Some(value)) =
                (self.layout.equipment_move.as_deref(), status.equipment_move())
            {
                w.write(move_col, value, true);
            }

            if let Some(desc_col) = self.layout.description.as_deref() {
                match status {
                    StatusKind::Decommissioned => w.write(
                        desc_col,
                        &format!(
                            "Equipment was decommissioned during {} {}",
                            self.config.project_name, year
                        ),
                        true,
                    ),
                    StatusKind::Missing => w.write(
                        desc_col,
                        &format!(
                            "Equipment was missing during {} {}",
                            self.config.project_name, year
                        ),
                        true,
                    ),
                    _ => {}
                }
            }
        }

        // Evaluated after the status rules so it wins when both apply.
        if let Some(desc_col) = self.layout.description.as_deref() {
            if !was_installed_in_place && self.installed_without_move(&*w.row) {
                w.write(
                    desc_col,
                    &format!(
                        "Equipment verified installed during {} {}",
                        self.config.project_name, year
                    ),
                    true,
                );
            }
        }

        if let Some(date_col) = self.layout.last_verified.as_deref() {
            if date_col != column {
                w.write(date_col, &format_us_date(ctx.today), true);
            }
        }

        if let Some(tech_col) = self.layout.technician.as_deref() {
            let privileged = ctx.user.is_privileged(&self.config.privileged_roles);
            if !privileged && !ctx.user.email.is_empty() && w.row.get(tech_col).trim().is_empty() {
                w.write(tech_col, &ctx.user.email, true);
            }
        }
    }

    fn installed_without_move(&self, row: &SheetRow) -> bool {
        let (Some(status_col), Some(move_col)) = (
            self.layout.status.as_deref(),
            self.layout.equipment_move.as_deref(),
        ) else {
            return false;
        };
        StatusKind::parse(row.get(status_col)) == StatusKind::Installed
            && row.get(move_col).trim().eq_ignore_ascii_case("no")
    }
}

/// Writes into one row and keeps a coalesced list of what changed.
struct RowWriter<'a> {
    row: &'a mut SheetRow,
    relative_row: usize,
    absolute_row: usize,
    edits: Vec<CellEdit>,
}

impl RowWriter<'_> {
    fn write(&mut self, column: &str, value: &str, auto: bool) {
        let current = self.row.get(column).to_string();
        if current == value {
            return;
        }
        self.row.set(column, value);

        // A cell written twice in one edit is reported once, from its value
        // before the edit to its final value.
        if let Some(pos) = self.edits.iter().position(|e| e.column == column) {
            if self.edits[pos].old_value == value {
                self.edits.remove(pos);
            } else {
                self.edits[pos].new_value = value.to_string();
            }
            return;
        }
        self.edits.push(CellEdit {
            relative_row: self.relative_row,
            absolute_row: self.absolute_row,
            column: column.to_string(),
            old_value: current,
            new_value: value.to_string(),
            auto,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing() {
        assert_eq!(StatusKind::parse(" Decommissioned "), StatusKind::Decommissioned);
        assert_eq!(StatusKind::parse("MISSING"), StatusKind::Missing);
        assert_eq!(StatusKind::parse("Damaged - screen"), StatusKind::Damaged);
        assert_eq!(StatusKind::parse("Disconnected"), StatusKind::Disconnected);
        assert_eq!(StatusKind::parse("Installed"), StatusKind::Installed);
        assert_eq!(StatusKind::parse("Not Installed"), StatusKind::Other);
        assert_eq!(StatusKind::parse("In storage"), StatusKind::Other);
    }

    #[test]
    fn implied_equipment_move() {
        assert_eq!(StatusKind::Damaged.equipment_move(), Some("Yes"));
        assert_eq!(StatusKind::Installed.equipment_move(), Some("No"));
        assert_eq!(StatusKind::Other.equipment_move(), None);
    }
}
