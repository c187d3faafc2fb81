//! Row coordinate spaces and the mapping between them.
//!
//! - Absolute: position in the raw fetched rows, banners and header included
//! - Clean: absolute - total_offset, data rows only
//! - View: position among the clean rows passing the active filter, in sort
//!   order
//!
//! Anything coming from the grid is in view space and must go through
//! `view_to_clean` and then `clean_to_absolute` before it touches the
//! tracker or the remote. All lookups return `None` for out-of-range input.

use std::cmp::Ordering;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::classify::RowType;
use crate::mapping::ColumnLayout;
use crate::row::SheetRow;

/// Active grid filter. Empty fields do not filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFilter {
    /// Exact status, case-insensitive. `Some("")` selects rows with no status.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub row_type: Option<RowType>,
    /// Case-insensitive substring searched across every cell.
    #[serde(default)]
    pub query: Option<String>,
}

impl RowFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.row_type.is_none()
            && self.query.as_deref().is_none_or(|q| q.trim().is_empty())
    }

    pub fn passes(&self, row: &SheetRow, row_type: RowType, layout: &ColumnLayout) -> bool {
        if let Some(wanted) = &self.status {
            let actual = layout
                .status
                .as_deref()
                .map(|col| row.get(col).trim())
                .unwrap_or("");
            if !actual.eq_ignore_ascii_case(wanted.trim()) {
                return false;
            }
        }
        if let Some(wanted) = self.row_type {
            if row_type != wanted {
                return false;
            }
        }
        if let Some(query) = self.query.as_deref().map(str::trim) {
            if !query.is_empty() {
                let needle = query.to_lowercase();
                if !row
                    .cells
                    .values()
                    .any(|v| v.to_lowercase().contains(&needle))
                {
                    return false;
                }
            }
        }
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    #[serde(default)]
    pub descending: bool,
}

/// View <-> clean <-> absolute translation for one filter/sort state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewIndex {
    /// `original_index_map[view] = clean`
    original_index_map: Vec<usize>,
    /// `clean_to_view_map[clean] = Some(view)` when the row is visible
    clean_to_view_map: Vec<Option<usize>>,
    total_offset: usize,
}

impl ViewIndex {
    /// Every clean row visible, in sheet order.
    pub fn identity(clean_len: usize, total_offset: usize) -> Self {
        ViewIndex {
            original_index_map: (0..clean_len).collect(),
            clean_to_view_map: (0..clean_len).map(Some).collect(),
            total_offset,
        }
    }

    /// `types` is indexed by clean row; a missing entry counts as `Other`.
    pub fn build(
        clean_rows: &[SheetRow],
        types: &[RowType],
        layout: &ColumnLayout,
        filter: &RowFilter,
        sort: Option<&SortSpec>,
        total_offset: usize,
    ) -> Self {
        let mut order: Vec<usize> = (0..clean_rows.len())
            .filter(|&i| {
                let t = types.get(i).copied().unwrap_or(RowType::Other);
                filter.passes(&clean_rows[i], t, layout)
            })
            .collect();

        if let Some(spec) = sort {
            order.sort_by(|&a, &b| {
                let (x, y) = (
                    clean_rows[a].get(&spec.column).trim(),
                    clean_rows[b].get(&spec.column).trim(),
                );
                // Blanks go last in either direction.
                match (x.is_empty(), y.is_empty()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) if spec.descending => compare_cells(x, y).reverse(),
                    (false, false) => compare_cells(x, y),
                }
            });
        }

        let mut clean_to_view_map = vec![None; clean_rows.len()];
        for (view, &clean) in order.iter().enumerate() {
            clean_to_view_map[clean] = Some(view);
        }

        debug!(
            "view index built: {} of {} rows visible",
            order.len(),
            clean_rows.len()
        );

        ViewIndex {
            original_index_map: order,
            clean_to_view_map,
            total_offset,
        }
    }

    /// Number of visible rows.
    pub fn len(&self) -> usize {
        self.original_index_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original_index_map.is_empty()
    }

    /// Number of clean rows the index was built over.
    pub fn clean_len(&self) -> usize {
        self.clean_to_view_map.len()
    }

    pub fn total_offset(&self) -> usize {
        self.total_offset
    }

    pub fn is_filtered(&self) -> bool {
        self.len() < self.clean_len()
    }

    pub fn original_index_map(&self) -> &[usize] {
        &self.original_index_map
    }

    pub fn view_to_clean(&self, view_row: usize) -> Option<usize> {
        self.original_index_map.get(view_row).copied()
    }

    pub fn clean_to_absolute(&self, clean_row: usize) -> Option<usize> {
        (clean_row < self.clean_len()).then(|| clean_row + self.total_offset)
    }

    pub fn view_to_absolute(&self, view_row: usize) -> Option<usize> {
        self.view_to_clean(view_row)
            .and_then(|clean| self.clean_to_absolute(clean))
    }

    pub fn absolute_to_clean(&self, absolute_row: usize) -> Option<usize> {
        let clean = absolute_row.checked_sub(self.total_offset)?;
        (clean < self.clean_len()).then_some(clean)
    }

    /// `None` when the row is hidden by the filter or out of range.
    pub fn clean_to_view(&self, clean_row: usize) -> Option<usize> {
        self.clean_to_view_map.get(clean_row).copied().flatten()
    }
}

/// Numbers compare numerically, everything else case-insensitively.
fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}
