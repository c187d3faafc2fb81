//! Checkbox selection of grid rows.
//!
//! Indices are in view space (see [`crate::index_map`]). The set is cleared
//! whenever the view changes underneath it.

use std::collections::BTreeSet;

use serde::Serialize;

/// Rows whose membership changed during one drag step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DragDelta {
    pub selected: Vec<usize>,
    pub deselected: Vec<usize>,
}

impl DragDelta {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.deselected.is_empty()
    }
}

#[derive(Clone, Debug)]
struct DragState {
    start: usize,
    current: usize,
    checked: bool,
    // Selection as it was when the drag began; rows leaving the dragged
    // range go back to this.
    before: BTreeSet<usize>,
}

impl DragState {
    fn contains(&self, row: usize) -> bool {
        let (lo, hi) = ordered(self.start, self.current);
        (lo..=hi).contains(&row)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SelectionManager {
    selected: BTreeSet<usize>,
    total_rows: usize,
    anchor: Option<usize>,
    drag: Option<DragState>,
}

impl SelectionManager {
    pub fn new(total_rows: usize) -> Self {
        SelectionManager {
            total_rows,
            ..Default::default()
        }
    }

    /// Empties the selection for a view with `total_rows` rows.
    pub fn reset(&mut self, total_rows: usize) {
        self.total_rows = total_rows;
        self.clear();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
        self.drag = None;
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, row: usize) -> bool {
        self.selected.contains(&row)
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// Selected view rows, ascending.
    pub fn selected_rows(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    pub fn select_all(&self) -> bool {
        self.selected.len() == self.total_rows
    }

    pub fn toggle(&mut self, row: usize, checked: bool) {
        if row >= self.total_rows {
            return;
        }
        self.set(row, checked);
        self.anchor = Some(row);
    }

    /// Applies `checked` to every row between `anchor` and `row`, inclusive.
    pub fn range_toggle(&mut self, anchor: usize, row: usize, checked: bool) {
        if self.total_rows == 0 || row >= self.total_rows {
            return;
        }
        let (lo, hi) = ordered(anchor.min(self.total_rows - 1), row);
        for r in lo..=hi {
            self.set(r, checked);
        }
    }

    /// Shift-click: ranges from the last toggled row, or acts as a plain
    /// toggle when there is no anchor yet.
    pub fn shift_toggle(&mut self, row: usize, checked: bool) {
        match self.anchor {
            Some(anchor) => self.range_toggle(anchor, row, checked),
            None => self.toggle(row, checked),
        }
    }

    pub fn toggle_all(&mut self, checked: bool) {
        if checked {
            self.selected = (0..self.total_rows).collect();
        } else {
            self.selected.clear();
        }
    }

    pub fn begin_drag(&mut self, start: usize, checked: bool) -> DragDelta {
        if start >= self.total_rows {
            return DragDelta::default();
        }
        let before = self.selected.clone();
        let mut delta = DragDelta::default();
        self.apply(start, checked, &mut delta);
        self.drag = Some(DragState {
            start,
            current: start,
            checked,
            before,
        });
        self.anchor = Some(start);
        delta
    }

    /// Moves the drag end to `current` and returns only the rows whose
    /// membership changed since the previous step.
    pub fn drag_to(&mut self, current: usize) -> DragDelta {
        let mut delta = DragDelta::default();
        if current >= self.total_rows {
            return delta;
        }
        let Some(mut drag) = self.drag.take() else {
            return delta;
        };

        let (old_lo, old_hi) = ordered(drag.start, drag.current);
        drag.current = current;
        let (new_lo, new_hi) = ordered(drag.start, drag.current);

        for r in new_lo..=new_hi {
            if !(old_lo..=old_hi).contains(&r) {
                self.apply(r, drag.checked, &mut delta);
            }
        }
        for r in old_lo..=old_hi {
            if !drag.contains(r) {
                let was_selected = drag.before.contains(&r);
                self.apply(r, was_selected, &mut delta);
            }
        }

        self.anchor = Some(current);
        self.drag = Some(drag);
        delta
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn set(&mut self, row: usize, checked: bool) {
        if checked {
            self.selected.insert(row);
        } else {
            self.selected.remove(&row);
        }
    }

    fn apply(&mut self, row: usize, checked: bool, delta: &mut DragDelta) {
        let changed = if checked {
            self.selected.insert(row)
        } else {
            self.selected.remove(&row)
        };
        if changed {
            if checked {
                delta.selected.push(row);
            } else {
                delta.deselected.push(row);
            }
        }
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}
