//! Header row detection.
//!
//! Sheets pulled from the remote often carry title banners, notes or blank
//! rows above the real header. Everything here is a pure function of its
//! inputs.

use crate::mapping::ColumnMapping;
use crate::row::SheetRow;
use log::debug;
use serde::{Deserialize, Serialize};

/// Rows scanned from the top when looking for the header.
pub const HEADER_SCAN_LIMIT: usize = 25;

/// Where the header sits and how many leading rows are not data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderContext {
    pub header_row_index: usize,
    pub total_offset: usize,
}

impl HeaderContext {
    pub fn at(header_row_index: usize) -> Self {
        HeaderContext {
            header_row_index,
            total_offset: header_row_index + 1,
        }
    }
}

impl Default for HeaderContext {
    fn default() -> Self {
        HeaderContext::at(0)
    }
}

/// Locates the header row.
///
/// With mappings, the first row whose cells match at least half of the mapped
/// display names wins. Otherwise (or if nothing matched) the first row that
/// looks like a header is used. Falls back to row 0.
pub fn compute_header_context(
    raw_rows: &[SheetRow],
    mappings: &[ColumnMapping],
    tab_name_hint: Option<&str>,
) -> HeaderContext {
    if raw_rows.is_empty() {
        return HeaderContext::default();
    }

    let window = &raw_rows[..raw_rows.len().min(HEADER_SCAN_LIMIT)];

    if !mappings.is_empty() {
        if let Some(idx) = find_by_mappings(window, mappings) {
            debug!("header row {} matched column mappings", idx);
            return HeaderContext::at(idx);
        }
    }

    if let Some(idx) = find_by_shape(window, tab_name_hint) {
        debug!("header row {} chosen by shape heuristic", idx);
        return HeaderContext::at(idx);
    }

    debug!("no header-like row found, defaulting to row 0");
    HeaderContext::default()
}

/// Data rows only (everything after the header).
pub fn clean_rows<'a>(raw_rows: &'a [SheetRow], ctx: &HeaderContext) -> &'a [SheetRow] {
    if ctx.total_offset >= raw_rows.len() {
        return &[];
    }
    &raw_rows[ctx.total_offset..]
}

fn find_by_mappings(window: &[SheetRow], mappings: &[ColumnMapping]) -> Option<usize> {
    let names: Vec<String> = mappings
        .iter()
        .map(|m| normalize(&m.field_name))
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        return None;
    }
    let needed = names.len().div_ceil(2).max(1);

    window.iter().position(|row| {
        let cells: Vec<String> = row
            .non_empty_values()
            .into_iter()
            .filter(|v| v.chars().count() >= 2 && !is_numeric(v))
            .map(normalize)
            .collect();
        matched_pairs(&cells, &names) >= needed
    })
}

/// Size of the largest one-to-one pairing of cells with mapping names, so a
/// single long cell never counts for more than one field.
fn matched_pairs(cells: &[String], names: &[String]) -> usize {
    let edges: Vec<Vec<usize>> = cells
        .iter()
        .map(|cell| {
            (0..names.len())
                .filter(|&n| names_match(cell, &names[n]))
                .collect()
        })
        .collect();

    let mut owner: Vec<Option<usize>> = vec![None; names.len()];
    let mut pairs = 0;
    for cell in 0..cells.len() {
        let mut seen = vec![false; names.len()];
        if assign(cell, &edges, &mut owner, &mut seen) {
            pairs += 1;
        }
    }
    pairs
}

fn assign(
    cell: usize,
    edges: &[Vec<usize>],
    owner: &mut [Option<usize>],
    seen: &mut [bool],
) -> bool {
    for &name in &edges[cell] {
        if seen[name] {
            continue;
        }
        seen[name] = true;
        let free = match owner[name] {
            None => true,
            Some(other) => assign(other, edges, owner, seen),
        };
        if free {
            owner[name] = Some(cell);
            return true;
        }
    }
    false
}

fn find_by_shape(window: &[SheetRow], tab_name_hint: Option<&str>) -> Option<usize> {
    let widest = window
        .iter()
        .map(|r| r.non_empty_values().len())
        .max()
        .unwrap_or(0);
    let hint = tab_name_hint.map(normalize).filter(|h| !h.is_empty());

    window.iter().position(|row| {
        let values = row.non_empty_values();
        if values.len() < 2 || values.len() * 2 < widest {
            return false;
        }
        if let Some(hint) = &hint {
            if values.iter().any(|v| normalize(v).contains(hint.as_str())) {
                return false;
            }
        }
        let textual = values.iter().filter(|v| !is_numeric(v)).count();
        textual * 2 > values.len()
    })
}

fn names_match(cell: &str, name: &str) -> bool {
    cell == name || cell.contains(name) || name.contains(cell)
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Numbers, dates and similar: digits with separators only.
pub fn is_numeric(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty()
        && s.chars().any(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '/' | '$' | '%' | ' '))
}
