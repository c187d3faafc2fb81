mod common;

use common::*;
use inventory_grid::header::{HeaderContext, clean_rows, compute_header_context};
use inventory_grid::mapping::ColumnMapping;
use inventory_grid::row::SheetRow;

#[test]
fn header_below_title_banner() {
    let raw = vec![
        SheetRow::from_values(["Title"]),
        SheetRow::from_values(["Asset", "Serial", "Status"]),
        SheetRow::from_values(["A1", "S1", "Installed"]),
    ];
    let mappings = vec![
        ColumnMapping::new("Asset Tag", "A", 0),
        ColumnMapping::new("Serial Number", "B", 1),
        ColumnMapping::new("Status", "C", 2),
    ];

    let ctx = compute_header_context(&raw, &mappings, None);
    assert_eq!(ctx.header_row_index, 1);
    assert_eq!(ctx.total_offset, 2);

    let clean = clean_rows(&raw, &ctx);
    assert_eq!(clean.len(), 1);
    assert_eq!(clean[0], SheetRow::from_values(["A1", "S1", "Installed"]));
    pass("header found below a one-cell title banner");
}

#[test]
fn banner_naming_several_fields_is_not_a_header() {
    let raw = vec![
        SheetRow::from_values(["Asset Tag and Serial Number Audit"]),
        SheetRow::from_values(["Asset", "Serial", "Status"]),
        SheetRow::from_values(["A1", "S1", "Installed"]),
    ];
    let mappings = vec![
        ColumnMapping::new("Asset Tag", "A", 0),
        ColumnMapping::new("Serial Number", "B", 1),
        ColumnMapping::new("Status", "C", 2),
    ];

    let ctx = compute_header_context(&raw, &mappings, None);
    assert_eq!(ctx.header_row_index, 1);
    assert_eq!(clean_rows(&raw, &ctx)[0].get("A"), "A1");
    pass("one banner cell counts for at most one field name");
}

#[test]
fn empty_sheet_defaults_to_first_row() {
    let ctx = compute_header_context(&[], &inventory_mappings(), Some(SHEET_ID));
    assert_eq!(
        ctx,
        HeaderContext {
            header_row_index: 0,
            total_offset: 1
        }
    );
    pass("empty sheet resolves to row 0");
}

#[test]
fn banner_and_blank_rows_are_skipped() {
    let raw = inventory_rows();
    let ctx = compute_header_context(&raw, &inventory_mappings(), Some(SHEET_ID));
    assert_eq!(ctx.header_row_index, 2);
    assert_eq!(clean_rows(&raw, &ctx).len(), 5);
    assert_eq!(clean_rows(&raw, &ctx)[0].get(ASSET), "LT-001");
    pass("inventory header found at row 2");
}

#[test]
fn shape_heuristic_without_mappings() {
    let raw = inventory_rows();
    let ctx = compute_header_context(&raw, &[], Some(SHEET_ID));
    assert_eq!(ctx.header_row_index, 2);
    pass("header found by shape when no mappings are configured");
}

#[test]
fn nothing_header_like_falls_back_to_zero() {
    let raw = vec![
        SheetRow::from_values(["1", "2", "3"]),
        SheetRow::from_values(["4", "5", "6"]),
    ];
    let ctx = compute_header_context(&raw, &[], None);
    assert_eq!(ctx.header_row_index, 0);
    pass("numeric-only sheet falls back to row 0");
}

#[test]
fn header_past_scan_window_is_not_found() {
    let mut raw: Vec<SheetRow> = (0..30).map(|_| SheetRow::from_values(["note"])).collect();
    raw.push(SheetRow::from_values(["Asset Tag", "Serial Number", "Status"]));
    let mappings = vec![
        ColumnMapping::new("Asset Tag", "A", 0),
        ColumnMapping::new("Serial Number", "B", 1),
        ColumnMapping::new("Status", "C", 2),
    ];
    let ctx = compute_header_context(&raw, &mappings, None);
    assert_eq!(ctx.header_row_index, 0);
    pass("only the first 25 rows are scanned");
}

#[test]
fn detection_is_deterministic() {
    let raw = inventory_rows_with_banners(4);
    let first = compute_header_context(&raw, &inventory_mappings(), Some(SHEET_ID));
    for _ in 0..5 {
        assert_eq!(
            compute_header_context(&raw, &inventory_mappings(), Some(SHEET_ID)),
            first
        );
    }
    assert_eq!(first.header_row_index, 4);
    pass("same input, same header");
}

#[test]
fn data_rows_survive_extra_banners() {
    let before = inventory_rows();
    let after = inventory_rows_with_banners(3);
    let ctx_before = compute_header_context(&before, &inventory_mappings(), Some(SHEET_ID));
    let ctx_after = compute_header_context(&after, &inventory_mappings(), Some(SHEET_ID));

    assert_eq!(ctx_after.total_offset, ctx_before.total_offset + 1);
    assert_eq!(clean_rows(&before, &ctx_before), clean_rows(&after, &ctx_after));
    pass("clean rows are identical when a banner is added");
}
