mod common;

use common::*;
use inventory_grid::classify::RowType;
use inventory_grid::editor::EditorConfig;
use inventory_grid::error::RemoteError;
use inventory_grid::index_map::{RowFilter, SortSpec};
use inventory_grid::remote::MemoryRemote;
use inventory_grid::session::{ScanHit, SheetSession, SyncReport};
use inventory_grid::store::{MemoryStore, unsaved_changes_key};
use inventory_grid::user::UserContext;

fn remote() -> MemoryRemote {
    let mut remote = MemoryRemote::new();
    remote.insert_sheet(SHEET_ID, inventory_rows());
    remote
}

fn open(remote: &MemoryRemote, store: &MemoryStore) -> SheetSession {
    SheetSession::open(
        SHEET_ID,
        inventory_mappings(),
        UserContext::new("tech@example.org", "technician"),
        EditorConfig::default(),
        remote,
        Box::new(store.clone()),
    )
    .unwrap()
}

#[test]
fn open_resolves_header_and_types() {
    let remote = remote();
    let session = open(&remote, &MemoryStore::new());

    assert_eq!(session.header().header_row_index, 2);
    assert_eq!(session.clean_rows().len(), 5);
    assert_eq!(
        session.row_types(),
        &[
            RowType::Laptop,
            RowType::Desktop,
            RowType::Printer,
            RowType::Desktop,
            RowType::Monitor
        ]
    );
    assert_eq!(session.view().len(), 5);
    assert!(!session.tracker().has_changes());
    assert_eq!(session.snapshot(), session.working());
    pass("open pulls, finds the header and classifies rows");
}

#[test]
fn open_unknown_sheet_fails() {
    let remote = MemoryRemote::new();
    let result = SheetSession::open(
        "nope",
        inventory_mappings(),
        UserContext::new("tech@example.org", "technician"),
        EditorConfig::default(),
        &remote,
        Box::new(MemoryStore::new()),
    );
    assert!(matches!(result, Err(RemoteError::SheetNotFound(_))));
    pass("pull errors surface from open");
}

#[test]
fn filtered_edit_lands_on_the_right_absolute_row() {
    let remote = remote();
    let mut session = open(&remote, &MemoryStore::new());
    session.set_filter(RowFilter {
        status: Some("installed".to_string()),
        ..RowFilter::default()
    });
    assert_eq!(session.view().original_index_map(), &[0, 1, 3]);

    let edits = session.edit_on(2, STATUS, "Missing", today());
    assert!(edits.iter().all(|e| e.absolute_row == 6 && e.relative_row == 3));
    assert_eq!(session.working().value(6, STATUS), "Missing");
    assert_eq!(session.working().value(4, STATUS), "Installed");
    assert_eq!(session.tracker().cell(3, STATUS).unwrap().absolute_row_index, 6);
    pass("view row 2 under a status filter is absolute row 6");
}

#[test]
fn sorted_edit_lands_on_the_right_absolute_row() {
    let remote = remote();
    let mut session = open(&remote, &MemoryStore::new());
    session.set_sort(Some(SortSpec {
        column: ASSET.to_string(),
        descending: true,
    }));
    assert_eq!(session.view_rows()[0].get(ASSET), "PR-003");
    assert_eq!(session.view().view_to_absolute(0), Some(5));

    session.edit_on(0, SERIAL, "SN333", today());
    assert_eq!(session.working().value(5, SERIAL), "SN333");
    assert_eq!(session.snapshot().value(5, SERIAL), "SN300");
    pass("view row 0 under a descending sort is PR-003");
}

#[test]
fn edit_outside_view_is_ignored() {
    let remote = remote();
    let mut session = open(&remote, &MemoryStore::new());
    assert!(session.edit_on(42, STATUS, "Missing", today()).is_empty());
    assert!(session.edit_clean(42, STATUS, "Missing", today()).is_empty());
    assert!(!session.tracker().has_changes());
    pass("unknown rows are no-ops");
}

#[test]
fn edit_applies_to_the_whole_selection() {
    let remote = remote();
    let mut session = open(&remote, &MemoryStore::new());
    session.toggle_row(0, true);
    session.toggle_row(3, true);

    session.edit_on(3, STATUS, "Damaged", today());
    assert_eq!(session.working().value(3, STATUS), "Damaged");
    assert_eq!(session.working().value(6, STATUS), "Damaged");
    assert_eq!(session.working().value(4, STATUS), "Installed");
    assert_eq!(session.summary().row_count, 2);

    // A row outside the selection is edited alone.
    session.edit_on(1, STATUS, "Disconnected", today());
    assert_eq!(session.working().value(4, STATUS), "Disconnected");
    assert_eq!(session.working().value(3, STATUS), "Damaged");
    pass("multi-row selection edits every selected row");
}

#[test]
fn view_changes_clear_the_selection() {
    let remote = remote();
    let mut session = open(&remote, &MemoryStore::new());
    session.toggle_all(true);
    assert!(session.selection().select_all());

    session.set_filter(RowFilter {
        row_type: Some(RowType::Desktop),
        ..RowFilter::default()
    });
    assert!(session.selection().is_empty());
    assert_eq!(session.selection().total_rows(), 2);
    pass("filter change empties the selection");
}

#[test]
fn edits_keep_row_types_current() {
    let remote = remote();
    let mut session = open(&remote, &MemoryStore::new());
    session.edit_clean(4, DEVICE, "Laptop", today());
    assert_eq!(session.row_types()[4], RowType::Laptop);
    pass("row type follows an edited device type");
}

#[test]
fn failed_sync_keeps_everything() {
    let mut remote = remote();
    let store = MemoryStore::new();
    let mut session = open(&remote, &store);
    session.toggle_row(1, true);
    session.edit_on(3, STATUS, "Missing", today());
    let before = session.summary();

    remote.set_fail_pushes(true);
    let result = session.sync(&mut remote);
    assert!(matches!(result, Err(RemoteError::Rejected(_))));

    assert_eq!(session.summary(), before);
    assert!(store.contains(&unsaved_changes_key(SHEET_ID)));
    assert_eq!(session.snapshot().value(6, STATUS), "Installed");
    assert_eq!(session.working().value(6, STATUS), "Missing");
    assert!(session.selection().contains(1));
    assert_eq!(remote.sheet(SHEET_ID).unwrap(), inventory_rows().as_slice());
    pass("a failed push changes nothing locally or remotely");
}

#[test]
fn sync_pushes_changed_rows_and_clears_state() {
    let mut remote = remote();
    let store = MemoryStore::new();
    let mut session = open(&remote, &store);
    session.edit_on(3, STATUS, "Missing", today());
    session.edit_on(0, SERIAL, "SN101", today());
    session.toggle_row(2, true);
    let cells = session.summary().cell_count;

    let report = session.sync(&mut remote).unwrap();
    assert_eq!(
        report,
        SyncReport {
            rows_written: 2,
            cells_written: cells
        }
    );

    let pushed = remote.sheet(SHEET_ID).unwrap();
    assert_eq!(pushed, session.working().rows());
    assert_eq!(pushed[6].get(STATUS), "Missing");
    assert_eq!(pushed[6].get(TECHNICIAN), "tech@example.org");
    assert_eq!(pushed[3].get(SERIAL), "SN101");
    assert_eq!(pushed[4], inventory_rows()[4]);
    assert_eq!(remote.highlighted(), &[3, 6]);

    assert!(!session.tracker().has_changes());
    assert!(!store.contains(&unsaved_changes_key(SHEET_ID)));
    assert_eq!(session.snapshot(), session.working());
    assert!(session.selection().is_empty());
    pass("sync writes only changed rows, then clears");
}

#[test]
fn sync_with_nothing_changed_does_not_push() {
    let mut remote = remote();
    let mut session = open(&remote, &MemoryStore::new());
    assert_eq!(session.sync(&mut remote).unwrap(), SyncReport::default());
    assert_eq!(remote.push_count(), 0);
    pass("empty change set skips the push");
}

#[test]
fn reopening_restores_unsaved_edits() {
    let remote = remote();
    let store = MemoryStore::new();
    {
        let mut session = open(&remote, &store);
        session.edit_on(2, STATUS, "Installed", today());
    }

    let session = open(&remote, &store);
    assert_eq!(session.working().value(5, STATUS), "Installed");
    assert_eq!(session.working().value(5, MOVE), "No");
    assert_eq!(session.snapshot().value(5, STATUS), "Missing");
    assert!(session.tracker().is_row_changed(2));
    pass("unsaved work survives a reopen");
}

#[test]
fn refresh_picks_up_remote_changes_and_keeps_local_ones() {
    let mut remote = remote();
    let store = MemoryStore::new();
    let mut session = open(&remote, &store);
    session.edit_on(3, STATUS, "Missing", today());
    let before = session.summary();

    let mut rows = inventory_rows();
    rows[4].set(SERIAL, "SN999");
    remote.insert_sheet(SHEET_ID, rows);

    session.refresh(&remote).unwrap();
    assert_eq!(session.working().value(4, SERIAL), "SN999");
    assert_eq!(session.working().value(6, STATUS), "Missing");
    assert_eq!(session.summary(), before);
    pass("refresh merges remote state with unsaved edits");
}

#[test]
fn discard_restores_the_snapshot() {
    let remote = remote();
    let store = MemoryStore::new();
    let mut session = open(&remote, &store);
    session.edit_on(0, STATUS, "Decommissioned", today());
    assert!(session.tracker().has_changes());

    session.discard();
    assert!(!session.tracker().has_changes());
    assert_eq!(session.working(), session.snapshot());
    assert!(!store.contains(&unsaved_changes_key(SHEET_ID)));
    pass("discard throws away every unsaved change");
}

#[test]
fn push_all_rewrites_the_data_range() {
    let mut remote = remote();
    let mut session = open(&remote, &MemoryStore::new());
    session.edit_on(4, STATUS, "Installed", today());

    let report = session.push_all(&mut remote).unwrap();
    assert_eq!(report.rows_written, 5);
    assert_eq!(remote.sheet(SHEET_ID).unwrap(), session.working().rows());
    assert_eq!(remote.sheet(SHEET_ID).unwrap()[0].get(ASSET), "Spring Inventory");
    assert!(!session.tracker().has_changes());
    pass("full push keeps banners and replaces data rows");
}

#[test]
fn scan_finds_rows_by_tag_or_serial() {
    let remote = remote();
    let mut session = open(&remote, &MemoryStore::new());

    assert_eq!(
        session.scan("  sn300 "),
        Some(ScanHit {
            clean_row: 2,
            absolute_row: 5,
            view_row: Some(2)
        })
    );

    session.set_filter(RowFilter {
        row_type: Some(RowType::Desktop),
        ..RowFilter::default()
    });
    assert_eq!(session.scan("DT-004").unwrap().view_row, Some(1));
    assert_eq!(session.scan("PR-003").unwrap().view_row, None);
    assert_eq!(session.scan("XX-000"), None);
    assert_eq!(session.scan("   "), None);
    pass("scan matches asset tag or serial, case-insensitively");
}

#[test]
fn unsaved_warning_is_given_once() {
    let remote = remote();
    let mut session = open(&remote, &MemoryStore::new());
    assert!(session.take_unsaved_warning().is_none());

    session.edit_on(0, STATUS, "Missing", today());
    let warning = session.take_unsaved_warning().unwrap();
    assert!(warning.cell_count > 0);
    assert!(session.take_unsaved_warning().is_none());
    pass("warning shown only once per change set");
}
