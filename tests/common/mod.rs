#![allow(dead_code)]

use chrono::NaiveDate;
use inventory_grid::mapping::ColumnMapping;
use inventory_grid::row::{SheetData, SheetRow};

pub const SHEET_ID: &str = "room-101";

/// Columns of the inventory fixture.
pub const ASSET: &str = "A";
pub const SERIAL: &str = "B";
pub const DEVICE: &str = "C";
pub const STATUS: &str = "D";
pub const MOVE: &str = "E";
pub const DESCRIPTION: &str = "F";
pub const VERIFIED: &str = "G";
pub const TECHNICIAN: &str = "H";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
}

pub fn inventory_mappings() -> Vec<ColumnMapping> {
    vec![
        ColumnMapping::new("Asset Tag", ASSET, 0),
        ColumnMapping::new("Serial Number", SERIAL, 1),
        ColumnMapping::new("Device Type", DEVICE, 2),
        ColumnMapping::new("Status", STATUS, 3),
        ColumnMapping::new("Equipment Move", MOVE, 4),
        ColumnMapping::new("Description", DESCRIPTION, 5),
        ColumnMapping::new("Last Verified Inventory Date", VERIFIED, 6),
        ColumnMapping::new("Technician", TECHNICIAN, 7),
    ]
}

fn header_row() -> SheetRow {
    SheetRow::from_values([
        "Asset Tag",
        "Serial Number",
        "Device Type",
        "Status",
        "Equipment Move",
        "Description",
        "Last Verified Inventory Date",
        "Technician",
    ])
}

fn data_rows() -> Vec<SheetRow> {
    vec![
        SheetRow::from_values(["LT-001", "SN100", "Laptop", "Installed", "No", "", "", ""]),
        SheetRow::from_values([
            "DT-002",
            "SN200",
            "Desktop",
            "Installed",
            "No",
            "",
            "",
            "alice@example.org",
        ]),
        SheetRow::from_values(["PR-003", "SN300", "Printer", "Missing", "Yes", "", "", ""]),
        SheetRow::from_values(["DT-004", "SN400", "Desktop", "Installed", "No", "", "", ""]),
        SheetRow::from_values(["MN-005", "SN500", "Monitor", "Damaged", "Yes", "", "", ""]),
    ]
}

/// Title banner, blank row, header at index 2, five data rows.
pub fn inventory_rows() -> Vec<SheetRow> {
    inventory_rows_with_banners(2)
}

/// Same sheet with `banners` rows above the header.
pub fn inventory_rows_with_banners(banners: usize) -> Vec<SheetRow> {
    let mut rows = Vec::new();
    for i in 0..banners {
        if i == 0 {
            rows.push(SheetRow::from_values(["Spring Inventory"]));
        } else {
            rows.push(SheetRow::new());
        }
    }
    rows.push(header_row());
    rows.extend(data_rows());
    rows
}

pub fn inventory_data() -> SheetData {
    SheetData::new(inventory_rows())
}

pub fn pass(what: &str) {
    println!("✓ {}", what);
}
