//! Derives a device type tag per data row so the grid can be filtered by
//! desktop, laptop, printer and so on.

use crate::mapping::ColumnLayout;
use crate::row::SheetRow;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref LAPTOP_REGEX: Regex = Regex::new(
        r"(?i)\b(laptop|notebook|latitude|thinkpad|elitebook|probook|macbook|chromebook|surface)\b"
    )
    .unwrap();
    static ref DESKTOP_REGEX: Regex = Regex::new(
        r"(?i)\b(desktop|optiplex|prodesk|elitedesk|thinkcentre|imac|workstation|tower|sff|all[- ]in[- ]one)\b"
    )
    .unwrap();
    static ref PRINTER_REGEX: Regex = Regex::new(
        r"(?i)\b(printer|laserjet|officejet|deskjet|mfp|copier|zebra|plotter)\b"
    )
    .unwrap();
    static ref MONITOR_REGEX: Regex =
        Regex::new(r"(?i)\b(monitor|display|lcd|led screen)\b").unwrap();
    static ref NETWORK_REGEX: Regex = Regex::new(
        r"(?i)\b(switch|router|access point|firewall|wap)\b"
    )
    .unwrap();
    // Asset tags such as "LT-0042" or "DT12345" encode the device class.
    static ref TAG_PREFIX_REGEX: Regex = Regex::new(r"(?i)^(LT|NB|DT|PC|PR|MN)[-_]?\d").unwrap();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowType {
    Desktop,
    Laptop,
    Printer,
    Monitor,
    Network,
    Other,
}

impl RowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowType::Desktop => "desktop",
            RowType::Laptop => "laptop",
            RowType::Printer => "printer",
            RowType::Monitor => "monitor",
            RowType::Network => "network",
            RowType::Other => "other",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "desktop" | "desktops" => Some(RowType::Desktop),
            "laptop" | "laptops" => Some(RowType::Laptop),
            "printer" | "printers" => Some(RowType::Printer),
            "monitor" | "monitors" => Some(RowType::Monitor),
            "network" => Some(RowType::Network),
            "other" => Some(RowType::Other),
            _ => None,
        }
    }
}

/// Tags one row. Explicit type and model columns are consulted before the
/// description, and the asset tag prefix is the last resort.
pub fn classify_row(row: &SheetRow, layout: &ColumnLayout) -> RowType {
    let sources = [
        layout.device_type.as_deref(),
        layout.model.as_deref(),
        layout.description.as_deref(),
    ];
    for column in sources.into_iter().flatten() {
        if let Some(t) = match_text(row.get(column)) {
            return t;
        }
    }

    if let Some(tag_col) = &layout.asset_tag {
        if let Some(caps) = TAG_PREFIX_REGEX.captures(row.get(tag_col).trim()) {
            return match caps[1].to_uppercase().as_str() {
                "LT" | "NB" => RowType::Laptop,
                "DT" | "PC" => RowType::Desktop,
                "PR" => RowType::Printer,
                "MN" => RowType::Monitor,
                _ => RowType::Other,
            };
        }
    }

    RowType::Other
}

/// Tags every data row, in clean-row order.
pub fn classify_rows(rows: &[SheetRow], layout: &ColumnLayout) -> Vec<RowType> {
    rows.iter().map(|r| classify_row(r, layout)).collect()
}

fn match_text(text: &str) -> Option<RowType> {
    if text.trim().is_empty() {
        return None;
    }
    // Laptop before desktop: "laptop workstation" is a laptop.
    if LAPTOP_REGEX.is_match(text) {
        Some(RowType::Laptop)
    } else if DESKTOP_REGEX.is_match(text) {
        Some(RowType::Desktop)
    } else if PRINTER_REGEX.is_match(text) {
        Some(RowType::Printer)
    } else if MONITOR_REGEX.is_match(text) {
        Some(RowType::Monitor)
    } else if NETWORK_REGEX.is_match(text) {
        Some(RowType::Network)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ColumnMapping;

    fn layout() -> ColumnLayout {
        ColumnLayout::resolve(&[
            ColumnMapping::new("Asset Tag", "A", 0),
            ColumnMapping::new("Device Type", "B", 1),
            ColumnMapping::new("Model", "C", 2),
        ])
    }

    #[test]
    fn loose_type_names() {
        assert_eq!(RowType::from_str_loose(" Laptops "), Some(RowType::Laptop));
        assert_eq!(RowType::from_str_loose("PRINTER"), Some(RowType::Printer));
        assert_eq!(RowType::from_str_loose("toaster"), None);
    }

    #[test]
    fn type_column_wins_over_model() {
        let row = SheetRow::from_values(["X1", "Printer", "OptiPlex 7080"]);
        assert_eq!(classify_row(&row, &layout()), RowType::Printer);
    }

    #[test]
    fn model_names_are_recognised() {
        let row = SheetRow::from_values(["X1", "", "Dell Latitude 5420"]);
        assert_eq!(classify_row(&row, &layout()), RowType::Laptop);
        let row = SheetRow::from_values(["X2", "", "HP LaserJet M404"]);
        assert_eq!(classify_row(&row, &layout()), RowType::Printer);
    }

    #[test]
    fn asset_tag_prefix_is_last_resort() {
        let row = SheetRow::from_values(["DT-0042", "", ""]);
        assert_eq!(classify_row(&row, &layout()), RowType::Desktop);
        let row = SheetRow::from_values(["ZZ-0042", "", "unknown gadget"]);
        assert_eq!(classify_row(&row, &layout()), RowType::Other);
    }
}
