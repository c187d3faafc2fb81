use serde::{Deserialize, Serialize};

use crate::row::{SheetRow, letter_to_col};

/// Links a sheet column to a named field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    #[serde(default)]
    pub field_key: Option<String>,
    pub field_name: String,
    pub column_letter: String,
    #[serde(default)]
    pub order: i32,
}

impl ColumnMapping {
    pub fn new(field_name: &str, column_letter: &str, order: i32) -> Self {
        ColumnMapping {
            field_key: None,
            field_name: field_name.to_string(),
            column_letter: column_letter.to_string(),
            order,
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.field_key = Some(key.to_string());
        self
    }
}

/// Mappings read straight off a header row, one per non-empty cell, for
/// sheets that have no configured mapping.
pub fn from_header_row(header: &SheetRow) -> Vec<ColumnMapping> {
    header
        .cells
        .iter()
        .filter(|(_, name)| !name.trim().is_empty())
        .map(|(col, name)| ColumnMapping::new(name.trim(), col, letter_to_col(col) as i32))
        .collect()
}

/// Semantic columns the editor and classifier care about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    AssetTag,
    SerialNumber,
    Status,
    EquipmentMove,
    Description,
    LastVerified,
    Technician,
    DeviceType,
    Model,
}

/// A named lookup rule: every `all_of` substring must appear and no
/// `none_of` substring may appear in the lower-cased field name or key.
#[derive(Debug)]
pub struct ColumnRule {
    pub role: ColumnRole,
    pub all_of: &'static [&'static str],
    pub none_of: &'static [&'static str],
}

impl ColumnRule {
    fn matches(&self, haystack: &str) -> bool {
        let haystack = haystack.to_lowercase();
        self.all_of.iter().all(|s| haystack.contains(s))
            && !self.none_of.iter().any(|s| haystack.contains(s))
    }
}

/// Ordered rule table; the first rule for a role that matches any mapping wins.
const fn rule(
    role: ColumnRole,
    all_of: &'static [&'static str],
    none_of: &'static [&'static str],
) -> ColumnRule {
    ColumnRule {
        role,
        all_of,
        none_of,
    }
}

pub const COLUMN_RULES: &[ColumnRule] = &[
    rule(ColumnRole::Status, &["status"], &["scanned"]),
    rule(ColumnRole::EquipmentMove, &["equipment", "move"], &[]),
    rule(ColumnRole::Description, &["description"], &[]),
    rule(ColumnRole::LastVerified, &["last", "verified"], &[]),
    rule(ColumnRole::LastVerified, &["verified", "date"], &[]),
    rule(ColumnRole::Technician, &["technician"], &[]),
    rule(ColumnRole::AssetTag, &["asset", "tag"], &[]),
    rule(ColumnRole::AssetTag, &["asset"], &["type", "move"]),
    rule(ColumnRole::SerialNumber, &["serial"], &[]),
    rule(ColumnRole::DeviceType, &["device", "type"], &[]),
    rule(ColumnRole::DeviceType, &["equipment", "type"], &[]),
    rule(ColumnRole::DeviceType, &["type"], &["move"]),
    rule(ColumnRole::Model, &["model"], &[]),
];

/// Mappings sorted by display order (ties broken by column letter).
pub fn ordered(mappings: &[ColumnMapping]) -> Vec<&ColumnMapping> {
    let mut sorted: Vec<&ColumnMapping> = mappings.iter().collect();
    sorted.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then_with(|| a.column_letter.cmp(&b.column_letter))
    });
    sorted
}

/// Column letter for a role, if any mapping satisfies one of its rules.
pub fn find_column(mappings: &[ColumnMapping], role: ColumnRole) -> Option<String> {
    let sorted = ordered(mappings);
    for rule in COLUMN_RULES.iter().filter(|r| r.role == role) {
        let hit = sorted.iter().find(|m| {
            rule.matches(&m.field_name)
                || m.field_key.as_deref().is_some_and(|k| rule.matches(k))
        });
        if let Some(m) = hit {
            return Some(m.column_letter.clone());
        }
    }
    None
}

/// Resolved letters for every role, looked up once per mapping set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    pub asset_tag: Option<String>,
    pub serial_number: Option<String>,
    pub status: Option<String>,
    pub equipment_move: Option<String>,
    pub description: Option<String>,
    pub last_verified: Option<String>,
    pub technician: Option<String>,
    pub device_type: Option<String>,
    pub model: Option<String>,
}

impl ColumnLayout {
    pub fn resolve(mappings: &[ColumnMapping]) -> Self {
        ColumnLayout {
            asset_tag: find_column(mappings, ColumnRole::AssetTag),
            serial_number: find_column(mappings, ColumnRole::SerialNumber),
            status: find_column(mappings, ColumnRole::Status),
            equipment_move: find_column(mappings, ColumnRole::EquipmentMove),
            description: find_column(mappings, ColumnRole::Description),
            last_verified: find_column(mappings, ColumnRole::LastVerified),
            technician: find_column(mappings, ColumnRole::Technician),
            device_type: find_column(mappings, ColumnRole::DeviceType),
            model: find_column(mappings, ColumnRole::Model),
        }
    }

    pub fn column(&self, role: ColumnRole) -> Option<&str> {
        let col = match role {
            ColumnRole::AssetTag => &self.asset_tag,
            ColumnRole::SerialNumber => &self.serial_number,
            ColumnRole::Status => &self.status,
            ColumnRole::EquipmentMove => &self.equipment_move,
            ColumnRole::Description => &self.description,
            ColumnRole::LastVerified => &self.last_verified,
            ColumnRole::Technician => &self.technician,
            ColumnRole::DeviceType => &self.device_type,
            ColumnRole::Model => &self.model,
        };
        col.as_deref()
    }
}
