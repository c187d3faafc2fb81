use std::collections::BTreeMap;
use std::env;

use inventory_grid::config::Config;
use inventory_grid::compute_header_context;
use inventory_grid::export::{data_to_csv, write_csv_file};
use inventory_grid::mapping::{ColumnMapping, from_header_row};
use inventory_grid::remote::{CsvRemote, SheetRemote};
use inventory_grid::session::SheetSession;
use inventory_grid::store::FileStore;
use inventory_grid::user::UserContext;

/// Command line entry point
///
/// Opens one sheet from a directory of CSV files and prints what the grid
/// would see: where the header is, how many rows of each device type there
/// are, and any unsaved changes left over from an earlier session.
///
/// # Arguments
/// * `data_dir` - Directory holding `<sheet_id>.csv` (defaults to the config)
/// * `sheet_id` - Sheet to open (defaults to the config)
/// * `export_path` - Optional CSV file to write the data rows to
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut config = Config::from_env()?;
    let args: Vec<String> = env::args().collect();
    if args.len() >= 2 {
        config.data_dir = args[1].clone().into();
    }
    if args.len() >= 3 {
        config.default_sheet = args[2].clone();
    }
    let export_path = args.get(3).cloned();

    let remote = CsvRemote::new(&config.data_dir);
    let store = FileStore::open(&config.storage_dir)?;
    let mappings = header_mappings(&remote, &config.default_sheet)?;
    let user = UserContext::new("", "admin");

    let session = SheetSession::open(
        &config.default_sheet,
        mappings,
        user,
        config.editor_config(),
        &remote,
        Box::new(store),
    )?;

    let header = session.header();
    println!("Sheet: {}", session.sheet_id());
    println!(
        "Header row: {} (data starts at row {})",
        header.header_row_index + 1,
        header.total_offset + 1
    );
    println!("Data rows: {}", session.clean_rows().len());

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for t in session.row_types() {
        *counts.entry(t.as_str()).or_default() += 1;
    }
    for (kind, count) in counts {
        println!("  {:<10} {}", kind, count);
    }

    println!("{}", session.summary().message);

    if let Some(path) = export_path {
        let csv = data_to_csv(session.clean_rows(), session.mappings());
        write_csv_file(&path, &csv)?;
        println!("Exported {} rows to {}", session.clean_rows().len(), path);
    }
    Ok(())
}

/// Uses the header row itself as the mapping: every non-empty header cell
/// becomes a field named after its text.
fn header_mappings(
    remote: &CsvRemote,
    sheet_id: &str,
) -> Result<Vec<ColumnMapping>, Box<dyn std::error::Error>> {
    let raw = remote.pull(sheet_id)?;
    let header = compute_header_context(&raw, &[], Some(sheet_id));
    Ok(raw
        .get(header.header_row_index)
        .map(from_header_row)
        .unwrap_or_default())
}
