use crate::mapping::{ColumnMapping, ordered};
use crate::row::{SheetRow, col_to_letter, letter_to_col};
use std::error::Error;

/// Convert raw rows to CSV format
///
/// Writes every row with the same width (the widest column any row uses),
/// so the output loads back into identical rows with
/// [`crate::loader::from_csv_str`]. Special characters (commas, quotes,
/// newlines) are escaped.
///
/// # Arguments
/// * `rows` - Rows in sheet order
///
/// # Returns
/// * `String` - CSV content
///
/// # Examples
/// ```
/// use inventory_grid::export::rows_to_csv;
/// use inventory_grid::row::SheetRow;
///
/// let rows = vec![SheetRow::from_values(["Asset", "Serial"])];
/// assert_eq!(rows_to_csv(&rows), "Asset,Serial\n");
/// ```
pub fn rows_to_csv(rows: &[SheetRow]) -> String {
    let width = rows
        .iter()
        .flat_map(|r| r.cells.keys())
        .map(|c| letter_to_col(c))
        .max()
        .unwrap_or(0);

    let mut csv_content = String::new();
    for row in rows {
        for c in 1..=width {
            if c > 1 {
                csv_content.push(',');
            }
            csv_content.push_str(&escape_field(row.get(&col_to_letter(c))));
        }
        csv_content.push('\n');
    }
    csv_content
}

/// Convert data rows to a CSV report with mapped field names as header
///
/// Only mapped columns are written, in mapping order.
///
/// # Arguments
/// * `rows` - Data rows (header and banners already stripped)
/// * `mappings` - Column mappings defining which columns appear and their titles
///
/// # Returns
/// * `String` - CSV content including a header line
pub fn data_to_csv(rows: &[SheetRow], mappings: &[ColumnMapping]) -> String {
    let columns = ordered(mappings);
    let mut csv_content = String::new();

    let header: Vec<String> = columns.iter().map(|m| escape_field(&m.field_name)).collect();
    csv_content.push_str(&header.join(","));
    csv_content.push('\n');

    for row in rows {
        let line: Vec<String> = columns
            .iter()
            .map(|m| escape_field(row.get(&m.column_letter)))
            .collect();
        csv_content.push_str(&line.join(","));
        csv_content.push('\n');
    }
    csv_content
}

/// Convert data rows to XLSX format
///
/// Same layout as [`data_to_csv`], written with rust_xlsxwriter.
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
#[cfg(feature = "web")]
pub fn data_to_xlsx(rows: &[SheetRow], mappings: &[ColumnMapping]) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    let columns = ordered(mappings);
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    for (c, m) in columns.iter().enumerate() {
        worksheet.write_string(0, c as u16, m.field_name.as_str())?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, m) in columns.iter().enumerate() {
            worksheet.write_string((r + 1) as u32, c as u16, row.get(&m.column_letter))?;
        }
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Write CSV content to a file
pub fn write_csv_file(
    path: impl AsRef<std::path::Path>,
    content: &str,
) -> Result<(), Box<dyn Error>> {
    std::fs::write(path, content)?;
    Ok(())
}

fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
