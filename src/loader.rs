use crate::error::RemoteError;
use crate::row::SheetRow;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Load raw sheet rows from a CSV file
///
/// Every record becomes one [`SheetRow`], banner and header lines included;
/// header detection happens later. Fields are assigned column letters
/// A, B, C, ... in order. Trailing empty fields are kept so row widths
/// survive a round trip.
///
/// # Arguments
/// * `filepath` - Path to the CSV file to load
///
/// # Returns
/// * `Result<Vec<SheetRow>, RemoteError>` - The rows in file order or an error
///
/// # Examples
/// ```no_run
/// use inventory_grid::loader::from_csv;
///
/// match from_csv("inventory.csv") {
///     Ok(rows) => println!("Loaded {} raw rows", rows.len()),
///     Err(e) => eprintln!("Error loading CSV: {}", e),
/// }
/// ```
pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Vec<SheetRow>, RemoteError> {
    let mut file = File::open(filepath)?;
    let mut text = String::new();
    file.read_to_string(&mut text)?;

    from_csv_str(&text)
}

/// Parse CSV text that is already in memory.
///
/// Quoted fields may span lines. A trailing newline does not start an
/// extra row.
pub fn from_csv_str(text: &str) -> Result<Vec<SheetRow>, RemoteError> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut row_open = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Double quote inside quoted field - add a single quote
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                // End of field
                fields.push(std::mem::take(&mut current_field));
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                // End of row
                fields.push(std::mem::take(&mut current_field));
                rows.push(SheetRow::from_values(std::mem::take(&mut fields)));
                row_open = false;
                continue;
            }
            _ => {
                current_field.push(c);
            }
        }
        row_open = true;
    }

    if in_quotes {
        return Err(RemoteError::Malformed(format!(
            "unterminated quote in row {}",
            rows.len() + 1
        )));
    }

    // Last row without a trailing newline
    if row_open {
        fields.push(current_field);
        rows.push(SheetRow::from_values(fields));
    }

    Ok(rows)
}
