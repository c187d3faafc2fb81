/*!
# Inventory Grid

Change tracking and header reconciliation for a spreadsheet-backed
inventory, built in Rust.

## Overview

Technicians walk a site, scan asset tags or serial numbers, and update
status fields in a grid that mirrors a remote spreadsheet. This crate is the
engine behind that grid: it finds the real header row under any banners,
tracks exactly the cells that were edited, keeps those edits on disk until
they are pushed, and pushes back only the rows that changed.

## Architecture

### Core
- **header**: Header row detection and the data-row offset
- **classify**: Device type tagging (desktop, laptop, printer, ...)
- **tracker**: Cell-level change set with durable persistence and restore
- **index_map**: View / clean / absolute row index translation, filtering and sorting
- **selection**: Checkbox selection with shift-click and drag
- **editor**: Cell edits and the rules that auto-fill related columns

### Boundaries
- **store**: Key-value storage for unsaved changes (files or memory)
- **remote**: Pull and push against the spreadsheet (memory or CSV files)
- **session**: One open sheet, wiring all of the above together

### Supporting modules
- **row**: Rows, column letters and the sheet arena
- **mapping**: Column mappings and role lookup
- **dates**: America/New_York dates for the verified stamp
- **user**: The signed-in user
- **config**: Runtime settings
- **loader** / **export**: CSV in, CSV/XLSX out
- **app**: HTTP routes (`web` feature)

## Row indices

Three index spaces are in play and are never mixed:

- *absolute*: position in the raw sheet, banners and header included
- *clean*: position among data rows, `absolute - total_offset`
- *view*: position in the filtered and sorted grid
*/

pub mod classify;
pub mod config;
pub mod dates;
pub mod editor;
pub mod error;
pub mod export;
pub mod header;
pub mod index_map;
pub mod loader;
pub mod mapping;
pub mod remote;
pub mod row;
pub mod selection;
pub mod session;
pub mod store;
pub mod tracker;
pub mod user;

#[cfg(feature = "web")]
pub mod app;

pub use error::{ConfigError, RemoteError, StoreError};
pub use header::{HeaderContext, compute_header_context};
pub use row::{SheetData, SheetRow};
pub use session::SheetSession;
pub use tracker::ChangeTracker;
