//! Spreadsheet adapter.
//!
//! - [`table`] - raw `.xlsx` / `.csv` read and write
//! - [`columns`] - header lookup and row mapping to and from VLAN records

mod columns;
mod table;

pub use columns::{export_table, parse_rows, Column, RawRow};
pub use table::{read_table, write_table, Table};

use crate::error::SyncError;
use crate::models::VlanRecord;
use std::path::Path;

/// Read `path` and return its data rows, failing fast on a schema problem.
pub fn read_raw_rows(path: &Path) -> Result<Vec<RawRow>, SyncError> {
    let table = read_table(path)?;
    let rows = parse_rows(&table)?;
    Ok(rows)
}

/// Write one row per VLAN record to `path`.
pub fn write_vlans(path: &Path, records: &[VlanRecord]) -> Result<(), SyncError> {
    write_table(path, &export_table(records))?;
    Ok(())
}
