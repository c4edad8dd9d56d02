//! Mapping between spreadsheet rows and VLAN records.

use super::table::Table;
use crate::error::SchemaError;
use crate::models::VlanRecord;
use std::fmt;

/// The five recognized spreadsheet columns, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    NetworkName,
    VlanId,
    VlanName,
    Subnet,
    MxIp,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::NetworkName,
        Column::VlanId,
        Column::VlanName,
        Column::Subnet,
        Column::MxIp,
    ];

    /// Exact header text of the column.
    pub fn header(self) -> &'static str {
        match self {
            Column::NetworkName => "Network Name",
            Column::VlanId => "VLAN ID",
            Column::VlanName => "VLAN Name",
            Column::Subnet => "Subnet",
            Column::MxIp => "MX IP",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// The five recognized cells of one data row, trimmed but not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// Spreadsheet row number, the header being row 1.
    pub row: usize,
    pub network_name: String,
    pub vlan_id: String,
    pub vlan_name: String,
    pub subnet: String,
    pub mx_ip: String,
}

impl RawRow {
    pub fn get(&self, column: Column) -> &str {
        match column {
            Column::NetworkName => &self.network_name,
            Column::VlanId => &self.vlan_id,
            Column::VlanName => &self.vlan_name,
            Column::Subnet => &self.subnet,
            Column::MxIp => &self.mx_ip,
        }
    }

    /// Recognized columns left empty on this row.
    pub fn empty_columns(&self) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|c| self.get(*c).is_empty())
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.empty_columns().len() == Column::ALL.len()
    }
}

/// Locate the recognized columns and cut the table into [`RawRow`]s.
///
/// Every missing header is reported at once, before any data row is read.
/// Other columns are ignored. Trailing rows with all five cells blank are dropped.
pub fn parse_rows(table: &Table) -> Result<Vec<RawRow>, SchemaError> {
    if table.headers.is_empty() {
        return Err(SchemaError::NoHeader);
    }

    let mut positions = Vec::with_capacity(Column::ALL.len());
    let mut missing = Vec::new();
    for column in Column::ALL {
        match table.headers.iter().position(|h| h == column.header()) {
            Some(i) => positions.push(i),
            None => missing.push(column.header().to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing));
    }

    let cell = |cells: &[String], i: usize| -> String {
        cells.get(i).map(|c| c.trim().to_string()).unwrap_or_default()
    };

    let mut rows: Vec<RawRow> = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, cells)| RawRow {
            row: table.header_row + 1 + i,
            network_name: cell(cells, positions[0]),
            vlan_id: cell(cells, positions[1]),
            vlan_name: cell(cells, positions[2]),
            subnet: cell(cells, positions[3]),
            mx_ip: cell(cells, positions[4]),
        })
        .collect();

    while rows.last().is_some_and(RawRow::is_blank) {
        rows.pop();
    }
    log::debug!("parsed {} data rows from {} table rows", rows.len(), table.rows.len());

    Ok(rows)
}

/// Build the export table, one row per VLAN, in the fixed column order.
pub fn export_table(records: &[VlanRecord]) -> Table {
    Table {
        header_row: 1,
        headers: Column::ALL.iter().map(|c| c.header().to_string()).collect(),
        rows: records
            .iter()
            .map(|v| {
                vec![
                    v.network_name.clone(),
                    v.vlan_id.to_string(),
                    v.vlan_name.clone(),
                    v.subnet.to_string(),
                    v.appliance_ip.to_string(),
                ]
            })
            .collect(),
    }
}
