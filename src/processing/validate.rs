//! Field validation of spreadsheet rows.
//!
//! Every validator is a pure function from the raw cell text to a typed value.
//! Row validation collects all violations instead of stopping at the first.

use crate::error::{ValidationError, ValidationErrorKind};
use crate::models::{DesiredState, DesiredVlan, Ipv4, VlanRecord};
use crate::sheet::{Column, RawRow};
use itertools::Itertools;
use regex::Regex;
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::OnceLock;

/// Lowest and highest usable VLAN id.
pub const VLAN_ID_MIN: i64 = 1;
pub const VLAN_ID_MAX: i64 = 4094;

static NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn name_regex() -> &'static Regex {
    NAME_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9 .@#_-]+$").expect("Invalid Regex"))
}

/// Network or VLAN name: letters, digits, space and `. @ # _ -`.
pub fn validate_name(raw: &str) -> Result<String, ValidationErrorKind> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationErrorKind::Empty);
    }
    if !name_regex().is_match(name) {
        return Err(ValidationErrorKind::InvalidCharacters(name.to_string()));
    }
    Ok(name.to_string())
}

/// VLAN id in 1..=4094. A zero fraction ("10.0") is accepted, exponents are not.
pub fn validate_vlan_id(raw: &str) -> Result<u16, ValidationErrorKind> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationErrorKind::Empty);
    }
    let digits = match value.split_once('.') {
        Some((int, frac)) if !frac.is_empty() && frac.chars().all(|c| c == '0') => int,
        _ => value,
    };
    let id = digits
        .parse::<i64>()
        .map_err(|_| ValidationErrorKind::NotAnInteger(value.to_string()))?;
    if !(VLAN_ID_MIN..=VLAN_ID_MAX).contains(&id) {
        return Err(ValidationErrorKind::VlanIdOutOfRange(id));
    }
    Ok(id as u16)
}

/// IPv4 CIDR, normalized to its network address.
pub fn validate_subnet(raw: &str) -> Result<Ipv4, ValidationErrorKind> {
    if raw.trim().is_empty() {
        return Err(ValidationErrorKind::Empty);
    }
    Ipv4::new(raw)
        .map(|cidr| cidr.network())
        .map_err(ValidationErrorKind::InvalidSubnet)
}

/// IPv4 address syntax only.
pub fn parse_ip(raw: &str) -> Result<Ipv4Addr, ValidationErrorKind> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationErrorKind::Empty);
    }
    match Ipv4Addr::from_str(value) {
        Ok(ip) => Ok(ip),
        Err(_) if Ipv6Addr::from_str(value).is_ok() => {
            Err(ValidationErrorKind::AddressFamily(value.to_string()))
        }
        Err(_) => Err(ValidationErrorKind::InvalidIp(value.to_string())),
    }
}

/// Appliance address strictly inside the host range of `subnet`.
pub fn validate_mx_ip(raw: &str, subnet: &Ipv4) -> Result<Ipv4Addr, ValidationErrorKind> {
    let ip = parse_ip(raw)?;
    let subnet_str = subnet.to_string();
    if !subnet.contains(ip) {
        return Err(ValidationErrorKind::OutsideSubnet {
            ip,
            subnet: subnet_str,
        });
    }
    if ip == subnet.lo() {
        return Err(ValidationErrorKind::NetworkAddress {
            ip,
            subnet: subnet_str,
        });
    }
    if ip == subnet.hi() {
        return Err(ValidationErrorKind::BroadcastAddress {
            ip,
            subnet: subnet_str,
        });
    }
    Ok(ip)
}

/// Run `check` on a non-empty cell, recording a failure against its column.
/// Empty cells yield `None` and are reported once as an incomplete row.
fn check_field<T>(
    raw: &RawRow,
    column: Column,
    errors: &mut Vec<ValidationError>,
    check: impl FnOnce(&str) -> Result<T, ValidationErrorKind>,
) -> Option<T> {
    let value = raw.get(column);
    if value.is_empty() {
        return None;
    }
    check(value)
        .map_err(|kind| errors.push(ValidationError::new(raw.row, column, kind)))
        .ok()
}

/// Validate every field of one row.
pub fn validate_row(raw: &RawRow) -> Result<DesiredVlan, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let empty = raw.empty_columns();
    if !empty.is_empty() {
        errors.push(ValidationError::row(
            raw.row,
            ValidationErrorKind::IncompleteRow(empty.iter().join(", ")),
        ));
    }

    let network_name = check_field(raw, Column::NetworkName, &mut errors, validate_name);
    let vlan_id = check_field(raw, Column::VlanId, &mut errors, validate_vlan_id);
    let vlan_name = check_field(raw, Column::VlanName, &mut errors, validate_name);
    let subnet = check_field(raw, Column::Subnet, &mut errors, validate_subnet);
    let appliance_ip = match subnet {
        Some(subnet) => check_field(raw, Column::MxIp, &mut errors, |v| {
            validate_mx_ip(v, &subnet)
        }),
        // syntax only, membership can not be checked without a subnet
        None => check_field(raw, Column::MxIp, &mut errors, parse_ip),
    };

    match (network_name, vlan_id, vlan_name, subnet, appliance_ip) {
        (Some(network_name), Some(vlan_id), Some(vlan_name), Some(subnet), Some(appliance_ip))
            if errors.is_empty() =>
        {
            Ok(DesiredVlan {
                row: raw.row,
                record: VlanRecord {
                    network_name,
                    vlan_id,
                    vlan_name,
                    subnet,
                    appliance_ip,
                },
            })
        }
        _ => Err(errors),
    }
}

/// Outcome of validating a whole spreadsheet.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Number of data rows checked.
    pub row_count: usize,
    pub valid: Vec<DesiredVlan>,
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Group the valid rows into the desired state.
    pub fn into_desired_state(self) -> DesiredState {
        DesiredState::from_rows(self.valid)
    }
}

/// Validate all rows and reject repeated (network, VLAN id) pairs.
pub fn validate_rows(rows: &[RawRow]) -> ValidationReport {
    let mut report = ValidationReport {
        row_count: rows.len(),
        ..Default::default()
    };
    let mut first_seen: HashMap<(String, u16), usize> = HashMap::new();

    for raw in rows {
        let mut row_errors = match validate_row(raw) {
            Ok(vlan) => {
                report.valid.push(vlan);
                Vec::new()
            }
            Err(errors) => errors,
        };

        if let (Ok(network), Ok(vlan_id)) = (
            validate_name(&raw.network_name),
            validate_vlan_id(&raw.vlan_id),
        ) {
            let key = (network.clone(), vlan_id);
            if let Some(&first_row) = first_seen.get(&key) {
                report.valid.retain(|v| v.row != raw.row);
                row_errors.push(ValidationError::row(
                    raw.row,
                    ValidationErrorKind::DuplicateVlan {
                        network,
                        vlan_id,
                        first_row,
                    },
                ));
            } else {
                first_seen.insert(key, raw.row);
            }
        }

        report.errors.extend(row_errors);
    }

    log::info!(
        "validated {} rows: {} valid, {} errors",
        report.row_count,
        report.valid.len(),
        report.errors.len()
    );
    report
}
