//! VLAN sync processing logic.
//!
//! This module contains the business logic between spreadsheet and dashboard:
//! - [`validate`] - Field and row validation of spreadsheet rows
//! - [`reconcile`] - Planning create/update operations against the remote state
//! - [`apply`] - Executing a plan through the [`crate::dashboard::Dashboard`] facade

mod apply;
mod reconcile;
mod validate;

// Re-export public functions
pub use apply::{
    apply_plan, preview, ApplyReport, NetworkOutcome, NetworkResult, Outcome, Preview,
    RowResult, Scope,
};
pub use reconcile::{
    reconcile, NetworkAction, NetworkPlan, Operation, Plan, PlannedVlan, VlanAction,
};
pub use validate::{
    parse_ip, validate_mx_ip, validate_name, validate_row, validate_rows, validate_subnet,
    validate_vlan_id, ValidationReport, VLAN_ID_MAX, VLAN_ID_MIN,
};
