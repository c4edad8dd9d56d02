//! Output formatting for sync results.
//!
//! This module handles what the operator sees on stdout:
//! - [`report`] - validation, plan, apply and export reports
//! - [`terminal`] - column and rule helpers

mod report;
mod terminal;

pub use report::{
    plan_lines, print_apply_report, print_export_summary, print_organizations, print_plan,
    print_validation, row_line,
};
pub use terminal::{format_field, rule};
