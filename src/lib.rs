//! Keep Meraki MX VLAN addressing in sync with a spreadsheet.
//!
//! - [`sheet`] - `.xlsx` / `.csv` read and write
//! - [`processing`] - validation, reconciliation and apply
//! - [`dashboard`] - Meraki Dashboard API client and auth
//! - [`output`] - operator reports
//! - [`commands`] - the CLI subcommands

pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;
pub mod sheet;

pub use commands::run;
pub use error::SyncError;
