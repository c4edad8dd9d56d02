//! Command line surface.

use crate::dashboard::AuthMethod;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "meraki-vlan-sync", version)]
#[command(about = "Sync Meraki MX VLAN addressing with a spreadsheet.")]
pub struct CommandLine {
    /// Organization id, required by every remote command except check-api
    #[arg(long, global = true, env = "MERAKI_ORG_ID")]
    pub org: Option<String>,

    /// How to authenticate against the dashboard
    #[arg(long, global = true, value_enum, default_value_t = AuthMethod::ApiKey)]
    pub auth: AuthMethod,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify credentials and list the visible organizations
    CheckApi,
    /// Validate a spreadsheet offline and report every problem
    ValidateExcel {
        #[arg(long)]
        file: PathBuf,
    },
    /// Export the VLANs of all appliance networks to a spreadsheet
    ExportToExcel {
        /// Output path, defaults to a timestamped file under output/exports
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Create networks and VLANs and update VLAN addressing
    ApplyFromExcel(SheetArgs),
    /// Create the missing networks only
    CreateNetworks(SheetArgs),
    /// Create the missing VLANs in existing networks only
    CreateVlans(SheetArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SheetArgs {
    /// Spreadsheet (.xlsx or .csv) describing the desired VLANs
    #[arg(long)]
    pub file: PathBuf,

    /// Print the planned operations without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
