//! Command handlers behind the CLI subcommands.
//!
//! Handlers that talk to the dashboard take any [`Dashboard`] so they can be
//! driven by the real [`MerakiClient`] or by an in-memory store.

use crate::cli::{Commands, CommandLine, SheetArgs};
use crate::config::{self, Config};
use crate::dashboard::{
    fetch_for_desired, fetch_for_export, get_auth_token, AuthMethod, Dashboard, MerakiClient,
    Organization,
};
use crate::error::{AuthError, RemoteError, SyncError};
use crate::models::DesiredState;
use crate::output;
use crate::processing::{apply_plan, reconcile, validate_rows, ApplyReport, Plan, Scope, ValidationReport};
use crate::sheet::{read_raw_rows, write_vlans};
use chrono::{DateTime, Local};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// What a sync command did.
#[derive(Debug)]
pub enum SyncRun {
    /// Plan only, nothing was changed.
    DryRun(Plan),
    Applied(ApplyReport),
}

impl SyncRun {
    pub fn is_success(&self) -> bool {
        match self {
            SyncRun::DryRun(_) => true,
            SyncRun::Applied(report) => report.is_success(),
        }
    }
}

/// 401/403 on the first call means the credentials are no good.
fn rejected(e: RemoteError) -> SyncError {
    match e.status {
        Some(401) | Some(403) => SyncError::Auth(AuthError::Rejected(e)),
        _ => SyncError::Remote(e),
    }
}

/// List organizations, failing when `org_id` is given but not among them.
pub async fn check_api<D: Dashboard + ?Sized>(
    client: &D,
    org_id: Option<&str>,
) -> Result<Vec<Organization>, SyncError> {
    log::info!("#Start check_api()");
    let orgs = client.list_organizations().await.map_err(rejected)?;
    output::print_organizations(&orgs);
    if let Some(org_id) = org_id {
        if !orgs.iter().any(|o| o.id == org_id) {
            return Err(SyncError::UnknownOrganization(org_id.to_string()));
        }
        println!("Organization {org_id} is accessible");
    }
    Ok(orgs)
}

async fn ensure_org<D: Dashboard + ?Sized>(client: &D, org_id: &str) -> Result<(), SyncError> {
    let orgs = client.list_organizations().await.map_err(rejected)?;
    match orgs.iter().find(|o| o.id == org_id) {
        Some(org) => {
            log::info!("using organization {} ({})", org.name, org.id);
            Ok(())
        }
        None => Err(SyncError::UnknownOrganization(org_id.to_string())),
    }
}

/// Validate `path` offline and print every violation.
pub fn validate_excel(path: &Path) -> Result<ValidationReport, SyncError> {
    log::info!("#Start validate_excel() file={}", path.display());
    let rows = read_raw_rows(path)?;
    let report = validate_rows(&rows);
    output::print_validation(&report);
    if !report.is_valid() {
        return Err(SyncError::Validation(report.errors.len()));
    }
    Ok(report)
}

/// Read and validate `path` into the desired state; invalid rows stop here.
pub fn load_desired(path: &Path) -> Result<DesiredState, SyncError> {
    let rows = read_raw_rows(path)?;
    let report = validate_rows(&rows);
    if !report.is_valid() {
        output::print_validation(&report);
        return Err(SyncError::Validation(report.errors.len()));
    }
    let desired = report.into_desired_state();
    log::info!(
        "spreadsheet {}: {} networks, {} VLANs",
        path.display(),
        desired.networks.len(),
        desired.vlan_count()
    );
    Ok(desired)
}

/// `output/exports/meraki_vlan_export_<org>_<YYYYmmdd_HHMMSS>.xlsx`
pub fn default_export_path(org_id: &str, now: DateTime<Local>) -> PathBuf {
    Path::new(config::EXPORT_DIR).join(format!(
        "meraki_vlan_export_{org_id}_{}.xlsx",
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// Write every appliance VLAN of the org to a spreadsheet.
pub async fn export_to_excel<D: Dashboard + ?Sized>(
    client: &D,
    org_id: &str,
    file: Option<&Path>,
) -> Result<PathBuf, SyncError> {
    log::info!("#Start export_to_excel() org={org_id}");
    ensure_org(client, org_id).await?;
    let state = fetch_for_export(client, org_id).await?;
    let records = state.vlan_records();
    if records.is_empty() {
        return Err(SyncError::NoData);
    }

    let path = match file {
        Some(path) => path.to_path_buf(),
        None => default_export_path(org_id, Local::now()),
    };
    write_vlans(&path, &records)?;
    output::print_export_summary(&path, records.len(), state.networks.len());
    Ok(path)
}

/// Reconcile `desired` with the org and apply, or only print, the plan.
pub async fn sync_desired<D: Dashboard + ?Sized>(
    client: &D,
    org_id: &str,
    desired: &DesiredState,
    scope: Scope,
    dry_run: bool,
) -> Result<SyncRun, SyncError> {
    log::info!("#Start sync_desired() org={org_id} scope={scope:?} dry_run={dry_run}");
    ensure_org(client, org_id).await?;
    let remote = fetch_for_desired(client, org_id, desired).await?;
    let plan = reconcile(desired, &remote);

    if dry_run {
        output::print_plan(&plan, scope);
        return Ok(SyncRun::DryRun(plan));
    }
    let report = apply_plan(client, org_id, &plan, scope).await;
    output::print_apply_report(&report);
    Ok(SyncRun::Applied(report))
}

async fn connect(method: AuthMethod, config: &Config) -> Result<MerakiClient, SyncError> {
    let token = get_auth_token(method, config).await?;
    Ok(MerakiClient::new(config, token)?)
}

fn require_org(org: Option<&str>) -> Result<&str, SyncError> {
    org.filter(|o| !o.trim().is_empty())
        .ok_or(SyncError::MissingOrganization)
}

async fn sync_command(
    cli_org: Option<&str>,
    method: AuthMethod,
    config: &Config,
    args: &SheetArgs,
    scope: Scope,
) -> Result<(), SyncError> {
    let org_id = require_org(cli_org)?;
    // bad spreadsheets fail before any credentials are needed
    let desired = load_desired(&args.file)?;
    let client = connect(method, config).await?;
    let run = sync_desired(&client, org_id, &desired, scope, args.dry_run).await?;
    match run {
        SyncRun::Applied(report) if !report.is_success() => {
            Err(SyncError::Apply(report.failures() + report.aborted()))
        }
        _ => Ok(()),
    }
}

/// Run one parsed command line to completion.
pub async fn run(cli: CommandLine) -> Result<(), SyncError> {
    let config = Config::from_env()?;
    let org = cli.org.as_deref();

    match &cli.command {
        Commands::CheckApi => {
            let client = connect(cli.auth, &config).await?;
            check_api(&client, org).await?;
        }
        Commands::ValidateExcel { file } => {
            validate_excel(file)?;
        }
        Commands::ExportToExcel { file } => {
            let org_id = require_org(org)?;
            let client = connect(cli.auth, &config).await?;
            export_to_excel(&client, org_id, file.as_deref()).await?;
        }
        Commands::ApplyFromExcel(args) => {
            sync_command(org, cli.auth, &config, args, Scope::All).await?;
        }
        Commands::CreateNetworks(args) => {
            sync_command(org, cli.auth, &config, args, Scope::NetworksOnly).await?;
        }
        Commands::CreateVlans(args) => {
            sync_command(org, cli.auth, &config, args, Scope::VlanCreatesOnly).await?;
        }
    }
    println!("{}", "Done".green());
    Ok(())
}
