//! Execute a [`Plan`] against the dashboard.
//!
//! Calls are issued one at a time in plan order. Within a network the first
//! failure aborts the rest of that network's rows; the next network is still
//! processed.

use super::reconcile::{NetworkAction, NetworkPlan, Operation, Plan, VlanAction};
use crate::dashboard::Dashboard;
use crate::models::DesiredVlan;
use colored::Colorize;
use std::fmt;

/// Which operation kinds a command is allowed to perform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    /// Create networks, create VLANs and update addressing.
    #[default]
    All,
    /// Create missing networks only.
    NetworksOnly,
    /// Create missing VLANs in existing networks only.
    VlanCreatesOnly,
}

impl Scope {
    fn allows_network_create(self) -> bool {
        matches!(self, Scope::All | Scope::NetworksOnly)
    }

    fn allows(self, action: &VlanAction) -> bool {
        match action {
            VlanAction::Create => matches!(self, Scope::All | Scope::VlanCreatesOnly),
            VlanAction::Update { .. } => self == Scope::All,
            VlanAction::Unchanged => true,
        }
    }

    fn touches_vlans(self) -> bool {
        self != Scope::NetworksOnly
    }
}

fn out_of_scope(action: &VlanAction) -> String {
    match action {
        VlanAction::Update { .. } => "addressing differs, update not in scope",
        _ => "VLAN creation not in scope",
    }
    .to_string()
}

fn missing_network(name: &str) -> String {
    format!("network '{name}' does not exist")
}

/// What a dry run expects an operation to do under a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Run,
    Skip(String),
    Fail(String),
}

/// Every operation of `plan` with the fate [`apply_plan`] would give it under `scope`.
///
/// Failures of dashboard calls can't be foreseen, only those decided by the scope.
pub fn preview(plan: &Plan, scope: Scope) -> Vec<(Operation, Preview)> {
    let mut ops = Vec::new();
    for network in &plan.networks {
        let missing = match network.action {
            NetworkAction::Unavailable { .. } => continue,
            NetworkAction::Existing { .. } => None,
            NetworkAction::Create => {
                let op = Operation::CreateNetwork {
                    name: network.name.clone(),
                };
                if scope.allows_network_create() {
                    ops.push((op, Preview::Run));
                    None
                } else {
                    ops.push((op, Preview::Skip("network creation not in scope".to_string())));
                    Some(missing_network(&network.name))
                }
            }
        };
        for planned in &network.vlans {
            let Some(op) = planned.operation() else {
                continue;
            };
            let fate = if !scope.allows(&planned.action) {
                Preview::Skip(out_of_scope(&planned.action))
            } else if let Some(why) = &missing {
                Preview::Fail(why.clone())
            } else {
                Preview::Run
            };
            ops.push((op, fate));
        }
    }
    ops
}

/// Result of one spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Dashboard already matches.
    Unchanged,
    Created,
    Updated,
    /// Not performed by this command.
    Skipped(String),
    /// Not attempted because an earlier step for the network failed.
    Aborted(String),
    Failed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Unchanged => write!(f, "ok (unchanged)"),
            Outcome::Created => write!(f, "created"),
            Outcome::Updated => write!(f, "updated"),
            Outcome::Skipped(why) => write!(f, "skipped: {why}"),
            Outcome::Aborted(why) => write!(f, "aborted: {why}"),
            Outcome::Failed(why) => write!(f, "failed: {why}"),
        }
    }
}

/// Result of the network step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkOutcome {
    Existing,
    Created(String),
    Skipped,
    Unavailable(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowResult {
    pub row: usize,
    pub network: String,
    pub vlan_id: u16,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkResult {
    pub name: String,
    pub outcome: NetworkOutcome,
}

/// Per-network and per-row results of one apply run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub scope: Scope,
    pub networks: Vec<NetworkResult>,
    pub rows: Vec<RowResult>,
}

impl ApplyReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn networks_created(&self) -> usize {
        self.networks
            .iter()
            .filter(|n| matches!(n.outcome, NetworkOutcome::Created(_)))
            .count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| *o == Outcome::Created)
    }

    pub fn updated(&self) -> usize {
        self.count(|o| *o == Outcome::Updated)
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| *o == Outcome::Unchanged)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn aborted(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Aborted(_)))
    }

    /// Failed rows plus failed network creations. Networks whose VLANs could
    /// not be read count only when the scope works on VLANs.
    pub fn failures(&self) -> usize {
        let scope = self.scope;
        self.count(|o| matches!(o, Outcome::Failed(_)))
            + self
                .networks
                .iter()
                .filter(|n| match n.outcome {
                    NetworkOutcome::Failed(_) => true,
                    NetworkOutcome::Unavailable(_) => scope.touches_vlans(),
                    _ => false,
                })
                .count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0 && self.aborted() == 0
    }

    fn push_row(&mut self, vlan: &DesiredVlan, outcome: Outcome) {
        match &outcome {
            Outcome::Failed(_) | Outcome::Aborted(_) => log::warn!(
                "row {} {}: {}",
                vlan.row,
                vlan.record,
                outcome.to_string().on_red()
            ),
            _ => log::info!("row {} {}: {}", vlan.row, vlan.record, outcome),
        }
        self.rows.push(RowResult {
            row: vlan.row,
            network: vlan.record.network_name.clone(),
            vlan_id: vlan.record.vlan_id,
            outcome,
        });
    }
}

/// Perform the operations of `plan` allowed by `scope`, in order.
pub async fn apply_plan<D: Dashboard + ?Sized>(
    client: &D,
    org_id: &str,
    plan: &Plan,
    scope: Scope,
) -> ApplyReport {
    let mut report = ApplyReport {
        scope,
        ..Default::default()
    };
    for network in &plan.networks {
        apply_network(client, org_id, network, scope, &mut report).await;
    }
    log::info!(
        "apply done: networks_created={} created={} updated={} unchanged={} skipped={} aborted={} failed={}",
        report.networks_created(),
        report.created(),
        report.updated(),
        report.unchanged(),
        report.skipped(),
        report.aborted(),
        report.failures()
    );
    report
}

async fn apply_network<D: Dashboard + ?Sized>(
    client: &D,
    org_id: &str,
    network: &NetworkPlan,
    scope: Scope,
    report: &mut ApplyReport,
) {
    // network id to use for VLAN calls, or the outcome of every VLAN row when there is none
    let target: Result<String, Outcome> = match &network.action {
        NetworkAction::Existing { remote_id } => {
            report.networks.push(NetworkResult {
                name: network.name.clone(),
                outcome: NetworkOutcome::Existing,
            });
            Ok(remote_id.clone())
        }
        NetworkAction::Unavailable { reason, .. } => {
            report.networks.push(NetworkResult {
                name: network.name.clone(),
                outcome: NetworkOutcome::Unavailable(reason.clone()),
            });
            Err(Outcome::Aborted(format!(
                "VLANs of network '{}' unavailable",
                network.name
            )))
        }
        NetworkAction::Create if !scope.allows_network_create() => {
            report.networks.push(NetworkResult {
                name: network.name.clone(),
                outcome: NetworkOutcome::Skipped,
            });
            Err(Outcome::Failed(missing_network(&network.name)))
        }
        NetworkAction::Create => {
            let outcome = create_network(client, org_id, &network.name).await;
            let target = match &outcome {
                NetworkOutcome::Created(id) => Ok(id.clone()),
                _ => Err(Outcome::Aborted(format!(
                    "network '{}' could not be created",
                    network.name
                ))),
            };
            report.networks.push(NetworkResult {
                name: network.name.clone(),
                outcome,
            });
            target
        }
    };

    let mut failed: Option<String> = None;
    for planned in &network.vlans {
        let vlan = &planned.vlan;
        if planned.action == VlanAction::Unchanged {
            report.push_row(vlan, Outcome::Unchanged);
            continue;
        }
        if !scope.allows(&planned.action) {
            report.push_row(vlan, Outcome::Skipped(out_of_scope(&planned.action)));
            continue;
        }
        let network_id = match &target {
            Ok(id) => id,
            Err(outcome) => {
                report.push_row(vlan, outcome.clone());
                continue;
            }
        };
        if let Some(why) = &failed {
            report.push_row(vlan, Outcome::Aborted(why.clone()));
            continue;
        }

        let outcome = match &planned.action {
            VlanAction::Create => match client.create_vlan(network_id, &vlan.record).await {
                Ok(_) => Outcome::Created,
                Err(e) => Outcome::Failed(e.to_string()),
            },
            VlanAction::Update { .. } => match client.update_vlan(network_id, &vlan.record).await {
                Ok(_) => Outcome::Updated,
                Err(e) => Outcome::Failed(e.to_string()),
            },
            VlanAction::Unchanged => Outcome::Unchanged,
        };
        if matches!(outcome, Outcome::Failed(_)) {
            failed = Some(format!("earlier failure on row {}", vlan.row));
        }
        report.push_row(vlan, outcome);
    }
}

/// Create `name` and switch VLAN mode on so VLANs can be added to it.
async fn create_network<D: Dashboard + ?Sized>(
    client: &D,
    org_id: &str,
    name: &str,
) -> NetworkOutcome {
    let created = match client.create_network(org_id, name).await {
        Ok(network) => network,
        Err(e) => {
            log::warn!(
                "{} CreateNetwork('{name}'): {e}",
                "failed".on_red()
            );
            return NetworkOutcome::Failed(e.to_string());
        }
    };
    log::info!("created network '{name}' id={}", created.id);
    if let Err(e) = client.enable_vlans(&created.id).await {
        log::warn!(
            "{} enabling VLANs on '{name}': {e}",
            "failed".on_red()
        );
        return NetworkOutcome::Failed(format!("created as {} but VLANs not enabled: {e}", created.id));
    }
    NetworkOutcome::Created(created.id)
}
