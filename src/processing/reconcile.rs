//! Reconciliation of the spreadsheet against the dashboard snapshot.
//!
//! Networks are matched by exact name and VLANs by id within a matched
//! network. Nothing is ever deleted: a changed VLAN id or network name shows
//! up as a new VLAN or network, and the old one is left alone.

use crate::models::{DesiredState, DesiredVlan, RemoteState, RemoteVlan, VlanRecord};
use std::fmt;

/// What happens to a desired network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkAction {
    /// Exists in the dashboard under this id.
    Existing { remote_id: String },
    /// Not found by name, will be created.
    Create,
    /// Exists, but its VLANs could not be listed.
    Unavailable { remote_id: String, reason: String },
}

/// What happens to a desired VLAN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VlanAction {
    Create,
    /// Addressing differs from `current`.
    Update { current: RemoteVlan },
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedVlan {
    pub vlan: DesiredVlan,
    pub action: VlanAction,
}

impl PlannedVlan {
    /// The mutation this VLAN needs, `None` when unchanged.
    pub fn operation(&self) -> Option<Operation> {
        let row = self.vlan.row;
        let vlan = self.vlan.record.clone();
        match &self.action {
            VlanAction::Create => Some(Operation::CreateVlan { row, vlan }),
            VlanAction::Update { current } => Some(Operation::UpdateVlanAddressing {
                row,
                vlan,
                current: current.clone(),
            }),
            VlanAction::Unchanged => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPlan {
    pub name: String,
    pub action: NetworkAction,
    pub vlans: Vec<PlannedVlan>,
}

/// Per-network actions in spreadsheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub networks: Vec<NetworkPlan>,
}

/// A single dashboard mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CreateNetwork {
        name: String,
    },
    CreateVlan {
        row: usize,
        vlan: VlanRecord,
    },
    UpdateVlanAddressing {
        row: usize,
        vlan: VlanRecord,
        current: RemoteVlan,
    },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateNetwork { name } => write!(f, "CreateNetwork('{name}')"),
            Operation::CreateVlan { row, vlan } => {
                write!(f, "row {row}: CreateVlan({vlan})")
            }
            Operation::UpdateVlanAddressing { row, vlan, current } => {
                let show = |v: Option<String>| v.unwrap_or_else(|| "none".to_string());
                write!(
                    f,
                    "row {row}: UpdateVlanAddressing({vlan}) was '{}' {} gw {}",
                    current.vlan_name,
                    show(current.subnet.map(|s| s.to_string())),
                    show(current.appliance_ip.map(|ip| ip.to_string())),
                )
            }
        }
    }
}

/// Match `desired` against `remote` and decide an action for every network and VLAN.
pub fn reconcile(desired: &DesiredState, remote: &RemoteState) -> Plan {
    let mut plan = Plan::default();

    for wanted in &desired.networks {
        let name = wanted.network.name.clone();
        let found = remote.find_network(&name);

        let action = match found {
            None => NetworkAction::Create,
            Some(network) => {
                let remote_id = network.network.remote_id.clone().unwrap_or_default();
                match &network.unavailable {
                    Some(reason) => NetworkAction::Unavailable {
                        remote_id,
                        reason: reason.clone(),
                    },
                    None => NetworkAction::Existing { remote_id },
                }
            }
        };

        let vlans = wanted
            .vlans
            .iter()
            .map(|vlan| {
                let current = found.and_then(|n| n.find_vlan(vlan.record.vlan_id));
                let action = match current {
                    None => VlanAction::Create,
                    Some(current) if current.differs_from(&vlan.record) => VlanAction::Update {
                        current: current.clone(),
                    },
                    Some(_) => VlanAction::Unchanged,
                };
                PlannedVlan {
                    vlan: vlan.clone(),
                    action,
                }
            })
            .collect();

        plan.networks.push(NetworkPlan {
            name,
            action,
            vlans,
        });
    }

    log::info!(
        "plan: {} networks, {} operations",
        plan.networks.len(),
        plan.operations().len()
    );
    plan
}

impl Plan {
    /// Mutations in execution order. Networks whose VLANs could not be
    /// listed contribute none.
    pub fn operations(&self) -> Vec<Operation> {
        let mut ops = Vec::new();
        for network in &self.networks {
            match network.action {
                NetworkAction::Unavailable { .. } => continue,
                NetworkAction::Create => ops.push(Operation::CreateNetwork {
                    name: network.name.clone(),
                }),
                NetworkAction::Existing { .. } => {}
            }
            ops.extend(network.vlans.iter().filter_map(PlannedVlan::operation));
        }
        ops
    }

    pub fn unchanged_count(&self) -> usize {
        self.networks
            .iter()
            .flat_map(|n| &n.vlans)
            .filter(|v| v.action == VlanAction::Unchanged)
            .count()
    }
}
