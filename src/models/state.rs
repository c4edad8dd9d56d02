//! Desired (spreadsheet) and remote (dashboard) state snapshots.

use super::{NetworkRecord, RemoteVlan, VlanRecord};
use std::collections::HashMap;
use std::fmt;

/// A validated VLAN record together with the spreadsheet row it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredVlan {
    pub row: usize,
    pub record: VlanRecord,
}

/// A network and its VLANs as the spreadsheet describes them.
#[derive(Debug, Clone)]
pub struct DesiredNetwork {
    pub network: NetworkRecord,
    pub vlans: Vec<DesiredVlan>,
}

/// Spreadsheet content grouped by network name.
///
/// Networks keep their first-seen order, VLANs keep their row order.
#[derive(Debug, Clone, Default)]
pub struct DesiredState {
    pub networks: Vec<DesiredNetwork>,
}

impl DesiredState {
    /// Group validated rows by network name.
    pub fn from_rows(rows: Vec<DesiredVlan>) -> DesiredState {
        let mut networks: Vec<DesiredNetwork> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for vlan in rows {
            let name = vlan.record.network_name.clone();
            match index.get(&name) {
                Some(&i) => networks[i].vlans.push(vlan),
                None => {
                    index.insert(name.clone(), networks.len());
                    networks.push(DesiredNetwork {
                        network: NetworkRecord::pending(&name),
                        vlans: vec![vlan],
                    });
                }
            }
        }

        DesiredState { networks }
    }

    /// Total number of VLAN rows.
    pub fn vlan_count(&self) -> usize {
        self.networks.iter().map(|n| n.vlans.len()).sum()
    }
}

/// A dashboard network with the VLANs listed for it.
#[derive(Debug, Clone)]
pub struct RemoteNetwork {
    pub network: NetworkRecord,
    /// Product types of the network, e.g. "appliance", "switch".
    pub product_types: Vec<String>,
    pub vlans: Vec<RemoteVlan>,
    /// Set when listing the VLANs of this network failed.
    pub unavailable: Option<String>,
}

impl RemoteNetwork {
    pub fn find_vlan(&self, vlan_id: u16) -> Option<&RemoteVlan> {
        self.vlans.iter().find(|v| v.vlan_id == vlan_id)
    }
}

/// Snapshot of the organization, read once per invocation.
#[derive(Debug, Clone, Default)]
pub struct RemoteState {
    pub networks: Vec<RemoteNetwork>,
}

impl RemoteState {
    /// Exact, case-sensitive lookup by network name.
    pub fn find_network(&self, name: &str) -> Option<&RemoteNetwork> {
        self.networks.iter().find(|n| n.network.name == name)
    }

    /// Every VLAN with complete addressing, in network then VLAN order.
    pub fn vlan_records(&self) -> Vec<VlanRecord> {
        self.networks
            .iter()
            .flat_map(|n| n.vlans.iter().filter_map(|v| v.to_record(&n.network.name)))
            .collect()
    }
}

impl fmt::Display for RemoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RemoteState ({} networks):", self.networks.len())?;
        for n in &self.networks {
            writeln!(
                f,
                "  - {} [{}] ({} vlans)",
                n.network.name,
                n.network.remote_id.as_deref().unwrap_or("-"),
                n.vlans.len()
            )?;
        }
        Ok(())
    }
}
