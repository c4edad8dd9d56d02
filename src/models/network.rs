//! Network and VLAN addressing records.

use super::Ipv4;
use std::fmt;
use std::net::Ipv4Addr;

/// A dashboard network, identified by name within an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRecord {
    /// Network name, the identity key within an organization.
    pub name: String,
    /// Dashboard network id, `None` until the network exists remotely.
    pub remote_id: Option<String>,
}

impl NetworkRecord {
    /// A network that only exists in the spreadsheet so far.
    pub fn pending(name: &str) -> NetworkRecord {
        NetworkRecord {
            name: name.to_string(),
            remote_id: None,
        }
    }
}

/// One VLAN addressing record of a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanRecord {
    /// Name of the network this VLAN belongs to.
    pub network_name: String,
    /// VLAN id (1-4094), unique within its network.
    pub vlan_id: u16,
    /// Display label of the VLAN.
    pub vlan_name: String,
    /// Subnet, always stored with host bits cleared.
    pub subnet: Ipv4,
    /// MX appliance (gateway) address inside `subnet`.
    pub appliance_ip: Ipv4Addr,
}

impl fmt::Display for VlanRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/vlan{} '{}' {} gw {}",
            self.network_name, self.vlan_id, self.vlan_name, self.subnet, self.appliance_ip
        )
    }
}

/// A VLAN as listed by the dashboard.
///
/// Addressing is optional since the dashboard can hold VLANs without a
/// subnet or appliance address, or with values this tool can not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVlan {
    pub vlan_id: u16,
    pub vlan_name: String,
    pub subnet: Option<Ipv4>,
    pub appliance_ip: Option<Ipv4Addr>,
}

impl RemoteVlan {
    /// Complete addressing record, `None` when subnet or appliance IP is missing.
    pub fn to_record(&self, network_name: &str) -> Option<VlanRecord> {
        Some(VlanRecord {
            network_name: network_name.to_string(),
            vlan_id: self.vlan_id,
            vlan_name: self.vlan_name.clone(),
            subnet: self.subnet?,
            appliance_ip: self.appliance_ip?,
        })
    }

    /// True when name, subnet or appliance IP differ from `desired`.
    pub fn differs_from(&self, desired: &VlanRecord) -> bool {
        self.vlan_name != desired.vlan_name
            || self.subnet.map(|s| s.network()) != Some(desired.subnet)
            || self.appliance_ip != Some(desired.appliance_ip)
    }
}
