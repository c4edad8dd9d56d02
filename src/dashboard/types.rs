//! JSON shapes of the dashboard API.

use crate::models::{Ipv4, NetworkRecord, RemoteVlan, VlanRecord};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;

/// Product type a network needs to carry appliance VLANs.
pub const APPLIANCE: &str = "appliance";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub product_types: Vec<String>,
}

impl Network {
    pub fn to_record(&self) -> NetworkRecord {
        NetworkRecord {
            name: self.name.clone(),
            remote_id: Some(self.id.clone()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vlan {
    #[serde(deserialize_with = "vlan_id_from_number_or_string")]
    pub id: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subnet: Option<String>,
    #[serde(default)]
    pub appliance_ip: Option<String>,
}

impl Vlan {
    /// Parse the addressing fields; unparseable values become `None`.
    pub fn to_remote(&self) -> RemoteVlan {
        let subnet = self.subnet.as_deref().and_then(|s| match Ipv4::new(s) {
            Ok(cidr) => Some(cidr.network()),
            Err(e) => {
                log::debug!("vlan {} subnet '{s}' ignored: {e}", self.id);
                None
            }
        });
        let appliance_ip = self
            .appliance_ip
            .as_deref()
            .and_then(|ip| ip.trim().parse::<Ipv4Addr>().ok());
        RemoteVlan {
            vlan_id: self.id,
            vlan_name: self.name.clone(),
            subnet,
            appliance_ip,
        }
    }
}

/// The API returns VLAN ids as strings in some versions and numbers in others.
fn vlan_id_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => u16::try_from(n)
            .map_err(|_| de::Error::custom(format!("VLAN id out of range: {n}"))),
        NumberOrString::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid VLAN id: {s}"))),
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateNetworkRequest<'a> {
    pub name: &'a str,
    pub product_types: Vec<&'a str>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VlanSettingsRequest {
    pub vlans_enabled: bool,
}

/// Body of VLAN create (with `id`) and update (without) calls.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VlanRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: &'a str,
    pub subnet: Ipv4,
    pub appliance_ip: Ipv4Addr,
}

impl<'a> VlanRequest<'a> {
    pub fn create(vlan: &'a VlanRecord) -> VlanRequest<'a> {
        VlanRequest {
            id: Some(vlan.vlan_id.to_string()),
            ..VlanRequest::update(vlan)
        }
    }

    pub fn update(vlan: &'a VlanRecord) -> VlanRequest<'a> {
        VlanRequest {
            id: None,
            name: &vlan.vlan_name,
            subnet: vlan.subnet,
            appliance_ip: vlan.appliance_ip,
        }
    }
}

/// Error body of a failed call: `{"errors": ["..."]}`.
#[derive(Deserialize, Debug)]
pub struct ApiErrors {
    #[serde(default)]
    pub errors: Vec<String>,
}
