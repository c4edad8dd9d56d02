//! Meraki dashboard interaction.
//!
//! This module handles all dashboard-related operations:
//! - [`Dashboard`] - the calls the sync engine needs from the remote API
//! - [`client`] - reqwest implementation against the Dashboard API v1
//! - [`auth`] - API key and OAuth credentials
//! - [`snapshot`] - reading a [`crate::models::RemoteState`]

mod auth;
mod client;
mod snapshot;
mod types;

pub use auth::{authorization_url, get_auth_token, read_code, AuthMethod};
pub use client::MerakiClient;
pub use snapshot::{fetch_for_desired, fetch_for_export};
pub use types::{Network, Organization, Vlan, APPLIANCE};

use crate::error::RemoteError;
use crate::models::VlanRecord;
use async_trait::async_trait;

/// Remote resource store holding organizations, networks and VLANs.
#[async_trait]
pub trait Dashboard: Send + Sync {
    async fn list_organizations(&self) -> Result<Vec<Organization>, RemoteError>;

    async fn list_networks(&self, org_id: &str) -> Result<Vec<Network>, RemoteError>;

    /// Create an appliance network. Fails on a name conflict or unknown org.
    async fn create_network(&self, org_id: &str, name: &str) -> Result<Network, RemoteError>;

    /// Turn on VLAN mode, needed before VLANs can be listed or created.
    async fn enable_vlans(&self, network_id: &str) -> Result<(), RemoteError>;

    async fn list_vlans(&self, network_id: &str) -> Result<Vec<Vlan>, RemoteError>;

    async fn create_vlan(&self, network_id: &str, vlan: &VlanRecord) -> Result<Vlan, RemoteError>;

    /// Replace name, subnet and appliance IP of an existing VLAN.
    async fn update_vlan(&self, network_id: &str, vlan: &VlanRecord) -> Result<Vlan, RemoteError>;
}
