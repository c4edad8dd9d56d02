//! Read the organization into a [`RemoteState`] snapshot.

use super::{Dashboard, Network};
use crate::error::RemoteError;
use crate::models::{DesiredState, RemoteNetwork, RemoteState};
use colored::Colorize;
use std::collections::HashSet;

/// List the VLANs of `network`; a failure is kept on the network, not raised.
async fn with_vlans<D: Dashboard + ?Sized>(client: &D, network: &Network) -> RemoteNetwork {
    let mut remote = RemoteNetwork {
        network: network.to_record(),
        product_types: network.product_types.clone(),
        vlans: Vec::new(),
        unavailable: None,
    };
    match client.list_vlans(&network.id).await {
        Ok(vlans) => {
            log::debug!("network '{}': {} vlans", network.name, vlans.len());
            remote.vlans = vlans.iter().map(|v| v.to_remote()).collect();
        }
        Err(e) => {
            log::warn!(
                "{warning} Could not retrieve VLAN data for network {}: {e}",
                network.name,
                warning = "Warning:".on_yellow()
            );
            remote.unavailable = Some(e.to_string());
        }
    }
    remote
}

/// Appliance networks of the org with their VLANs.
pub async fn fetch_for_export<D: Dashboard + ?Sized>(
    client: &D,
    org_id: &str,
) -> Result<RemoteState, RemoteError> {
    log::info!("Fetching networks for organization {org_id}...");
    let networks = client.list_networks(org_id).await?;
    let appliances: Vec<&Network> = networks
        .iter()
        .filter(|n| n.product_types.iter().any(|p| p == super::APPLIANCE))
        .collect();
    log::info!("Found {} networks with MX appliances", appliances.len());

    let mut state = RemoteState::default();
    for network in appliances {
        log::info!("Processing network: {}", network.name);
        state.networks.push(with_vlans(client, network).await);
    }
    Ok(state)
}

/// Every network of the org, with VLANs listed only for the networks
/// named in `desired`.
pub async fn fetch_for_desired<D: Dashboard + ?Sized>(
    client: &D,
    org_id: &str,
    desired: &DesiredState,
) -> Result<RemoteState, RemoteError> {
    log::info!("Fetching networks for organization {org_id}...");
    let networks = client.list_networks(org_id).await?;
    let wanted: HashSet<&str> = desired
        .networks
        .iter()
        .map(|n| n.network.name.as_str())
        .collect();

    let mut state = RemoteState::default();
    for network in &networks {
        if wanted.contains(network.name.as_str()) {
            state.networks.push(with_vlans(client, network).await);
        } else {
            state.networks.push(RemoteNetwork {
                network: network.to_record(),
                product_types: network.product_types.clone(),
                vlans: Vec::new(),
                unavailable: None,
            });
        }
    }
    log::debug!("{state}");
    Ok(state)
}
