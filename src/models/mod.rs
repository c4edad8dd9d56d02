//! Domain models for VLAN addressing sync.
//!
//! This module contains the core data structures used throughout the application:
//! - [`Ipv4`] - IPv4 subnet with CIDR notation support
//! - [`NetworkRecord`], [`VlanRecord`] and [`RemoteVlan`] - addressing records
//! - [`DesiredState`] and [`RemoteState`] - spreadsheet and dashboard snapshots

mod ipv4;
mod network;
mod state;

// Re-export public types
pub use ipv4::{broadcast_addr, cut_addr, get_cidr_mask, CidrError, Ipv4, MAX_LENGTH};
pub use network::{NetworkRecord, RemoteVlan, VlanRecord};
pub use state::{DesiredNetwork, DesiredState, DesiredVlan, RemoteNetwork, RemoteState};
