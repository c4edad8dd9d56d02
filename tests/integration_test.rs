//! Integration tests for meraki-vlan-sync
//!
//! These tests drive the full spreadsheet -> plan -> apply workflow against an
//! in-memory dashboard.

use async_trait::async_trait;
use meraki_vlan_sync::commands::{
    check_api, export_to_excel, load_desired, sync_desired, SyncRun,
};
use meraki_vlan_sync::dashboard::{Dashboard, Network, Organization, Vlan};
use meraki_vlan_sync::error::{RemoteError, SyncError};
use meraki_vlan_sync::models::VlanRecord;
use meraki_vlan_sync::output::plan_lines;
use meraki_vlan_sync::processing::{ApplyReport, NetworkOutcome, Operation, Outcome, Scope};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

const ORG: &str = "123";
const VALID: &str = "src/tests/test_data/vlans_valid.csv";

#[derive(Default)]
struct State {
    /// (network, VLANs); `None` while VLANs are not enabled
    networks: Vec<(Network, Option<Vec<Vlan>>)>,
    next_id: usize,
    calls: Vec<String>,
}

/// Dashboard kept in memory, with failure injection.
#[derive(Default)]
struct FakeDashboard {
    state: Mutex<State>,
    fail_networks: HashSet<String>,
    fail_vlans: HashSet<(String, u16)>,
}

impl FakeDashboard {
    fn with_network(self, name: &str, vlans: Vec<Vlan>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = format!("N_{}", state.networks.len() + 100);
            state.networks.push((
                Network {
                    id,
                    name: name.to_string(),
                    product_types: vec!["appliance".to_string()],
                },
                Some(vlans),
            ));
        }
        self
    }

    fn with_vlans_disabled(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = format!("N_{}", state.networks.len() + 100);
            state.networks.push((
                Network {
                    id,
                    name: name.to_string(),
                    product_types: vec!["appliance".to_string()],
                },
                None,
            ));
        }
        self
    }

    /// Mutating calls made so far.
    fn mutations(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| !c.starts_with("list"))
            .cloned()
            .collect()
    }

    fn vlans_of(&self, name: &str) -> Vec<Vlan> {
        let state = self.state.lock().unwrap();
        state
            .networks
            .iter()
            .find(|(n, _)| n.name == name)
            .and_then(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    fn network_name(state: &State, network_id: &str) -> Option<String> {
        state
            .networks
            .iter()
            .find(|(n, _)| n.id == network_id)
            .map(|(n, _)| n.name.clone())
    }
}

fn to_vlan(record: &VlanRecord) -> Vlan {
    Vlan {
        id: record.vlan_id,
        name: record.vlan_name.clone(),
        subnet: Some(record.subnet.to_string()),
        appliance_ip: Some(record.appliance_ip.to_string()),
    }
}

fn vlan(id: u16, name: &str, subnet: &str, ip: &str) -> Vlan {
    Vlan {
        id,
        name: name.to_string(),
        subnet: Some(subnet.to_string()),
        appliance_ip: Some(ip.to_string()),
    }
}

#[async_trait]
impl Dashboard for FakeDashboard {
    async fn list_organizations(&self) -> Result<Vec<Organization>, RemoteError> {
        self.state.lock().unwrap().calls.push("list_organizations".into());
        Ok(vec![Organization {
            id: ORG.to_string(),
            name: "Test Org".to_string(),
        }])
    }

    async fn list_networks(&self, org_id: &str) -> Result<Vec<Network>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("list_networks {org_id}"));
        if org_id != ORG {
            return Err(RemoteError::new(Some(404), "Not found"));
        }
        Ok(state.networks.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn create_network(&self, org_id: &str, name: &str) -> Result<Network, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_network {name}"));
        if org_id != ORG || self.fail_networks.contains(name) {
            return Err(RemoteError::new(Some(400), "Name has already been taken"));
        }
        state.next_id += 1;
        let network = Network {
            id: format!("L_{}", state.next_id),
            name: name.to_string(),
            product_types: vec!["appliance".to_string()],
        };
        state.networks.push((network.clone(), None));
        Ok(network)
    }

    async fn enable_vlans(&self, network_id: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("enable_vlans {network_id}"));
        match state.networks.iter_mut().find(|(n, _)| n.id == network_id) {
            Some((_, vlans)) => {
                vlans.get_or_insert_with(Vec::new);
                Ok(())
            }
            None => Err(RemoteError::new(Some(404), "Not found")),
        }
    }

    async fn list_vlans(&self, network_id: &str) -> Result<Vec<Vlan>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("list_vlans {network_id}"));
        match state.networks.iter().find(|(n, _)| n.id == network_id) {
            Some((_, Some(vlans))) => Ok(vlans.clone()),
            Some((_, None)) => Err(RemoteError::new(
                Some(400),
                "VLANs are not enabled for this network",
            )),
            None => Err(RemoteError::new(Some(404), "Not found")),
        }
    }

    async fn create_vlan(&self, network_id: &str, vlan: &VlanRecord) -> Result<Vlan, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("create_vlan {network_id} {}", vlan.vlan_id));
        let name = FakeDashboard::network_name(&state, network_id);
        if let Some(name) = &name {
            if self.fail_vlans.contains(&(name.clone(), vlan.vlan_id)) {
                return Err(RemoteError::new(Some(400), "Subnet overlaps with another VLAN"));
            }
        }
        let vlans = state
            .networks
            .iter_mut()
            .find(|(n, _)| n.id == network_id)
            .and_then(|(_, v)| v.as_mut())
            .ok_or_else(|| RemoteError::new(Some(400), "VLANs are not enabled for this network"))?;
        if vlans.iter().any(|v| v.id == vlan.vlan_id) {
            return Err(RemoteError::new(Some(400), "Vlan has already been taken"));
        }
        let created = to_vlan(vlan);
        vlans.push(created.clone());
        Ok(created)
    }

    async fn update_vlan(&self, network_id: &str, vlan: &VlanRecord) -> Result<Vlan, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("update_vlan {network_id} {}", vlan.vlan_id));
        let existing = state
            .networks
            .iter_mut()
            .find(|(n, _)| n.id == network_id)
            .and_then(|(_, v)| v.as_mut())
            .and_then(|vlans| vlans.iter_mut().find(|v| v.id == vlan.vlan_id))
            .ok_or_else(|| RemoteError::new(Some(404), "VLAN not found"))?;
        *existing = to_vlan(vlan);
        Ok(existing.clone())
    }
}

async fn apply(client: &FakeDashboard, path: &str, scope: Scope) -> ApplyReport {
    let desired = load_desired(Path::new(path)).expect("valid spreadsheet");
    match sync_desired(client, ORG, &desired, scope, false)
        .await
        .expect("sync runs")
    {
        SyncRun::Applied(report) => report,
        SyncRun::DryRun(_) => panic!("expected an applied run"),
    }
}

#[tokio::test]
async fn test_apply_into_empty_org_then_idempotent() {
    let client = FakeDashboard::default();

    let report = apply(&client, VALID, Scope::All).await;
    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.networks_created(), 2);
    assert_eq!(report.created(), 4);
    assert_eq!(
        client.mutations(),
        vec![
            "create_network Site-A",
            "enable_vlans L_1",
            "create_vlan L_1 10",
            "create_vlan L_1 20",
            "create_network Branch #2",
            "enable_vlans L_2",
            "create_vlan L_2 10",
            "create_vlan L_2 30",
        ]
    );
    // host bits of 10.20.30.5/25 are cleared before sending
    let branch = client.vlans_of("Branch #2");
    assert_eq!(branch[1].subnet.as_deref(), Some("10.20.30.0/25"));

    let before = client.mutations().len();
    let second = apply(&client, VALID, Scope::All).await;
    assert!(second.is_success());
    assert_eq!(client.mutations().len(), before, "second run must not mutate");
    assert_eq!(second.unchanged(), 4);
    assert!(second
        .networks
        .iter()
        .all(|n| n.outcome == NetworkOutcome::Existing));
}

#[tokio::test]
async fn test_dry_run_plans_network_then_vlan_without_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one.csv");
    std::fs::write(
        &path,
        "Network Name,VLAN ID,VLAN Name,Subnet,MX IP\nSite-A,10,Data,192.168.10.0/24,192.168.10.1\n",
    )
    .unwrap();
    let client = FakeDashboard::default();
    let desired = load_desired(&path).unwrap();

    let run = sync_desired(&client, ORG, &desired, Scope::All, true)
        .await
        .unwrap();
    let plan = match run {
        SyncRun::DryRun(plan) => plan,
        SyncRun::Applied(_) => panic!("dry run applied changes"),
    };
    let ops = plan.operations();
    assert_eq!(ops.len(), 2);
    assert_eq!(
        ops[0],
        Operation::CreateNetwork {
            name: "Site-A".to_string()
        }
    );
    match &ops[1] {
        Operation::CreateVlan { row, vlan } => {
            assert_eq!(*row, 2);
            assert_eq!(vlan.network_name, "Site-A");
            assert_eq!(vlan.vlan_id, 10);
            assert_eq!(vlan.vlan_name, "Data");
            assert_eq!(vlan.subnet.to_string(), "192.168.10.0/24");
            assert_eq!(vlan.appliance_ip.to_string(), "192.168.10.1");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(client.mutations().is_empty());
}

#[tokio::test]
async fn test_failed_network_creation_skips_its_vlans() {
    let client = FakeDashboard {
        fail_networks: HashSet::from(["Site-A".to_string()]),
        ..Default::default()
    };

    let report = apply(&client, VALID, Scope::All).await;
    assert!(!report.is_success());
    assert!(matches!(
        report.networks[0].outcome,
        NetworkOutcome::Failed(_)
    ));
    let site_a: Vec<&Outcome> = report
        .rows
        .iter()
        .filter(|r| r.network == "Site-A")
        .map(|r| &r.outcome)
        .collect();
    assert_eq!(site_a.len(), 2);
    assert!(site_a.iter().all(|o| matches!(o, Outcome::Aborted(_))));

    // Branch #2 still gets created
    assert_eq!(
        client.mutations(),
        vec![
            "create_network Site-A",
            "create_network Branch #2",
            "enable_vlans L_1",
            "create_vlan L_1 10",
            "create_vlan L_1 30",
        ]
    );
}

#[tokio::test]
async fn test_vlan_failure_aborts_rest_of_network_only() {
    let client = FakeDashboard {
        fail_vlans: HashSet::from([("Site-A".to_string(), 10)]),
        ..Default::default()
    }
    .with_network("Site-A", vec![])
    .with_network("Branch #2", vec![]);

    let report = apply(&client, VALID, Scope::All).await;
    let outcomes: Vec<(usize, &Outcome)> =
        report.rows.iter().map(|r| (r.row, &r.outcome)).collect();
    assert!(matches!(outcomes[0], (2, Outcome::Failed(_))));
    assert!(matches!(outcomes[1], (3, Outcome::Aborted(_))));
    assert_eq!(outcomes[2], (4, &Outcome::Created));
    assert_eq!(outcomes[3], (5, &Outcome::Created));
    assert_eq!(report.failures(), 1);
    assert_eq!(report.aborted(), 1);
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_changed_addressing_is_updated() {
    let client = FakeDashboard::default()
        .with_network(
            "Site-A",
            vec![
                vlan(10, "Data", "192.168.10.0/24", "192.168.10.1"),
                vlan(20, "Voice", "192.168.21.0/24", "192.168.21.1"),
                vlan(99, "Legacy", "172.16.0.0/24", "172.16.0.1"),
            ],
        )
        .with_network("Branch #2", vec![]);

    let report = apply(&client, VALID, Scope::All).await;
    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.unchanged(), 1);
    assert_eq!(report.updated(), 1);
    assert_eq!(report.created(), 2);

    let site_a = client.vlans_of("Site-A");
    let voice = site_a.iter().find(|v| v.id == 20).unwrap();
    assert_eq!(voice.subnet.as_deref(), Some("192.168.20.0/24"));
    // VLANs missing from the spreadsheet are never deleted
    assert!(site_a.iter().any(|v| v.id == 99));
}

#[tokio::test]
async fn test_create_vlans_scope_needs_existing_network() {
    let client = FakeDashboard::default().with_network(
        "Site-A",
        vec![vlan(20, "Voice", "192.168.21.0/24", "192.168.21.1")],
    );

    let report = apply(&client, VALID, Scope::VlanCreatesOnly).await;
    assert_eq!(client.mutations(), vec!["create_vlan N_100 10"]);
    let outcomes: Vec<&Outcome> = report.rows.iter().map(|r| &r.outcome).collect();
    assert_eq!(outcomes[0], &Outcome::Created);
    assert!(matches!(outcomes[1], Outcome::Skipped(_)));
    assert!(matches!(outcomes[2], Outcome::Failed(why) if why.contains("does not exist")));
    assert!(matches!(outcomes[3], Outcome::Failed(_)));
    assert_eq!(report.networks[1].outcome, NetworkOutcome::Skipped);
}

#[tokio::test]
async fn test_create_networks_scope_creates_networks_only() {
    let client = FakeDashboard::default().with_network("Site-A", vec![]);

    let report = apply(&client, VALID, Scope::NetworksOnly).await;
    assert!(report.is_success(), "{report:?}");
    assert_eq!(
        client.mutations(),
        vec!["create_network Branch #2", "enable_vlans L_1"]
    );
    assert_eq!(report.skipped(), 4);
}

#[tokio::test]
async fn test_create_networks_ignores_network_with_vlans_disabled() {
    let client = FakeDashboard::default().with_vlans_disabled("Site-A");

    let report = apply(&client, VALID, Scope::NetworksOnly).await;
    assert!(matches!(
        report.networks[0].outcome,
        NetworkOutcome::Unavailable(_)
    ));
    assert_eq!(client.mutations(), vec!["create_network Branch #2", "enable_vlans L_1"]);
    assert_eq!(report.failures(), 0);
    assert!(report.is_success(), "{report:?}");
}

#[tokio::test]
async fn test_dry_run_marks_operations_outside_scope() {
    let client = FakeDashboard::default().with_network("Site-A", vec![]);
    let desired = load_desired(Path::new(VALID)).unwrap();

    let plan = match sync_desired(&client, ORG, &desired, Scope::VlanCreatesOnly, true)
        .await
        .unwrap()
    {
        SyncRun::DryRun(plan) => plan,
        SyncRun::Applied(_) => panic!("dry run applied changes"),
    };
    let lines = plan_lines(&plan, Scope::VlanCreatesOnly);
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("row 2: CreateVlan("));
    assert!(lines[1].starts_with("row 3: CreateVlan("));
    assert_eq!(
        lines[2],
        "SKIP CreateNetwork('Branch #2'): network creation not in scope"
    );
    assert!(lines[3].starts_with("FAIL row 4: CreateVlan("));
    assert!(lines[4].ends_with("network 'Branch #2' does not exist"));

    let lines = plan_lines(&plan, Scope::NetworksOnly);
    assert_eq!(lines[2], "CreateNetwork('Branch #2')");
    let vlan_lines: Vec<&String> = lines.iter().filter(|l| l.contains("CreateVlan")).collect();
    assert_eq!(vlan_lines.len(), 4);
    assert!(vlan_lines
        .iter()
        .all(|l| l.starts_with("SKIP ") && l.ends_with("VLAN creation not in scope")));
    assert!(client.mutations().is_empty());
}

#[tokio::test]
async fn test_network_with_vlans_disabled_is_reported() {
    let client = FakeDashboard::default()
        .with_vlans_disabled("Site-A")
        .with_network("Branch #2", vec![]);

    let report = apply(&client, VALID, Scope::All).await;
    assert!(matches!(
        &report.networks[0].outcome,
        NetworkOutcome::Unavailable(why) if why.contains("not enabled")
    ));
    assert_eq!(report.aborted(), 2);
    assert_eq!(report.created(), 2);
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_unknown_org_is_rejected() {
    let client = FakeDashboard::default();
    let desired = load_desired(Path::new(VALID)).unwrap();
    let err = sync_desired(&client, "999", &desired, Scope::All, false)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::UnknownOrganization(ref org) if org == "999"));
    assert!(client.mutations().is_empty());

    assert!(check_api(&client, Some(ORG)).await.is_ok());
    assert!(matches!(
        check_api(&client, Some("999")).await,
        Err(SyncError::UnknownOrganization(_))
    ));
}

#[test]
fn test_schema_and_validation_errors_stop_early() {
    let err = load_desired(Path::new("src/tests/test_data/vlans_missing_vlan_id.csv")).unwrap_err();
    assert!(matches!(err, SyncError::Schema(_)), "{err}");

    let err = load_desired(Path::new("src/tests/test_data/vlans_invalid.csv")).unwrap_err();
    assert!(matches!(err, SyncError::Validation(8)), "{err}");
}

#[tokio::test]
async fn test_export_then_apply_is_no_op() {
    let client = FakeDashboard::default()
        .with_network(
            "Site-A",
            vec![
                vlan(10, "Data", "192.168.10.0/24", "192.168.10.1"),
                vlan(20, "Voice", "192.168.20.0/24", "192.168.20.1"),
            ],
        )
        .with_vlans_disabled("Warehouse")
        .with_network("Branch #2", vec![vlan(30, "Guest", "10.20.30.0/25", "10.20.30.1")]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exports").join("vlans.xlsx");
    let written = export_to_excel(&client, ORG, Some(&path)).await.unwrap();
    assert_eq!(written, path);
    assert!(path.exists());

    let desired = load_desired(&path).unwrap();
    assert_eq!(desired.networks.len(), 2);
    assert_eq!(desired.vlan_count(), 3);

    let report = match sync_desired(&client, ORG, &desired, Scope::All, false)
        .await
        .unwrap()
    {
        SyncRun::Applied(report) => report,
        SyncRun::DryRun(_) => unreachable!(),
    };
    assert_eq!(report.unchanged(), 3);
    assert!(client.mutations().is_empty());
}

#[tokio::test]
async fn test_export_without_vlans_writes_nothing() {
    let client = FakeDashboard::default().with_network("Empty", vec![]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vlans.xlsx");

    let err = export_to_excel(&client, ORG, Some(&path)).await.unwrap_err();
    assert!(matches!(err, SyncError::NoData));
    assert!(!path.exists());
}
