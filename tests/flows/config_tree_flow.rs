//! Materialise config trees for a small fleet, then run the mesh hosts
//! sync across them the way the supervisor's jobs do.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use warden_application::ports::ReloadPort;
use warden_domain::config::ResolverConfig;
use warden_domain::{DomainError, HostRecord, PidDescriptor, VlanId};
use warden_infrastructure::config_tree::{layout, materialise};
use warden_infrastructure::hosts::HostsSync;

const TEMPLATE_CONF: &str = r#"server:
    verbosity: 1
    directory: "/etc/unbound"
    interface: 127.0.0.1
    include-toplevel: "/etc/unbound/local.d/*.conf"
"#;

#[derive(Default)]
struct RecordingReload {
    targeted: Mutex<Vec<u32>>,
}

#[async_trait]
impl ReloadPort for RecordingReload {
    async fn request_reload(&self, vlan: VlanId) -> Result<(), DomainError> {
        self.targeted.lock().unwrap().push(vlan.0);
        Ok(())
    }

    async fn reload_all(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

fn make_template(dir: &Path) {
    std::fs::write(dir.join("unbound.conf"), TEMPLATE_CONF).unwrap();
}

#[tokio::test]
async fn test_fleet_materialise_then_hosts_sync() {
    let template = tempfile::tempdir().unwrap();
    make_template(template.path());
    let base = tempfile::tempdir().unwrap();
    let resolver = ResolverConfig::default();

    let vlans = [VlanId(0), VlanId(10), VlanId(20)];
    for vlan in vlans {
        let vlan_dir = base.path().join(vlan.dir_name());
        materialise(&vlan_dir, template.path(), None, &resolver).unwrap();

        let conf = std::fs::read_to_string(vlan_dir.join("unbound.conf")).unwrap();
        assert!(!conf.contains("/etc/unbound/"), "paths must be rewritten:\n{conf}");
        assert!(layout::blacklists_dir(&vlan_dir).is_dir());
        assert!(layout::local_dir(&vlan_dir).is_dir());
    }

    assert_eq!(layout::discover_vlan_dirs(base.path()).len(), 3);

    let hosts = vec![
        HostRecord {
            hostname: "alice".to_string(),
            ips: vec!["100.64.0.1".to_string()],
        },
        HostRecord {
            hostname: "bob".to_string(),
            ips: vec!["100.64.0.2".to_string(), "fd7a:115c:a1e0::2".to_string()],
        },
    ];

    let reload = RecordingReload::default();
    let sync = HostsSync::new("example.net");
    let updated = sync
        .sync_all(base.path(), &hosts, &resolver, &reload)
        .await
        .unwrap();
    assert_eq!(updated, 3);
    assert_eq!(*reload.targeted.lock().unwrap(), vec![0, 10, 20]);

    for vlan in vlans {
        let file = layout::mesh_hosts_file(&base.path().join(vlan.dir_name()));
        let content = std::fs::read_to_string(file).unwrap();
        assert!(content.contains("alice.example.net. IN A 100.64.0.1"));
        assert!(content.contains("bob.example.net. IN AAAA fd7a:115c:a1e0::2"));
    }

    // Identical input: no writes, no reloads.
    reload.targeted.lock().unwrap().clear();
    let updated = sync
        .sync_all(base.path(), &hosts, &resolver, &reload)
        .await
        .unwrap();
    assert_eq!(updated, 0);
    assert!(reload.targeted.lock().unwrap().is_empty());
}

#[test]
fn test_pid_descriptor_round_trip_on_disk() {
    let base = tempfile::tempdir().unwrap();
    let vlan_dir = base.path().join("10");
    std::fs::create_dir_all(&vlan_dir).unwrap();

    let descriptor = PidDescriptor {
        screen_session: Some("unbound_10".to_string()),
        screen_pid: Some(1000),
        supervisor_pid: Some(1000),
        resolver_pid: Some(1001),
        vlan_id: Some(10),
        config_file: Some(vlan_dir.join("unbound.conf")),
    };
    std::fs::write(PidDescriptor::path_in(&vlan_dir), descriptor.render()).unwrap();

    let read_back = PidDescriptor::parse(
        &std::fs::read_to_string(PidDescriptor::path_in(&vlan_dir)).unwrap(),
    );
    assert_eq!(read_back, descriptor);
}
