//! Mesh-VPN host collection via the `tailscale` CLI.

use serde::Deserialize;
use std::collections::HashMap;
use tokio::process::Command;
use warden_domain::{DomainError, HostRecord};

#[derive(Debug, Deserialize)]
struct StatusDoc {
    #[serde(rename = "Self")]
    self_node: Option<Node>,
    #[serde(rename = "Peer")]
    peers: Option<HashMap<String, Node>>,
}

#[derive(Debug, Deserialize)]
struct Node {
    #[serde(rename = "HostName")]
    hostname: Option<String>,
    #[serde(rename = "TailscaleIPs")]
    ips: Option<Vec<String>>,
}

impl Node {
    fn into_record(self) -> Option<HostRecord> {
        Some(HostRecord {
            hostname: self.hostname?,
            ips: self.ips.unwrap_or_default(),
        })
    }
}

/// Hosts named in a `tailscale status --json` document: the local node
/// first, then every peer.
pub fn extract_hosts(json: &str) -> Result<Vec<HostRecord>, DomainError> {
    let doc: StatusDoc = serde_json::from_str(json)
        .map_err(|e| DomainError::Fetch(format!("tailscale status JSON: {e}")))?;

    let mut hosts = Vec::new();
    if let Some(record) = doc.self_node.and_then(Node::into_record) {
        hosts.push(record);
    }
    if let Some(peers) = doc.peers {
        let mut peer_records: Vec<HostRecord> =
            peers.into_values().filter_map(Node::into_record).collect();
        peer_records.sort_by(|a, b| a.hostname.cmp(&b.hostname));
        hosts.extend(peer_records);
    }
    Ok(hosts)
}

/// Run the mesh CLI and collect the cluster's host map.
pub async fn collect_hosts() -> Result<Vec<HostRecord>, DomainError> {
    let output = Command::new("tailscale")
        .args(["status", "--json"])
        .output()
        .await
        .map_err(|e| DomainError::Fetch(format!("tailscale status: {e}")))?;

    if !output.status.success() {
        return Err(DomainError::Fetch(format!(
            "tailscale status exited with {}",
            output.status
        )));
    }

    extract_hosts(&String::from_utf8_lossy(&output.stdout))
}
