//! Recognisers for the resolver's verbose debug output.
//!
//! Two line shapes matter; everything else is noise and returns `None`:
//!
//! - answered query (`info:` lines):
//!   `[1700000000] rx[1:1] info: 192.168.10.5 ads.example.com. A IN`
//! - local-zone refusal (`debug:` lines):
//!   `[1700000000] rx[1:1] debug: using localzone ads.example.com. always_null`
//!
//! Blocked lines carry no client address; the sentinel `"unknown"` is
//! substituted. A missing or unparseable epoch falls back to `now`.

use fancy_regex::Regex;
use std::sync::OnceLock;
use warden_domain::{normalize_domain, QueryEvent, QueryStatus, VlanId, UNKNOWN_CLIENT};

fn allowed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\[(\d+)\]\s+\S+\[\d+:\d+\]\s+info:\s+(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\s+(\S+)\s+A\s+IN",
        )
        .expect("allowed pattern is valid")
    })
}

fn blocked_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"debug:\s+using\s+localzone\s+(\S+)\s+always_null")
            .expect("blocked pattern is valid")
    })
}

fn epoch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[(\d+)\]").expect("epoch pattern is valid"))
}

/// Cheap pre-filter run before the full recognisers. Mirrors what the
/// recognisers can possibly match so the per-line cost on chatty
/// resolvers stays low.
pub fn is_candidate(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.contains(" a in") || lower.contains("always_null")
}

/// Classify one resolver output line.
pub fn parse(line: &str, now_epoch: i64, vlan: VlanId) -> Option<QueryEvent> {
    if line.contains("info:") {
        if let Ok(Some(caps)) = allowed_re().captures(line) {
            let ts_second = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .unwrap_or(now_epoch);
            let client_ip = caps.get(2)?.as_str().to_string();
            let domain = normalize_domain(caps.get(3)?.as_str());
            return Some(QueryEvent {
                ts_second,
                client_ip,
                domain,
                query_type: "A".to_string(),
                status: QueryStatus::Allowed,
                vlan_id: vlan.0,
            });
        }
    }

    if let Ok(Some(caps)) = blocked_re().captures(line) {
        let ts_second = epoch_re()
            .captures(line)
            .ok()
            .flatten()
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(now_epoch);
        let domain = normalize_domain(caps.get(1)?.as_str());
        return Some(QueryEvent {
            ts_second,
            client_ip: UNKNOWN_CLIENT.to_string(),
            domain,
            query_type: "A".to_string(),
            status: QueryStatus::Blocked,
            vlan_id: vlan.0,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_800_000_000;

    #[test]
    fn test_parse_allowed_line() {
        let line = "[1700000000] rx[1:1] info: 192.168.10.5 ads.example.com. A IN";
        let event = parse(line, NOW, VlanId(10)).unwrap();
        assert_eq!(event.status, QueryStatus::Allowed);
        assert_eq!(event.ts_second, 1_700_000_000);
        assert_eq!(event.client_ip, "192.168.10.5");
        assert_eq!(event.domain, "ads.example.com");
        assert_eq!(event.query_type, "A");
        assert_eq!(event.vlan_id, 10);
    }

    #[test]
    fn test_parse_blocked_line() {
        let line = "[1700000000] rx[1:1] debug: using localzone ads.example.com. always_null";
        let event = parse(line, NOW, VlanId(10)).unwrap();
        assert_eq!(event.status, QueryStatus::Blocked);
        assert_eq!(event.ts_second, 1_700_000_000);
        assert_eq!(event.client_ip, UNKNOWN_CLIENT);
        assert_eq!(event.domain, "ads.example.com");
        assert_eq!(event.query_type, "A");
    }

    #[test]
    fn test_allowed_domain_is_lowercased() {
        let line = "[1700000000] rx[2:0] info: 10.0.0.7 Tracker.Example.NET. A IN";
        let event = parse(line, NOW, VlanId(0)).unwrap();
        assert_eq!(event.domain, "tracker.example.net");
    }

    #[test]
    fn test_blocked_without_epoch_uses_now() {
        let line = "debug: using localzone ads.example.com. always_null";
        let event = parse(line, NOW, VlanId(0)).unwrap();
        assert_eq!(event.ts_second, NOW);
    }

    #[test]
    fn test_long_domain_truncated() {
        let label = "a".repeat(300);
        let line = format!("[1700000000] rx[1:1] info: 192.168.0.2 {label}.com. A IN");
        let event = parse(&line, NOW, VlanId(0)).unwrap();
        assert!(event.domain.len() <= 255);
    }

    #[test]
    fn test_unrelated_lines_skipped() {
        assert!(parse("[1700000000] unbound[100:0] notice: init module 0: validator", NOW, VlanId(0)).is_none());
        assert!(parse("", NOW, VlanId(0)).is_none());
        // AAAA answers are not recognised, only A
        assert!(parse(
            "[1700000000] rx[1:1] info: 192.168.10.5 host.example.com. AAAA IN",
            NOW,
            VlanId(0)
        )
        .is_none());
    }

    #[test]
    fn test_is_candidate_prefilter() {
        assert!(is_candidate("info: 1.2.3.4 x.com. A IN"));
        assert!(is_candidate("debug: using localzone x.com. ALWAYS_NULL"));
        assert!(!is_candidate("notice: service start"));
    }
}
