use std::fmt;

/// Sentinel client address for blocked-query log lines, which carry no
/// client information.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Maximum stored domain length in bytes, matching the `domain` column.
pub const MAX_DOMAIN_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Allowed,
    Blocked,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Allowed => "allowed",
            QueryStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified DNS query, as extracted from a resolver log line.
///
/// The `(domain, ts_second, vlan_id)` triple is the dedup key; status is
/// finalised by the dedup buffer before the event reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEvent {
    /// Epoch second the resolver logged the query.
    pub ts_second: i64,
    /// Dotted-quad client address, or [`UNKNOWN_CLIENT`].
    pub client_ip: String,
    /// Normalised domain: lower-cased, trailing dot stripped, at most
    /// [`MAX_DOMAIN_LEN`] bytes.
    pub domain: String,
    pub query_type: String,
    pub status: QueryStatus,
    pub vlan_id: u32,
}

impl QueryEvent {
    /// Dedup key for this event.
    pub fn key(&self) -> (&str, i64, u32) {
        (&self.domain, self.ts_second, self.vlan_id)
    }
}

/// Normalise a domain as it appears in resolver output: lower-case, strip
/// the trailing dot, truncate to [`MAX_DOMAIN_LEN`] bytes.
pub fn normalize_domain(raw: &str) -> String {
    let mut domain = raw.trim().trim_end_matches('.').to_ascii_lowercase();
    if domain.len() > MAX_DOMAIN_LEN {
        let mut cut = MAX_DOMAIN_LEN;
        while !domain.is_char_boundary(cut) {
            cut -= 1;
        }
        domain.truncate(cut);
    }
    domain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_strips_dot() {
        assert_eq!(normalize_domain("Ads.Example.COM."), "ads.example.com");
    }

    #[test]
    fn test_normalize_plain_domain_unchanged() {
        assert_eq!(normalize_domain("example.net"), "example.net");
    }

    #[test]
    fn test_normalize_truncates_to_255_bytes() {
        let long = format!("{}.com.", "a".repeat(300));
        let normalized = normalize_domain(&long);
        assert_eq!(normalized.len(), MAX_DOMAIN_LEN);
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(QueryStatus::Allowed.as_str(), "allowed");
        assert_eq!(QueryStatus::Blocked.as_str(), "blocked");
    }
}
