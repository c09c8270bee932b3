//! Fetches remote blocklists and materialises them as resolver include
//! files, minus whatever the VLAN's whitelist covers.

use crate::config_tree::layout;
use crate::system::ownership;
use fancy_regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};
use warden_application::ports::QueryStore;
use warden_domain::config::{BlocklistConfig, ResolverConfig};
use warden_domain::{BlocklistSource, DomainError, VlanId};

// ---------------------------------------------------------------------------
// Line parsing
// ---------------------------------------------------------------------------

/// Some published lists wrap an already-rendered local-zone line in a
/// second `local-zone:` layer; that form is tried first.
fn double_wrapped_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"local-zone:\s*"local-zone:\s*"([^"\s]+?)\.?"\s*always_null"#)
            .expect("double-wrapped pattern is valid")
    })
}

fn plain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"local-zone:\s*"([^"\s]+?)\.?"\s*always_null"#)
            .expect("plain pattern is valid")
    })
}

/// Extract the domain from one blocklist line, lower-cased with a
/// trailing dot. Comments, blanks, and unrecognised lines yield `None`.
pub fn parse_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let caps = double_wrapped_re()
        .captures(line)
        .ok()
        .flatten()
        .or_else(|| plain_re().captures(line).ok().flatten())?;

    let domain = caps.get(1)?.as_str().to_ascii_lowercase();
    Some(format!("{domain}."))
}

/// Parse a whole blocklist body into a de-duplicated, sorted domain set.
pub fn parse_text(text: &str) -> BTreeSet<String> {
    text.lines().filter_map(parse_line).collect()
}

// ---------------------------------------------------------------------------
// Whitelist semantics
// ---------------------------------------------------------------------------

/// Normalise raw whitelist entries: lower-case, strip the trailing dot,
/// strip a leading `*.` wildcard.
pub fn normalize_whitelist(raw: &HashSet<String>) -> HashSet<String> {
    raw.iter()
        .map(|entry| {
            let entry = entry.trim().trim_end_matches('.').to_ascii_lowercase();
            entry.strip_prefix("*.").unwrap_or(&entry).to_string()
        })
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// A domain is whitelisted when it equals an entry or is a subdomain of
/// one.
pub fn is_whitelisted(domain: &str, whitelist: &HashSet<String>) -> bool {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    whitelist
        .iter()
        .any(|entry| domain == *entry || domain.ends_with(&format!(".{entry}")))
}

/// Render the resolver include fragment for a filtered domain set.
pub fn render_include<'a>(domains: impl IntoIterator<Item = &'a String>) -> String {
    let mut out = String::from("server:\n");
    for domain in domains {
        out.push_str(&format!("  local-zone: \"{domain}\" always_null\n"));
    }
    out
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct BlocklistBuilder {
    client: reqwest::Client,
    fetch_timeout: Duration,
}

impl BlocklistBuilder {
    pub fn new(cfg: &BlocklistConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            fetch_timeout: Duration::from_secs(cfg.fetch_timeout_secs),
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, DomainError> {
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| DomainError::Fetch(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            return Err(DomainError::Fetch(format!(
                "HTTP {} for {url}",
                response.status().as_u16()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| DomainError::Fetch(format!("read {url}: {e}")))
    }

    /// Fetch one source, subtract the VLAN's whitelist, and write
    /// `blacklists.d/<name>.conf` into the VLAN directory. Returns the
    /// number of domains written. A fetch failure leaves any existing
    /// include file untouched.
    pub async fn build_source(
        &self,
        source: &BlocklistSource,
        vlan_dir: &Path,
        store: &dyn QueryStore,
        resolver: &ResolverConfig,
    ) -> Result<usize, DomainError> {
        let body = self.fetch(&source.url).await?;
        let domains = parse_text(&body);

        let whitelist = normalize_whitelist(&store.load_whitelist(VlanId(source.vlan_id)).await?);
        let filtered: Vec<&String> = domains
            .iter()
            .filter(|d| !is_whitelisted(d, &whitelist))
            .collect();
        let removed = domains.len() - filtered.len();

        let dir = layout::blacklists_dir(vlan_dir);
        std::fs::create_dir_all(&dir)?;
        let out_file = dir.join(format!("{}.conf", source.name));
        std::fs::write(&out_file, render_include(filtered.iter().copied()))?;
        ownership::chown_path(&out_file, &resolver.user)?;

        info!(
            source = %source.name,
            vlan = source.vlan_id,
            domains = filtered.len(),
            whitelisted = removed,
            "Blocklist written"
        );
        Ok(filtered.len())
    }

    /// Rebuild every registered source for one VLAN, clearing the
    /// `blacklists.d` directory first. A failing source is skipped; the
    /// rest still build. Returns the number of sources written.
    pub async fn sync_vlan(
        &self,
        vlan: VlanId,
        vlan_dir: &Path,
        store: &dyn QueryStore,
        resolver: &ResolverConfig,
    ) -> Result<usize, DomainError> {
        let sources = store.load_blocklist_sources(vlan).await?;

        let dir = layout::blacklists_dir(vlan_dir);
        std::fs::create_dir_all(&dir)?;
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "conf") {
                std::fs::remove_file(&path)?;
            }
        }

        let mut written = 0;
        for source in &sources {
            match self.build_source(source, vlan_dir, store, resolver).await {
                Ok(_) => written += 1,
                Err(e) => {
                    warn!(source = %source.name, vlan = vlan.0, error = %e, "Blocklist skipped");
                }
            }
        }
        Ok(written)
    }
}
