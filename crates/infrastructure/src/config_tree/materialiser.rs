//! Renders one VLAN's resolver config directory from the template tree.
//!
//! The template references the resolver's canonical config base (e.g.
//! `/etc/unbound`); every such path is rewritten to the VLAN directory so
//! several instances can coexist. Running twice with the same inputs is a
//! no-op after the first run.

use crate::config_tree::layout;
use crate::system::ownership;
use fancy_regex::Regex;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};
use warden_domain::config::ResolverConfig;
use warden_domain::DomainError;

fn include_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]+)""#).expect("include pattern is valid"))
}

pub fn materialise(
    target_dir: &Path,
    template_dir: &Path,
    bind_ip: Option<Ipv4Addr>,
    resolver: &ResolverConfig,
) -> Result<(), DomainError> {
    let conf_file = target_dir.join(ResolverConfig::CONF_FILE_NAME);

    if !conf_file.exists() {
        if !template_dir.exists() {
            return Err(DomainError::Materialisation(format!(
                "template directory {} does not exist",
                template_dir.display()
            )));
        }
        std::fs::create_dir_all(target_dir).map_err(|e| {
            DomainError::Materialisation(format!("create {}: {}", target_dir.display(), e))
        })?;
        copy_tree(template_dir, target_dir)?;
        info!(
            target = %target_dir.display(),
            template = %template_dir.display(),
            "Template copied"
        );
    }

    if conf_file.exists() {
        rewrite_conf(&conf_file, target_dir, bind_ip, resolver)?;
    }

    ownership::chown_recursive(target_dir, &resolver.user)?;
    Ok(())
}

fn copy_tree(source: &Path, target: &Path) -> Result<(), DomainError> {
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let from = entry.path();
        let to = target.join(entry.file_name());
        if from.is_dir() {
            std::fs::create_dir_all(&to)?;
            copy_tree(&from, &to)?;
        } else {
            std::fs::copy(&from, &to).map_err(|e| {
                DomainError::Materialisation(format!("copy {}: {}", from.display(), e))
            })?;
        }
    }
    Ok(())
}

/// Rewrite the resolver config in place:
/// - canonical base paths become the target directory,
/// - the first `interface:` line in the server stanza is bound to
///   `bind_ip` (inserted after `server:` when absent),
/// - a `blacklists.d` include is appended after the last
///   `include-toplevel` when missing,
/// - every `include-toplevel "<dir>/*.conf"` directory is created.
fn rewrite_conf(
    conf_file: &Path,
    target_dir: &Path,
    bind_ip: Option<Ipv4Addr>,
    resolver: &ResolverConfig,
) -> Result<(), DomainError> {
    let original = std::fs::read_to_string(conf_file)?;
    let target = target_dir.display().to_string();

    let mut lines: Vec<String> = Vec::new();
    let mut in_server = false;
    let mut interface_bound = false;
    let mut blacklists_include_found = false;

    for raw in original.lines() {
        let mut line = raw.replace(&resolver.canonical_base, &target);
        let trimmed = line.trim_start();
        let active = !trimmed.starts_with('#');

        if active && trimmed.starts_with("server:") {
            in_server = true;
        }

        if active && line.contains("include-toplevel:") && line.contains(layout::BLACKLISTS_DIR) {
            blacklists_include_found = true;
        }

        if in_server && active && trimmed.starts_with("interface:") {
            if let (Some(ip), false) = (bind_ip, interface_bound) {
                line = format!("    interface: {ip}");
            }
            interface_bound = true;
        }

        lines.push(line);
    }

    if let (Some(ip), false) = (bind_ip, interface_bound) {
        if let Some(pos) = lines
            .iter()
            .position(|l| l.trim_start().starts_with("server:"))
        {
            lines.insert(pos + 1, format!("    interface: {ip}"));
        }
    }

    if !blacklists_include_found {
        let last_include = lines
            .iter()
            .rposition(|l| !l.trim_start().starts_with('#') && l.contains("include-toplevel:"));
        if let Some(pos) = last_include {
            lines.insert(
                pos + 1,
                format!(
                    "    include-toplevel: \"{}/{}/*.conf\"",
                    target,
                    layout::BLACKLISTS_DIR
                ),
            );
            debug!(conf = %conf_file.display(), "Added missing blacklists.d include");
        }
    }

    let mut updated = lines.join("\n");
    if original.ends_with('\n') {
        updated.push('\n');
    }
    if updated != original {
        std::fs::write(conf_file, &updated)?;
        info!(conf = %conf_file.display(), "Config rewritten");
    }

    create_include_dirs(&updated, resolver)?;
    Ok(())
}

fn create_include_dirs(conf_text: &str, resolver: &ResolverConfig) -> Result<(), DomainError> {
    for line in conf_text.lines() {
        if line.trim_start().starts_with('#') || !line.contains("include-toplevel:") {
            continue;
        }
        let Ok(Some(caps)) = include_path_re().captures(line) else {
            continue;
        };
        let include_path = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        // Only glob includes ("<dir>/*.conf") name a directory; a literal
        // file include must not become a directory.
        let Some((dir, _)) = include_path.split_once("/*") else {
            continue;
        };
        let dir = Path::new(dir);
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| {
                DomainError::Materialisation(format!("create include dir {}: {}", dir.display(), e))
            })?;
            ownership::chown_path(dir, &resolver.user)?;
            debug!(dir = %dir.display(), "Include directory created");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TEMPLATE_CONF: &str = r#"server:
    verbosity: 1
    directory: "/etc/unbound"
    interface: 127.0.0.1
    include-toplevel: "/etc/unbound/local.d/*.conf"

remote-control:
    control-enable: no
"#;

    fn resolver_cfg() -> ResolverConfig {
        ResolverConfig::default()
    }

    fn make_template(conf: &str) -> tempfile::TempDir {
        let template = tempdir().unwrap();
        std::fs::write(template.path().join("unbound.conf"), conf).unwrap();
        std::fs::write(template.path().join("root.hints"), "; stub\n").unwrap();
        template
    }

    #[test]
    fn test_materialise_rewrites_paths_and_binds_interface() {
        let template = make_template(TEMPLATE_CONF);
        let base = tempdir().unwrap();
        let target = base.path().join("10");

        materialise(
            &target,
            template.path(),
            Some("192.168.10.1".parse().unwrap()),
            &resolver_cfg(),
        )
        .unwrap();

        let conf = std::fs::read_to_string(target.join("unbound.conf")).unwrap();
        assert!(!conf.contains("/etc/unbound\""), "canonical base must be rewritten:\n{conf}");
        assert!(conf.contains(&format!("directory: \"{}\"", target.display())));
        assert!(conf.contains("interface: 192.168.10.1"));
        assert!(!conf.contains("interface: 127.0.0.1"));
        // template files are copied alongside the conf
        assert!(target.join("root.hints").exists());
    }

    #[test]
    fn test_materialise_appends_blacklists_include_and_creates_dirs() {
        let template = make_template(TEMPLATE_CONF);
        let base = tempdir().unwrap();
        let target = base.path().join("10");

        materialise(&target, template.path(), None, &resolver_cfg()).unwrap();

        let conf = std::fs::read_to_string(target.join("unbound.conf")).unwrap();
        let expected_include = format!(
            "include-toplevel: \"{}/blacklists.d/*.conf\"",
            target.display()
        );
        assert!(conf.contains(&expected_include), "{conf}");
        assert!(target.join("blacklists.d").is_dir());
        assert!(target.join("local.d").is_dir());
    }

    #[test]
    fn test_materialise_inserts_interface_when_absent() {
        let conf = "server:\n    verbosity: 1\n    include-toplevel: \"/etc/unbound/local.d/*.conf\"\n";
        let template = make_template(conf);
        let base = tempdir().unwrap();
        let target = base.path().join("default");

        materialise(
            &target,
            template.path(),
            Some("10.0.0.1".parse().unwrap()),
            &resolver_cfg(),
        )
        .unwrap();

        let conf = std::fs::read_to_string(target.join("unbound.conf")).unwrap();
        let server_pos = conf.find("server:").unwrap();
        let iface_pos = conf.find("interface: 10.0.0.1").unwrap();
        assert!(iface_pos > server_pos);
    }

    #[test]
    fn test_materialise_is_idempotent() {
        let template = make_template(TEMPLATE_CONF);
        let base = tempdir().unwrap();
        let target = base.path().join("20");
        let ip = Some("192.168.20.1".parse().unwrap());

        materialise(&target, template.path(), ip, &resolver_cfg()).unwrap();
        let first = std::fs::read_to_string(target.join("unbound.conf")).unwrap();

        materialise(&target, template.path(), ip, &resolver_cfg()).unwrap();
        let second = std::fs::read_to_string(target.join("unbound.conf")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_literal_file_include_creates_no_directory() {
        let conf = "server:\n    include-toplevel: \"/etc/unbound/forwarders.conf\"\n    include-toplevel: \"/etc/unbound/local.d/*.conf\"\n";
        let template = make_template(conf);
        let base = tempdir().unwrap();
        let target = base.path().join("10");

        materialise(&target, template.path(), None, &resolver_cfg()).unwrap();

        assert!(!target.join("forwarders.conf").is_dir());
        assert!(target.join("local.d").is_dir());
    }

    #[test]
    fn test_missing_template_is_materialisation_error() {
        let base = tempdir().unwrap();
        let result = materialise(
            &base.path().join("10"),
            Path::new("/nonexistent/template"),
            None,
            &resolver_cfg(),
        );
        assert!(matches!(result, Err(DomainError::Materialisation(_))));
    }
}
