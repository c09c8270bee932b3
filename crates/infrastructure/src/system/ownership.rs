use nix::unistd::{chown, geteuid, Gid, Uid, User};
use std::path::Path;
use tracing::{debug, warn};
use warden_domain::DomainError;

/// Resolve the resolver service account. `None` when the account does
/// not exist on this host.
fn resolve_account(user: &str) -> Option<(Uid, Gid)> {
    match User::from_name(user) {
        Ok(Some(account)) => Some((account.uid, account.gid)),
        Ok(None) => {
            warn!(user, "Service account not found, skipping ownership change");
            None
        }
        Err(e) => {
            warn!(user, error = %e, "Account lookup failed, skipping ownership change");
            None
        }
    }
}

/// Chown a single path to the service account. A no-op (with a debug
/// note) when not running as root, so materialisation keeps working in
/// development and test environments.
pub fn chown_path(path: &Path, user: &str) -> Result<(), DomainError> {
    if !geteuid().is_root() {
        debug!(path = %path.display(), "Not root, skipping ownership change");
        return Ok(());
    }
    let Some((uid, gid)) = resolve_account(user) else {
        return Ok(());
    };
    chown(path, Some(uid), Some(gid))
        .map_err(|e| DomainError::Materialisation(format!("chown {}: {}", path.display(), e)))
}

/// Recursively chown a directory tree to the service account.
pub fn chown_recursive(path: &Path, user: &str) -> Result<(), DomainError> {
    if !geteuid().is_root() {
        debug!(path = %path.display(), "Not root, skipping ownership change");
        return Ok(());
    }
    let Some((uid, gid)) = resolve_account(user) else {
        return Ok(());
    };
    chown_tree(path, uid, gid)
}

fn chown_tree(path: &Path, uid: Uid, gid: Gid) -> Result<(), DomainError> {
    chown(path, Some(uid), Some(gid))
        .map_err(|e| DomainError::Materialisation(format!("chown {}: {}", path.display(), e)))?;
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            chown_tree(&entry?.path(), uid, gid)?;
        }
    }
    Ok(())
}
