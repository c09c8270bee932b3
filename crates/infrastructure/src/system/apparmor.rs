use std::path::Path;
use tokio::process::Command;
use tracing::{info, warn};

const PROFILE: &str = "/etc/apparmor.d/usr.sbin.unbound";
const DISABLE_DIR: &str = "/etc/apparmor.d/disable";

/// Unload the distribution's AppArmor profile for the resolver so it can
/// read config trees outside its packaged paths. Every failure here is a
/// warning; hosts without AppArmor are the common case.
pub async fn disable_for_resolver() {
    let profile = Path::new(PROFILE);
    if !profile.exists() {
        return;
    }

    if let Err(e) = std::fs::create_dir_all(DISABLE_DIR) {
        warn!(error = %e, "Cannot create AppArmor disable directory");
        return;
    }

    let symlink = Path::new(DISABLE_DIR).join("usr.sbin.unbound");
    if !symlink.exists() {
        if let Err(e) = std::os::unix::fs::symlink(profile, &symlink) {
            warn!(error = %e, "Cannot link AppArmor profile into disable directory");
            return;
        }
    }

    match Command::new("apparmor_parser")
        .arg("-R")
        .arg(PROFILE)
        .status()
        .await
    {
        Ok(status) if status.success() => {
            info!("AppArmor profile for the resolver unloaded");
        }
        Ok(status) => warn!(%status, "apparmor_parser exited non-zero"),
        Err(e) => warn!(error = %e, "Cannot run apparmor_parser"),
    }
}
