use serde::Deserialize;
use std::fmt;

/// Identifier of a VLAN tenant. `0` is the default (untagged) instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VlanId(pub u32);

impl VlanId {
    pub const DEFAULT: VlanId = VlanId(0);

    pub fn is_default(&self) -> bool {
        self.0 == 0
    }

    /// Directory name of this VLAN's config tree under the base directory.
    pub fn dir_name(&self) -> String {
        if self.is_default() {
            "default".to_string()
        } else {
            self.0.to_string()
        }
    }

    /// Tagged interface name for this VLAN on the given internal interface.
    /// The default instance binds the internal interface itself.
    pub fn interface_name(&self, internal_interface: &str) -> String {
        if self.is_default() {
            internal_interface.to_string()
        } else {
            format!("{}.{}", internal_interface, self.0)
        }
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One element of the VLAN enumeration file (`vlans.json`).
///
/// The file carries more per-VLAN settings than the DNS stack needs;
/// unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct VlanEntry {
    pub id: u32,
}

impl VlanEntry {
    pub fn vlan_id(&self) -> VlanId {
        VlanId(self.id)
    }
}
