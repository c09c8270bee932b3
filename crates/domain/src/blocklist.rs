/// One remote blocklist registered in the store.
///
/// `(name, vlan_id)` is unique; the name doubles as the file stem of the
/// generated include file `blacklists.d/<name>.conf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlocklistSource {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub vlan_id: u32,
}
