pub mod fetch_blocklist;
pub mod run;
pub mod sync_blocklists;
pub mod sync_hosts;
