//! Warden Application Layer
//!
//! Ports (traits implemented by infrastructure) and the pure services of
//! the ingestion pipeline: the resolver log parser and the dedup buffer.
pub mod ports;
pub mod services;

pub use ports::{QueryStore, ReloadPort};
pub use services::dedup_buffer::{DedupBuffer, FlushOutcome, DEDUP_CAPACITY, DEDUP_WINDOW};
pub use services::ingest_stats::{IngestStats, StatsSnapshot};
pub use services::log_parser;
