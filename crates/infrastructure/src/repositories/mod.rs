pub mod sqlite_query_store;

pub use sqlite_query_store::SqliteQueryStore;
