//! Durable outputs: CSV files and the table store they are uploaded into.

#[cfg(feature = "postgres")]
mod postgres;
mod store;
mod writer;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
pub use store::{DirectoryStore, TableStore, UploadOutcome, upload_tables};
pub use writer::{write_lookup, write_table};
