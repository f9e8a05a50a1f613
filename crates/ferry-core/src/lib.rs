pub mod error;
pub mod export;
pub mod filter;
pub mod harbor;
pub mod models;
pub mod parser;
pub mod query;
pub mod traits;
pub mod util;
pub mod watcher;

#[cfg(test)]
pub mod testutil;

pub use error::AppError;
pub use models::{Connection, ConnectionIdentity, QueryConstraints, RawRecord};
pub use query::QueryService;
pub use traits::{ConnectionQuery, ExportSink, Notifier, RecordSource};
pub use watcher::{WatchConfig, WatchMode, WatchOutcome, Watcher};
