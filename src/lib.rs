//! Health Stats - Period-windowed statistics for personal health records
//!
//! Health Stats turns the records a user logged for a time window into the
//! numbers a statistics screen shows, through a deterministic pipeline:
//! window resolution → record store query → per-category aggregation → trend
//! extraction.
//!
//! ## Modules
//!
//! - **Core**: [`aggregator`], [`trend`], [`window`]
//! - **Boundary**: [`schema`] coerces stored documents, [`store`] queries them
//! - **Entry**: [`catalog`] and [`entry`] build new records from form input

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod entry;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod trend;
pub mod types;
pub mod window;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{MissingValuePolicy, StatsConfig};
pub use error::StatsError;
pub use pipeline::{documents_to_report_json, summarize, trend, StatsProcessor};
pub use store::{InMemoryStore, RecordStore};
pub use types::{CategorySummary, HealthRecord, StatisticsReport, TrendPoint, TrendSeries};
pub use window::Period;

/// Crate version embedded in reports and diagnostics
pub const STATS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for diagnostics
pub const PRODUCER_NAME: &str = "health-stats";
