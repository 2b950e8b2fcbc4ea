//! Core business logic abstractions

pub mod config;
pub mod convert;
pub mod fetcher;
pub mod log;
pub mod rate;
pub mod reader;
pub mod refresh;
pub mod store;

// Re-export main types for cleaner imports
pub use fetcher::RateFetcher;
pub use rate::{RateProvider, RateReading, RateSnapshot, RateSource, RateSources};
pub use reader::{RateReader, ReadOutcome};
pub use refresh::{RefreshJob, RefreshOutcome};
pub use store::{KeyValueStore, WriteBatch};
