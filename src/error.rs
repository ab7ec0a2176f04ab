//! Error types for the arrivals board.
//!
//! Each failure is contained at the smallest scope that can carry on without
//! it: a feed error drops one source, a headsign error drops destinations, a
//! cycle error keeps the previous snapshot. Only a stop-name load failure at
//! startup is allowed to halt the process.

use std::path::PathBuf;

/// A static reference file could not be opened or parsed.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceLoadError {
    /// File missing or unreadable
    #[error("failed to open reference file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A row did not match the expected columns
    #[error("malformed row in reference file {}: {source}", .path.display())]
    Row {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The blocking load task was cancelled or panicked
    #[error("reference load task failed: {0}")]
    Task(String),
}

/// A single feed source failed to produce a decoded message.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Source looked like a URL but could not be parsed as one
    #[error("invalid feed endpoint {endpoint}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    /// HTTP request failed or returned a non-success status
    #[error("failed to fetch feed from {endpoint}: {source}")]
    Fetch {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Local feed snapshot could not be read
    #[error("failed to read feed file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bytes were not a valid GTFS-RT `FeedMessage`
    #[error("failed to decode feed from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: prost::DecodeError,
    },
}

/// A refresh cycle failed before it could publish.
#[derive(Debug, thiserror::Error)]
pub enum RefreshCycleError {
    #[error("reference data unavailable: {0}")]
    References(#[from] ReferenceLoadError),

    #[error("refresh cycle panicked: {0}")]
    Panicked(String),
}

/// Configuration values that cannot drive the engine.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("page size must be at least 1")]
    ZeroPageSize,

    #[error("arrival window must be a non-negative number of minutes, got {0}")]
    InvalidWindow(f64),

    #[error("at least one monitored stop is required")]
    NoMonitoredStops,
}
