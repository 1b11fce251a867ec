//! # Juicesync - JuiceNet EV charger exporter for InfluxDB
//!
//! Polls the JuiceNet cloud API for charging history and live charger state,
//! reconciles fragmented session records into real charging sessions, and
//! writes sessions, power curves and status snapshots to InfluxDB.
//!
//! ## Architecture
//!
//! - `config`: Configuration loading and validation
//! - `logging`: Structured logging and tracing
//! - `juicenet`: Upstream API types, client and the `SessionSource` seam
//! - `history`: Cutoff-bounded pagination over session history
//! - `merge`: Gap-based coalescing of raw sessions
//! - `points`: Power-sample series with zero-padded edges
//! - `emit`: Conversion into time-series write records
//! - `influx`: Line-protocol encoding and the InfluxDB writer
//! - `checkpoint`: Last-processed timestamp persistence
//! - `run`: History and status runs

pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod emit;
pub mod error;
pub mod history;
pub mod influx;
pub mod juicenet;
pub mod logging;
pub mod merge;
pub mod points;
pub mod run;


// Re-export commonly used types
pub use config::Config;
pub use error::{JuicesyncError, Result};
pub use merge::MergedSession;
