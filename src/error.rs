// Yocto Exporter - Sensor hub collection core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for yocto-metrics
//!
//! [`HubError`] covers everything the sensor hub client can report.
//! [`CollectError`] explains why a single sensor was left out of a pass; it
//! never escapes the collector.

use thiserror::Error;

/// Result type alias for hub operations
pub type Result<T> = std::result::Result<T, HubError>;

/// Errors reported by a sensor hub client
#[derive(Error, Debug)]
pub enum HubError {
    /// The hub could not be reached or rejected the session
    #[error("Hub connection failed ({url}): {reason}")]
    Connect { url: String, reason: String },

    /// No hub implementation handles this address
    #[error("Unsupported hub address '{url}': {reason}")]
    Unsupported { url: String, reason: String },

    /// Refreshing the device list failed
    #[error("Hub refresh failed: {0}")]
    Refresh(String),

    /// A per-sensor attribute could not be read
    #[error("Failed to read {attribute}: {reason}")]
    Read {
        attribute: &'static str,
        reason: String,
    },

    /// Hub data is not in the expected shape
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The handle does not refer to a sensor the hub knows about
    #[error("Stale sensor handle: {0}")]
    StaleHandle(usize),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error from the replay hub
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl HubError {
    /// Shorthand for an attribute read failure
    pub fn read(attribute: &'static str, reason: impl Into<String>) -> Self {
        HubError::Read {
            attribute,
            reason: reason.into(),
        }
    }
}

/// Reasons a sensor is skipped during a collection pass
#[derive(Error, Debug)]
pub enum CollectError {
    /// The hub failed to deliver an attribute
    #[error(transparent)]
    Hub(#[from] HubError),

    /// The hub delivered a value that cannot be exported
    #[error("Unusable reading: {0}")]
    Unusable(String),

    /// The metrics framework rejected the series or its labels
    #[error("Metric error: {0}")]
    Metric(#[from] prometheus::Error),
}
