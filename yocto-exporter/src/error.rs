// Yocto Exporter - Prometheus exporter for Yoctopuce sensor hubs
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the exporter process
//!
//! Everything here is fatal: `main` logs the error and exits non-zero.

use std::io;
use thiserror::Error;
use yocto_metrics::HubError;

#[derive(Error, Debug)]
pub enum ExporterError {
    /// Hub session could not be established
    #[error(transparent)]
    Hub(#[from] HubError),

    /// HTTP listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// HTTP server stopped with an error
    #[error("Server error: {0}")]
    Serve(#[source] io::Error),

    /// Async runtime could not be started
    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] io::Error),

    /// Exposition payload could not be encoded or written
    #[error("Encoding error: {0}")]
    Encode(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
