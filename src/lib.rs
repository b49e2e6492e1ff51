// Yocto Exporter - Sensor hub collection core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # yocto-metrics - Sensor hub collection core
//!
//! Turns the live state of a Yoctopuce sensor hub into Prometheus metric
//! families. Every sensor function id becomes one gauge family, labeled by
//! `unit` and `hardwareId`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prometheus::{Encoder, TextEncoder};
//! use yocto_metrics::{hub, HubCollector, UnitOverrides};
//!
//! let hub = hub::connect("csv:readings.csv").unwrap();
//! let overrides = UnitOverrides::from_pairs([("temperature", "C")]);
//! let collector = HubCollector::new(hub, overrides);
//!
//! let families = collector.collect_pass();
//! let mut out = Vec::new();
//! TextEncoder::new().encode(&families, &mut out).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`hub`]: sensor hub abstraction and implementations
//! - [`units`]: unit overrides and sanitizing
//! - [`registry`]: grow-only series registry
//! - [`collector`]: the collection pass
//! - [`error`]: error types

pub mod collector;
pub mod error;
pub mod hub;
pub mod registry;
pub mod units;

pub use collector::{HubCollector, Reading};
pub use error::{CollectError, HubError};
pub use hub::{CsvHub, SensorHandle, SensorHub};
pub use registry::SeriesRegistry;
pub use units::{resolve_unit, UnitOverrides};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
