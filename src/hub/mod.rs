// Yocto Exporter - Sensor hub collection core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sensor hub client abstraction
//!
//! A hub aggregates one or more physical sensors. The collector only ever
//! talks to it through [`SensorHub`]: refresh the device list, walk the
//! sensors with opaque [`SensorHandle`]s, and read four attributes per
//! sensor.
//!
//! Two implementations ship with the crate:
//!
//! - [`CsvHub`]: replays sensor state from a CSV file (`csv:<path>`)
//! - `YapiHub`: native access through the vendor library (feature `yapi`)
//!
//! Sessions are released when the hub value is dropped.

mod native;
mod replay;
#[cfg(feature = "yapi")]
mod yapi;

pub use self::replay::CsvHub;
#[cfg(feature = "yapi")]
pub use self::yapi::YapiHub;

#[cfg(not(feature = "yapi"))]
use crate::error::HubError;
use crate::error::Result;
use tracing::info;

/// Address prefix selecting the CSV replay hub
pub const CSV_SCHEME: &str = "csv:";

/// Opaque reference to a sensor, valid until the next refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorHandle(usize);

impl SensorHandle {
    /// Wrap a hub-specific raw value
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Hub-specific raw value
    pub fn raw(self) -> usize {
        self.0
    }
}

/// Capabilities the collector needs from a sensor hub
///
/// Enumeration is forward-only: a pass starts at [`first_sensor`] and follows
/// [`next_sensor`] until it returns `None`. Attribute reads may fail for a
/// sensor that vanished mid-pass; callers are expected to skip that sensor.
///
/// [`first_sensor`]: SensorHub::first_sensor
/// [`next_sensor`]: SensorHub::next_sensor
pub trait SensorHub: Send {
    /// Poll the hub for current device and sensor state
    fn refresh(&mut self) -> Result<()>;

    /// First known sensor, if any
    fn first_sensor(&mut self) -> Option<SensorHandle>;

    /// Sensor following `handle`, if any
    fn next_sensor(&mut self, handle: SensorHandle) -> Option<SensorHandle>;

    /// Logical measurement channel id (used as the series name)
    fn function_id(&mut self, handle: SensorHandle) -> Result<String>;

    /// Physical module id
    fn hardware_id(&mut self, handle: SensorHandle) -> Result<String>;

    /// Unit as reported by the hub; not guaranteed to be valid UTF-8
    fn unit(&mut self, handle: SensorHandle) -> Result<Vec<u8>>;

    /// Latest measured value
    fn current_value(&mut self, handle: SensorHandle) -> Result<f64>;
}

/// Open a hub session for `url`
///
/// `csv:<path>` opens a [`CsvHub`]. Anything else (`usb`, `host`,
/// `host:port`) is handed to the native library, which requires the `yapi`
/// feature.
///
/// # Errors
///
/// Returns an error if the hub is unreachable, rejects the session, or no
/// implementation handles the address.
pub fn connect(url: &str) -> Result<Box<dyn SensorHub>> {
    if let Some(path) = url.strip_prefix(CSV_SCHEME) {
        let hub = CsvHub::open(path)?;
        info!("Replaying sensor state from {}", path);
        return Ok(Box::new(hub));
    }
    connect_native(url)
}

#[cfg(feature = "yapi")]
fn connect_native(url: &str) -> Result<Box<dyn SensorHub>> {
    let hub = YapiHub::connect(url)?;
    info!("Registered hub {}", url);
    Ok(Box::new(hub))
}

#[cfg(not(feature = "yapi"))]
fn connect_native(url: &str) -> Result<Box<dyn SensorHub>> {
    Err(HubError::Unsupported {
        url: url.to_string(),
        reason: format!(
            "native hub access requires the `yapi` feature; use {}<path> to replay a file",
            CSV_SCHEME
        ),
    })
}
