// Yocto Exporter - Sensor hub collection core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! CSV replay hub
//!
//! Serves sensor state from a CSV file instead of real hardware. The file is
//! re-read on every refresh, so editing it while the exporter runs changes
//! what the next scrape sees.
//!
//! ```text
//! function_id,hardware_id,unit,value
//! temperature,METEOMK1-12345.temperature,°C,21.5
//! humidity,METEOMK1-12345.humidity,%RH,48.0
//! ```
//!
//! Column order is free and extra columns are ignored. Fields are kept as
//! raw bytes so malformed text reaches the collector the same way it would
//! from a real hub.

use super::{SensorHandle, SensorHub, CSV_SCHEME};
use crate::error::{HubError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

const FUNCTION_ID: &str = "function_id";
const HARDWARE_ID: &str = "hardware_id";
const UNIT: &str = "unit";
const VALUE: &str = "value";

/// One sensor row, exactly as found in the file
#[derive(Debug, Clone)]
struct SensorRow {
    function_id: Vec<u8>,
    hardware_id: Vec<u8>,
    unit: Vec<u8>,
    value: Vec<u8>,
}

/// Hub backed by a CSV snapshot of sensor state
#[derive(Debug)]
pub struct CsvHub {
    path: PathBuf,
    rows: Vec<SensorRow>,
}

impl CsvHub {
    /// Open a replay file
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Connect`] if the file cannot be read or lacks one
    /// of the required columns.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let rows = Self::load(&path).map_err(|e| HubError::Connect {
            url: format!("{}{}", CSV_SCHEME, path.display()),
            reason: e.to_string(),
        })?;

        Ok(Self { path, rows })
    }

    /// Number of sensors loaded by the last successful read
    pub fn sensor_count(&self) -> usize {
        self.rows.len()
    }

    fn load(path: &Path) -> Result<Vec<SensorRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let headers = reader.byte_headers()?.clone();
        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name.as_bytes())
                .ok_or_else(|| HubError::InvalidFormat(format!("missing '{}' column", name)))
        };
        let function_id = column(FUNCTION_ID)?;
        let hardware_id = column(HARDWARE_ID)?;
        let unit = column(UNIT)?;
        let value = column(VALUE)?;

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or_default().to_vec();

            rows.push(SensorRow {
                function_id: field(function_id),
                hardware_id: field(hardware_id),
                unit: field(unit),
                value: field(value),
            });
        }

        Ok(rows)
    }

    fn row(&self, handle: SensorHandle) -> Result<&SensorRow> {
        self.rows
            .get(handle.raw())
            .ok_or(HubError::StaleHandle(handle.raw()))
    }
}

fn utf8_field(attribute: &'static str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| HubError::read(attribute, e.to_string()))
}

impl SensorHub for CsvHub {
    fn refresh(&mut self) -> Result<()> {
        let rows = Self::load(&self.path)?;
        debug!("Reloaded {} sensors from {}", rows.len(), self.path.display());
        self.rows = rows;
        Ok(())
    }

    fn first_sensor(&mut self) -> Option<SensorHandle> {
        if self.rows.is_empty() {
            None
        } else {
            Some(SensorHandle::new(0))
        }
    }

    fn next_sensor(&mut self, handle: SensorHandle) -> Option<SensorHandle> {
        let next = handle.raw() + 1;
        (next < self.rows.len()).then(|| SensorHandle::new(next))
    }

    fn function_id(&mut self, handle: SensorHandle) -> Result<String> {
        utf8_field("function id", &self.row(handle)?.function_id)
    }

    fn hardware_id(&mut self, handle: SensorHandle) -> Result<String> {
        utf8_field("hardware id", &self.row(handle)?.hardware_id)
    }

    fn unit(&mut self, handle: SensorHandle) -> Result<Vec<u8>> {
        Ok(self.row(handle)?.unit.clone())
    }

    fn current_value(&mut self, handle: SensorHandle) -> Result<f64> {
        let raw = utf8_field("current value", &self.row(handle)?.value)?;
        raw.parse::<f64>()
            .map_err(|e| HubError::read("current value", format!("'{}': {}", raw, e)))
    }
}
