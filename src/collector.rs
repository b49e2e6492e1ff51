// Yocto Exporter - Sensor hub collection core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Collection pass
//!
//! [`HubCollector`] owns the hub session and the series registry. Each pass
//! refreshes the hub, walks every visible sensor, resolves its unit, updates
//! the matching series and returns the samples touched by that pass as
//! Prometheus metric families.
//!
//! A pass never fails as a whole. Sensors whose attributes cannot be read
//! are skipped and logged at debug level; a failed refresh falls back to
//! whatever state the hub still has.

use crate::error::CollectError;
use crate::hub::{SensorHandle, SensorHub};
use crate::registry::SeriesRegistry;
use crate::units::{resolve_unit, UnitOverrides};
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::Gauge;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// One sensor reading, valid for the duration of a pass
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub function_id: String,
    pub hardware_id: String,
    pub unit: String,
    pub value: f64,
}

/// State shared by all passes
struct CollectorState {
    hub: Box<dyn SensorHub>,
    registry: SeriesRegistry,
}

/// Samples touched in one pass: function id → (unit, hardware id) → sample
type PassSamples = BTreeMap<String, BTreeMap<(String, String), Gauge>>;

/// Prometheus collector backed by a sensor hub
///
/// Concurrent passes are serialized: the hub session and the registry sit
/// behind one mutex held for the whole pass.
pub struct HubCollector {
    state: Mutex<CollectorState>,
    overrides: UnitOverrides,
}

impl HubCollector {
    /// Create a collector taking ownership of the hub session
    pub fn new(hub: Box<dyn SensorHub>, overrides: UnitOverrides) -> Self {
        Self {
            state: Mutex::new(CollectorState {
                hub,
                registry: SeriesRegistry::new(),
            }),
            overrides,
        }
    }

    /// Number of metric families registered since startup
    pub fn series_count(&self) -> usize {
        self.lock().registry.len()
    }

    /// Function ids registered since startup, sorted
    pub fn function_ids(&self) -> Vec<String> {
        self.lock().registry.function_ids()
    }

    /// Run one collection pass
    ///
    /// Returns one family per function id seen in this pass, sorted by name,
    /// each holding one sample per `(unit, hardwareId)` pair sorted by
    /// labels. A sensor enumerated twice in the same pass is emitted once
    /// with its last value.
    pub fn collect_pass(&self) -> Vec<MetricFamily> {
        let mut guard = self.lock();
        let CollectorState { hub, registry } = &mut *guard;

        if let Err(e) = hub.refresh() {
            debug!("Hub refresh failed, using cached state: {}", e);
        }

        let mut touched = PassSamples::new();
        let mut skipped = 0usize;

        let mut cursor = hub.first_sensor();
        while let Some(handle) = cursor {
            match self.observe_sensor(&mut **hub, registry, handle) {
                Ok((reading, sample)) => {
                    touched
                        .entry(reading.function_id)
                        .or_default()
                        .insert((reading.unit, reading.hardware_id), sample);
                }
                Err(e) => {
                    skipped += 1;
                    debug!("Skipping sensor {:?}: {}", handle, e);
                }
            }
            cursor = hub.next_sensor(handle);
        }

        let families: Vec<MetricFamily> = touched.into_values().filter_map(merge_samples).collect();
        debug!(
            "Collection pass done: {} families, {} sensors skipped",
            families.len(),
            skipped
        );
        families
    }

    fn observe_sensor(
        &self,
        hub: &mut dyn SensorHub,
        registry: &mut SeriesRegistry,
        handle: SensorHandle,
    ) -> Result<(Reading, Gauge), CollectError> {
        let reading = read_sensor(hub, handle, &self.overrides)?;
        let sample = registry.observe(
            &reading.function_id,
            &reading.unit,
            &reading.hardware_id,
            reading.value,
        )?;
        Ok((reading, sample))
    }

    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        // The registry only grows, so state left by a panicking pass is
        // still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read and validate the four attributes of one sensor
pub fn read_sensor(
    hub: &mut dyn SensorHub,
    handle: SensorHandle,
    overrides: &UnitOverrides,
) -> Result<Reading, CollectError> {
    let function_id = hub.function_id(handle)?;
    if function_id.is_empty() {
        return Err(CollectError::Unusable("empty function id".to_string()));
    }

    let unit = resolve_unit(&function_id, &hub.unit(handle)?, overrides);

    let hardware_id = hub.hardware_id(handle)?;
    if hardware_id.is_empty() {
        return Err(CollectError::Unusable(format!(
            "empty hardware id for {}",
            function_id
        )));
    }

    let value = hub.current_value(handle)?;
    if !value.is_finite() {
        return Err(CollectError::Unusable(format!(
            "non-finite value {} for {}",
            value, function_id
        )));
    }

    Ok(Reading {
        function_id,
        hardware_id,
        unit,
        value,
    })
}

/// Fold the samples of one function id into a single family
fn merge_samples(samples: BTreeMap<(String, String), Gauge>) -> Option<MetricFamily> {
    let mut merged: Option<MetricFamily> = None;

    for sample in samples.into_values() {
        for mut family in sample.collect() {
            if let Some(target) = merged.as_mut() {
                for metric in family.take_metric().into_iter() {
                    target.mut_metric().push(metric);
                }
                continue;
            }
            merged = Some(family);
        }
    }

    merged
}

impl Collector for HubCollector {
    /// Families are only known once the hub has been walked, so nothing is
    /// described up front.
    fn desc(&self) -> Vec<&Desc> {
        Vec::new()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.collect_pass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_samples_single_family() {
        let mut registry = SeriesRegistry::new();
        let mut samples = BTreeMap::new();
        for (unit, hw, value) in [("C", "T-2", 2.0), ("C", "T-1", 1.0)] {
            let sample = registry.observe("temperature", unit, hw, value).unwrap();
            samples.insert((unit.to_string(), hw.to_string()), sample);
        }

        let family = merge_samples(samples).unwrap();
        assert_eq!(family.get_name(), "temperature");
        assert_eq!(family.get_metric().len(), 2);
        assert_eq!(family.get_metric()[0].get_gauge().get_value(), 1.0);
    }

    #[test]
    fn test_merge_samples_empty() {
        assert!(merge_samples(BTreeMap::new()).is_none());
    }
}
