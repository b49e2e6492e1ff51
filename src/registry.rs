// Yocto Exporter - Sensor hub collection core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Metric series registry
//!
//! One [`GaugeVec`] per function id, created the first time the function id
//! is seen and kept for the lifetime of the process. Each family carries the
//! `unit` and `hardwareId` label dimensions; label combinations are created
//! lazily by [`SeriesRegistry::observe`].

use prometheus::{Gauge, GaugeVec, Opts};
use std::collections::HashMap;
use tracing::debug;

/// Label dimension holding the resolved unit
pub const UNIT_LABEL: &str = "unit";

/// Label dimension holding the hardware id
pub const HARDWARE_ID_LABEL: &str = "hardwareId";

/// Help text of the family exported for `function_id`
pub fn help_text(function_id: &str) -> String {
    format!("Current {} reading", function_id)
}

/// Grow-only map from function id to its gauge family
#[derive(Default)]
pub struct SeriesRegistry {
    families: HashMap<String, GaugeVec>,
}

impl SeriesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Family for `function_id`, created on first use
    ///
    /// # Errors
    ///
    /// Returns an error if `function_id` is not a valid metric name. Nothing
    /// is registered in that case.
    pub fn get_or_create(&mut self, function_id: &str) -> prometheus::Result<&GaugeVec> {
        if !self.families.contains_key(function_id) {
            let opts = Opts::new(function_id, help_text(function_id));
            let family = GaugeVec::new(opts, &[UNIT_LABEL, HARDWARE_ID_LABEL])?;
            debug!("Registered series {}", function_id);
            self.families.insert(function_id.to_string(), family);
        }

        self.families
            .get(function_id)
            .ok_or_else(|| prometheus::Error::Msg(format!("series {} vanished", function_id)))
    }

    /// Set the sample for `(unit, hardware_id)` under `function_id`
    ///
    /// Returns the sample so the caller can emit it.
    pub fn observe(
        &mut self,
        function_id: &str,
        unit: &str,
        hardware_id: &str,
        value: f64,
    ) -> prometheus::Result<Gauge> {
        let sample = self
            .get_or_create(function_id)?
            .get_metric_with_label_values(&[unit, hardware_id])?;
        sample.set(value);
        Ok(sample)
    }

    /// Number of registered families
    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn contains(&self, function_id: &str) -> bool {
        self.families.contains_key(function_id)
    }

    /// Registered function ids, sorted
    pub fn function_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.families.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut registry = SeriesRegistry::new();
        registry.get_or_create("temperature").unwrap();
        registry.get_or_create("temperature").unwrap();
        registry.get_or_create("humidity").unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.function_ids(), vec!["humidity", "temperature"]);
    }

    #[test]
    fn test_family_description() {
        let mut registry = SeriesRegistry::new();
        let family = registry.get_or_create("pressure").unwrap();
        let desc = family.desc()[0];

        assert_eq!(desc.fq_name, "pressure");
        assert_eq!(desc.help, "Current pressure reading");
        assert_eq!(desc.variable_labels, vec!["unit", "hardwareId"]);
    }

    #[test]
    fn test_invalid_name_is_not_registered() {
        let mut registry = SeriesRegistry::new();
        assert!(registry.get_or_create("bad name!").is_err());
        assert!(registry.is_empty());
        assert!(!registry.contains("bad name!"));
    }

    #[test]
    fn test_observe_overwrites_same_labels() {
        let mut registry = SeriesRegistry::new();
        registry.observe("voltage1", "V", "VOLT-1.voltage1", 3.3).unwrap();
        let sample = registry.observe("voltage1", "V", "VOLT-1.voltage1", 5.0).unwrap();

        assert_eq!(sample.get(), 5.0);
        let families = registry.get_or_create("voltage1").unwrap().collect();
        assert_eq!(families[0].get_metric().len(), 1);
    }

    #[test]
    fn test_observe_distinct_labels() {
        let mut registry = SeriesRegistry::new();
        registry.observe("temperature", "C", "METEO-1.temperature", 20.0).unwrap();
        registry.observe("temperature", "C", "METEO-2.temperature", 21.0).unwrap();

        assert_eq!(registry.len(), 1);
        let families = registry.get_or_create("temperature").unwrap().collect();
        assert_eq!(families[0].get_metric().len(), 2);
    }
}
