// Yocto Exporter - Sensor hub collection core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Unit resolution
//!
//! Hubs report units as raw bytes that are not always valid text (the degree
//! sign is a common offender). Users can pin the unit of a function id with an
//! override, which always wins over whatever the hub reports.

use std::collections::HashMap;

/// Replacement for each run of invalid UTF-8 in a hub-reported unit
pub const PLACEHOLDER: char = '?';

/// Immutable function id → unit mapping built at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitOverrides {
    units: HashMap<String, String>,
}

impl UnitOverrides {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(function_id, unit)` pairs; the last pair for a key wins
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            units: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Override for `function_id`, if any
    pub fn get(&self, function_id: &str) -> Option<&str> {
        self.units.get(function_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Unit to export for a reading of `function_id`
pub fn resolve_unit(function_id: &str, raw_unit: &[u8], overrides: &UnitOverrides) -> String {
    match overrides.get(function_id) {
        Some(unit) => unit.to_string(),
        None => sanitize_unit(raw_unit),
    }
}

/// Decode `raw` as UTF-8, collapsing each run of invalid bytes into a single
/// [`PLACEHOLDER`]
pub fn sanitize_unit(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    let mut in_invalid_run = false;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, invalid) = rest.split_at(err.valid_up_to());
                if !valid.is_empty() {
                    out.push_str(&String::from_utf8_lossy(valid));
                    in_invalid_run = false;
                }
                if !in_invalid_run {
                    out.push(PLACEHOLDER);
                    in_invalid_run = true;
                }
                let skip = err.error_len().unwrap_or(invalid.len());
                rest = &invalid[skip..];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let overrides = UnitOverrides::from_pairs([("temperature", "C")]);
        assert_eq!(resolve_unit("temperature", b"'F", &overrides), "C");
        assert_eq!(resolve_unit("temperature", b"\xb0C", &overrides), "C");
    }

    #[test]
    fn test_hub_unit_without_override() {
        let overrides = UnitOverrides::from_pairs([("temperature", "C")]);
        assert_eq!(resolve_unit("humidity", b"%RH", &overrides), "%RH");
    }

    #[test]
    fn test_last_pair_wins() {
        let overrides = UnitOverrides::from_pairs([("voltage1", "V"), ("voltage1", "mV")]);
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides.get("voltage1"), Some("mV"));
    }

    #[test]
    fn test_empty_override_is_allowed() {
        let overrides = UnitOverrides::from_pairs([("pressure", "")]);
        assert_eq!(resolve_unit("pressure", b"hPa", &overrides), "");
    }

    #[test]
    fn test_sanitize_valid_utf8() {
        assert_eq!(sanitize_unit("°C".as_bytes()), "°C");
        assert_eq!(sanitize_unit(b""), "");
    }

    #[test]
    fn test_sanitize_latin1_degree() {
        assert_eq!(sanitize_unit(b"\xb0C"), "?C");
    }

    #[test]
    fn test_sanitize_collapses_invalid_runs() {
        assert_eq!(sanitize_unit(b"\xff\xfe\xfdm/s"), "?m/s");
        assert_eq!(sanitize_unit(b"a\xffb\xffc"), "a?b?c");
    }

    #[test]
    fn test_sanitize_truncated_sequence() {
        // First two bytes of a three-byte sequence at the end of the buffer
        assert_eq!(sanitize_unit(b"lx\xe2\x82"), "lx?");
    }
}
