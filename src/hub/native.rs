// Yocto Exporter - Sensor hub collection core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Conversions for values coming back from the native wrapper
//!
//! Kept free of FFI calls so they build and test without the vendor library.

#![cfg_attr(not(feature = "yapi"), allow(dead_code))]

use crate::error::{HubError, Result};
use std::ffi::{c_char, CStr};

/// Size of every string buffer handed to the wrapper, NUL included
pub(crate) const BUFFER_SIZE: usize = 256;

/// Value YAPI reports when a measurement is not available
pub(crate) const INVALID_DOUBLE: f64 = -66_666_666.0;

/// Bytes up to the first NUL, never past the end of the buffer
pub(crate) fn buffer_to_bytes(buf: &[c_char]) -> Vec<u8> {
    let bytes: Vec<u8> = buf.iter().map(|&c| c as u8).collect();
    match CStr::from_bytes_until_nul(&bytes) {
        Ok(s) => s.to_bytes().to_vec(),
        Err(_) => bytes,
    }
}

pub(crate) fn buffer_to_string(buf: &[c_char]) -> String {
    String::from_utf8_lossy(&buffer_to_bytes(buf)).into_owned()
}

/// Reject the "no measurement" sentinel
///
/// The sentinel is a legal f64, so it would otherwise be exported as a real
/// reading.
pub(crate) fn checked_value(value: f64) -> Result<f64> {
    if value == INVALID_DOUBLE {
        return Err(HubError::read("current value", "sensor reports no valid measurement"));
    }
    Ok(value)
}
