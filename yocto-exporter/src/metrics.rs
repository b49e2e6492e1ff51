// Yocto Exporter - Prometheus exporter for Yoctopuce sensor hubs
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Exposition encoding
//!
//! Both sinks go through here: the HTTP handler encodes to a string, the
//! one-shot driver streams straight to stdout.

use crate::error::ExporterError;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};
use std::io::Write;

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Encode metric families to Prometheus text format.
pub fn encode_metrics(families: &[MetricFamily]) -> Result<String, ExporterError> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(families, &mut buffer)?;
    // The text encoder only writes UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Encode metric families to `writer` and flush it.
pub fn write_metrics<W: Write>(families: &[MetricFamily], writer: &mut W) -> Result<(), ExporterError> {
    TextEncoder::new().encode(families, writer)?;
    writer.flush()?;
    Ok(())
}
