// Yocto Exporter - Prometheus exporter for Yoctopuce sensor hubs
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Yocto Exporter
//!
//! Prometheus exporter for the sensors attached to a Yoctopuce hub.
//!
//! ## Usage
//!
//! ```bash
//! # Serve metrics from local USB sensors on :8000/metrics
//! # (native hub URLs need a build with `--features yapi`)
//! yocto-exporter
//!
//! # Network hub, custom port, fixed unit for temperature
//! yocto-exporter --hub-url 192.168.1.10 --listen-address :9100 \
//!     --override-unit temperature=C
//!
//! # Print one snapshot to stdout and exit
//! yocto-exporter --hub-url csv:readings.csv --oneshot
//! ```

mod config;
mod error;
mod metrics;
mod server;

use clap::Parser;
use config::Args;
use error::ExporterError;
use server::AppState;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;
use yocto_metrics::{hub, HubCollector, UnitOverrides};

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);

    info!("Yocto Exporter v{}", env!("CARGO_PKG_VERSION"));

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so one-shot output on stdout stays clean.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::new(level.to_string())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), ExporterError> {
    let overrides = UnitOverrides::from_pairs(args.override_unit.iter().cloned());
    if !overrides.is_empty() {
        info!("{} unit override(s) configured", overrides.len());
    }

    let hub = hub::connect(&args.hub_url)?;
    info!("Connected to hub '{}'", args.hub_url);
    let collector = Arc::new(HubCollector::new(hub, overrides));

    if args.oneshot {
        return oneshot(&collector, &mut io::stdout().lock());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ExporterError::Runtime)?;

    let state = Arc::new(AppState::new(
        collector,
        args.hub_url.clone(),
        config::metrics_route(&args.metrics_path),
    ));
    let addr = config::bind_address(&args.listen_address);

    runtime.block_on(server::serve(state, &addr))
}

/// Run a single pass and write the payload to `out`.
fn oneshot<W: Write>(collector: &HubCollector, out: &mut W) -> Result<(), ExporterError> {
    let families = collector.collect_pass();
    metrics::write_metrics(&families, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn collector_for(rows: &[&str]) -> (NamedTempFile, HubCollector) {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "function_id,hardware_id,unit,value").unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file.flush().unwrap();

        let hub = hub::connect(&format!("csv:{}", file.path().display())).unwrap();
        (file, HubCollector::new(hub, UnitOverrides::new()))
    }

    #[test]
    fn test_oneshot_writes_one_record_per_sensor() {
        let (_file, collector) = collector_for(&["A,HW1,V,1.0", "B,HW2,A,2.5"]);

        let mut out = Vec::new();
        oneshot(&collector, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "# HELP A Current A reading\n\
             # TYPE A gauge\n\
             A{hardwareId=\"HW1\",unit=\"V\"} 1\n\
             # HELP B Current B reading\n\
             # TYPE B gauge\n\
             B{hardwareId=\"HW2\",unit=\"A\"} 2.5\n"
        );
    }

    #[test]
    fn test_oneshot_empty_hub_writes_nothing() {
        let (_file, collector) = collector_for(&[]);

        let mut out = Vec::new();
        oneshot(&collector, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_oneshot_write_failure_is_an_error() {
        struct Closed;

        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let (_file, collector) = collector_for(&["A,HW1,V,1.0"]);
        assert!(oneshot(&collector, &mut Closed).is_err());
    }
}
