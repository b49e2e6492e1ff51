// Yocto Exporter - Prometheus exporter for Yoctopuce sensor hubs
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Command line configuration

use clap::Parser;
use thiserror::Error;

/// Yoctopuce Prometheus Exporter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The address to listen on for HTTP requests (":port" listens on all IPv4 and IPv6 interfaces)
    #[arg(long, default_value = ":8000")]
    pub listen_address: String,

    /// Path under which to serve metrics
    #[arg(long, default_value = "/metrics")]
    pub metrics_path: String,

    /// Hub URL (e.g. 'usb', '127.0.0.1:4444', '192.168.1.10', 'csv:readings.csv')
    #[arg(long, default_value = "usb")]
    pub hub_url: String,

    /// Run once and output metrics to stdout, then exit
    #[arg(long)]
    pub oneshot: bool,

    /// Override the unit of a function id (e.g. --override-unit temperature=C). Can be repeated
    #[arg(long = "override-unit", value_name = "FUNCTION_ID=UNIT", value_parser = parse_override)]
    pub override_unit: Vec<(String, String)>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Startup configuration errors
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    /// An override entry without '='
    #[error("invalid override '{0}', expected FUNCTION_ID=UNIT")]
    MalformedOverride(String),
}

/// Split a `function_id=unit` entry at the first '='
pub fn parse_override(entry: &str) -> Result<(String, String), ConfigError> {
    entry
        .split_once('=')
        .map(|(id, unit)| (id.to_string(), unit.to_string()))
        .ok_or_else(|| ConfigError::MalformedOverride(entry.to_string()))
}

/// Socket address to bind; a bare `:port` means the IPv6 wildcard, which
/// also accepts IPv4 clients on dual-stack hosts
pub fn bind_address(listen_address: &str) -> String {
    if listen_address.starts_with(':') {
        format!("[::]{}", listen_address)
    } else {
        listen_address.to_string()
    }
}

/// Metrics route with a leading '/'
pub fn metrics_route(metrics_path: &str) -> String {
    if metrics_path.starts_with('/') {
        metrics_path.to_string()
    } else {
        format!("/{}", metrics_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["yocto-exporter"]).unwrap();
        assert_eq!(args.listen_address, ":8000");
        assert_eq!(args.metrics_path, "/metrics");
        assert_eq!(args.hub_url, "usb");
        assert!(!args.oneshot);
        assert!(args.override_unit.is_empty());
    }

    #[test]
    fn test_repeated_overrides() {
        let args = Args::try_parse_from([
            "yocto-exporter",
            "--override-unit",
            "temperature='C",
            "--override-unit",
            "voltage1=V",
            "--override-unit",
            "temperature=C",
        ])
        .unwrap();
        assert_eq!(
            args.override_unit,
            vec![
                ("temperature".to_string(), "'C".to_string()),
                ("voltage1".to_string(), "V".to_string()),
                ("temperature".to_string(), "C".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_override_is_rejected() {
        let result = Args::try_parse_from(["yocto-exporter", "--override-unit", "temperature"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_version_flag_short_circuits() {
        let err = Args::try_parse_from(["yocto-exporter", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("pressure=hPa"),
            Ok(("pressure".to_string(), "hPa".to_string()))
        );
        assert_eq!(
            parse_override("ratio=a=b"),
            Ok(("ratio".to_string(), "a=b".to_string()))
        );
        assert_eq!(
            parse_override("pressure"),
            Err(ConfigError::MalformedOverride("pressure".to_string()))
        );
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(bind_address(":8000"), "[::]:8000");
        assert_eq!(bind_address("127.0.0.1:9100"), "127.0.0.1:9100");
        assert_eq!(bind_address("[::1]:9100"), "[::1]:9100");
    }

    #[test]
    fn test_bare_port_parses_as_socket_address() {
        let addr: std::net::SocketAddr = bind_address(":8000").parse().unwrap();
        assert!(addr.ip().is_unspecified());
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_metrics_route() {
        assert_eq!(metrics_route("/metrics"), "/metrics");
        assert_eq!(metrics_route("probe"), "/probe");
    }
}
