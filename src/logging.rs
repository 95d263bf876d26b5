//! Diagnostic logging setup
//!
//! The library only emits `tracing` events: lifecycle transitions and wiring
//! at `debug`, per-element forwarding at `trace`, task start/completion at
//! `info` and element failures at `error`. Binaries and tests that want to
//! see them install a subscriber with [`init`] or [`init_with_default`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level used as the fallback filter when `RUST_LOG` is unset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// Initialize logging, defaulting to `warn` when `RUST_LOG` is unset
pub fn init() {
    init_with_default(LogLevel::Warn);
}

/// Initialize logging with an explicit fallback level
///
/// Output goes to stderr in compact format. Calling this more than once is
/// harmless: later calls leave the first subscriber in place.
///
/// # Example
/// ```bash
/// RUST_LOG=opgraph=debug cargo test
/// ```
pub fn init_with_default(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
