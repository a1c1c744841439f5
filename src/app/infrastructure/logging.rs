//! Logging setup.
//!
//! Console output respects `RUST_LOG` and defaults to warnings only, so the
//! interactive prompt stays readable. When file logging is enabled, debug
//! level logs also go to `<data dir>/quillpad/logs/quillpad.log` with daily
//! rotation.

use std::fs;
use std::path::PathBuf;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::infrastructure::error::Result;

pub const LOG_FILE_NAME: &str = "quillpad.log";

/// Directory holding the rotated log files.
pub fn logs_dir() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("quillpad");
    path.push("logs");
    path
}

fn ensure_logs_dir() -> Result<PathBuf> {
    let dir = logs_dir();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Install the global subscriber. Call once, before the session starts.
pub fn init(log_to_file: bool) {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(console_filter);

    let file_layer = if log_to_file {
        match ensure_logs_dir() {
            Ok(dir) => {
                let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
                Some(
                    fmt::layer()
                        .with_writer(appender)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true)
                        .with_filter(EnvFilter::new("debug")),
                )
            }
            Err(e) => {
                eprintln!("Warning: Could not initialize file logging: {}", e);
                None
            }
        }
    } else {
        None
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Warning: logging already initialized: {}", e);
    }
}
