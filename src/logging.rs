//! Tracing setup: stdout plus an append-only log file.
//!
//! `RUST_LOG` controls the filter and defaults to `info`. Timestamps are RFC
//! 3339 UTC on both sinks.

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

/// Install the global subscriber writing to stdout and appending to `log_file`.
///
/// The parent directory of `log_file` is created when missing.
pub fn init(log_file: &str) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = Path::new(log_file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;
    let writer = std::io::stdout.and(Arc::new(file));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tfmt::time::UtcTime::rfc_3339())
        .try_init()
        .map_err(|e| e as Box<dyn Error>)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_log_dir_and_rejects_second_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");
        let path = path.to_str().unwrap();

        init(path).unwrap();
        tracing::info!("first line");
        assert!(Path::new(path).exists());

        // A global subscriber is already installed; this must be an error, not a panic.
        assert!(init(path).is_err());
    }
}
