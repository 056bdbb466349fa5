//! Tracing initialization

use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global subscriber: human-readable output on stderr, plus
/// daily JSON files when a log directory is configured. `RUST_LOG` wins over
/// the verbosity flag when set.
pub fn init(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "flowdeck.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .try_init()
                .ok();
            Ok(Some(guard))
        }
        None => {
            registry.try_init().ok();
            Ok(None)
        }
    }
}
