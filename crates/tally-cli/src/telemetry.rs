use std::fs;
use std::path::PathBuf;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const LOG_FILE_PREFIX: &str = "tally.log";
const LOG_ENV_VAR: &str = "TALLY_LOG";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// One-shot commands
    Stderr,
    /// Interactive mode owns the terminal, so logs go to daily files in this dir
    Daily(PathBuf),
}

pub struct TelemetryGuard {
    _guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Installs the global subscriber. `TALLY_LOG` wins over everything else.
pub fn init(target: LogTarget, configured_level: &str, verbosity: u8) -> TelemetryGuard {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| {
        EnvFilter::new(default_directive(&target, configured_level, verbosity))
    });

    let (layer, guard) = match &target {
        LogTarget::Stderr => (build_stderr_layer(), None),
        LogTarget::Daily(dir) => match fs::create_dir_all(dir) {
            Ok(()) => {
                let (layer, guard) = build_file_layer(dir.clone());
                (layer, Some(guard))
            }
            Err(err) => {
                eprintln!("log dir init failed for {}: {err}", dir.display());
                (build_sink_layer(), None)
            }
        },
    };

    // A second init (tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init();

    TelemetryGuard { _guard: guard }
}

/// One-shot commands stay quiet unless asked; the TUI log file follows the
/// configured level.
fn default_directive(target: &LogTarget, configured_level: &str, verbosity: u8) -> String {
    match (verbosity, target) {
        (0, LogTarget::Stderr) => "warn".to_string(),
        (0, LogTarget::Daily(_)) => configured_level.to_string(),
        (1, _) => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn build_stderr_layer() -> Box<dyn Layer<Registry> + Send + Sync> {
    Box::new(
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true),
    )
}

fn build_file_layer(
    dir: PathBuf,
) -> (
    Box<dyn Layer<Registry> + Send + Sync>,
    tracing_appender::non_blocking::WorkerGuard,
) {
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
    (Box::new(layer), guard)
}

fn build_sink_layer() -> Box<dyn Layer<Registry> + Send + Sync> {
    Box::new(tracing_subscriber::fmt::layer().with_writer(std::io::sink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        let file = LogTarget::Daily(PathBuf::from("/tmp/logs"));
        assert_eq!(default_directive(&LogTarget::Stderr, "info", 0), "warn");
        assert_eq!(default_directive(&file, "tally_view=trace", 0), "tally_view=trace");
        assert_eq!(default_directive(&LogTarget::Stderr, "info", 1), "debug");
        assert_eq!(default_directive(&file, "info", 3), "trace");
    }
}
