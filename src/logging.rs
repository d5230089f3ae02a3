use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_LEVEL_VAR: &str = "OCTOPUS_LOG";
const LOG_ALL_VAR: &str = "OCTOPUS_LOG_ALL";

/// Setup logging.
///
/// Only logs from this crate are shown, at `info` unless `OCTOPUS_LOG` says otherwise.
/// Setting `OCTOPUS_LOG_ALL` shows logs from every crate at that level.
/// `debug` (the hidden `--debug` flag) forces the level to `debug`.
pub fn setup_logging(debug: bool) {
    let log_level = if debug {
        "debug".to_string()
    } else {
        std::env::var(LOG_LEVEL_VAR).unwrap_or_else(|_| "info".to_string())
    };

    let filter = log_filter(&log_level, std::env::var(LOG_ALL_VAR).is_ok());

    // stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::new(filter))
        .init();
}

fn log_filter(log_level: &str, show_all_logs: bool) -> String {
    if show_all_logs {
        log_level.to_string()
    } else {
        format!("{}={log_level}", env!("CARGO_CRATE_NAME"))
    }
}
