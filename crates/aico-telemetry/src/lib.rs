//! Logging setup for aico
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a `fmt`
//! layer. Library crates only emit `tracing` events; the embedding
//! application decides whether and how they are rendered by calling [`init`].

use aico_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber described by `config`
///
/// An unparseable filter directive falls back to `info` rather than failing.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed
pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt_layer(config.format))
        .with(build_filter(&config.log_filter))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

fn build_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn fmt_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Pretty => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn invalid_filter_falls_back_to_info() {
        let filter = build_filter("aico=[[[");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn valid_filter_is_kept() {
        let filter = build_filter("warn");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn second_init_reports_error() {
        let config = TelemetryConfig {
            log_filter: "warn".to_owned(),
            format: LogFormat::Json,
        };
        // Another test binary thread may have won the race; either way the
        // second call must not panic and must fail.
        let _ = init(&config);
        assert!(init(&config).is_err());
    }
}
