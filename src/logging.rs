use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// How log lines are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines for an operator watching a run.
    Text,
    /// One JSON object per event, with span context.
    Json,
}

impl LogFormat {
    /// Read `SCRIBE_RELAY_LOG_FORMAT` (`json` or `text`, default `text`).
    pub fn from_env() -> Self {
        match std::env::var("SCRIBE_RELAY_LOG_FORMAT") {
            Ok(value) if value.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Initialize logging on stderr using [`LogFormat::from_env`].
///
/// Defaults to `info` level unless overridden by `SCRIBE_RELAY_LOG`.
pub fn init() {
    init_with(LogFormat::from_env());
}

/// Initialize logging with an explicit format. Safe to call more than once.
pub fn init_with(format: LogFormat) {
    install(format, LevelFilter::INFO);
}

fn install(format: LogFormat, default_level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_env_var("SCRIBE_RELAY_LOG")
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let json = (format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
    });
    let text = (format == LogFormat::Text).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        // The first call wins for the whole test binary; keep it quiet.
        install(LogFormat::Json, LevelFilter::ERROR);
        install(LogFormat::Text, LevelFilter::ERROR);
        init_with(LogFormat::Text);
        init();
    }
}
