//! Tracing initialisation for the Volcanology daemon.
//!
//! Call [`init_tracing`] once at program start. Later calls are ignored,
//! since the global subscriber can only be set once per process.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// * `json` - newline-delimited JSON lines carrying the current cycle span,
///   otherwise compact human-readable lines.
/// * `level` - default verbosity when `RUST_LOG` is not set.
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_target(false))
            .try_init()
    };

    if installed.is_ok() {
        tracing::debug!(json = json, level = %level, "tracing initialised");
    }
}
