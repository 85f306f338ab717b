//! Subscriber setup for the `roundtable` binary.
//!
//! Session events are emitted under the `roundtable_core` target; everything
//! else (tokio, process spawning, serde) is held at `warn` unless `RUST_LOG`
//! asks for more.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// How session logs are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// Newline-delimited JSON instead of the human format.
    pub json: bool,
    /// Verbosity for roundtable's own targets when `RUST_LOG` is unset.
    pub level: Level,
    /// Print the emitting module next to each line.
    pub show_targets: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            json: false,
            level: Level::INFO,
            show_targets: false,
        }
    }
}

impl LogOptions {
    /// Verbose runs get debug logs with targets, so selector fallbacks and
    /// retries can be traced to their module.
    pub fn verbose(json: bool) -> Self {
        Self {
            json,
            level: Level::DEBUG,
            show_targets: true,
        }
    }
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    format!("warn,roundtable_core={level},roundtable={level}")
}

/// Install the global subscriber. Logs go to stderr so transcript and
/// summary output on stdout stays clean. Later calls are ignored.
pub fn init_tracing(options: LogOptions) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(options.level)));
    let layer = fmt::layer()
        .with_target(options.show_targets)
        .with_writer(std::io::stderr);

    let installed = if options.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
