// Tracing log adapter - Structured logging using tracing crate

use tracing_subscriber::EnvFilter;

use crate::domain::config::{LogFormat, LogLevel};
use crate::error::{ClipdeckError, ClipdeckResult};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. Logs go to stderr so
/// command output on stdout stays machine-readable.
pub fn init_logging(level: LogLevel, format: LogFormat) -> ClipdeckResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .map_err(|e| ClipdeckError::LoggingInit {
            message: e.to_string(),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| ClipdeckError::LoggingInit {
        message: e.to_string(),
    })
}
