//! Tracing subscriber setup shared by the server and the kiosk

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Install the global subscriber. `default_directives` applies when
/// `RUST_LOG` is not set, with `{level}` replaced by the configured level.
///
/// The returned guard must be kept alive for file output to be flushed.
pub fn init(config: &LoggingConfig, default_directives: &str, file_prefix: &str) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives.replace("{level}", &config.level).into());

    let json = config.format.eq_ignore_ascii_case("json");
    // Console output goes to stderr, leaving stdout to the kiosk screen
    let console_layer = fmt::layer().with_writer(std::io::stderr);
    let console_layer = if json {
        console_layer.json().boxed()
    } else {
        console_layer.boxed()
    };

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            let layer = if json { layer.json().boxed() } else { layer.boxed() };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}
