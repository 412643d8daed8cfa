//! Observability setup.
//!
//! Structured logging through `tracing`; `RUST_LOG` controls the filter
//! (default `info`) and `LOG_FORMAT=json` switches to JSON lines.

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Install the global tracing subscriber. Logs go to stderr.
pub fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Pretty => builder.with_ansi(false).try_init(),
    };

    if let Err(e) = result {
        eprintln!("Tracing subscriber already initialized: {}", e);
    }
}

/// Install a panic hook that reports panics through `tracing`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_default();

        tracing::error!(
            location = %location,
            "PANIC occurred: {}\nBacktrace:\n{}",
            message,
            std::backtrace::Backtrace::capture()
        );
    }));
}
