// src/telemetry.rs
use crate::config::LogFormat;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVES: &str = "simple_load_balancer=info,lb=info,hyper=info";
const DEBUG_DIRECTIVES: &str = "simple_load_balancer=debug,lb=debug,hyper=info";

/// Filter directives applied when `RUST_LOG` is unset.
pub fn default_directives(debug: bool) -> &'static str {
    if debug {
        DEBUG_DIRECTIVES
    } else {
        DEFAULT_DIRECTIVES
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the defaults.
pub fn init(format: LogFormat, debug: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .try_init(),
    }
    .map_err(anyhow::Error::msg)
}

/// Any panic, on any thread or task, is logged and ends the process.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let location = info
            .location()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let backtrace = std::backtrace::Backtrace::force_capture();

        tracing::error!(
            panic = %payload,
            %location,
            %backtrace,
            "panic recovered, exiting"
        );
        std::process::exit(1);
    }));
}
