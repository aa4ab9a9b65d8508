use color_eyre::eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// `RUST_LOG` when set, otherwise the configured directive.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global subscriber on stderr, keeping stdout for samples.
/// JSON output also records span close events, so refresh timings show up.
pub fn init_tracing(filter: &str, json: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(filter))
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(
            builder
                .with_ansi(false)
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .finish(),
        )
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}
