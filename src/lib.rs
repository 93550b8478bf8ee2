pub mod config;
pub mod fetch;
pub mod flights;
pub mod month;
pub mod prune;
pub mod seasons;
pub mod store;
pub mod table;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the fmt subscriber shared by every binary.
///
/// `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
}
