// 🪵 Console logging for the CLI
// Library code only emits tracing events; the binary decides where they go

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize console logging. Defaults to `sales_pipeline=info`,
/// overridable via `RUST_LOG`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sales_pipeline=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
