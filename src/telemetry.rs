use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,customer_voucher_service=debug,sqlx=warn,tower_http=debug";

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the default filter.
pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
