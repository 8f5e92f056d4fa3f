//! Tender Aggregator: binary entrypoint.
//! Boots the Axum HTTP server: config, adapter discovery, cache, metrics.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tender_aggregator::{api, metrics::Metrics, AppConfig, AppState, TenderService};

/// Compact tracing logs. `RUST_LOG` overrides the default filter. Uses
/// `try_init` because the Shuttle runtime may already own the global
/// subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tender_aggregator=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::load_default()?;
    let service = TenderService::from_config(&config)?;
    for err in service.load_errors() {
        tracing::warn!(error = %err, "source unavailable");
    }

    let mut router = api::create_router(AppState::new(service));
    match Metrics::init(config.cache_ttl_secs) {
        Ok(metrics) => router = router.merge(metrics.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
