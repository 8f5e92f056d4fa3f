// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod record;
pub mod registry;
pub mod service;
pub mod sources;
pub mod views;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::{Aggregator, CacheSnapshot, CacheState, CacheStatus, Lookup};
pub use crate::api::{create_router, AppState};
pub use crate::config::AppConfig;
pub use crate::error::AggregatorError;
pub use crate::record::Record;
pub use crate::registry::{AdapterRegistry, AdapterSpec, SourceInfo};
pub use crate::service::TenderService;
pub use crate::sources::types::{SourceAdapter, SourceContext};

/// Build the full application router from the default configuration.
/// Used by the binary and by tests that want the real wiring.
pub fn app() -> anyhow::Result<axum::Router> {
    let config = AppConfig::load_default()?;
    let service = TenderService::from_config(&config)?;
    Ok(create_router(AppState::new(service)))
}
