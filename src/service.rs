// src/service.rs
//! Service facade: the operations the HTTP layer (or any other front-end)
//! calls. Constructed once at startup, shared by `Arc`, dropped at shutdown;
//! nothing is persisted.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result as AnyResult;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::aggregator::{Aggregator, CacheSnapshot, Lookup};
use crate::config::AppConfig;
use crate::error::{AggregatorError, Result};
use crate::record::Record;
use crate::registry::{AdapterRegistry, AdapterSpec, SourceInfo};
use crate::sources::{builtin_catalog, types::SourceContext};
use crate::views::{self, SourceStats};

pub struct TenderService {
    aggregator: Arc<Aggregator>,
    load_errors: Vec<AggregatorError>,
}

impl TenderService {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            load_errors: Vec::new(),
        }
    }

    /// Discover the built-in adapters and wire them to a fresh cache.
    pub fn from_config(config: &AppConfig) -> AnyResult<Self> {
        Self::from_catalog(&builtin_catalog(), config)
    }

    pub fn from_catalog(catalog: &[AdapterSpec], config: &AppConfig) -> AnyResult<Self> {
        let ctx = SourceContext::from_config(config)?;
        let (registry, load_errors) = AdapterRegistry::discover(catalog, &ctx);
        let aggregator = Aggregator::with_limits(
            Arc::new(registry),
            config.cache_ttl(),
            config.fetch_timeout(),
        );
        info!(
            sources = aggregator.registry().len(),
            ttl_secs = config.cache_ttl_secs,
            "tender service ready"
        );
        Ok(Self {
            aggregator: Arc::new(aggregator),
            load_errors,
        })
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    /// Adapters that failed to load during discovery.
    pub fn load_errors(&self) -> &[AggregatorError] {
        &self.load_errors
    }

    pub fn list_sources(&self) -> Vec<SourceInfo> {
        self.aggregator.registry().list()
    }

    pub async fn run(&self, key: &str, force: bool) -> Result<Arc<Vec<Record>>> {
        Ok(self.run_detailed(key, force).await?.data)
    }

    /// Like [`run`](Self::run) but also reports how the data was served.
    pub async fn run_detailed(&self, key: &str, force: bool) -> Result<Lookup> {
        self.aggregator.get_or_fetch(key, force).await
    }

    /// Refresh every registered source in parallel.
    pub async fn run_all(&self, force: bool) -> BTreeMap<String, Arc<Vec<Record>>> {
        let mut set = JoinSet::new();
        for key in self.aggregator.registry().keys() {
            let agg = Arc::clone(&self.aggregator);
            set.spawn(async move {
                let out = agg.get_or_fetch(&key, force).await;
                (key, out)
            });
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((key, Ok(lookup))) => {
                    results.insert(key, lookup.data);
                }
                Ok((key, Err(e))) => warn!(source = %key, error = %e, "run_all skipped source"),
                Err(e) => warn!(error = %e, "run_all task failed"),
            }
        }
        results
    }

    pub fn cached(&self, key: &str) -> Result<CacheSnapshot> {
        self.aggregator.cached(key)
    }

    pub fn stats(&self) -> BTreeMap<String, SourceStats> {
        views::stats(&self.aggregator)
    }

    pub fn export_json(&self) -> Vec<Record> {
        views::combined(&self.aggregator)
    }

    pub fn export_csv(&self) -> String {
        views::to_csv(&self.export_json())
    }
}
