// src/registry.rs
//! Adapter registry: static catalog of source adapters keyed by a stable id.
//!
//! Adapters are registered explicitly, either one by one through
//! [`AdapterRegistry::register`] or in bulk from a build-time catalog via
//! [`AdapterRegistry::discover`]. The registry is immutable once handed to
//! the aggregator (it lives behind an `Arc`).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AggregatorError, Result};
use crate::sources::types::{SourceAdapter, SourceContext};

/// Builds one adapter. Returning `Err` marks a discovery load failure for
/// that key only.
pub type AdapterFactory = fn(&SourceContext) -> anyhow::Result<Arc<dyn SourceAdapter>>;

/// One catalog line: key, optional label and the factory that builds it.
#[derive(Clone, Copy)]
pub struct AdapterSpec {
    pub key: &'static str,
    pub display_name: Option<&'static str>,
    pub factory: AdapterFactory,
}

impl AdapterSpec {
    pub const fn new(
        key: &'static str,
        display_name: Option<&'static str>,
        factory: AdapterFactory,
    ) -> Self {
        Self {
            key,
            display_name,
            factory,
        }
    }
}

#[derive(Clone)]
pub struct AdapterEntry {
    pub key: String,
    pub display_name: String,
    pub adapter: Arc<dyn SourceAdapter>,
}

impl std::fmt::Debug for AdapterEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterEntry")
            .field("key", &self.key)
            .field("display_name", &self.display_name)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

/// Public `{key, display_name}` pair as returned by `list()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub key: String,
    pub display_name: String,
}

#[derive(Debug, Default)]
pub struct AdapterRegistry {
    entries: HashMap<String, AdapterEntry>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` under `key`. The label defaults to the key with its
    /// first letter upper-cased.
    ///
    /// Duplicate keys: last registration wins. The replaced entry is returned
    /// and a warning is logged.
    pub fn register(
        &mut self,
        key: &str,
        adapter: Arc<dyn SourceAdapter>,
        display_name: Option<&str>,
    ) -> Option<AdapterEntry> {
        let display_name = display_name
            .map(str::to_string)
            .unwrap_or_else(|| capitalize(key));
        let entry = AdapterEntry {
            key: key.to_string(),
            display_name,
            adapter,
        };
        let replaced = self.entries.insert(key.to_string(), entry);
        if let Some(old) = &replaced {
            warn!(
                source = key,
                previous = %old.display_name,
                "adapter key registered twice; keeping the last registration"
            );
        }
        replaced
    }

    /// Build every adapter of `catalog` and register it. A factory failure is
    /// logged, collected and skipped; the remaining specs still load.
    /// Specs disabled in `ctx.config` are skipped silently.
    pub fn discover(
        catalog: &[AdapterSpec],
        ctx: &SourceContext,
    ) -> (Self, Vec<AggregatorError>) {
        let mut registry = Self::new();
        let mut failures = Vec::new();

        for spec in catalog {
            if !ctx.config.is_enabled(spec.key) {
                continue;
            }
            match (spec.factory)(ctx) {
                Ok(adapter) => {
                    registry.register(spec.key, adapter, spec.display_name);
                }
                Err(e) => {
                    warn!(source = spec.key, error = ?e, "adapter failed to load; skipping");
                    failures.push(AggregatorError::DiscoveryLoad {
                        key: spec.key.to_string(),
                        reason: format!("{e:#}"),
                    });
                }
            }
        }

        info!(
            loaded = registry.len(),
            failed = failures.len(),
            "adapter discovery finished"
        );
        (registry, failures)
    }

    /// All registered sources, sorted by key.
    pub fn list(&self) -> Vec<SourceInfo> {
        let mut out: Vec<SourceInfo> = self
            .entries
            .values()
            .map(|e| SourceInfo {
                key: e.key.clone(),
                display_name: e.display_name.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    pub fn get(&self, key: &str) -> Result<Arc<dyn SourceAdapter>> {
        self.entries
            .get(key)
            .map(|e| Arc::clone(&e.adapter))
            .ok_or_else(|| AggregatorError::UnknownSource(key.to_string()))
    }

    pub fn entry(&self, key: &str) -> Option<&AdapterEntry> {
        self.entries.get(key)
    }

    pub fn display_name(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.display_name.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
