// tests/common/mod.rs
// Scripted source adapter and service builders shared by integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tender_aggregator::record::record_from;
use tender_aggregator::{AdapterRegistry, Aggregator, Record, SourceAdapter, TenderService};
use tokio::sync::Semaphore;

pub enum Step {
    Records(Vec<Record>),
    Fail(&'static str),
    Hang,
}

/// Replays `steps` in order, then keeps answering with an empty list.
pub struct MockAdapter {
    name: &'static str,
    calls: Arc<AtomicUsize>,
    steps: Mutex<VecDeque<Step>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockAdapter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: Arc::new(AtomicUsize::new(0)),
            steps: Mutex::new(VecDeque::new()),
            gate: None,
        }
    }

    pub fn then_records(self, records: Vec<Record>) -> Self {
        self.steps.lock().unwrap().push_back(Step::Records(records));
        self
    }

    pub fn then_fail(self, why: &'static str) -> Self {
        self.steps.lock().unwrap().push_back(Step::Fail(why));
        self
    }

    pub fn then_hang(self) -> Self {
        self.steps.lock().unwrap().push_back(Step::Hang);
        self
    }

    /// Every fetch waits for one permit of `gate` before answering.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    async fn fetch(&self) -> Result<Vec<Record>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Records(r)) => Ok(r),
            Some(Step::Fail(why)) => Err(anyhow!("upstream said no: {why}")),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

pub fn tender(title: &str) -> Record {
    record_from([("title", title)])
}

pub fn registry_of(adapters: Vec<(&str, MockAdapter)>) -> Arc<AdapterRegistry> {
    let mut r = AdapterRegistry::new();
    for (key, a) in adapters {
        r.register(key, Arc::new(a), None);
    }
    Arc::new(r)
}

pub fn aggregator_of(adapters: Vec<(&str, MockAdapter)>, ttl: Duration) -> Arc<Aggregator> {
    Arc::new(Aggregator::with_limits(
        registry_of(adapters),
        ttl,
        Duration::from_secs(5),
    ))
}

pub fn service_of(adapters: Vec<(&str, MockAdapter)>, ttl: Duration) -> TenderService {
    TenderService::new(aggregator_of(adapters, ttl))
}

pub const LONG_TTL: Duration = Duration::from_secs(300);
