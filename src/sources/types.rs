// src/sources/types.rs
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::record::Record;

/// One external site. Implementations translate a page into records and must
/// not panic on markup changes: a page that parses but matches nothing yields
/// `Ok(vec![])`, transport or status failures yield `Err`.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Record>>;
    fn name(&self) -> &'static str;
}

/// Everything an adapter factory may need: one shared HTTP client and the
/// loaded configuration.
#[derive(Clone)]
pub struct SourceContext {
    pub client: reqwest::Client,
    pub config: Arc<AppConfig>,
}

impl SourceContext {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout())
            .timeout(config.fetch_timeout())
            .build()
            .context("building upstream http client")?;
        Ok(Self {
            client,
            config: Arc::new(config.clone()),
        })
    }
}
