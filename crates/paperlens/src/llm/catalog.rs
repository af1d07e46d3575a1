//! Model catalog: the fixed local entry plus the remote provider's list.
//!
//! The remote list changes rarely and the popover that displays it opens
//! often, so fetches go through a process-wide cache with a one-hour TTL.
//! The cached value is replaced by whole-value swap under a write lock;
//! readers never observe a partial list. When a refetch fails and a stale
//! list exists, the stale list is served rather than erroring.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::{SourceError, SourceResult};
use crate::models::{ModelEntry, Provider};

#[derive(Debug, Deserialize)]
struct RemoteModelList {
    #[serde(default)]
    data: Vec<RemoteModel>,
}

#[derive(Debug, Deserialize)]
struct RemoteModel {
    id: String,

    #[serde(default)]
    name: String,

    #[serde(default)]
    pricing: RemotePricing,

    #[serde(default)]
    context_length: f64,

    #[serde(default)]
    architecture: RemoteArchitecture,
}

#[derive(Debug, Default, Deserialize)]
struct RemotePricing {
    #[serde(default)]
    prompt: String,

    #[serde(default)]
    completion: String,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteArchitecture {
    #[serde(default)]
    modality: String,
}

#[derive(Debug, Clone)]
struct CachedList {
    fetched_at: Instant,
    models: Vec<ModelEntry>,
}

/// Supplies the ordered list of selectable models.
pub struct ModelCatalog {
    client: reqwest::Client,
    models_url: String,
    ttl: Duration,
    cache: RwLock<Option<CachedList>>,
}

impl ModelCatalog {
    /// Create a catalog pointed at the configured remote list endpoint.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.search_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            models_url: format!("{}/v1/models", config.openrouter_url),
            ttl: config.model_cache_ttl,
            cache: RwLock::new(None),
        })
    }

    /// The model list: local entry first, then remote text-capable models
    /// in the provider's default order.
    pub async fn models(&self) -> SourceResult<Vec<ModelEntry>> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(cached.models.clone());
            }
        }

        match self.fetch_remote().await {
            Ok(remote) => {
                let mut models = vec![ModelEntry::local_default()];
                models.extend(remote);

                let mut guard = self.cache.write().await;
                *guard = Some(CachedList { fetched_at: Instant::now(), models: models.clone() });
                Ok(models)
            }
            Err(err) => {
                if let Some(stale) = self.cache.read().await.as_ref() {
                    tracing::warn!(error = %err, "model refetch failed, serving stale list");
                    return Ok(stale.models.clone());
                }
                Err(err)
            }
        }
    }

    async fn fetch_remote(&self) -> SourceResult<Vec<ModelEntry>> {
        tracing::debug!(url = %self.models_url, "fetching remote model list");

        let response = self.client.get(&self.models_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::status(status.as_u16()));
        }

        let list: RemoteModelList = response.json().await?;

        // Only text-in/text-out models are usable for document chat.
        Ok(list
            .data
            .into_iter()
            .filter(|m| {
                m.architecture.modality.contains("text")
                    && m.architecture.modality.contains("->text")
            })
            .map(|m| ModelEntry {
                name: strip_org_prefix(&m.name).to_string(),
                description: Some(format!(
                    "{} in · {} out · {:.0}k ctx",
                    format_price(&m.pricing.prompt),
                    format_price(&m.pricing.completion),
                    m.context_length / 1000.0,
                )),
                id: m.id,
                provider: Provider::OpenRouter,
            })
            .collect())
    }
}

/// Format a per-token price as a per-million-tokens label.
fn format_price(per_token: &str) -> String {
    let per_million = per_token.parse::<f64>().unwrap_or(0.0) * 1_000_000.0;
    if per_million == 0.0 {
        "free".to_string()
    } else if per_million < 0.01 {
        format!("${per_million:.4}/M")
    } else if per_million < 1.0 {
        format!("${per_million:.2}/M")
    } else {
        format!("${per_million:.1}/M")
    }
}

/// Remote names look like "Anthropic: Claude Sonnet 4"; drop the org
/// prefix.
fn strip_org_prefix(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, rest)| rest.trim())
}
