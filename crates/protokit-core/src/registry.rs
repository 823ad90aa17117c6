//! ComponentRegistry — remote JSON catalogue of reusable app components.
//! Fetches are memoized per URL for the life of the registry; failures are never cached.

use crate::error::RegistryError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A named component and where its source lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub url: String,
}

/// Raw index entry; `url` may be null upstream.
#[derive(Debug, Deserialize)]
struct IndexEntry {
    name: String,
    #[serde(default)]
    url: Option<String>,
}

/// Text transport for the registry.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, RegistryError>;
}

/// reqwest-backed transport with an explicit per-request timeout. No retries.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("protokit/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(RegistryError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, RegistryError> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| RegistryError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        res.text().await.map_err(|source| RegistryError::Request {
            url: url.to_string(),
            source,
        })
    }
}

/// Parse a component index: keep entries whose url ends with `extension`;
/// a later duplicate name replaces the earlier url in place.
pub fn parse_index(json: &str, extension: &str) -> Result<Vec<Component>, RegistryError> {
    let entries: Vec<IndexEntry> = serde_json::from_str(json)?;
    let mut components: Vec<Component> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let url = match entry.url {
            Some(url) if url.ends_with(extension) => url,
            _ => continue,
        };
        match position.get(&entry.name) {
            Some(&i) => components[i].url = url,
            None => {
                position.insert(entry.name.clone(), components.len());
                components.push(Component {
                    name: entry.name,
                    url,
                });
            }
        }
    }
    Ok(components)
}

/// Session-scoped component registry with pure (never invalidated) caches.
pub struct ComponentRegistry {
    fetcher: Arc<dyn Fetch>,
    extension: String,
    indexes: DashMap<String, Arc<Vec<Component>>>,
    sources: DashMap<String, Arc<String>>,
}

impl ComponentRegistry {
    pub fn new(fetcher: Arc<dyn Fetch>, extension: impl Into<String>) -> Self {
        Self {
            fetcher,
            extension: extension.into(),
            indexes: DashMap::new(),
            sources: DashMap::new(),
        }
    }

    /// Registry over HTTP with the given per-request timeout.
    pub fn http(timeout: Duration, extension: impl Into<String>) -> Result<Self, RegistryError> {
        Ok(Self::new(Arc::new(HttpFetcher::new(timeout)?), extension))
    }

    /// Ordered `(name, url)` list from the index at `index_url`.
    pub async fn list_components(&self, index_url: &str) -> Result<Arc<Vec<Component>>, RegistryError> {
        if let Some(hit) = self.indexes.get(index_url) {
            return Ok(Arc::clone(hit.value()));
        }

        tracing::info!("[REGISTRY] Fetching component index {}", index_url);
        let body = self.fetcher.fetch_text(index_url).await?;
        let components = Arc::new(parse_index(&body, &self.extension)?);
        tracing::info!("[REGISTRY] {} components available", components.len());

        self.indexes
            .insert(index_url.to_string(), Arc::clone(&components));
        Ok(components)
    }

    /// Component entry by name.
    pub async fn find(&self, index_url: &str, name: &str) -> Result<Component, RegistryError> {
        self.list_components(index_url)
            .await?
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownComponent(name.to_string()))
    }

    /// Raw source text at `url`.
    pub async fn fetch_source(&self, url: &str) -> Result<Arc<String>, RegistryError> {
        if let Some(hit) = self.sources.get(url) {
            return Ok(Arc::clone(hit.value()));
        }

        tracing::info!("[REGISTRY] Fetching component source {}", url);
        let text = Arc::new(self.fetcher.fetch_text(url).await?);
        self.sources.insert(url.to_string(), Arc::clone(&text));
        Ok(text)
    }
}
