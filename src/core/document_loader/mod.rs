//! JSON-LD context loading.
//!
//! Credential parsing hands a [DocumentLoader] to the JSON-LD processor, which resolves
//! every context URI through it, including contexts referenced by other contexts. Loaders
//! compose: a [CachingDocumentLoader] answers well-known contexts locally and remembers
//! whatever its inner loader (e.g. an [HttpDocumentLoader]) fetched.

mod contexts;
mod processor;

pub(crate) use processor::ProcessorLoader;

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use http::{header, Request};
use serde_json::Value as Json;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use super::util::AsyncHttpClient;

/// A loaded JSON-LD document.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub document_url: String,
    pub document: Json,
}

/// Resolves a JSON-LD context URI to its document.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<RemoteDocument>;
}

/// Serves a fixed set of documents from memory.
#[derive(Debug, Clone, Default)]
pub struct StaticDocumentLoader {
    documents: HashMap<String, Json>,
}

impl StaticDocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document served for `url`.
    pub fn with_document(mut self, url: impl Into<String>, document: Json) -> Self {
        self.documents.insert(url.into(), document);
        self
    }
}

#[async_trait]
impl DocumentLoader for StaticDocumentLoader {
    async fn load(&self, url: &str) -> Result<RemoteDocument> {
        let document = self
            .documents
            .get(url)
            .with_context(|| format!("no document available for {url}"))?;

        Ok(RemoteDocument {
            document_url: url.to_owned(),
            document: document.clone(),
        })
    }
}

/// Fetches documents over HTTP(S).
#[derive(Debug)]
pub struct HttpDocumentLoader<C> {
    client: C,
    allowed_hosts: Vec<String>,
}

impl<C: AsyncHttpClient> HttpDocumentLoader<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            allowed_hosts: Vec::new(),
        }
    }

    /// Restrict fetching to the given hosts. An empty list allows any host.
    pub fn with_allowed_hosts(mut self, hosts: Vec<String>) -> Self {
        self.allowed_hosts = hosts;
        self
    }

    fn check_url(&self, url: &str) -> Result<Url> {
        let parsed = Url::parse(url).with_context(|| format!("invalid context url {url}"))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("unsupported scheme for context url {url}")
        }

        if !self.allowed_hosts.is_empty() {
            let host = parsed.host_str().unwrap_or_default();
            if !self.allowed_hosts.iter().any(|allowed| allowed == host) {
                bail!("context host '{host}' is not allowed")
            }
        }

        Ok(parsed)
    }
}

#[async_trait]
impl<C: AsyncHttpClient> DocumentLoader for HttpDocumentLoader<C> {
    async fn load(&self, url: &str) -> Result<RemoteDocument> {
        let parsed = self.check_url(url)?;

        let request = Request::get(parsed.as_str())
            .header(header::ACCEPT, "application/ld+json, application/json")
            .body(Vec::new())
            .context("unable to build context request")?;

        debug!("fetching JSON-LD context {url}");

        let response = self
            .client
            .execute(request)
            .await
            .with_context(|| format!("failed to fetch context {url}"))?;

        if !response.status().is_success() {
            bail!("fetching context {url} returned status {}", response.status())
        }

        let document = serde_json::from_slice(response.body())
            .with_context(|| format!("context {url} is not valid json"))?;

        Ok(RemoteDocument {
            document_url: url.to_owned(),
            document,
        })
    }
}

/// Answers well-known contexts locally and caches everything loaded by `inner`.
///
/// The cache is shared by concurrent loads; it is never evicted.
#[derive(Debug)]
pub struct CachingDocumentLoader<L> {
    inner: L,
    cache: RwLock<HashMap<String, RemoteDocument>>,
}

impl<L: DocumentLoader> CachingDocumentLoader<L> {
    pub fn new(inner: L) -> Self {
        let cache = contexts::embedded()
            .into_iter()
            .map(|(url, document)| {
                (
                    url.to_owned(),
                    RemoteDocument {
                        document_url: url.to_owned(),
                        document,
                    },
                )
            })
            .collect();

        Self {
            inner,
            cache: RwLock::new(cache),
        }
    }

    /// Preload a document for `url`.
    pub fn with_document(mut self, url: impl Into<String>, document: Json) -> Self {
        let url = url.into();
        self.cache.get_mut().insert(
            url.clone(),
            RemoteDocument {
                document_url: url,
                document,
            },
        );
        self
    }
}

#[async_trait]
impl<L: DocumentLoader> DocumentLoader for CachingDocumentLoader<L> {
    async fn load(&self, url: &str) -> Result<RemoteDocument> {
        if let Some(document) = self.cache.read().await.get(url) {
            debug!("JSON-LD context cache hit for {url}");
            return Ok(document.clone());
        }

        let document = self.inner.load(url).await?;
        self.cache
            .write()
            .await
            .insert(url.to_owned(), document.clone());

        Ok(document)
    }
}
