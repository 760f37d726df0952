use anyhow::Error;
use json_ld::{Iri, LoadError, Loader};
use tokio::sync::Mutex;
use tracing::debug;

use super::DocumentLoader;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct LoadFailure(String);

/// Serves the documents requested by the JSON-LD processor through a [DocumentLoader].
///
/// Contexts referenced from inside other contexts go through the same loader. The first
/// failed load is kept so it can be reported with its URL.
pub(crate) struct ProcessorLoader<'a> {
    loader: &'a dyn DocumentLoader,
    failure: Mutex<Option<(String, Error)>>,
}

impl<'a> ProcessorLoader<'a> {
    pub(crate) fn new(loader: &'a dyn DocumentLoader) -> Self {
        Self {
            loader,
            failure: Mutex::new(None),
        }
    }

    /// The URL and cause of the first document that failed to load.
    pub(crate) fn into_failure(self) -> Option<(String, Error)> {
        self.failure.into_inner()
    }
}

impl Loader for ProcessorLoader<'_> {
    async fn load(&self, url: &Iri) -> Result<json_ld::RemoteDocument, LoadError> {
        match self.loader.load(url.as_str()).await {
            Ok(remote) => {
                debug!("loaded JSON-LD context {}", remote.document_url);
                Ok(json_ld::RemoteDocument::new(
                    Some(url.to_owned()),
                    None,
                    json_syntax::Value::from_serde_json(remote.document),
                ))
            }
            Err(e) => {
                let failure = LoadFailure(format!("{e:#}"));
                self.failure
                    .lock()
                    .await
                    .get_or_insert_with(|| (url.as_str().to_owned(), e));
                Err(LoadError::new(url.to_owned(), failure))
            }
        }
    }
}
