use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;

use crate::core::{
    document_loader::{CachingDocumentLoader, HttpDocumentLoader, StaticDocumentLoader},
    presentation_definition::MatchOptions,
    util::{AsyncHttpClient, ReqwestClient},
};

/// Matching configuration, as read from a settings file.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Skip proof checks on submitted credentials.
    pub disable_proof_check: bool,
    /// Reject credential properties that no context defines.
    ///
    /// Without `remote_contexts` only the embedded well-known contexts can be resolved.
    pub strict_jsonld: bool,
    /// Fetch JSON-LD contexts over HTTP, behind the embedded well-known contexts.
    pub remote_contexts: bool,
    /// Hosts contexts may be fetched from. Empty allows any host.
    pub allowed_context_hosts: Vec<String>,
}

impl Config {
    /// Build [MatchOptions] fetching remote contexts with a [ReqwestClient].
    pub fn match_options(&self) -> Result<MatchOptions> {
        if self.remote_contexts {
            Ok(self.match_options_with_client(ReqwestClient::new()?))
        } else {
            Ok(self.base_options())
        }
    }

    /// Build [MatchOptions] fetching remote contexts with `client`.
    pub fn match_options_with_client<C: AsyncHttpClient + 'static>(&self, client: C) -> MatchOptions {
        let options = self.base_options();

        if !self.remote_contexts {
            return options;
        }

        let loader = CachingDocumentLoader::new(
            HttpDocumentLoader::new(client).with_allowed_hosts(self.allowed_context_hosts.clone()),
        );
        options.with_jsonld_document_loader(Arc::new(loader))
    }

    fn base_options(&self) -> MatchOptions {
        let mut options = MatchOptions::new();
        if self.strict_jsonld && !self.remote_contexts {
            let embedded = CachingDocumentLoader::new(StaticDocumentLoader::new());
            options = options.with_jsonld_document_loader(Arc::new(embedded));
        }
        if self.disable_proof_check {
            options = options.with_disabled_proof_check();
        }
        if self.strict_jsonld {
            options = options.with_strict_jsonld_validation();
        }
        options
    }
}
