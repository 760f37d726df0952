#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use base64::prelude::*;
use p256::ecdsa::{signature::Signer, Signature, SigningKey};
use presentation_exchange::core::{
    credential::{
        parser::{CredentialOptions, CredentialParser, JsonCredentialParser, PublicKey, PublicKeyFetcher},
        Credential,
    },
    presentation::Presentation,
    presentation_submission::{
        InputDescriptorMapping, PresentationSubmission, PRESENTATION_SUBMISSION_JSONLD_CONTEXT,
        PRESENTATION_SUBMISSION_JSONLD_TYPE,
    },
};
use serde_json::{json, Value as Json};

pub const EXAMPLES_CONTEXT: &str = "https://www.w3.org/2018/credentials/examples/v1";
pub const CONTEXT_1: &str = "https://example.com/contexts/1";
pub const CONTEXT_2: &str = "https://example.com/contexts/2";

/// A credential whose second context is `context`.
pub fn credential(id: &str, context: &str, credential_type: &str) -> Json {
    json!({
        "@context": ["https://www.w3.org/2018/credentials/v1", context],
        "id": id,
        "type": ["VerifiableCredential", credential_type],
        "credentialSubject": {
            "id": "did:example:ebfeb1f712ebc6f1c276e12ec21",
            "degree": { "type": "BachelorDegree", "university": "MIT" }
        },
        "issuer": {
            "id": "did:example:76e12ec712ebc6f1c221ebfeb1f",
            "name": "Example University"
        },
        "issuanceDate": "2010-01-01T19:23:24Z"
    })
}

/// A presentation submission embedding `credentials`, mapped by `(descriptor id, path)`.
pub fn submission(credentials: Vec<Json>, mappings: &[(&str, &str)]) -> Presentation {
    let presentation = credentials.into_iter().fold(
        Presentation::new()
            .add_context(PRESENTATION_SUBMISSION_JSONLD_CONTEXT)
            .add_type(PRESENTATION_SUBMISSION_JSONLD_TYPE)
            .set_holder("did:example:ebfeb1f712ebc6f1c276e12ec21".into()),
        Presentation::add_credential,
    );

    let descriptor_map = mappings
        .iter()
        .map(|(id, path)| InputDescriptorMapping::new(*id, *path).set_format("ldp_vc"))
        .collect();

    presentation
        .set_presentation_submission(
            PresentationSubmission::new(descriptor_map)
                .set_id("a30e3b91-fb77-4d22-95fa-871689c322e2".into())
                .set_definition_id("32f54163-7166-48f1-93d8-ff217bdb0653".into()),
        )
        .unwrap()
}

/// Encode a compact JWT, signed with `key` when given.
pub fn encode_jwt(header: &Json, claims: &Json, key: Option<&SigningKey>) -> String {
    let header = BASE64_URL_SAFE_NO_PAD.encode(header.to_string());
    let claims = BASE64_URL_SAFE_NO_PAD.encode(claims.to_string());
    let signing_input = format!("{header}.{claims}");
    let signature = key
        .map(|key| {
            let signature: Signature = key.sign(signing_input.as_bytes());
            signature.to_vec()
        })
        .unwrap_or_default();
    format!("{signing_input}.{}", BASE64_URL_SAFE_NO_PAD.encode(signature))
}

/// Serves the public key of a single issuer.
pub struct IssuerKeyFetcher {
    pub issuer: String,
    pub jwk: Json,
}

impl IssuerKeyFetcher {
    pub fn new(issuer: &str, key: &SigningKey) -> Self {
        let public: p256::PublicKey = key.verifying_key().into();
        Self {
            issuer: issuer.to_owned(),
            jwk: serde_json::from_str(&public.to_jwk_string()).unwrap(),
        }
    }
}

#[async_trait]
impl PublicKeyFetcher for IssuerKeyFetcher {
    async fn fetch(&self, issuer_id: &str, _key_id: &str) -> Result<PublicKey> {
        anyhow::ensure!(issuer_id == self.issuer, "unknown issuer {issuer_id}");
        Ok(PublicKey {
            key_type: "EC".into(),
            jwk: self.jwk.clone(),
        })
    }
}

/// Delegates to [JsonCredentialParser] and counts the calls.
#[derive(Default)]
pub struct CountingParser {
    pub calls: AtomicUsize,
    inner: JsonCredentialParser,
}

impl CountingParser {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialParser for CountingParser {
    async fn parse(&self, data: &[u8], options: &CredentialOptions) -> Result<Credential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.parse(data, options).await
    }
}
