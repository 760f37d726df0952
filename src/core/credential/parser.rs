use std::{fmt, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use json_ld::{
    expansion::{Action, Policy},
    JsonLdProcessor, Options,
};
use serde_json::{Map, Value as Json};

use super::{
    jwt::{self, DecodedJwt},
    Credential, ParseError, Proof,
};
use crate::core::document_loader::{DocumentLoader, ProcessorLoader};

/// Turns raw credential bytes into a validated [Credential].
#[async_trait]
pub trait CredentialParser: Send + Sync {
    async fn parse(&self, data: &[u8], options: &CredentialOptions) -> Result<Credential>;
}

/// A public key used to check a credential proof.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicKey {
    pub key_type: String,
    pub jwk: Json,
}

/// Looks up the public key `key_id` of `issuer_id`.
#[async_trait]
pub trait PublicKeyFetcher: Send + Sync {
    async fn fetch(&self, issuer_id: &str, key_id: &str) -> Result<PublicKey>;
}

/// Checks an embedded linked data proof.
///
/// `document` is the credential without its `proof` property.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, document: &Json, proof: &Proof, key: &PublicKey) -> Result<()>;
}

/// Collaborators and switches handed to a [CredentialParser].
#[derive(Clone, Default)]
pub struct CredentialOptions {
    document_loader: Option<Arc<dyn DocumentLoader>>,
    public_key_fetcher: Option<Arc<dyn PublicKeyFetcher>>,
    disable_proof_check: bool,
    strict_jsonld: bool,
}

impl fmt::Debug for CredentialOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialOptions")
            .field("document_loader", &self.document_loader.is_some())
            .field("public_key_fetcher", &self.public_key_fetcher.is_some())
            .field("disable_proof_check", &self.disable_proof_check)
            .field("strict_jsonld", &self.strict_jsonld)
            .finish()
    }
}

impl CredentialOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jsonld_document_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.document_loader = Some(loader);
        self
    }

    pub fn with_public_key_fetcher(mut self, fetcher: Arc<dyn PublicKeyFetcher>) -> Self {
        self.public_key_fetcher = Some(fetcher);
        self
    }

    pub fn with_disabled_proof_check(mut self) -> Self {
        self.disable_proof_check = true;
        self
    }

    /// Reject properties that none of the credential's contexts define.
    ///
    /// Only takes effect when a document loader is configured.
    pub fn with_strict_jsonld_validation(mut self) -> Self {
        self.strict_jsonld = true;
        self
    }

    pub fn document_loader(&self) -> Option<&Arc<dyn DocumentLoader>> {
        self.document_loader.as_ref()
    }

    pub fn public_key_fetcher(&self) -> Option<&Arc<dyn PublicKeyFetcher>> {
        self.public_key_fetcher.as_ref()
    }

    pub fn proof_check_disabled(&self) -> bool {
        self.disable_proof_check
    }

    pub fn strict_jsonld(&self) -> bool {
        self.strict_jsonld
    }
}

/// Parses JSON-LD and compact JWT credentials.
#[derive(Clone, Default)]
pub struct JsonCredentialParser {
    proof_verifier: Option<Arc<dyn ProofVerifier>>,
}

impl fmt::Debug for JsonCredentialParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCredentialParser")
            .field("proof_verifier", &self.proof_verifier.is_some())
            .finish()
    }
}

enum Encoded {
    JsonLd(Map<String, Json>),
    Jwt(String),
}

fn decode(data: &[u8]) -> Result<Encoded, ParseError> {
    match serde_json::from_slice::<Json>(data) {
        Ok(Json::Object(object)) => Ok(Encoded::JsonLd(object)),
        Ok(Json::String(jwt)) => Ok(Encoded::Jwt(jwt)),
        Ok(_) => Err(ParseError::UnsupportedEncoding),
        Err(e) => match std::str::from_utf8(data).map(str::trim) {
            Ok(text) if jwt::is_compact_jws(text) => Ok(Encoded::Jwt(text.to_owned())),
            _ => Err(ParseError::Invalid(format!("credential is not valid json: {e}"))),
        },
    }
}

impl JsonCredentialParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the verifier used for embedded linked data proofs.
    pub fn with_proof_verifier(mut self, verifier: Arc<dyn ProofVerifier>) -> Self {
        self.proof_verifier = Some(verifier);
        self
    }

    /// Expand `document` with the JSON-LD processor, loading its contexts through `loader`.
    ///
    /// In strict mode every property must expand to an IRI.
    async fn check_contexts(
        &self,
        document: Map<String, Json>,
        loader: &dyn DocumentLoader,
        strict: bool,
    ) -> Result<(), ParseError> {
        let loader = ProcessorLoader::new(loader);
        let document: json_ld::RemoteDocument = json_ld::RemoteDocument::new(
            None,
            None,
            json_syntax::Value::from_serde_json(Json::Object(document)),
        );

        let expanded = document
            .expand_using(&loader, expansion_options(strict))
            .await;

        match (expanded, loader.into_failure()) {
            (Ok(_), _) => Ok(()),
            (Err(_), Some((url, source))) => Err(ParseError::ContextLoad { url, source }),
            (Err(e), None) => Err(ParseError::Expansion(e.to_string())),
        }
    }

    async fn check_jwt_proof(
        &self,
        decoded: &DecodedJwt,
        credential: &Credential,
        options: &CredentialOptions,
    ) -> Result<(), ParseError> {
        if decoded.alg()? == "none" {
            return Err(ParseError::UnsecuredJwt);
        }

        let fetcher = options
            .public_key_fetcher()
            .ok_or(ParseError::MissingPublicKeyFetcher)?;

        let issuer = decoded.issuer().unwrap_or(credential.issuer.id.as_str());
        let key = fetch_key(fetcher.as_ref(), issuer, decoded.kid()).await?;

        decoded.verify(&key.jwk).map_err(ParseError::Proof)
    }

    async fn check_ld_proofs(
        &self,
        unsigned: &Json,
        credential: &Credential,
        options: &CredentialOptions,
    ) -> Result<(), ParseError> {
        if credential.proofs.is_empty() {
            return Ok(());
        }

        let fetcher = options
            .public_key_fetcher()
            .ok_or(ParseError::MissingPublicKeyFetcher)?;

        for proof in &credential.proofs {
            let proof_type = proof
                .get("type")
                .and_then(Json::as_str)
                .unwrap_or("unknown");

            let Some(verifier) = &self.proof_verifier else {
                return Err(ParseError::UnsupportedProof(proof_type.to_owned()));
            };

            let verification_method = proof
                .get("verificationMethod")
                .and_then(Json::as_str)
                .ok_or_else(|| ParseError::Proof(anyhow!("proof has no verificationMethod")))?;

            let (issuer, key_id) = match verification_method.split_once('#') {
                Some((issuer, fragment)) => (issuer, format!("#{fragment}")),
                None => (credential.issuer.id.as_str(), verification_method.to_owned()),
            };

            let key = fetch_key(fetcher.as_ref(), issuer, &key_id).await?;
            verifier
                .verify(unsigned, proof, &key)
                .map_err(ParseError::Proof)?;
        }

        Ok(())
    }
}

fn expansion_options(strict: bool) -> Options {
    if !strict {
        return Options::default();
    }

    Options {
        expansion_policy: Policy {
            invalid: Action::Reject,
            allow_undefined: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

async fn fetch_key(
    fetcher: &dyn PublicKeyFetcher,
    issuer: &str,
    key_id: &str,
) -> Result<PublicKey, ParseError> {
    fetcher
        .fetch(issuer, key_id)
        .await
        .map_err(|source| ParseError::KeyFetch {
            issuer: issuer.to_owned(),
            key_id: key_id.to_owned(),
            source,
        })
}

#[async_trait]
impl CredentialParser for JsonCredentialParser {
    async fn parse(&self, data: &[u8], options: &CredentialOptions) -> Result<Credential> {
        let (document, decoded) = match decode(data)? {
            Encoded::JsonLd(document) => (document, None),
            Encoded::Jwt(compact) => {
                let decoded = jwt::decode(&compact)?;
                (decoded.credential_json()?, Some(decoded))
            }
        };

        let mut credential: Credential = serde_json::from_value(Json::Object(document.clone()))
            .map_err(|e| ParseError::Invalid(e.to_string()))?;
        credential.jwt = decoded.as_ref().map(|decoded| decoded.compact().to_owned());

        // Proofs are checked on their own and are not expanded with the credential.
        let mut unsigned = document;
        unsigned.remove("proof");

        if let Some(loader) = options.document_loader() {
            self.check_contexts(unsigned.clone(), loader.as_ref(), options.strict_jsonld())
                .await?;
        }

        if options.proof_check_disabled() {
            return Ok(credential);
        }

        match &decoded {
            Some(decoded) => self.check_jwt_proof(decoded, &credential, options).await?,
            None => {
                self.check_ld_proofs(&Json::Object(unsigned), &credential, options)
                    .await?
            }
        }

        Ok(credential)
    }
}
