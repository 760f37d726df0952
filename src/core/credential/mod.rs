//! W3C Verifiable Credential data model.
//!
//! A [Credential] is only ever produced by deserialization, which enforces the mandatory
//! credential properties. Richer processing (JWT decoding, JSON-LD context resolution,
//! proof checks) is the job of a [CredentialParser](parser::CredentialParser).

pub mod extension;
pub mod jwt;
pub mod parser;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::utils::one_or_many;

/// Base context every credential must start with.
pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// Type every credential must declare.
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// A linked data proof, kept as its raw JSON object.
pub type Proof = Map<String, Json>;

/// Failure to build or validate a credential.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A mandatory property is missing or malformed.
    #[error("{0}")]
    Invalid(String),

    /// The input is neither a JSON object nor a compact JWT.
    #[error("unsupported credential encoding: expected a JSON object or a JWT")]
    UnsupportedEncoding,

    /// The input looks like a JWT but cannot be decoded.
    #[error("invalid JWT: {0}")]
    InvalidJwt(String),

    /// A JSON-LD context could not be loaded.
    #[error("failed to load JSON-LD context {url}: {source}")]
    ContextLoad {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// JSON-LD expansion rejected the credential, e.g. a property no context defines.
    #[error("JSON-LD expansion failed: {0}")]
    Expansion(String),

    /// An `alg: none` JWT was presented while the proof check is enabled.
    #[error("unsecured JWT credentials require the proof check to be disabled")]
    UnsecuredJwt,

    #[error("public key fetcher is not defined")]
    MissingPublicKeyFetcher,

    /// The public key referenced by a proof could not be obtained.
    #[error("failed to fetch public key {key_id} of {issuer}: {source}")]
    KeyFetch {
        issuer: String,
        key_id: String,
        #[source]
        source: anyhow::Error,
    },

    /// No verifier is available for an embedded linked data proof.
    #[error("unsupported proof type: {0}")]
    UnsupportedProof(String),

    /// The signature or proof did not verify.
    #[error("proof verification failed: {0}")]
    Proof(#[source] anyhow::Error),
}

/// The issuer of a credential: an identifier plus optional descriptive properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Issuer {
    pub id: String,
    pub custom_fields: Map<String, Json>,
}

impl Issuer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            custom_fields: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawIssuer {
    Id(String),
    Object {
        #[serde(default)]
        id: String,
        #[serde(flatten)]
        custom_fields: Map<String, Json>,
    },
}

impl From<Issuer> for RawIssuer {
    fn from(issuer: Issuer) -> Self {
        if issuer.custom_fields.is_empty() {
            RawIssuer::Id(issuer.id)
        } else {
            RawIssuer::Object {
                id: issuer.id,
                custom_fields: issuer.custom_fields,
            }
        }
    }
}

/// A verifiable credential.
///
/// The compact JWT a credential was decoded from, if any, is kept in [Credential::jwt] but
/// is not part of the serialized JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCredential", into = "RawCredential")]
pub struct Credential {
    /// Context URIs, in document order.
    pub context: Vec<String>,
    /// Inline (object) contexts.
    pub custom_context: Vec<Json>,
    pub id: Option<String>,
    pub types: Vec<String>,
    pub subject: Json,
    pub issuer: Issuer,
    pub issued: DateTime<Utc>,
    pub expired: Option<DateTime<Utc>>,
    pub status: Option<Json>,
    pub schemas: Option<Json>,
    pub evidence: Option<Json>,
    pub terms_of_use: Option<Json>,
    pub refresh_service: Option<Json>,
    pub proofs: Vec<Proof>,
    pub jwt: Option<String>,
    /// Every property without a dedicated field.
    pub custom_fields: Map<String, Json>,
}

impl Credential {
    /// Returns true if the credential declares `credential_type`.
    pub fn has_type(&self, credential_type: &str) -> bool {
        self.types.iter().any(|t| t == credential_type)
    }

    /// Return the JSON form of the credential.
    pub fn to_json(&self) -> Result<Json, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCredential {
    #[serde(rename = "@context", default, deserialize_with = "one_or_many")]
    context: Vec<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "one_or_many")]
    types: Vec<String>,
    #[serde(rename = "credentialSubject", default, skip_serializing_if = "Option::is_none")]
    subject: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    issuer: Option<RawIssuer>,
    #[serde(rename = "issuanceDate", default, skip_serializing_if = "Option::is_none")]
    issued: Option<String>,
    #[serde(rename = "expirationDate", default, skip_serializing_if = "Option::is_none")]
    expired: Option<String>,
    #[serde(rename = "credentialStatus", default, skip_serializing_if = "Option::is_none")]
    status: Option<Json>,
    #[serde(rename = "credentialSchema", default, skip_serializing_if = "Option::is_none")]
    schemas: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evidence: Option<Json>,
    #[serde(rename = "termsOfUse", default, skip_serializing_if = "Option::is_none")]
    terms_of_use: Option<Json>,
    #[serde(rename = "refreshService", default, skip_serializing_if = "Option::is_none")]
    refresh_service: Option<Json>,
    #[serde(
        rename = "proof",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    proofs: Vec<Proof>,
    #[serde(flatten)]
    custom_fields: Map<String, Json>,
}

fn parse_date(property: &str, value: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|e| ParseError::Invalid(format!("credential `{property}` is not an RFC 3339 date: {e}")))
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Separate URI contexts from inline context objects.
pub(crate) fn split_context(context: Vec<Json>) -> (Vec<String>, Vec<Json>) {
    let mut uris = Vec::new();
    let mut inline = Vec::new();
    for entry in context {
        match entry {
            Json::String(uri) => uris.push(uri),
            other => inline.push(other),
        }
    }
    (uris, inline)
}

impl TryFrom<RawCredential> for Credential {
    type Error = ParseError;

    fn try_from(raw: RawCredential) -> Result<Self, Self::Error> {
        let (context, custom_context) = split_context(raw.context);

        if context.first().map(String::as_str) != Some(CREDENTIALS_V1_CONTEXT) {
            return Err(ParseError::Invalid(format!(
                "credential `@context` must start with {CREDENTIALS_V1_CONTEXT}"
            )));
        }

        if !raw.types.iter().any(|t| t == VERIFIABLE_CREDENTIAL_TYPE) {
            return Err(ParseError::Invalid(format!(
                "credential `type` must include {VERIFIABLE_CREDENTIAL_TYPE}"
            )));
        }

        let subject = match raw.subject {
            Some(subject) if !subject.is_null() => subject,
            _ => {
                return Err(ParseError::Invalid(
                    "credential is missing `credentialSubject`".into(),
                ))
            }
        };

        let issuer = match raw.issuer {
            Some(RawIssuer::Id(id)) => Issuer::new(id),
            Some(RawIssuer::Object { id, custom_fields }) => Issuer { id, custom_fields },
            None => return Err(ParseError::Invalid("credential is missing `issuer`".into())),
        };
        if issuer.id.is_empty() {
            return Err(ParseError::Invalid("credential `issuer` has no id".into()));
        }

        let issued = raw
            .issued
            .ok_or_else(|| ParseError::Invalid("credential is missing `issuanceDate`".into()))
            .and_then(|issued| parse_date("issuanceDate", &issued))?;

        let expired = raw
            .expired
            .map(|expired| parse_date("expirationDate", &expired))
            .transpose()?;

        Ok(Self {
            context,
            custom_context,
            id: raw.id,
            types: raw.types,
            subject,
            issuer,
            issued,
            expired,
            status: raw.status,
            schemas: raw.schemas,
            evidence: raw.evidence,
            terms_of_use: raw.terms_of_use,
            refresh_service: raw.refresh_service,
            proofs: raw.proofs,
            jwt: None,
            custom_fields: raw.custom_fields,
        })
    }
}

impl From<Credential> for RawCredential {
    fn from(credential: Credential) -> Self {
        let context = credential
            .context
            .into_iter()
            .map(Json::String)
            .chain(credential.custom_context)
            .collect();

        Self {
            context,
            id: credential.id,
            types: credential.types,
            subject: Some(credential.subject),
            issuer: Some(credential.issuer.into()),
            issued: Some(format_date(&credential.issued)),
            expired: credential.expired.as_ref().map(format_date),
            status: credential.status,
            schemas: credential.schemas,
            evidence: credential.evidence,
            terms_of_use: credential.terms_of_use,
            refresh_service: credential.refresh_service,
            proofs: credential.proofs,
            custom_fields: credential.custom_fields,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn university_degree() -> Json {
        json!({
            "@context": [
                "https://www.w3.org/2018/credentials/v1",
                "https://www.w3.org/2018/credentials/examples/v1"
            ],
            "id": "http://example.edu/credentials/1872",
            "type": ["VerifiableCredential", "UniversityDegreeCredential"],
            "credentialSubject": {
                "id": "did:example:ebfeb1f712ebc6f1c276e12ec21",
                "degree": {
                    "type": "BachelorDegree",
                    "university": "MIT"
                }
            },
            "issuer": {
                "id": "did:example:76e12ec712ebc6f1c221ebfeb1f",
                "name": "Example University"
            },
            "issuanceDate": "2010-01-01T19:23:24Z",
            "referenceNumber": 83294847
        })
    }

    #[test]
    fn parse_credential() {
        let credential: Credential = serde_json::from_value(university_degree()).unwrap();

        assert_eq!(
            credential.context,
            vec![
                CREDENTIALS_V1_CONTEXT.to_string(),
                "https://www.w3.org/2018/credentials/examples/v1".to_string()
            ]
        );
        assert!(credential.has_type("UniversityDegreeCredential"));
        assert_eq!(credential.issuer.id, "did:example:76e12ec712ebc6f1c221ebfeb1f");
        assert_eq!(credential.issuer.custom_fields["name"], "Example University");
        assert_eq!(credential.custom_fields["referenceNumber"], 83294847);
        assert!(credential.proofs.is_empty());
        assert!(credential.expired.is_none());
    }

    #[test]
    fn serialize_keeps_w3c_shape() {
        let credential: Credential = serde_json::from_value(university_degree()).unwrap();
        let value = credential.to_json().unwrap();

        assert_eq!(value["issuanceDate"], "2010-01-01T19:23:24Z");
        assert_eq!(value["issuer"]["name"], "Example University");
        assert_eq!(value["referenceNumber"], 83294847);
        assert!(value.get("proof").is_none());

        let reparsed: Credential = serde_json::from_value(value).unwrap();
        assert_eq!(reparsed, credential);
    }

    #[test]
    fn single_string_type_and_issuer() {
        let mut value = university_degree();
        value["type"] = json!("VerifiableCredential");
        value["issuer"] = json!("did:example:issuer");
        let credential: Credential = serde_json::from_value(value).unwrap();
        assert_eq!(credential.types, vec!["VerifiableCredential".to_string()]);
        assert_eq!(credential.issuer, Issuer::new("did:example:issuer"));
    }

    #[test]
    fn mandatory_fields() {
        for (property, expected) in [
            ("credentialSubject", "credentialSubject"),
            ("issuer", "issuer"),
            ("issuanceDate", "issuanceDate"),
        ] {
            let mut value = university_degree();
            value.as_object_mut().unwrap().remove(property);
            let err = serde_json::from_value::<Credential>(value).unwrap_err();
            assert!(err.to_string().contains(expected), "{err}");
        }

        let mut value = university_degree();
        value["@context"] = json!(["https://www.w3.org/2018/credentials/examples/v1"]);
        assert!(serde_json::from_value::<Credential>(value).is_err());

        let mut value = university_degree();
        value["type"] = json!(["UniversityDegreeCredential"]);
        assert!(serde_json::from_value::<Credential>(value).is_err());

        let mut value = university_degree();
        value["issuanceDate"] = json!("yesterday");
        assert!(serde_json::from_value::<Credential>(value).is_err());
    }

    #[test]
    fn inline_contexts_are_kept_apart() {
        let mut value = university_degree();
        value["@context"] = json!([
            "https://www.w3.org/2018/credentials/v1",
            { "referenceNumber": "https://example.com/vocab#referenceNumber" }
        ]);
        let credential: Credential = serde_json::from_value(value).unwrap();
        assert_eq!(credential.context, vec![CREDENTIALS_V1_CONTEXT.to_string()]);
        assert_eq!(credential.custom_context.len(), 1);
    }
}
