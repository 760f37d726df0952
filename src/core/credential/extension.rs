//! Resolution of credentials into application-defined types.
//!
//! A [CustomCredentialProducer] claims credentials with [accept](CustomCredentialProducer::accept)
//! and builds its typed value with [apply](CustomCredentialProducer::apply). Producers are passed
//! to [resolve] per call, in priority order; the first one that accepts wins, even if its
//! `apply` then fails.

use std::{any::Any, fmt::Debug};

use anyhow::Result;
use tracing::debug;

use super::{
    parser::{CredentialOptions, CredentialParser},
    Credential,
};

/// A typed credential built by a [CustomCredentialProducer].
pub trait CustomCredential: Any + Debug + Send + Sync {
    /// The base credential this value was built from.
    fn base(&self) -> &Credential;

    fn as_any(&self) -> &dyn Any;
}

pub trait CustomCredentialProducer: Send + Sync {
    /// Identifies the producer in errors and logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns true if this producer handles `credential`. Must not have side effects.
    fn accept(&self, credential: &Credential) -> bool;

    /// Build the typed credential from the base credential and its source bytes.
    fn apply(&self, credential: &Credential, data: &[u8]) -> Result<Box<dyn CustomCredential>>;
}

/// The outcome of [resolve].
#[derive(Debug)]
pub enum ResolvedCredential {
    /// No producer accepted the credential.
    Base(Credential),
    Custom(Box<dyn CustomCredential>),
}

impl ResolvedCredential {
    pub fn base(&self) -> &Credential {
        match self {
            ResolvedCredential::Base(credential) => credential,
            ResolvedCredential::Custom(custom) => custom.base(),
        }
    }

    pub fn is_base(&self) -> bool {
        matches!(self, ResolvedCredential::Base(_))
    }

    /// The custom credential, if it is a `T`.
    pub fn downcast_ref<T: CustomCredential>(&self) -> Option<&T> {
        match self {
            ResolvedCredential::Base(_) => None,
            ResolvedCredential::Custom(custom) => custom.as_any().downcast_ref(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("failed to build base verifiable credential: {0}")]
    BaseCredentialBuild(#[source] anyhow::Error),
    #[error("failed to apply credential extension `{producer}`: {source}")]
    ExtensionApply {
        producer: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Parse `data` and hand it to the first producer that accepts it.
pub async fn resolve(
    parser: &dyn CredentialParser,
    data: &[u8],
    producers: &[Box<dyn CustomCredentialProducer>],
    options: &CredentialOptions,
) -> Result<ResolvedCredential, ResolveError> {
    let credential = parser
        .parse(data, options)
        .await
        .map_err(ResolveError::BaseCredentialBuild)?;

    let Some(producer) = producers.iter().find(|p| p.accept(&credential)) else {
        debug!("no credential extension accepted the credential");
        return Ok(ResolvedCredential::Base(credential));
    };

    debug!("applying credential extension `{}`", producer.name());

    producer
        .apply(&credential, data)
        .map(ResolvedCredential::Custom)
        .map_err(|source| ResolveError::ExtensionApply {
            producer: producer.name(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credential::{parser::JsonCredentialParser, tests::university_degree};
    use anyhow::bail;

    #[derive(Debug)]
    struct Degree {
        base: Credential,
        university: String,
    }

    impl CustomCredential for Degree {
        fn base(&self) -> &Credential {
            &self.base
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct DegreeProducer;

    impl CustomCredentialProducer for DegreeProducer {
        fn name(&self) -> &'static str {
            "degree"
        }

        fn accept(&self, credential: &Credential) -> bool {
            credential.has_type("UniversityDegreeCredential")
        }

        fn apply(&self, credential: &Credential, data: &[u8]) -> Result<Box<dyn CustomCredential>> {
            let raw: serde_json::Value = serde_json::from_slice(data)?;
            let Some(university) = raw["credentialSubject"]["degree"]["university"].as_str() else {
                bail!("degree has no university")
            };
            Ok(Box::new(Degree {
                base: credential.clone(),
                university: university.to_owned(),
            }))
        }
    }

    fn options() -> CredentialOptions {
        CredentialOptions::new().with_disabled_proof_check()
    }

    #[tokio::test]
    async fn accepted_credential_is_custom() {
        let data = serde_json::to_vec(&university_degree()).unwrap();
        let producers: Vec<Box<dyn CustomCredentialProducer>> = vec![Box::new(DegreeProducer)];

        let resolved = resolve(&JsonCredentialParser::new(), &data, &producers, &options())
            .await
            .unwrap();

        assert!(!resolved.is_base());
        let degree = resolved.downcast_ref::<Degree>().unwrap();
        assert_eq!(degree.university, "MIT");
        assert!(resolved.base().has_type("UniversityDegreeCredential"));
    }

    #[tokio::test]
    async fn failing_apply_does_not_fall_back() {
        let mut value = university_degree();
        value["credentialSubject"]["degree"] = serde_json::json!({ "type": "BachelorDegree" });
        let data = serde_json::to_vec(&value).unwrap();
        let producers: Vec<Box<dyn CustomCredentialProducer>> = vec![Box::new(DegreeProducer)];

        let err = resolve(&JsonCredentialParser::new(), &data, &producers, &options())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ExtensionApply { producer: "degree", .. }));
        assert!(err.to_string().contains("no university"));
    }
}
