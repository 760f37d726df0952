//! Well-known JSON-LD contexts served without network access.
//!
//! These are trimmed copies holding the term definitions; `@protected` and the
//! proof-suite definitions of the published documents are left out.

use serde_json::{json, Value as Json};

use crate::core::{
    credential::CREDENTIALS_V1_CONTEXT, presentation_submission::PRESENTATION_SUBMISSION_JSONLD_CONTEXT,
};

pub(crate) fn embedded() -> [(&'static str, Json); 2] {
    [
        (CREDENTIALS_V1_CONTEXT, credentials_v1()),
        (PRESENTATION_SUBMISSION_JSONLD_CONTEXT, presentation_submission_v1()),
    ]
}

fn credentials_v1() -> Json {
    json!({
        "@context": {
            "@version": 1.1,
            "id": "@id",
            "type": "@type",
            "VerifiableCredential": {
                "@id": "https://www.w3.org/2018/credentials#VerifiableCredential",
                "@context": {
                    "@version": 1.1,
                    "id": "@id",
                    "type": "@type",
                    "cred": "https://www.w3.org/2018/credentials#",
                    "sec": "https://w3id.org/security#",
                    "xsd": "http://www.w3.org/2001/XMLSchema#",
                    "credentialSchema": { "@id": "cred:credentialSchema", "@type": "@id" },
                    "credentialStatus": { "@id": "cred:credentialStatus", "@type": "@id" },
                    "credentialSubject": { "@id": "cred:credentialSubject", "@type": "@id" },
                    "evidence": { "@id": "cred:evidence", "@type": "@id" },
                    "expirationDate": { "@id": "cred:expirationDate", "@type": "xsd:dateTime" },
                    "holder": { "@id": "cred:holder", "@type": "@id" },
                    "issued": { "@id": "cred:issued", "@type": "xsd:dateTime" },
                    "issuer": { "@id": "cred:issuer", "@type": "@id" },
                    "issuanceDate": { "@id": "cred:issuanceDate", "@type": "xsd:dateTime" },
                    "proof": { "@id": "sec:proof", "@type": "@id", "@container": "@graph" },
                    "refreshService": { "@id": "cred:refreshService", "@type": "@id" },
                    "termsOfUse": { "@id": "cred:termsOfUse", "@type": "@id" },
                    "validFrom": { "@id": "cred:validFrom", "@type": "xsd:dateTime" },
                    "validUntil": { "@id": "cred:validUntil", "@type": "xsd:dateTime" }
                }
            },
            "VerifiablePresentation": {
                "@id": "https://www.w3.org/2018/credentials#VerifiablePresentation",
                "@context": {
                    "@version": 1.1,
                    "id": "@id",
                    "type": "@type",
                    "cred": "https://www.w3.org/2018/credentials#",
                    "sec": "https://w3id.org/security#",
                    "holder": { "@id": "cred:holder", "@type": "@id" },
                    "proof": { "@id": "sec:proof", "@type": "@id", "@container": "@graph" },
                    "verifiableCredential": {
                        "@id": "cred:verifiableCredential",
                        "@type": "@id",
                        "@container": "@graph"
                    }
                }
            }
        }
    })
}

fn presentation_submission_v1() -> Json {
    json!({
        "@context": {
            "@version": 1.1,
            "PresentationSubmission": {
                "@id": "https://identity.foundation/presentation-exchange/#presentation-submission",
                "@context": {
                    "@version": 1.1,
                    "presentation_submission": {
                        "@id": "https://identity.foundation/presentation-exchange/#presentation-submission",
                        "@type": "@json"
                    }
                }
            }
        }
    })
}
