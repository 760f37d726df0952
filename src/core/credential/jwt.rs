//! Compact JWT encoded credentials.
//!
//! The `vc` claim carries the credential body; the registered claims take precedence over
//! the corresponding credential properties.

use anyhow::{Context, Result};
use base64::prelude::*;
use chrono::{DateTime, SecondsFormat};
use serde_json::{Map, Value as Json};
use ssi::{
    claims::{jws::split_jws, jwt},
    jwk::JWK,
};

use super::ParseError;

/// A JWT with its header and claims decoded, signature not yet verified.
#[derive(Debug, Clone)]
pub struct DecodedJwt {
    pub header: Map<String, Json>,
    pub claims: Map<String, Json>,
    compact: String,
}

/// Returns true if `data` has the shape of a compact JWS.
pub fn is_compact_jws(data: &str) -> bool {
    split_jws(data).is_ok_and(|(header, payload, _)| {
        !payload.is_empty() && BASE64_URL_SAFE_NO_PAD.decode(header).is_ok()
    })
}

/// Split and decode a compact JWT.
pub fn decode(compact: &str) -> Result<DecodedJwt, ParseError> {
    let (header_b64, _, _) =
        split_jws(compact).map_err(|e| ParseError::InvalidJwt(e.to_string()))?;

    let header_json_bytes = BASE64_URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|e| ParseError::InvalidJwt(format!("jwt headers were not valid base64url: {e}")))?;

    let header = serde_json::from_slice::<Map<String, Json>>(&header_json_bytes)
        .map_err(|e| ParseError::InvalidJwt(format!("jwt headers were not valid json: {e}")))?;

    let claims = jwt::decode_unverified::<Map<String, Json>>(compact)
        .map_err(|e| ParseError::InvalidJwt(format!("jwt claims could not be decoded: {e}")))?;

    Ok(DecodedJwt {
        header,
        claims,
        compact: compact.to_owned(),
    })
}

impl DecodedJwt {
    /// The `alg` header.
    pub fn alg(&self) -> Result<&str, ParseError> {
        match self.header.get("alg") {
            Some(Json::String(alg)) => Ok(alg),
            Some(_) => Err(ParseError::InvalidJwt("'alg' header was not a string".into())),
            None => Err(ParseError::InvalidJwt("'alg' was missing from jwt headers".into())),
        }
    }

    /// The `kid` header, empty when absent.
    pub fn kid(&self) -> &str {
        self.header.get("kid").and_then(Json::as_str).unwrap_or_default()
    }

    /// The `iss` claim.
    pub fn issuer(&self) -> Option<&str> {
        self.claims.get("iss").and_then(Json::as_str)
    }

    /// Verify the signature against the public key `jwk`.
    pub fn verify(&self, jwk: &Json) -> Result<()> {
        let jwk: JWK = serde_json::from_value(jwk.clone()).context("public key is not a valid JWK")?;

        let _: Json = jwt::decode_verify(&self.compact, &jwk)
            .context("credential signature could not be verified")?;

        Ok(())
    }

    /// The JWT in its compact form.
    pub fn compact(&self) -> &str {
        &self.compact
    }

    /// Build the JSON credential from the `vc` claim and the registered claims.
    pub fn credential_json(&self) -> Result<Map<String, Json>, ParseError> {
        let Some(Json::Object(vc)) = self.claims.get("vc") else {
            return Err(ParseError::InvalidJwt("'vc' claim was missing or not an object".into()));
        };
        let mut vc = vc.clone();

        if let Some(iss) = self.issuer() {
            match vc.get_mut("issuer") {
                Some(Json::Object(issuer)) => {
                    issuer.insert("id".into(), iss.into());
                }
                _ => {
                    vc.insert("issuer".into(), iss.into());
                }
            }
        }

        if let Some(jti) = self.claims.get("jti").and_then(Json::as_str) {
            vc.insert("id".into(), jti.into());
        }

        if let Some(sub) = self.claims.get("sub").and_then(Json::as_str) {
            if let Some(Json::Object(subject)) = vc.get_mut("credentialSubject") {
                subject.insert("id".into(), sub.into());
            }
        }

        let issued = self
            .claims
            .get("nbf")
            .or_else(|| self.claims.get("iat"))
            .and_then(Json::as_i64);
        if let Some(issued) = issued {
            vc.insert("issuanceDate".into(), timestamp("nbf", issued)?.into());
        }

        if let Some(exp) = self.claims.get("exp").and_then(Json::as_i64) {
            vc.insert("expirationDate".into(), timestamp("exp", exp)?.into());
        }

        Ok(vc)
    }
}

fn timestamp(claim: &str, secs: i64) -> Result<String, ParseError> {
    DateTime::from_timestamp(secs, 0)
        .map(|date| date.to_rfc3339_opts(SecondsFormat::Secs, true))
        .ok_or_else(|| ParseError::InvalidJwt(format!("'{claim}' claim is out of range")))
}
