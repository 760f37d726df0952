//! W3C Verifiable Presentation envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::{
    credential::{split_context, Proof, CREDENTIALS_V1_CONTEXT},
    object::UntypedObject,
    presentation_submission::PresentationSubmission,
};
use crate::utils::one_or_many;

/// Type every presentation declares.
pub const VERIFIABLE_PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// A verifiable presentation.
///
/// Embedded credentials are kept as untyped JSON: they are only interpreted once a
/// descriptor mapping selects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPresentation", into = "RawPresentation")]
pub struct Presentation {
    context: Vec<String>,
    custom_context: Vec<Json>,
    id: Option<String>,
    types: Vec<String>,
    holder: Option<String>,
    credentials: Vec<Json>,
    proofs: Vec<Proof>,
    custom_fields: UntypedObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPresentation {
    #[serde(rename = "@context", default, deserialize_with = "one_or_many")]
    context: Vec<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "one_or_many")]
    types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    holder: Option<String>,
    #[serde(
        rename = "verifiableCredential",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    credentials: Vec<Json>,
    #[serde(
        rename = "proof",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    proofs: Vec<Proof>,
    #[serde(flatten)]
    custom_fields: UntypedObject,
}

impl From<RawPresentation> for Presentation {
    fn from(raw: RawPresentation) -> Self {
        let (context, custom_context) = split_context(raw.context);
        Self {
            context,
            custom_context,
            id: raw.id,
            types: raw.types,
            holder: raw.holder,
            credentials: raw.credentials,
            proofs: raw.proofs,
            custom_fields: raw.custom_fields,
        }
    }
}

impl From<Presentation> for RawPresentation {
    fn from(presentation: Presentation) -> Self {
        let context = presentation
            .context
            .into_iter()
            .map(Json::String)
            .chain(presentation.custom_context)
            .collect();

        Self {
            context,
            id: presentation.id,
            types: presentation.types,
            holder: presentation.holder,
            credentials: presentation.credentials,
            proofs: presentation.proofs,
            custom_fields: presentation.custom_fields,
        }
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new()
    }
}

impl Presentation {
    /// An empty presentation with the base credentials context and type.
    pub fn new() -> Self {
        Self {
            context: vec![CREDENTIALS_V1_CONTEXT.to_owned()],
            custom_context: Vec::new(),
            id: None,
            types: vec![VERIFIABLE_PRESENTATION_TYPE.to_owned()],
            holder: None,
            credentials: Vec::new(),
            proofs: Vec::new(),
            custom_fields: UntypedObject::default(),
        }
    }

    /// Parse a presentation from its JSON form. Proofs are not checked.
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Return the untyped JSON form of the presentation.
    pub fn to_json(&self) -> Result<Json, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn add_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn add_type(mut self, presentation_type: impl Into<String>) -> Self {
        self.types.push(presentation_type.into());
        self
    }

    /// Append an embedded credential: a JSON object, or a JSON string holding a JWT.
    pub fn add_credential(mut self, credential: Json) -> Self {
        self.credentials.push(credential);
        self
    }

    pub fn set_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }

    pub fn set_holder(mut self, holder: String) -> Self {
        self.holder = Some(holder);
        self
    }

    /// Embed `submission` under the `presentation_submission` property.
    pub fn set_presentation_submission(
        mut self,
        submission: PresentationSubmission,
    ) -> anyhow::Result<Self> {
        self.custom_fields.insert(submission)?;
        Ok(self)
    }

    /// Context URIs, in document order.
    pub fn context(&self) -> &[String] {
        &self.context
    }

    pub fn custom_context(&self) -> &[Json] {
        &self.custom_context
    }

    pub fn id(&self) -> Option<&String> {
        self.id.as_ref()
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn holder(&self) -> Option<&String> {
        self.holder.as_ref()
    }

    pub fn credentials(&self) -> &[Json] {
        &self.credentials
    }

    pub fn proofs(&self) -> &[Proof] {
        &self.proofs
    }

    /// Every property without a dedicated field.
    pub fn custom_fields(&self) -> &UntypedObject {
        &self.custom_fields
    }

    pub fn custom_fields_mut(&mut self) -> &mut UntypedObject {
        &mut self.custom_fields
    }
}
