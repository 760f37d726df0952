use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::{
    credential::Credential, object::TypedParameter, presentation::Presentation,
    presentation_definition::PresentationDefinition,
};

/// JSON-LD context a presentation carrying a submission must declare.
pub const PRESENTATION_SUBMISSION_JSONLD_CONTEXT: &str =
    "https://identity.foundation/presentation-exchange/submission/v1";

/// JSON-LD type a presentation carrying a submission must declare.
pub const PRESENTATION_SUBMISSION_JSONLD_TYPE: &str = "PresentationSubmission";

const DESCRIPTOR_MAP_PROPERTY: &str = "descriptor_map";

/// A DescriptorMapId is the id of the input descriptor a mapping satisfies.
pub type DescriptorMapId = String;

/// Presentation Submissions are objects embedded within a verifiable presentation that express
/// how the credentials it carries are provided in accordance with the requirements specified in
/// a [PresentationDefinition].
///
/// Embedded Presentation Submission objects MUST be located within the presentation as
/// the value of a `presentation_submission` property.
///
/// For more information, see: [https://identity.foundation/presentation-exchange/spec/v1.0.0/#presentation-submission](https://identity.foundation/presentation-exchange/spec/v1.0.0/#presentation-submission)
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresentationSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    definition_id: Option<String>,
    descriptor_map: Vec<InputDescriptorMapping>,
}

impl TypedParameter for PresentationSubmission {
    const KEY: &'static str = "presentation_submission";
}

impl PresentationSubmission {
    /// The object MUST include a `descriptor_map` property. The value of this property MUST be an
    /// array of [InputDescriptorMapping] objects.
    pub fn new(descriptor_map: Vec<InputDescriptorMapping>) -> Self {
        Self {
            descriptor_map,
            ..Default::default()
        }
    }

    pub fn set_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }

    /// Return the id of the presentation submission.
    pub fn id(&self) -> Option<&String> {
        self.id.as_ref()
    }

    /// Set the id of the [PresentationDefinition] this submission answers.
    pub fn set_definition_id(mut self, definition_id: String) -> Self {
        self.definition_id = Some(definition_id);
        self
    }

    /// Return the definition id of the presentation submission.
    pub fn definition_id(&self) -> Option<&String> {
        self.definition_id.as_ref()
    }

    /// Return the descriptor map of the presentation submission.
    pub fn descriptor_map(&self) -> &Vec<InputDescriptorMapping> {
        &self.descriptor_map
    }

    /// Read a submission from the raw `presentation_submission` value.
    ///
    /// Only the `descriptor_map` array is required; its entries must be well formed. A non-string
    /// `id` or `definition_id` is dropped rather than rejected.
    pub fn from_value(value: &Json) -> Result<Self, SubmissionError> {
        let Json::Object(submission) = value else {
            return Err(SubmissionError::NotAnObject);
        };

        let descriptor_map = match submission.get(DESCRIPTOR_MAP_PROPERTY) {
            Some(map @ Json::Array(_)) => Vec::<InputDescriptorMapping>::deserialize(map)
                .map_err(SubmissionError::InvalidDescriptorMap)?,
            _ => return Err(SubmissionError::MissingDescriptorMap),
        };

        // Identifiers of another type are not part of the submission's shape and are ignored.
        let text = |key: &str| submission.get(key).and_then(Json::as_str).map(str::to_owned);

        Ok(Self {
            id: text("id"),
            definition_id: text("definition_id"),
            descriptor_map,
        })
    }

    /// Read the submission embedded in `presentation`.
    pub fn from_presentation(presentation: &Presentation) -> Result<Self, SubmissionError> {
        presentation
            .custom_fields()
            .get_raw(Self::KEY)
            .ok_or(SubmissionError::MissingSubmission)
            .and_then(Self::from_value)
    }
}

impl TryFrom<Json> for PresentationSubmission {
    type Error = anyhow::Error;

    fn try_from(raw: Json) -> Result<Self, Self::Error> {
        Self::from_value(&raw).map_err(Into::into)
    }
}

impl TryFrom<PresentationSubmission> for Json {
    type Error = serde_json::Error;

    fn try_from(value: PresentationSubmission) -> Result<Self, Self::Error> {
        serde_json::to_value(value)
    }
}

/// Describes where, in the presentation, the credential submitted for an input descriptor is.
///
/// For more information, see: [https://identity.foundation/presentation-exchange/spec/v1.0.0/#presentation-submission](https://identity.foundation/presentation-exchange/spec/v1.0.0/#presentation-submission)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputDescriptorMapping {
    pub id: DescriptorMapId,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_nested: Option<Box<InputDescriptorMapping>>,
}

impl InputDescriptorMapping {
    /// The mapping MUST include an `id` property matching the `id` of an input descriptor of the
    /// related [PresentationDefinition].
    ///
    /// The `path` property is a [JSONPath](https://goessner.net/articles/JsonPath/) expression
    /// selecting the submitted credential, evaluated against the top level of the presentation.
    pub fn new(id: impl Into<DescriptorMapId>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            format: None,
            path_nested: None,
        }
    }

    pub fn set_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Set the nested path of the mapping.
    ///
    /// The nested mapping always carries the id of its parent. Nested paths are kept with the
    /// submission but not followed during matching.
    pub fn set_path_nested(mut self, mut path_nested: InputDescriptorMapping) -> Self {
        path_nested.id.clone_from(&self.id);

        self.path_nested = Some(Box::new(path_nested));

        self
    }
}

/// Presentation submission error.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("missing 'presentation_submission' on verifiable presentation")]
    MissingSubmission,

    #[error("'presentation_submission' must be a JSON object")]
    NotAnObject,

    #[error("missing 'descriptor_map' on verifiable presentation")]
    MissingDescriptorMap,

    #[error("failed to parse descriptor map: {0}")]
    InvalidDescriptorMap(#[source] serde_json::Error),
}

/// Presentation submission inputs validation error.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionValidationError {
    /// Missing an input required by the presentation definition.
    #[error("no credential provided for input descriptor {0}")]
    MissingRequiredInput(String),
}

/// Credentials matched to input descriptors, keyed by descriptor id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchedCredentials(HashMap<DescriptorMapId, Credential>);

impl MatchedCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `credential` for `descriptor_id`, returning the credential it replaces.
    pub fn insert(&mut self, descriptor_id: DescriptorMapId, credential: Credential) -> Option<Credential> {
        self.0.insert(descriptor_id, credential)
    }

    pub fn get(&self, descriptor_id: &str) -> Option<&Credential> {
        self.0.get(descriptor_id)
    }

    /// Every input descriptor of `definition` must have a matched credential.
    ///
    /// Submission requirement rules are not evaluated.
    pub fn validate(&self, definition: &PresentationDefinition) -> Result<(), SubmissionValidationError> {
        match definition
            .input_descriptors()
            .iter()
            .find(|d| !self.0.contains_key(d.id()))
        {
            Some(missing) => Err(SubmissionValidationError::MissingRequiredInput(
                missing.id().to_owned(),
            )),
            None => Ok(()),
        }
    }

    pub fn into_inner(self) -> HashMap<DescriptorMapId, Credential> {
        self.0
    }
}
