use std::{collections::HashMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Map;
use tracing::{debug, warn};

use super::{
    credential::{
        parser::{CredentialOptions, CredentialParser, JsonCredentialParser, PublicKeyFetcher},
        Credential,
    },
    document_loader::DocumentLoader,
    input_descriptor::*,
    path::{self, PathError},
    presentation::Presentation,
    presentation_submission::*,
};
use crate::utils::intersects;

/// A presentation definition is a JSON object that describes the information a [Verifier](https://identity.foundation/presentation-exchange/spec/v1.0.0/#term:verifier) requires of a [Holder](https://identity.foundation/presentation-exchange/spec/v1.0.0/#term:holder).
///
/// > Presentation Definitions are objects that articulate what proofs a [Verifier](https://identity.foundation/presentation-exchange/spec/v1.0.0/#term:verifier) requires.
/// > These help the [Verifier](https://identity.foundation/presentation-exchange/spec/v1.0.0/#term:verifier) to decide how or whether to interact with a [Holder](https://identity.foundation/presentation-exchange/spec/v1.0.0/#term:holder).
///
/// For more information, see: [https://identity.foundation/presentation-exchange/spec/v1.0.0/#presentation-definition](https://identity.foundation/presentation-exchange/spec/v1.0.0/#presentation-definition)
#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct PresentationDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    input_descriptors: Vec<InputDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    submission_requirements: Option<Vec<SubmissionRequirement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
}

impl PresentationDefinition {
    /// Create a presentation definition requiring `input_descriptor`.
    pub fn new(input_descriptor: InputDescriptor) -> Self {
        Self {
            input_descriptors: vec![input_descriptor],
            ..Default::default()
        }
    }

    /// Set the id of the presentation definition.
    pub fn set_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }

    /// Return the id of the presentation definition.
    pub fn id(&self) -> Option<&String> {
        self.id.as_ref()
    }

    /// Add a new input descriptor to the presentation definition.
    pub fn add_input_descriptor(mut self, input_descriptor: InputDescriptor) -> Self {
        self.input_descriptors.push(input_descriptor);
        self
    }

    /// Return the input descriptors of the presentation definition.
    pub fn input_descriptors(&self) -> &Vec<InputDescriptor> {
        &self.input_descriptors
    }

    /// Find an input descriptor by id.
    ///
    /// Descriptor ids are expected to be unique; the first match is returned.
    pub fn input_descriptor(&self, id: &str) -> Option<&InputDescriptor> {
        self.input_descriptors.iter().find(|d| d.id() == id)
    }

    /// Set the name of the presentation definition.
    ///
    /// The [PresentationDefinition] MAY contain a name property. If present, its value SHOULD be a
    /// human-friendly string intended to constitute a distinctive designation of the Presentation Definition.
    pub fn set_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Return the name of the presentation definition.
    pub fn name(&self) -> Option<&String> {
        self.name.as_ref()
    }

    /// Set the purpose of the presentation definition.
    ///
    /// The [PresentationDefinition] MAY contain a purpose property. If present, its value MUST be a string that
    /// describes the purpose for which the Presentation Definition's inputs are being used for.
    pub fn set_purpose(mut self, purpose: String) -> Self {
        self.purpose = Some(purpose);
        self
    }

    /// Return the purpose of the presentation definition.
    pub fn purpose(&self) -> Option<&String> {
        self.purpose.as_ref()
    }

    /// Return the submission requirements of the presentation definition.
    ///
    /// Submission requirements are not evaluated during matching: every input descriptor
    /// must be satisfied.
    pub fn submission_requirements(&self) -> Option<&Vec<SubmissionRequirement>> {
        self.submission_requirements.as_ref()
    }

    /// Match the credentials of a presentation submission against the input descriptors.
    ///
    /// Returns the submitted credential for every input descriptor, keyed by descriptor id.
    /// Mappings are processed in descriptor map order and the first failing one aborts the match.
    /// If several mappings share an id, the last one wins.
    pub async fn match_submission(
        &self,
        presentation: &Presentation,
        options: &MatchOptions,
    ) -> Result<HashMap<String, Credential>, MatchError> {
        check_envelope(presentation)?;

        let document = presentation.to_json()?;
        let submission = PresentationSubmission::from_presentation(presentation)?;

        let mut matched = MatchedCredentials::new();

        for mapping in submission.descriptor_map() {
            let descriptor = self
                .input_descriptor(&mapping.id)
                .ok_or_else(|| MatchError::UnknownDescriptorId(mapping.id.clone()))?;

            let selected =
                path::select_bytes(&document, &mapping.path).map_err(|source| MatchError::Selection {
                    descriptor_id: mapping.id.clone(),
                    source,
                })?;

            let credential = options
                .parser
                .parse(&selected, &options.credential_options)
                .await
                .map_err(|source| MatchError::CredentialParse {
                    descriptor_id: mapping.id.clone(),
                    source,
                })?;

            if !intersects(&credential.context, descriptor.schema_uris()) {
                return Err(MatchError::SchemaMismatch {
                    descriptor_id: descriptor.id().to_owned(),
                    schema_uris: descriptor.schema_uris().to_vec(),
                    context: credential.context,
                });
            }

            debug!("input descriptor `{}` matched at {}", mapping.id, mapping.path);

            if matched.insert(mapping.id.clone(), credential).is_some() {
                warn!(
                    "descriptor map contains `{}` more than once, keeping the last credential",
                    mapping.id
                );
            }
        }

        matched.validate(self)?;

        Ok(matched.into_inner())
    }
}

fn check_envelope(presentation: &Presentation) -> Result<(), MatchError> {
    if !presentation
        .context()
        .iter()
        .any(|c| c == PRESENTATION_SUBMISSION_JSONLD_CONTEXT)
    {
        return Err(MatchError::NotASubmission(format!(
            "input verifiable presentation must have json-ld context {PRESENTATION_SUBMISSION_JSONLD_CONTEXT}"
        )));
    }

    if !presentation
        .types()
        .iter()
        .any(|t| t == PRESENTATION_SUBMISSION_JSONLD_TYPE)
    {
        return Err(MatchError::NotASubmission(format!(
            "input verifiable presentation must have json-ld type {PRESENTATION_SUBMISSION_JSONLD_TYPE}"
        )));
    }

    Ok(())
}

/// Configuration used when resolving the credentials of a submission.
///
/// With no options set, credentials are parsed by a [JsonCredentialParser] with its defaults.
#[derive(Clone)]
pub struct MatchOptions {
    parser: Arc<dyn CredentialParser>,
    credential_options: CredentialOptions,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            parser: Arc::new(JsonCredentialParser::new()),
            credential_options: CredentialOptions::default(),
        }
    }
}

impl fmt::Debug for MatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchOptions")
            .field("credential_options", &self.credential_options)
            .finish_non_exhaustive()
    }
}

impl MatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the embedded credentials with `parser`.
    pub fn with_credential_parser(mut self, parser: Arc<dyn CredentialParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Set the loader used to resolve the JSON-LD contexts of the embedded credentials.
    pub fn with_jsonld_document_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.credential_options = self.credential_options.with_jsonld_document_loader(loader);
        self
    }

    /// Set the fetcher resolving the keys referenced by credential proofs.
    pub fn with_public_key_fetcher(mut self, fetcher: Arc<dyn PublicKeyFetcher>) -> Self {
        self.credential_options = self.credential_options.with_public_key_fetcher(fetcher);
        self
    }

    /// Skip proof checks on the embedded credentials.
    pub fn with_disabled_proof_check(mut self) -> Self {
        self.credential_options = self.credential_options.with_disabled_proof_check();
        self
    }

    pub fn with_strict_jsonld_validation(mut self) -> Self {
        self.credential_options = self.credential_options.with_strict_jsonld_validation();
        self
    }

    pub fn credential_options(&self) -> &CredentialOptions {
        &self.credential_options
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("{0}")]
    NotASubmission(String),

    #[error(transparent)]
    MalformedSubmission(#[from] SubmissionError),

    #[error("a descriptor_map ID was found that did not match the `id` property of any input descriptor: {0}")]
    UnknownDescriptorId(String),

    #[error("failed to select vc for input descriptor `{descriptor_id}` from submission: {source}")]
    Selection {
        descriptor_id: String,
        #[source]
        source: PathError,
    },

    #[error("failed to parse credential for input descriptor `{descriptor_id}`: {source}")]
    CredentialParse {
        descriptor_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("input descriptor id [{descriptor_id}] requires schema uri {schema_uris:?} which is not in vc context {context:?}")]
    SchemaMismatch {
        descriptor_id: String,
        schema_uris: Vec<String>,
        context: Vec<String>,
    },

    #[error("failed submission requirements: {0}")]
    Unsatisfied(#[from] SubmissionValidationError),

    #[error("failed to serialize presentation: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SubmissionRequirementObject {
    pub name: Option<String>,
    pub purpose: Option<String>,
    #[serde(flatten)]
    pub property_set: Option<Map<String, serde_json::Value>>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SubmissionRequirementBase {
    From {
        from: GroupId,
        #[serde(flatten)]
        submission_requirement_base: SubmissionRequirementObject,
    },
    FromNested {
        from_nested: Vec<SubmissionRequirement>,
        #[serde(flatten)]
        submission_requirement_base: SubmissionRequirementObject,
    },
}

/// A submission requirement rule. Parsed, but not evaluated.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SubmissionRequirement {
    All(SubmissionRequirementBase),
    Pick(SubmissionRequirementPick),
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SubmissionRequirementPick {
    #[serde(flatten)]
    pub submission_requirement: SubmissionRequirementBase,
    pub count: Option<u64>,
    pub min: Option<u64>,
    pub max: Option<u64>,
}
