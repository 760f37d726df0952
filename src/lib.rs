//! This library checks verifiable presentations against
//! [DIF Presentation Exchange] definitions, and resolves credentials into
//! application-defined types.
//!
//! [DIF Presentation Exchange]: <https://identity.foundation/presentation-exchange/spec/v1.0.0/>
//!
//! # Matching a Submission
//!
//! A [`PresentationDefinition`] lists the input descriptors a verifier requires. A holder
//! answers with a [`Presentation`] carrying a `presentation_submission` whose descriptor map
//! points, with JSONPath expressions, at the credential submitted for each descriptor:
//!
//! ```ignore
//! use presentation_exchange::core::input_descriptor::{InputDescriptor, Schema};
//! use presentation_exchange::core::presentation::Presentation;
//! use presentation_exchange::core::presentation_definition::{MatchOptions, PresentationDefinition};
//!
//! let definition = PresentationDefinition::new(
//!     InputDescriptor::new("degree")?
//!         .set_schema(Schema::new("https://www.w3.org/2018/credentials/examples/v1")),
//! );
//!
//! let presentation = Presentation::from_json(&submitted_bytes)?;
//!
//! let options = MatchOptions::new()
//!     .with_jsonld_document_loader(loader)
//!     .with_public_key_fetcher(fetcher);
//!
//! let credentials = definition.match_submission(&presentation, &options).await?;
//! let degree = &credentials["degree"];
//! ```
//!
//! Matching fails on the first mapping, in descriptor map order, that references an unknown
//! descriptor, selects nothing, does not parse as a credential, or whose credential context
//! does not intersect the descriptor's schema URIs. It also fails if any descriptor is left
//! without a credential.
//!
//! [`PresentationDefinition`]: crate::core::presentation_definition::PresentationDefinition
//! [`Presentation`]: crate::core::presentation::Presentation
//!
//! # Custom Credential Types
//!
//! [`resolve`] parses a credential and hands it to the first [`CustomCredentialProducer`]
//! that accepts it:
//!
//! ```ignore
//! use presentation_exchange::core::credential::extension::{resolve, CustomCredentialProducer};
//! use presentation_exchange::core::credential::parser::{CredentialOptions, JsonCredentialParser};
//!
//! let producers: Vec<Box<dyn CustomCredentialProducer>> =
//!     vec![Box::new(DriverLicenseProducer), Box::new(DegreeProducer)];
//!
//! let resolved = resolve(
//!     &JsonCredentialParser::new(),
//!     &credential_bytes,
//!     &producers,
//!     &CredentialOptions::new(),
//! )
//! .await?;
//!
//! if let Some(license) = resolved.downcast_ref::<DriverLicense>() {
//!     // ...
//! }
//! ```
//!
//! [`resolve`]: crate::core::credential::extension::resolve
//! [`CustomCredentialProducer`]: crate::core::credential::extension::CustomCredentialProducer
//!
//! # Collaborators
//!
//! Credential parsing, JSON-LD context loading and public key lookup sit behind the
//! [`CredentialParser`], [`DocumentLoader`] and [`PublicKeyFetcher`] traits. The default
//! [`JsonCredentialParser`] handles JSON-LD credentials and JWT credentials.
//!
//! [`CredentialParser`]: crate::core::credential::parser::CredentialParser
//! [`DocumentLoader`]: crate::core::document_loader::DocumentLoader
//! [`PublicKeyFetcher`]: crate::core::credential::parser::PublicKeyFetcher
//! [`JsonCredentialParser`]: crate::core::credential::parser::JsonCredentialParser

pub mod config;
pub mod core;
pub mod utils;

#[cfg(test)]
pub(crate) mod tests;

pub use serde_json_path::JsonPath;
