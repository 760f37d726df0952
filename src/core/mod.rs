pub mod credential;
pub mod document_loader;
pub mod input_descriptor;
pub mod object;
pub mod path;
pub mod presentation;
pub mod presentation_definition;
pub mod presentation_submission;
pub mod util;
