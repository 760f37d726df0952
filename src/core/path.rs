//! JSONPath selection into untyped JSON documents.
//!
//! The resolver knows nothing about credentials: it compiles an expression, runs it
//! against a [`serde_json::Value`] tree and hands back whatever it selected.

use serde_json::Value as Json;
use serde_json_path::JsonPath;

/// Failure to select a value out of a document.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// The expression is not valid JSONPath.
    #[error("invalid path expression `{expression}`: {source}")]
    InvalidExpression {
        expression: String,
        #[source]
        source: serde_json_path::ParseError,
    },

    /// The expression is valid but selects nothing in the document.
    #[error("failed to evaluate path expression `{expression}`: {reason}")]
    Evaluation { expression: String, reason: String },
}

/// Compile `expression` and evaluate it against `document`.
///
/// A single match is returned as is. Several matches (e.g. through a wildcard) are
/// returned as an array of the matched values in document order. No match at all is
/// an evaluation failure.
pub fn select(document: &Json, expression: &str) -> Result<Json, PathError> {
    let path = JsonPath::parse(expression).map_err(|source| PathError::InvalidExpression {
        expression: expression.to_owned(),
        source,
    })?;

    select_compiled(document, &path, expression)
}

fn select_compiled(document: &Json, path: &JsonPath, expression: &str) -> Result<Json, PathError> {
    let nodes = path.query(document).all();

    match nodes.as_slice() {
        [] => Err(PathError::Evaluation {
            expression: expression.to_owned(),
            reason: "no value found at path".into(),
        }),
        [single] => Ok((*single).clone()),
        many => Ok(Json::Array(many.iter().map(|v| (*v).clone()).collect())),
    }
}

/// Select a value and serialize it back to JSON bytes, ready for a credential parser.
pub fn select_bytes(document: &Json, expression: &str) -> Result<Vec<u8>, PathError> {
    let selected = select(document, expression)?;
    serde_json::to_vec(&selected).map_err(|e| PathError::Evaluation {
        expression: expression.to_owned(),
        reason: format!("selected value could not be serialized: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn presentation() -> Json {
        json!({
            "type": ["VerifiablePresentation"],
            "verifiableCredential": [
                { "id": "urn:uuid:1", "type": ["VerifiableCredential"] },
                { "id": "urn:uuid:2", "type": ["VerifiableCredential"] }
            ]
        })
    }

    #[test]
    fn select_by_index() {
        let selected = select(&presentation(), "$.verifiableCredential[1]").unwrap();
        assert_eq!(selected["id"], "urn:uuid:2");

        let selected = select(&presentation(), "$['verifiableCredential'][0].id").unwrap();
        assert_eq!(selected, json!("urn:uuid:1"));
    }

    #[test]
    fn wildcard_selects_all_in_order() {
        let selected = select(&presentation(), "$.verifiableCredential[*].id").unwrap();
        assert_eq!(selected, json!(["urn:uuid:1", "urn:uuid:2"]));
    }

    #[test]
    fn invalid_expression() {
        let err = select(&presentation(), "$.verifiableCredential[").unwrap_err();
        assert!(matches!(err, PathError::InvalidExpression { ref expression, .. } if expression == "$.verifiableCredential["));
    }

    #[test]
    fn unresolved_path() {
        let err = select(&presentation(), "$.verifiableCredential[5]").unwrap_err();
        assert!(matches!(err, PathError::Evaluation { .. }));
        assert!(err.to_string().contains("$.verifiableCredential[5]"));
    }

    #[test]
    fn selected_bytes_are_json() {
        let bytes = select_bytes(&presentation(), "$.verifiableCredential[0]").unwrap();
        let value: Json = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["id"], "urn:uuid:1");
    }
}
