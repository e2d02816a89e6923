// Document Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::index::is_valid_identifier;
use serde_json::Value;

/// Opaque field-name -> value mapping
pub type Document = serde_json::Map<String, Value>;

/// Infer the primary key of a document: the first field, in alphabetical
/// order, whose name ends with `id` (case-insensitive).
pub fn infer_primary_key(document: &Document) -> Option<&str> {
    document
        .keys()
        .map(String::as_str)
        .filter(|name| name.to_ascii_lowercase().ends_with("id"))
        .min_by_key(|name| (name.to_ascii_lowercase(), *name))
}

/// Render a primary-key value as a document id.
///
/// Only strings and integers qualify.
pub fn document_id(document: &Document, primary_key: &str) -> Option<String> {
    match document.get(primary_key)? {
        Value::String(s) if is_valid_identifier(s) => Some(s.clone()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        _ => None,
    }
}

/// Check that every serialized document is an object carrying `primary_key`
pub fn check_primary_key(documents: &[Value], primary_key: &str) -> Result<()> {
    for (position, value) in documents.iter().enumerate() {
        let document = value
            .as_object()
            .ok_or(DomainError::NotAnObject { position })?;
        if document_id(document, primary_key).is_none() {
            return Err(DomainError::MissingPrimaryKey {
                position,
                primary_key: primary_key.to_string(),
            });
        }
    }
    Ok(())
}

/// Validate a document id before it is placed in a request path
pub fn validate_document_id(id: &str) -> Result<()> {
    if is_valid_identifier(id) {
        Ok(())
    } else {
        Err(DomainError::InvalidDocumentId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_infer_primary_key_alphabetical() {
        let d = doc(json!({ "uuid": "x", "movie_id": 1, "name": "Up" }));
        assert_eq!(infer_primary_key(&d), Some("movie_id"));
    }

    #[test]
    fn test_infer_primary_key_case_insensitive() {
        let d = doc(json!({ "Name": "Up", "ID": 4 }));
        assert_eq!(infer_primary_key(&d), Some("ID"));
    }

    #[test]
    fn test_infer_primary_key_ignores_letter_case_when_ordering() {
        let d = doc(json!({ "Zid": 1, "aid": 2 }));
        assert_eq!(infer_primary_key(&d), Some("aid"));

        let d = doc(json!({ "Bookid": 1, "author_id": 2, "Zone": "eu" }));
        assert_eq!(infer_primary_key(&d), Some("author_id"));
    }

    #[test]
    fn test_infer_primary_key_none() {
        let d = doc(json!({ "name": "Up", "genre": "Animation" }));
        assert_eq!(infer_primary_key(&d), None);
    }

    #[test]
    fn test_document_id_kinds() {
        let d = doc(json!({ "id": 10, "sid": "abc-1", "bad": "a b", "f": 1.5 }));
        assert_eq!(document_id(&d, "id").as_deref(), Some("10"));
        assert_eq!(document_id(&d, "sid").as_deref(), Some("abc-1"));
        assert_eq!(document_id(&d, "bad"), None);
        assert_eq!(document_id(&d, "f"), None);
        assert_eq!(document_id(&d, "missing"), None);
    }

    #[test]
    fn test_check_primary_key_reports_position() {
        let docs = vec![json!({ "id": "1" }), json!({ "name": "no id" })];
        let err = check_primary_key(&docs, "id").unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingPrimaryKey {
                position: 1,
                primary_key: "id".to_string()
            }
        );

        let err = check_primary_key(&[json!([1, 2])], "id").unwrap_err();
        assert_eq!(err, DomainError::NotAnObject { position: 0 });
    }
}
