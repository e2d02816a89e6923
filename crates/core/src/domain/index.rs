// Index Domain Model

use crate::domain::error::{DomainError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index uid
pub type IndexUid = String;

/// Index descriptor as listed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescriptor {
    pub uid: IndexUid,
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl IndexDescriptor {
    pub fn new(uid: impl Into<String>, primary_key: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            primary_key,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Body of `POST /indexes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIndexRequest {
    pub uid: IndexUid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
}

/// Index statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub number_of_documents: u64,
    #[serde(default)]
    pub is_indexing: bool,
    #[serde(default)]
    pub field_distribution: BTreeMap<String, u64>,
}

/// List payload: a bare array, or a paginated `{ "results": [...] }` envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Plain(items) => items,
            Listing::Paged { results } => results,
        }
    }
}

/// Validate an index uid before it is placed in a request path
pub fn validate_index_uid(uid: &str) -> Result<()> {
    if is_valid_identifier(uid) {
        Ok(())
    } else {
        Err(DomainError::InvalidIndexUid(uid.to_string()))
    }
}

pub(crate) fn is_valid_identifier(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 511
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
