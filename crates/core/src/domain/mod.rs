// Domain Layer - Tasks, indexes, documents and settings

pub mod document;
pub mod error;
pub mod index;
pub mod search;
pub mod settings;
pub mod task;

// Re-exports
pub use document::{check_primary_key, document_id, infer_primary_key, Document};
pub use error::DomainError;
pub use index::{
    validate_index_uid, CreateIndexRequest, IndexDescriptor, IndexStats, IndexUid, Listing,
};
pub use search::{DocumentsQuery, SearchQuery, SearchResults};
pub use settings::Settings;
pub use task::{Task, TaskError, TaskId, TaskKind, TaskRef, TaskStatus};
