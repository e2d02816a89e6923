//! Meili SDK - Task-aware Rust client for Meilisearch
//!
//! Every mutating call returns the engine's [`Task`] immediately; the
//! [`TaskPoller`] behind [`MeiliClient::wait_for_task`] and
//! [`Index::wait_for_task`] turns that into "block until applied".
//!
//! # Example
//!
//! ```no_run
//! use meili_sdk::{ClientConfig, MeiliClient, SearchQuery};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MeiliClient::new(&ClientConfig::from_env()?)?;
//!     let movies = client.index("movies");
//!
//!     let task = movies
//!         .add_documents(&[json!({ "id": "10", "title": "Carol" })], Some("id"))
//!         .await?;
//!     movies.wait_for_task(task.id, None).await?.into_result()?;
//!
//!     let results = movies.search::<serde_json::Value>(&SearchQuery::new("carol")).await?;
//!     println!("{} hits", results.hits.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod index;
mod types;

pub use client::MeiliClient;
pub use config::{default_config_path, ClientConfig, DEFAULT_URL, ENV_PREFIX};
pub use index::Index;
pub use types::Health;

pub use meili_core::application::{cancel_channel, CancelHandle, CancelToken, PollOptions, TaskPoller};
pub use meili_core::domain::{
    Document, DocumentsQuery, IndexDescriptor, IndexStats, SearchQuery, SearchResults, Settings,
    Task, TaskError, TaskId, TaskKind, TaskRef, TaskStatus,
};
pub use meili_core::port::{ApiError, TransportError};
pub use meili_core::{MeiliError, Result};
pub use meili_infra_http::AuthScheme;
