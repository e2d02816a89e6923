//! Index fixtures and teardown
//!
//! Each setup waits for its tasks and panics unless they end `processed`,
//! so a broken fixture fails loudly instead of leaking into assertions.

use crate::fake_engine::FakeEngine;
use meili_sdk::{
    ClientConfig, Index, MeiliClient, MeiliError, PollOptions, Settings, Task, TaskStatus,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wiremock::MockServer;

/// Master key used by [`TestEngine::start_with_key`]
pub const MASTER_KEY: &str = "masterKey";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl Movie {
    fn new(id: &str, name: &str, genre: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            genre: genre.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieWithIntId {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

/// Seven movies with string ids `10`..`16`
pub fn basic_movies() -> Vec<Movie> {
    vec![
        Movie::new("10", "Gladiator", None),
        Movie::new("11", "Interstellar", None),
        Movie::new("12", "Star Wars", None),
        Movie::new("13", "Harry Potter", None),
        Movie::new("14", "Iron Man", None),
        Movie::new("15", "Spider-Man", None),
        Movie::new("16", "Amélie Poulain", None),
    ]
}

/// Eight movies with a `genre` facet
pub fn faceting_movies() -> Vec<Movie> {
    vec![
        Movie::new("10", "Gladiator", Some("Action")),
        Movie::new("11", "Interstellar", Some("Sci-Fi")),
        Movie::new("12", "Star Wars", Some("Sci-Fi")),
        Movie::new("13", "Harry Potter", Some("Fantasy")),
        Movie::new("14", "Iron Man", Some("Action")),
        Movie::new("15", "Spider-Man", Some("Action")),
        Movie::new("16", "Amélie Poulain", Some("Romance")),
        Movie::new("17", "Mission Impossible", None),
    ]
}

/// A fake engine, its server, and a client pointed at it
pub struct TestEngine {
    pub engine: FakeEngine,
    pub server: MockServer,
    pub client: MeiliClient,
}

impl TestEngine {
    /// Polling defaults suited to the fake: short interval, generous timeout
    pub fn poll_options() -> PollOptions {
        PollOptions::new(Duration::from_secs(5), Duration::from_millis(5))
    }

    pub async fn start() -> Self {
        Self::launch(FakeEngine::new(), None).await
    }

    pub async fn start_with_key() -> Self {
        Self::launch(FakeEngine::new().with_master_key(MASTER_KEY), Some(MASTER_KEY)).await
    }

    async fn launch(engine: FakeEngine, api_key: Option<&str>) -> Self {
        let server = engine.serve().await;
        let client = Self::client_for(&server, api_key);
        Self {
            engine,
            server,
            client,
        }
    }

    /// Another client on the same server, e.g. with a different key
    pub fn client_for(server: &MockServer, api_key: Option<&str>) -> MeiliClient {
        let mut config =
            ClientConfig::new(server.uri()).with_poll_options(Self::poll_options());
        if let Some(key) = api_key {
            config = config.with_api_key(key);
        }
        MeiliClient::new(&config).expect("client for the fake engine")
    }

    pub fn fixture(&self) -> IndexFixture {
        IndexFixture::new(self.client.clone())
    }
}

/// Unique index uid for one test
pub fn unique_uid(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Builds populated indexes
pub struct IndexFixture {
    client: MeiliClient,
}

impl IndexFixture {
    pub fn new(client: MeiliClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &MeiliClient {
        &self.client
    }

    /// Index holding [`basic_movies`]
    pub async fn setup_basic_index(&self, uid: &str) -> Index {
        let index = self.client.index(uid);
        let task = index
            .add_documents(&basic_movies(), None)
            .await
            .expect("add basic movies");
        self.expect_processed(&index, task).await;
        index
    }

    /// Index holding [`basic_movies`] with integer ids
    pub async fn setup_basic_index_with_int_id(&self, uid: &str) -> Index {
        let movies: Vec<MovieWithIntId> = basic_movies()
            .into_iter()
            .map(|m| MovieWithIntId {
                id: m.id.parse().expect("numeric fixture id"),
                name: m.name,
                genre: m.genre,
            })
            .collect();
        let index = self.client.index(uid);
        let task = index
            .add_documents(&movies, None)
            .await
            .expect("add int-id movies");
        self.expect_processed(&index, task).await;
        index
    }

    /// Index holding [`faceting_movies`] with `genre` filterable
    pub async fn setup_index_for_faceting(&self, uid: &str) -> Index {
        let index = self.client.index(uid);
        let task = index
            .add_documents(&faceting_movies(), None)
            .await
            .expect("add faceting movies");
        self.expect_processed(&index, task).await;

        let task = index
            .update_settings(&Settings::new().with_filterable_attributes(["genre"]))
            .await
            .expect("update filterable attributes");
        self.expect_processed(&index, task).await;
        index
    }

    /// Delete every index, waiting for each deletion before the next
    pub async fn delete_all_indexes(&self) -> Result<(), MeiliError> {
        for descriptor in self.client.list_indexes().await? {
            let task = self.client.delete_index(&descriptor.uid).await?;
            self.client
                .wait_for_task(&descriptor.uid, task.id, None)
                .await?
                .into_result()?;
        }
        Ok(())
    }

    async fn expect_processed(&self, index: &Index, task: Task) {
        let done = index
            .wait_for_task(task.id, None)
            .await
            .expect("fixture task did not finish");
        assert_eq!(
            done.status,
            TaskStatus::Processed,
            "fixture task {} on `{}` ended {}: {}",
            done.id,
            index.uid,
            done.status,
            done.failure_message()
        );
    }
}
