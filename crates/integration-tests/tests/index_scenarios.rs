//! Index Scenario Tests
//!
//! Documents, settings, search and index lifecycle through the SDK,
//! each mutation awaited with the poller.

use meili_integration_tests::{
    basic_movies, faceting_movies, unique_uid, Movie, MovieWithIntId, TestEngine,
};
use meili_sdk::{
    DocumentsQuery, MeiliError, SearchQuery, SearchResults, Settings, TaskKind, TaskStatus,
    TransportError,
};
use serde_json::{json, Value};

/// Seven documents into a fresh index -> count 7
#[tokio::test]
async fn test_seven_documents_counted() {
    let env = TestEngine::start().await;
    let uid = unique_uid("movies");

    let index = env.fixture().setup_basic_index(&uid).await;

    let stats = index.get_stats().await.unwrap();
    assert_eq!(stats.number_of_documents, 7);
    assert!(!stats.is_indexing);
    assert_eq!(stats.field_distribution.get("name"), Some(&7));
}

/// Add then fetch by primary key returns an equal document
#[tokio::test]
async fn test_document_round_trip() {
    let env = TestEngine::start().await;
    let uid = unique_uid("movies");
    let index = env.client.index(&uid);
    let movie = Movie {
        id: "42".to_string(),
        name: "Carol".to_string(),
        genre: Some("Romance".to_string()),
    };

    let task = index.add_documents(&[movie.clone()], Some("id")).await.unwrap();
    let done = index.wait_for_task(task.id, None).await.unwrap();
    assert_eq!(done.status, TaskStatus::Processed);

    let fetched: Movie = index.get_document("42").await.unwrap();
    assert_eq!(fetched, movie);
}

/// Integer ids are accepted and addressable as strings
#[tokio::test]
async fn test_int_id_index() {
    let env = TestEngine::start().await;
    let uid = unique_uid("movies_int");

    let index = env.fixture().setup_basic_index_with_int_id(&uid).await;

    let fetched: MovieWithIntId = index.get_document("13").await.unwrap();
    assert_eq!(fetched.id, 13);
    assert_eq!(fetched.name, "Harry Potter");
}

/// Without an explicit key, the first field ending in `id` becomes the primary key
#[tokio::test]
async fn test_primary_key_inferred_on_first_write() {
    let env = TestEngine::start().await;
    let uid = unique_uid("books");
    let mut index = env.client.index(&uid);

    let task = index
        .add_documents(&[json!({ "title": "Dune", "book_id": 1, "author": "Herbert" })], None)
        .await
        .unwrap();
    index.wait_for_task(task.id, None).await.unwrap();

    let info = index.fetch_info().await.unwrap();
    assert_eq!(info.primary_key.as_deref(), Some("book_id"));
    assert_eq!(index.primary_key.as_deref(), Some("book_id"));
}

/// Documents missing an explicit primary key never leave the client
#[tokio::test]
async fn test_missing_primary_key_rejected_before_request() {
    let env = TestEngine::start().await;
    let uid = unique_uid("movies");
    let index = env.client.index(&uid);

    let err = index
        .add_documents(&[json!({ "name": "No id" })], Some("id"))
        .await
        .unwrap_err();

    assert!(matches!(err, MeiliError::Domain(_)));
    assert!(!env.engine.index_exists(&uid));
    assert!(env.server.received_requests().await.unwrap().is_empty());
}

/// An engine-side document error fails the task, not the request
#[tokio::test]
async fn test_document_without_id_fails_task() {
    let env = TestEngine::start().await;
    let uid = unique_uid("movies");
    let index = env.fixture().setup_basic_index(&uid).await;

    let task = index
        .add_documents(&[json!({ "name": "No id" })], None)
        .await
        .unwrap();
    let done = index.wait_for_task(task.id, None).await.unwrap();

    assert_eq!(done.status, TaskStatus::Failed);
    assert_eq!(
        done.error.and_then(|e| e.code).as_deref(),
        Some("missing_document_id")
    );
    assert_eq!(env.engine.document_count(&uid), 7);
}

/// Invalid filterable attribute -> Failed task; search keeps working on old settings
#[tokio::test]
async fn test_invalid_settings_keep_index_searchable() {
    let env = TestEngine::start().await;
    let uid = unique_uid("movies");
    let index = env.fixture().setup_index_for_faceting(&uid).await;

    let task = index
        .update_settings(&Settings::new().with_filterable_attributes(["genre!"]))
        .await
        .unwrap();
    assert_eq!(task.kind, TaskKind::SettingsUpdate);
    let done = index.wait_for_task(task.id, None).await.unwrap();

    assert_eq!(done.status, TaskStatus::Failed);
    let error = done.error.expect("failed task carries an error");
    assert!(!error.message.is_empty());
    assert_eq!(error.code.as_deref(), Some("invalid_filterable_attribute"));

    let settings = index.get_settings().await.unwrap();
    assert_eq!(settings.filterable_attributes, Some(vec!["genre".to_string()]));

    let results: SearchResults<Movie> = index
        .search(&SearchQuery::new("").with_filter("genre = Action"))
        .await
        .unwrap();
    assert_eq!(results.hits.len(), 3);
}

/// Deleting a missing index fails immediately, with no task
#[tokio::test]
async fn test_delete_missing_index_is_not_found() {
    let env = TestEngine::start().await;

    let err = env.client.delete_index(&unique_uid("ghost")).await.unwrap_err();

    match &err {
        MeiliError::Transport(TransportError::NotFound(api)) => {
            assert_eq!(api.status, 404);
            assert_eq!(api.code.as_deref(), Some("index_not_found"));
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert!(err.task().is_none());
    assert_eq!(env.engine.total_task_fetches(), 0);
}

/// Facet filter and distribution
#[tokio::test]
async fn test_faceted_search() {
    let env = TestEngine::start().await;
    let uid = unique_uid("movies_facets");
    let index = env.fixture().setup_index_for_faceting(&uid).await;

    let results: SearchResults<Movie> = index
        .search(
            &SearchQuery::new("")
                .with_filter("genre = \"Sci-Fi\"")
                .with_facets(["genre"]),
        )
        .await
        .unwrap();

    let names: Vec<&str> = results.hits.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Interstellar", "Star Wars"]);
    assert_eq!(results.estimated_total_hits, Some(2));
    let distribution = results.facet_distribution.expect("facet distribution");
    assert_eq!(distribution["genre"]["Sci-Fi"], 2);
}

/// Filtering on a non-filterable attribute is a validation error
#[tokio::test]
async fn test_filter_on_unfilterable_attribute() {
    let env = TestEngine::start().await;
    let uid = unique_uid("movies");
    let index = env.fixture().setup_basic_index(&uid).await;

    let err = index
        .search::<Value>(&SearchQuery::new("").with_filter("name = Gladiator"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MeiliError::Transport(TransportError::Validation(_))
    ));
    assert_eq!(err.status_code(), Some(400));
}

/// Text search
#[tokio::test]
async fn test_plain_search() {
    let env = TestEngine::start().await;
    let uid = unique_uid("movies");
    let index = env.fixture().setup_basic_index(&uid).await;

    let results: SearchResults<Movie> = index
        .search(&SearchQuery::new("man").with_limit(1))
        .await
        .unwrap();

    assert_eq!(results.hits.len(), 1);
    assert_eq!(results.estimated_total_hits, Some(2));
    assert_eq!(results.limit, 1);
}

/// Pagination, single and batch deletion, clearing
#[tokio::test]
async fn test_document_deletions() {
    let env = TestEngine::start().await;
    let uid = unique_uid("movies");
    let index = env.fixture().setup_basic_index(&uid).await;

    let page: Vec<Movie> = index
        .get_documents(DocumentsQuery::new().with_offset(2).with_limit(3))
        .await
        .unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(page[0].id, "12");

    let task = index.delete_document("10").await.unwrap();
    index.wait_for_task(task.id, None).await.unwrap();
    let err = index.get_document::<Movie>("10").await.unwrap_err();
    assert!(err.is_not_found());

    let task = index.delete_documents(&["11", "12"]).await.unwrap();
    index.wait_for_task(task.id, None).await.unwrap();
    assert_eq!(index.get_stats().await.unwrap().number_of_documents, 4);

    let task = index.delete_all_documents().await.unwrap();
    assert_eq!(task.kind, TaskKind::DocumentClear);
    index.wait_for_task(task.id, None).await.unwrap();
    assert_eq!(index.get_stats().await.unwrap().number_of_documents, 0);
}

/// Partial document update merges fields
#[tokio::test]
async fn test_update_documents_merges() {
    let env = TestEngine::start().await;
    let uid = unique_uid("movies");
    let index = env.fixture().setup_basic_index(&uid).await;

    let task = index
        .update_documents(&[json!({ "id": "10", "genre": "Action" })], None)
        .await
        .unwrap();
    index.wait_for_task(task.id, None).await.unwrap();

    let movie: Movie = index.get_document("10").await.unwrap();
    assert_eq!(movie.name, "Gladiator");
    assert_eq!(movie.genre.as_deref(), Some("Action"));
}

/// Reset brings settings back to the engine defaults
#[tokio::test]
async fn test_reset_settings() {
    let env = TestEngine::start().await;
    let uid = unique_uid("movies");
    let index = env.fixture().setup_index_for_faceting(&uid).await;

    let task = index.reset_settings().await.unwrap();
    index.wait_for_task(task.id, None).await.unwrap();

    let settings = index.get_settings().await.unwrap();
    assert_eq!(settings.filterable_attributes, Some(vec![]));
}

/// Explicit creation, lookup, listing
#[tokio::test]
async fn test_create_and_get_index() {
    let env = TestEngine::start().await;
    let uid = unique_uid("books");

    let task = env.client.create_index(&uid, Some("isbn")).await.unwrap();
    assert_eq!(task.kind, TaskKind::IndexCreation);
    let err = env.client.get_index(&uid).await.unwrap_err();
    assert!(err.is_not_found(), "index exists only once the task ran");

    env.client
        .wait_for_task(&uid, task.id, None)
        .await
        .unwrap()
        .into_result()
        .unwrap();

    let index = env.client.get_index(&uid).await.unwrap();
    assert_eq!(index.primary_key.as_deref(), Some("isbn"));
    let listed = env.client.list_indexes().await.unwrap();
    assert!(listed.iter().any(|d| d.uid == uid));

    // Second creation of the same uid fails as a task
    let again = env.client.create_index(&uid, None).await.unwrap();
    let again = env.client.wait_for_task(&uid, again.id, None).await.unwrap();
    assert_eq!(again.status, TaskStatus::Failed);
}

/// Task listings per index and globally
#[tokio::test]
async fn test_task_listings() {
    let env = TestEngine::start().await;
    let movies = unique_uid("movies");
    let books = unique_uid("books");
    env.fixture().setup_index_for_faceting(&movies).await;
    env.fixture().setup_basic_index(&books).await;

    let movie_tasks = env.client.index(&movies).get_tasks().await.unwrap();
    assert_eq!(movie_tasks.len(), 2);
    assert!(movie_tasks.iter().all(|t| t.index_uid.as_deref() == Some(movies.as_str())));

    let all = env.client.get_tasks().await.unwrap();
    assert_eq!(all.len(), 3);
}

/// Teardown removes every index, one awaited deletion at a time
#[tokio::test]
async fn test_delete_all_indexes() {
    let env = TestEngine::start().await;
    let fixture = env.fixture();
    let uids = [unique_uid("a"), unique_uid("b"), unique_uid("c")];
    for uid in &uids {
        fixture.setup_basic_index(uid).await;
    }

    fixture.delete_all_indexes().await.unwrap();

    assert!(env.client.list_indexes().await.unwrap().is_empty());
    for uid in &uids {
        assert!(!env.engine.index_exists(uid));
    }
}

/// Shared fixture data stays as documented
#[test]
fn test_fixture_data() {
    assert_eq!(basic_movies().len(), 7);
    assert_eq!(faceting_movies().len(), 8);
    assert!(basic_movies().iter().all(|m| m.genre.is_none()));
}
