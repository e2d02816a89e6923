//! Simple SDK Example
//!
//! Demonstrates the enqueue-then-wait flow of the Meili SDK.
//!
//! # Usage
//!
//! 1. Start a Meilisearch engine:
//!    ```bash
//!    meilisearch --master-key masterKey
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    MEILI_API_KEY=masterKey cargo run --package meili-sdk --example simple
//!    ```

use meili_sdk::{ClientConfig, MeiliClient, SearchQuery, Settings};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Meili SDK - Simple Example");
    println!("==========================\n");

    // 1. Connect
    println!("1. Connecting...");
    let client = MeiliClient::new(&ClientConfig::from_env()?)?;
    let health = client.health().await?;
    println!("   ✓ Engine is {}\n", health.status);

    // 2. Add documents (returns immediately)
    println!("2. Adding documents...");
    let movies = client.index("movies");
    let task = movies
        .add_documents(
            &[
                json!({ "id": "10", "title": "Gladiator", "genre": "Action" }),
                json!({ "id": "11", "title": "Interstellar", "genre": "Sci-Fi" }),
                json!({ "id": "12", "title": "Carol", "genre": "Romance" }),
            ],
            Some("id"),
        )
        .await?;
    println!("   ✓ Task {} is {}\n", task.id, task.status);

    // 3. Wait until the engine has applied it
    println!("3. Waiting for task {}...", task.id);
    let task = movies.wait_for_task(task.id, None).await?.into_result()?;
    println!("   ✓ Task {} is {}\n", task.id, task.status);

    // 4. Make `genre` filterable
    println!("4. Updating settings...");
    let task = movies
        .update_settings(&Settings::new().with_filterable_attributes(["genre"]))
        .await?;
    movies.wait_for_task(task.id, None).await?.into_result()?;
    println!("   ✓ Settings applied\n");

    // 5. Search
    println!("5. Searching...");
    let results = movies
        .search::<serde_json::Value>(&SearchQuery::new("").with_filter("genre = Action"))
        .await?;
    for hit in &results.hits {
        println!("     - {}", hit["title"]);
    }

    println!("\n✓ Example completed successfully!");

    Ok(())
}
