//! End-to-end harness: a stateful fake engine plus index fixtures

pub mod fake_engine;
pub mod fixture;

pub use fake_engine::FakeEngine;
pub use fixture::{
    basic_movies, faceting_movies, unique_uid, IndexFixture, Movie, MovieWithIntId, TestEngine,
    MASTER_KEY,
};
