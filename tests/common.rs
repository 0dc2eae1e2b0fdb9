//! Test utilities & fixtures.
//! Builds throwaway libraries on temporary sled stores.

use std::sync::Arc;
use std::time::Duration;

use babelshelf::config::LibraryConfig;
use babelshelf::generation::GenerationClient;
use babelshelf::library::{ContentStore, ContentStoreBuilder, Library};
use babelshelf::testing::ScriptedBackend;
use tempfile::TempDir;

/// Library config with a small grid and `books_per_room` books per room.
#[allow(dead_code)]
pub fn small_config(width: u32, height: u32, books_per_room: usize) -> LibraryConfig {
    LibraryConfig {
        width,
        height,
        books_per_room,
        ..LibraryConfig::default()
    }
}

#[allow(dead_code)]
pub fn temp_store() -> (Arc<ContentStore>, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ContentStoreBuilder::new(dir.path()).open().expect("store");
    (Arc::new(store), dir)
}

/// Library backed by `backend` with no rate limiting, on a fresh store.
#[allow(dead_code)]
pub fn scripted_library(
    config: LibraryConfig,
    backend: Arc<ScriptedBackend>,
) -> (Library, TempDir) {
    let (store, dir) = temp_store();
    let generator = GenerationClient::new(backend, Duration::ZERO)
        .with_words_per_page(config.words_per_page)
        .with_store(Arc::clone(&store))
        .expect("client");
    (Library::new(config, store, Arc::new(generator)), dir)
}

/// Library answering only from the offline generator.
#[allow(dead_code)]
pub fn offline_library(config: LibraryConfig) -> (Library, TempDir) {
    let (store, dir) = temp_store();
    let generator = GenerationClient::offline()
        .with_store(Arc::clone(&store))
        .expect("client");
    (Library::new(config, store, Arc::new(generator)), dir)
}
