use std::sync::Arc;

use babelshelf::generation::BackendError;
use babelshelf::library::{Coordinate, Direction, RoomCatalog, RoomManager};
use babelshelf::library::storage::Catalogs;
use babelshelf::testing::ScriptedBackend;

mod common;

#[tokio::test]
async fn short_catalog_is_padded_and_persisted() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(
        "[\"Alpha\",\"Beta\",\"Gamma\"]".to_string()
    )]));
    let (library, _dir) = common::scripted_library(common::small_config(256, 256, 100), backend.clone());
    let mut rooms = RoomManager::new(library.clone());

    let catalog = rooms.load_room(10, 10).await.expect("load");
    assert_eq!(catalog.len(), 100);
    assert_eq!(&catalog.titles()[..3], &["Alpha", "Beta", "Gamma"]);
    assert_eq!(catalog.title(3), Some("Unnamed Volume 4"));
    assert_eq!(catalog.title(99), Some("Unnamed Volume 100"));
    assert_eq!(backend.calls(), 1);

    let stored = library
        .store()
        .get::<Catalogs>(&Coordinate::new(10, 10))
        .expect("get")
        .expect("catalog persisted");
    assert_eq!(stored, catalog);

    // A fresh manager has no in-memory cache and still avoids the backend.
    let mut other = RoomManager::new(library);
    assert_eq!(other.load_room(10, 10).await.expect("load"), catalog);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn catalog_length_holds_for_any_backend_answer() {
    let too_many = serde_json::to_string(&(0..40).map(|i| format!("T{}", i)).collect::<Vec<_>>())
        .expect("json");
    let replies = vec![
        Ok("[]".to_string()),
        Ok(too_many),
        Ok("no brackets, just one line".to_string()),
        Ok("\n\n".to_string()),
    ];
    let backend = Arc::new(ScriptedBackend::new(replies));
    let (library, _dir) = common::scripted_library(common::small_config(8, 8, 12), backend);
    let mut rooms = RoomManager::new(library);

    for x in 0..4 {
        let catalog = rooms.load_room(x, 0).await.expect("load");
        assert_eq!(catalog.len(), 12, "room ({}, 0)", x);
    }
    // the fourth answer held nothing usable
    assert_eq!(
        rooms.catalog().cloned(),
        Some(RoomCatalog::placeholder(Coordinate::new(3, 0), 12))
    );
    assert_eq!(rooms.catalog().and_then(|c| c.title(0)), Some("Book 1 of Room (3,0)"));
}

#[tokio::test]
async fn placeholder_catalog_is_stable_across_visits() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok("   ".to_string())]).with_default_reply("[\"Later\"]"));
    let (library, _dir) = common::scripted_library(common::small_config(4, 4, 5), backend.clone());
    let mut rooms = RoomManager::new(library.clone());

    let first = rooms.load_room(2, 1).await.expect("load");
    let mut fresh = RoomManager::new(library);
    let second = fresh.load_room(2, 1).await.expect("load");
    assert_eq!(first, second);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn moves_stop_at_the_grid_edge() {
    let backend = Arc::new(ScriptedBackend::always("[\"A\"]"));
    let (library, _dir) = common::scripted_library(common::small_config(3, 3, 4), backend);
    let mut rooms = RoomManager::new(library);
    rooms.load_room(0, 0).await.expect("load");

    assert!(!rooms.move_to(Direction::North).await.expect("move"));
    assert!(!rooms.move_to(Direction::West).await.expect("move"));
    assert_eq!(rooms.current_coordinate(), Coordinate::new(0, 0));

    assert!(rooms.move_to(Direction::South).await.expect("move"));
    assert_eq!(rooms.current_coordinate(), Coordinate::new(0, 1));
    assert!(rooms.move_to(Direction::East).await.expect("move"));
    assert_eq!(rooms.current_coordinate(), Coordinate::new(1, 1));

    rooms.load_room(2, 2).await.expect("load");
    assert!(!rooms.move_to(Direction::South).await.expect("move"));
    assert!(!rooms.move_to(Direction::East).await.expect("move"));
    assert_eq!(rooms.current_coordinate(), Coordinate::new(2, 2));
}

#[tokio::test]
async fn backend_failure_still_fills_the_room() {
    let backend = Arc::new(ScriptedBackend::new(vec![Err(BackendError::Network(
        "connection reset".to_string(),
    ))]));
    let (library, _dir) = common::scripted_library(common::small_config(4, 4, 20), backend);
    let mut rooms = RoomManager::new(library);

    let catalog = rooms.load_room(1, 2).await.expect("load");
    assert_eq!(catalog.len(), 20);
    assert!(catalog.titles().iter().all(|t| t.contains("(Vol. ")));
}

#[tokio::test]
async fn concurrent_loads_of_one_room_agree() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok("[\"First\"]".to_string()),
        Ok("[\"Second\"]".to_string()),
    ]));
    let (library, _dir) = common::scripted_library(common::small_config(4, 4, 3), backend.clone());

    let a = {
        let library = library.clone();
        tokio::spawn(async move { RoomManager::new(library).load_room(1, 1).await })
    };
    let b = {
        let library = library.clone();
        tokio::spawn(async move { RoomManager::new(library).load_room(1, 1).await })
    };
    let a = a.await.expect("join").expect("load");
    let b = b.await.expect("join").expect("load");

    assert_eq!(a, b);
    assert_eq!(backend.calls(), 1);
}
