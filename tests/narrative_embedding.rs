use std::sync::Arc;

use babelshelf::library::errors::LibraryError;
use babelshelf::library::narrative::{character_book, embed_story, embed_story_at};
use babelshelf::library::storage::{Catalogs, Pages};
use babelshelf::library::{BookLocation, CharacterRecord, Coordinate, PageKey, RoomManager};
use babelshelf::testing::ScriptedBackend;

mod common;

#[tokio::test]
async fn story_lands_in_an_unvisited_room() {
    let (library, _dir) = common::offline_library(common::small_config(6, 6, 10));
    let character = CharacterRecord::new("Ada", "a cartographer");
    let location = BookLocation {
        coordinate: Coordinate::new(4, 1),
        book_index: 6,
    };

    embed_story_at(&library, &character, "Ada's tale", location)
        .await
        .expect("embed");

    let catalog = library
        .store()
        .get::<Catalogs>(&location.coordinate)
        .expect("get")
        .expect("catalog written");
    assert_eq!(catalog.len(), 10);
    assert_eq!(catalog.title(6), Some("The Story of Ada: Seeker of Knowledge"));
    assert_eq!(catalog.title(0), Some("Book 1 of Room (4,1)"));

    let page = library
        .store()
        .get::<Pages>(&PageKey::new(location.coordinate, 6, 1))
        .expect("get");
    assert_eq!(page.as_deref(), Some("Ada's tale"));
    assert_eq!(character_book(&library).expect("get"), Some(location));
}

#[tokio::test]
async fn story_overwrites_one_slot_of_a_visited_room() {
    let backend = Arc::new(ScriptedBackend::always("[\"Alpha\",\"Beta\",\"Gamma\"]"));
    let (library, _dir) = common::scripted_library(common::small_config(4, 4, 3), backend);
    let mut rooms = RoomManager::new(library.clone());
    rooms.load_room(2, 2).await.expect("load");

    let character = CharacterRecord::new("Borges", "a blind librarian");
    let location = BookLocation {
        coordinate: Coordinate::new(2, 2),
        book_index: 1,
    };
    embed_story_at(&library, &character, "a story", location)
        .await
        .expect("embed");

    let mut fresh = RoomManager::new(library);
    let catalog = fresh.load_room(2, 2).await.expect("load");
    assert_eq!(
        catalog.titles(),
        &["Alpha", "The Story of Borges: Seeker of Knowledge", "Gamma"]
    );

    let mut book = fresh.book(1).expect("book");
    assert_eq!(book.go_to_page(1).await.expect("page"), "a story");
}

#[tokio::test]
async fn random_location_is_recorded() {
    let (library, _dir) = common::offline_library(common::small_config(3, 3, 5));
    let character = CharacterRecord::new("Ada", "x");
    let location = embed_story(&library, &character, "tale").await.expect("embed");

    assert!(location.coordinate.x < 3 && location.coordinate.y < 3);
    assert!(location.book_index < 5);
    assert_eq!(character_book(&library).expect("get"), Some(location));

    let mut rooms = RoomManager::new(library);
    rooms
        .load_room(location.coordinate.x as i64, location.coordinate.y as i64)
        .await
        .expect("load");
    let book = rooms.book(location.book_index as usize).expect("book");
    assert_eq!(book.title(), character.book_title());
}

#[tokio::test]
async fn index_past_the_room_is_rejected() {
    let (library, _dir) = common::offline_library(common::small_config(4, 4, 3));
    let character = CharacterRecord::new("Ada", "x");
    let location = BookLocation {
        coordinate: Coordinate::new(1, 1),
        book_index: 7,
    };

    let err = embed_story_at(&library, &character, "tale", location)
        .await
        .expect_err("out of range");
    assert!(matches!(
        err,
        LibraryError::BookOutOfRange {
            index: 7,
            books_per_room: 3
        }
    ));
    assert!(library
        .store()
        .get::<Catalogs>(&location.coordinate)
        .expect("get")
        .is_none());
    assert_eq!(character_book(&library).expect("get"), None);

    let mut rooms = RoomManager::new(library);
    assert_eq!(rooms.load_room(1, 1).await.expect("load").len(), 3);
}
