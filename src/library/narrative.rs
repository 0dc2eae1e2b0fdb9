//! Shelving the character's own story somewhere in the library.
//!
//! A uniformly random room and book index are chosen, the catalog slot is
//! retitled after the character and the story becomes that book's first page.
//! The catalog write takes the room's pending lock, so it cannot interleave
//! with a load of the same room; between the two, the later write wins.

use log::info;
use rand::Rng;

use crate::library::errors::LibraryError;
use crate::library::storage::{Catalogs, CharacterBooks, Pages, RecordFamily};
use crate::library::types::{
    BookLocation, CharacterRecord, Coordinate, LibrarySize, PageKey, RoomCatalog,
};
use crate::library::Library;

/// Uniformly random room and book index.
pub fn choose_location<R: Rng + ?Sized>(
    rng: &mut R,
    size: LibrarySize,
    books_per_room: usize,
) -> BookLocation {
    BookLocation {
        coordinate: Coordinate::new(rng.gen_range(0..size.width), rng.gen_range(0..size.height)),
        book_index: rng.gen_range(0..books_per_room.max(1)) as u32,
    }
}

/// Embed `story` at a random location and return where it went.
pub async fn embed_story(
    library: &Library,
    character: &CharacterRecord,
    story: &str,
) -> Result<BookLocation, LibraryError> {
    let location = {
        let mut rng = rand::thread_rng();
        choose_location(&mut rng, library.size(), library.books_per_room())
    };
    embed_story_at(library, character, story, location).await?;
    Ok(location)
}

/// Embed `story` as book `location.book_index` of room `location.coordinate`.
///
/// Fails with [`LibraryError::BookOutOfRange`] when the index does not name a
/// book of the room; nothing is written in that case.
pub async fn embed_story_at(
    library: &Library,
    character: &CharacterRecord,
    story: &str,
    location: BookLocation,
) -> Result<(), LibraryError> {
    let BookLocation {
        coordinate,
        book_index,
    } = location;
    let books_per_room = library.books_per_room();
    if book_index as usize >= books_per_room {
        return Err(LibraryError::BookOutOfRange {
            index: book_index,
            books_per_room,
        });
    }

    {
        let _pending = library
            .pending()
            .acquire(&Catalogs::storage_key(&coordinate))
            .await?;
        let mut catalog = match library.store().get::<Catalogs>(&coordinate)? {
            Some(stored) => RoomCatalog::normalized(stored.into_titles(), books_per_room),
            None => RoomCatalog::placeholder(coordinate, books_per_room),
        };
        if !catalog.set_title(book_index as usize, character.book_title()) {
            return Err(LibraryError::BookOutOfRange {
                index: book_index,
                books_per_room,
            });
        }
        library.store().put::<Catalogs>(&coordinate, &catalog)?;
    }

    let first_page = PageKey::new(coordinate, book_index, 1);
    {
        let _pending = library
            .pending()
            .acquire(&Pages::storage_key(&first_page))
            .await?;
        library.store().put::<Pages>(&first_page, &story.to_string())?;
    }

    library.store().put::<CharacterBooks>(&(), &location)?;
    info!(
        "Shelved the story of {} as book {} in room {}",
        character.name,
        book_index + 1,
        coordinate
    );
    Ok(())
}

/// Where the character's story was shelved, if it has been.
pub fn character_book(library: &Library) -> Result<Option<BookLocation>, LibraryError> {
    library.store().get::<CharacterBooks>(&())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn chosen_locations_stay_inside_the_grid() {
        let mut rng = StdRng::seed_from_u64(7);
        let size = LibrarySize::new(3, 2);
        for _ in 0..200 {
            let location = choose_location(&mut rng, size, 5);
            assert!(location.coordinate.x < 3);
            assert!(location.coordinate.y < 2);
            assert!(location.book_index < 5);
        }
    }
}
