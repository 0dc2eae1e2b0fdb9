//! A player's session: the character, the room they stand in and their position.

use log::{debug, info};

use crate::library::errors::LibraryError;
use crate::library::narrative;
use crate::library::room_manager::RoomManager;
use crate::library::storage::{Characters, PlayerPositions};
use crate::library::types::{BookLocation, CharacterRecord, PlayerPosition};
use crate::library::Library;

/// Greeting used as the backstory when generation produced no text.
pub fn librarian_greeting(name: &str) -> String {
    format!(
        "The ancient librarian looks at you with knowing eyes. \"Welcome, {}, to the Library \
         of Babel. I've been expecting you. The knowledge you seek is here, somewhere among our \
         infinite collection. Your journey begins now.\"",
        name
    )
}

pub struct LibrarySession {
    library: Library,
    rooms: RoomManager,
    character: Option<CharacterRecord>,
    story: Option<String>,
}

impl LibrarySession {
    /// Pick up where the saved player position left off, or start in a random
    /// room when nothing was saved.
    pub async fn resume(library: Library) -> Result<Self, LibraryError> {
        let character = library.store().get::<Characters>(&())?;
        let position = library.store().get::<PlayerPositions>(&())?;
        let mut rooms = RoomManager::new(library.clone());
        rooms.initialize(position.map(|p| p.room)).await?;

        let session = Self {
            library,
            rooms,
            character,
            story: None,
        };
        match position {
            Some(position) => debug!(
                "Resumed at ({:.0}, {:.0}) in room {}",
                position.x, position.y, position.room
            ),
            None => session.record_entrance()?,
        }
        Ok(session)
    }

    /// Create a character, generate their backstory and shelve it in the library.
    pub async fn start_new(library: Library, name: &str, description: &str) -> Result<Self, LibraryError> {
        let character = CharacterRecord::new(name, description);
        library.store().put::<Characters>(&(), &character)?;

        let mut story = library.generator().generate_story(name, description).await;
        if story.trim().is_empty() {
            story = librarian_greeting(name);
        }
        let location = narrative::embed_story(&library, &character, &story).await?;
        info!(
            "New character {} created, story shelved in room {}",
            character.name, location.coordinate
        );

        let mut rooms = RoomManager::new(library.clone());
        rooms.initialize(None).await?;
        let session = Self {
            library,
            rooms,
            character: Some(character),
            story: Some(story),
        };
        session.record_entrance()?;
        Ok(session)
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub fn rooms_mut(&mut self) -> &mut RoomManager {
        &mut self.rooms
    }

    pub fn character(&self) -> Option<&CharacterRecord> {
        self.character.as_ref()
    }

    /// Backstory generated by [`start_new`](Self::start_new) in this session.
    pub fn story(&self) -> Option<&str> {
        self.story.as_deref()
    }

    pub fn character_book(&self) -> Result<Option<BookLocation>, LibraryError> {
        narrative::character_book(&self.library)
    }

    /// Save the continuous position together with the current room.
    pub fn record_player_position(&self, x: f32, y: f32) -> Result<(), LibraryError> {
        let position = PlayerPosition::new(x, y, self.rooms.current_coordinate());
        self.library.store().put::<PlayerPositions>(&(), &position)
    }

    /// Position at the door of the current room.
    pub fn record_entrance(&self) -> Result<(), LibraryError> {
        self.record_player_position(self.library.config().room_width / 2.0, 0.0)
    }

    /// Erase all durable state and every in-memory cache.
    pub fn reset(&mut self) -> Result<(), LibraryError> {
        self.library.store().reset()?;
        self.rooms.clear_cache();
        self.character = None;
        self.story = None;
        Ok(())
    }
}
