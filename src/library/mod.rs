//! The library core: durable content, rooms, books and the character's story.
//!
//! [`Library`] bundles the shared pieces every component needs (store,
//! generation client, pending-request registry and configuration) so they can
//! be handed around by cheap clone.

pub mod book;
pub mod errors;
pub mod geometry;
pub mod narrative;
pub mod pending;
pub mod room_manager;
pub mod session;
pub mod storage;
pub mod types;

use std::sync::Arc;

use log::info;

use crate::config::{Config, LibraryConfig};
use crate::generation::GenerationClient;

pub use book::BookPager;
pub use errors::LibraryError;
pub use geometry::{ShelfLayout, ShelfPosition, ShelfSide};
pub use pending::PendingRegistry;
pub use room_manager::{CacheStats, RoomInfo, RoomManager};
pub use session::LibrarySession;
pub use storage::{ContentStore, ContentStoreBuilder, KnownKeys, RecordFamily};
pub use types::{
    BookLocation, CharacterRecord, Coordinate, Direction, LibrarySize, PageKey, PlayerPosition,
    RoomCatalog,
};

#[derive(Clone)]
pub struct Library {
    store: Arc<ContentStore>,
    generator: Arc<GenerationClient>,
    pending: Arc<PendingRegistry>,
    config: Arc<LibraryConfig>,
}

impl Library {
    pub fn new(
        config: LibraryConfig,
        store: Arc<ContentStore>,
        generator: Arc<GenerationClient>,
    ) -> Self {
        Self {
            store,
            generator,
            pending: Arc::new(PendingRegistry::new()),
            config: Arc::new(config),
        }
    }

    /// Open the store under `storage.data_dir` and pick the generation backend.
    pub fn open(config: &Config) -> Result<Self, LibraryError> {
        let store = Arc::new(ContentStore::open(&config.storage.data_dir)?);
        let generator = GenerationClient::from_config(config, Arc::clone(&store))?;
        info!(
            "Library opened at {} ({} generation)",
            config.storage.data_dir,
            generator.mode()
        );
        Ok(Self::new(
            config.library.clone(),
            store,
            Arc::new(generator),
        ))
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn generator(&self) -> &GenerationClient {
        &self.generator
    }

    pub fn pending(&self) -> &PendingRegistry {
        &self.pending
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn size(&self) -> LibrarySize {
        self.config.size()
    }

    pub fn books_per_room(&self) -> usize {
        self.config.books_per_room
    }
}
