//! Room manager with LRU caching of room catalogs.
//!
//! Owns the current room cursor and drives the load-or-generate protocol for
//! catalogs: store first, then the generation client, then a deterministic
//! placeholder. Whatever is produced is normalized to `books_per_room` titles
//! and persisted before it is handed out, so a room reads the same on every
//! visit.

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, warn};
use rand::Rng;

use crate::library::book::BookPager;
use crate::library::errors::LibraryError;
use crate::library::geometry::ShelfPosition;
use crate::library::storage::{Catalogs, RecordFamily};
use crate::library::types::{Coordinate, Direction, RoomCatalog};
use crate::library::Library;

/// Default maximum number of catalogs to cache
const DEFAULT_CACHE_SIZE: usize = 64;

/// Cache entry for a catalog with access tracking
#[derive(Debug, Clone)]
struct CachedCatalog {
    catalog: RoomCatalog,
    last_accessed: Instant,
    access_count: u64,
}

/// Everything a renderer needs to draw the current room.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub coordinate: Coordinate,
    pub total_rooms: u64,
    pub catalog: RoomCatalog,
    pub shelves: Vec<ShelfPosition>,
}

pub struct RoomManager {
    library: Library,
    current: Coordinate,
    catalog: Option<RoomCatalog>,
    cache: HashMap<Coordinate, CachedCatalog>,
    max_cache_size: usize,
}

impl RoomManager {
    /// Room manager positioned at the origin with no room loaded yet.
    pub fn new(library: Library) -> Self {
        Self::with_cache_size(library, DEFAULT_CACHE_SIZE)
    }

    pub fn with_cache_size(library: Library, cache_size: usize) -> Self {
        Self {
            library,
            current: Coordinate::new(0, 0),
            catalog: None,
            cache: HashMap::new(),
            max_cache_size: cache_size.max(1),
        }
    }

    pub fn current_coordinate(&self) -> Coordinate {
        self.current
    }

    /// Catalog of the current room, once one has been loaded.
    pub fn catalog(&self) -> Option<&RoomCatalog> {
        self.catalog.as_ref()
    }

    /// Enter `start`, or a uniformly random room when there is none.
    pub async fn initialize(&mut self, start: Option<Coordinate>) -> Result<RoomCatalog, LibraryError> {
        let coordinate = match start {
            Some(coordinate) => coordinate,
            None => {
                let size = self.library.size();
                let mut rng = rand::thread_rng();
                Coordinate::new(rng.gen_range(0..size.width), rng.gen_range(0..size.height))
            }
        };
        debug!("Starting in room {}", coordinate);
        self.load_room(coordinate.x as i64, coordinate.y as i64).await
    }

    /// Clamp `(x, y)` into the grid, make it the current room and return its catalog.
    pub async fn load_room(&mut self, x: i64, y: i64) -> Result<RoomCatalog, LibraryError> {
        let coordinate = Coordinate::clamped(x, y, self.library.size());
        let catalog = self.get_catalog(coordinate).await?;
        self.current = coordinate;
        self.catalog = Some(catalog.clone());
        Ok(catalog)
    }

    /// Step to the neighbouring room. Returns `false`, leaving the current
    /// room unchanged, when the neighbour lies outside the grid.
    pub async fn move_to(&mut self, direction: Direction) -> Result<bool, LibraryError> {
        let Some(next) = self.current.step(direction, self.library.size()) else {
            debug!("Cannot move {} from {}: edge of the library", direction, self.current);
            return Ok(false);
        };
        self.load_room(next.x as i64, next.y as i64).await?;
        Ok(true)
    }

    /// Coordinate, grid size, catalog and shelf positions of the current room.
    pub fn room_info(&self) -> Option<RoomInfo> {
        let catalog = self.catalog.clone()?;
        let shelves = self.library.config().shelf_layout().positions(catalog.len());
        Some(RoomInfo {
            coordinate: self.current,
            total_rooms: self.library.size().total_rooms(),
            catalog,
            shelves,
        })
    }

    /// Pager for book `index` of the current room.
    pub fn book(&self, index: usize) -> Option<BookPager> {
        let title = self.catalog.as_ref()?.title(index)?;
        Some(BookPager::new(
            self.library.clone(),
            self.current,
            index as u32,
            title,
        ))
    }

    async fn get_catalog(&mut self, coordinate: Coordinate) -> Result<RoomCatalog, LibraryError> {
        if let Some(cached) = self.cache.get_mut(&coordinate) {
            cached.last_accessed = Instant::now();
            cached.access_count += 1;
            debug!(
                "Catalog cache hit: {} (access_count: {})",
                coordinate, cached.access_count
            );
            return Ok(cached.catalog.clone());
        }

        debug!("Catalog cache miss: {}", coordinate);
        let catalog = self.load_or_generate(coordinate).await?;
        self.cache_catalog(coordinate, catalog.clone());
        Ok(catalog)
    }

    async fn load_or_generate(&self, coordinate: Coordinate) -> Result<RoomCatalog, LibraryError> {
        let books_per_room = self.library.books_per_room();
        let _pending = self
            .library
            .pending()
            .acquire(&Catalogs::storage_key(&coordinate))
            .await?;

        if let Some(stored) = self.library.store().get::<Catalogs>(&coordinate)? {
            debug!("Loaded catalog for room {} from store", coordinate);
            return Ok(RoomCatalog::normalized(stored.into_titles(), books_per_room));
        }

        let catalog = match self
            .library
            .generator()
            .generate_catalog(coordinate, books_per_room)
            .await
        {
            Some(titles) => {
                if titles.len() != books_per_room {
                    debug!(
                        "Normalizing catalog for room {}: {} titles generated, {} expected",
                        coordinate,
                        titles.len(),
                        books_per_room
                    );
                }
                RoomCatalog::normalized(titles, books_per_room)
            }
            None => {
                warn!("No titles generated for room {}, using placeholder catalog", coordinate);
                RoomCatalog::placeholder(coordinate, books_per_room)
            }
        };
        self.library.store().put::<Catalogs>(&coordinate, &catalog)?;
        Ok(catalog)
    }

    /// Add a catalog to the cache, evicting LRU entries if needed
    fn cache_catalog(&mut self, coordinate: Coordinate, catalog: RoomCatalog) {
        if self.cache.len() >= self.max_cache_size {
            self.evict_lru();
        }

        self.cache.insert(
            coordinate,
            CachedCatalog {
                catalog,
                last_accessed: Instant::now(),
                access_count: 1,
            },
        );
        debug!("Cached catalog: {} (cache size: {})", coordinate, self.cache.len());
    }

    /// Evict the least recently used catalog from cache
    fn evict_lru(&mut self) {
        let oldest = self
            .cache
            .iter()
            .min_by_key(|(_, cached)| cached.last_accessed)
            .map(|(coordinate, _)| *coordinate);

        if let Some(coordinate) = oldest {
            self.cache.remove(&coordinate);
            debug!("Evicted LRU catalog from cache: {}", coordinate);
        }
    }

    /// Drop a cached catalog whose stored copy was rewritten elsewhere.
    pub fn invalidate(&mut self, coordinate: Coordinate) {
        self.cache.remove(&coordinate);
    }

    /// Get cache statistics for debugging/monitoring
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            cache_size: self.cache.len(),
            max_cache_size: self.max_cache_size,
            total_accesses: self.cache.values().map(|c| c.access_count).sum(),
        }
    }

    /// Forget every cached catalog and the current room's state.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.catalog = None;
        debug!("Catalog cache cleared");
    }
}

/// Cache performance statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub cache_size: usize,
    pub max_cache_size: usize,
    pub total_accesses: u64,
}
