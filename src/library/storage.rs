//! Sled-backed content store.
//!
//! Every record belongs to a [`RecordFamily`], which fixes the key type, the
//! value type and how the value is encoded. Persisted keys follow the layout
//! `babel_<kind>[_<identifier>]`, for example `babel_room_10,4` or
//! `babel_book_10,4_7_2`. Catalog and page families additionally register
//! their identifier in an append-only [`KnownKeys`] index the first time they
//! are written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info};
use sled::IVec;

use crate::library::errors::LibraryError;
use crate::library::types::{
    BookLocation, CharacterRecord, Coordinate, PageKey, PlayerPosition, RoomCatalog,
    CHARACTER_SCHEMA_VERSION, POSITION_SCHEMA_VERSION,
};

/// Namespace prefix shared by every persisted key.
pub const KEY_PREFIX: &str = "babel_";

const TREE_RECORDS: &str = "babel_records";
const TREE_KNOWN_ROOMS: &str = "babel_known_rooms";
const TREE_KNOWN_BOOKS: &str = "babel_known_books";

/// Which known-keys index a family registers its identifiers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownIndex {
    Rooms,
    Books,
}

/// A typed family of records sharing a key shape and a serialization contract.
pub trait RecordFamily {
    type Key;
    type Value;

    /// Record kind segment of the persisted key.
    const KIND: &'static str;

    /// Index that enumerates identifiers of this family, if any.
    const INDEX: Option<KnownIndex> = None;

    /// Identifier segment of the persisted key; `None` for singleton records.
    fn identifier(key: &Self::Key) -> Option<String>;

    fn encode(value: &Self::Value) -> Result<Vec<u8>, LibraryError>;

    fn decode(key: &str, bytes: &[u8]) -> Result<Self::Value, LibraryError>;

    fn storage_key(key: &Self::Key) -> String {
        match Self::identifier(key) {
            Some(id) => format!("{}{}_{}", KEY_PREFIX, Self::KIND, id),
            None => format!("{}{}", KEY_PREFIX, Self::KIND),
        }
    }
}

/// Room catalogs keyed by coordinate.
pub struct Catalogs;

impl RecordFamily for Catalogs {
    type Key = Coordinate;
    type Value = RoomCatalog;
    const KIND: &'static str = "room";
    const INDEX: Option<KnownIndex> = Some(KnownIndex::Rooms);

    fn identifier(key: &Coordinate) -> Option<String> {
        Some(key.key())
    }

    fn encode(value: &RoomCatalog) -> Result<Vec<u8>, LibraryError> {
        Ok(bincode::serialize(value)?)
    }

    fn decode(_key: &str, bytes: &[u8]) -> Result<RoomCatalog, LibraryError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Page text keyed by (coordinate, book, page). Stored as raw UTF-8.
pub struct Pages;

impl RecordFamily for Pages {
    type Key = PageKey;
    type Value = String;
    const KIND: &'static str = "book";
    const INDEX: Option<KnownIndex> = Some(KnownIndex::Books);

    fn identifier(key: &PageKey) -> Option<String> {
        Some(key.key())
    }

    fn encode(value: &String) -> Result<Vec<u8>, LibraryError> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(_key: &str, bytes: &[u8]) -> Result<String, LibraryError> {
        Ok(std::str::from_utf8(bytes)?.to_string())
    }
}

pub struct PlayerPositions;

impl RecordFamily for PlayerPositions {
    type Key = ();
    type Value = PlayerPosition;
    const KIND: &'static str = "player_pos";

    fn identifier(_key: &()) -> Option<String> {
        None
    }

    fn encode(value: &PlayerPosition) -> Result<Vec<u8>, LibraryError> {
        Ok(bincode::serialize(value)?)
    }

    fn decode(_key: &str, bytes: &[u8]) -> Result<PlayerPosition, LibraryError> {
        let record: PlayerPosition = bincode::deserialize(bytes)?;
        if record.schema_version != POSITION_SCHEMA_VERSION {
            return Err(LibraryError::SchemaMismatch {
                entity: "player position",
                expected: POSITION_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }
}

pub struct Characters;

impl RecordFamily for Characters {
    type Key = ();
    type Value = CharacterRecord;
    const KIND: &'static str = "character";

    fn identifier(_key: &()) -> Option<String> {
        None
    }

    fn encode(value: &CharacterRecord) -> Result<Vec<u8>, LibraryError> {
        Ok(bincode::serialize(value)?)
    }

    fn decode(_key: &str, bytes: &[u8]) -> Result<CharacterRecord, LibraryError> {
        let record: CharacterRecord = bincode::deserialize(bytes)?;
        if record.schema_version != CHARACTER_SCHEMA_VERSION {
            return Err(LibraryError::SchemaMismatch {
                entity: "character",
                expected: CHARACTER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }
}

/// Location of the book holding the character's story.
pub struct CharacterBooks;

impl RecordFamily for CharacterBooks {
    type Key = ();
    type Value = BookLocation;
    const KIND: &'static str = "character_book";

    fn identifier(_key: &()) -> Option<String> {
        None
    }

    fn encode(value: &BookLocation) -> Result<Vec<u8>, LibraryError> {
        Ok(bincode::serialize(value)?)
    }

    fn decode(_key: &str, bytes: &[u8]) -> Result<BookLocation, LibraryError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Persisted permanent-fallback flag of the generation client.
pub struct FallbackFlag;

impl RecordFamily for FallbackFlag {
    type Key = ();
    type Value = bool;
    const KIND: &'static str = "use_mock_data";

    fn identifier(_key: &()) -> Option<String> {
        None
    }

    fn encode(value: &bool) -> Result<Vec<u8>, LibraryError> {
        Ok(if *value { b"true".to_vec() } else { b"false".to_vec() })
    }

    fn decode(key: &str, bytes: &[u8]) -> Result<bool, LibraryError> {
        match bytes {
            b"true" => Ok(true),
            b"false" => Ok(false),
            other => Err(LibraryError::Corrupt {
                key: key.to_string(),
                reason: format!("expected true/false, found {} bytes", other.len()),
            }),
        }
    }
}

/// Append-only set of identifiers that have ever been written.
pub struct KnownKeys {
    tree: sled::Tree,
}

impl KnownKeys {
    fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    /// Returns true when the identifier was not known before.
    fn insert(&self, id: &str) -> Result<bool, LibraryError> {
        let previous = self.tree.insert(id.as_bytes(), Vec::<u8>::new())?;
        Ok(previous.is_none())
    }

    pub fn contains(&self, id: &str) -> Result<bool, LibraryError> {
        Ok(self.tree.contains_key(id.as_bytes())?)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// All identifiers in key order.
    pub fn list(&self) -> Result<Vec<String>, LibraryError> {
        let mut ids = Vec::with_capacity(self.tree.len());
        for entry in self.tree.iter() {
            let (key, _) = entry?;
            ids.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(ids)
    }

    fn clear(&self) -> Result<(), LibraryError> {
        Ok(self.tree.clear()?)
    }

    fn flush(&self) -> Result<(), LibraryError> {
        self.tree.flush()?;
        Ok(())
    }
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct ContentStoreBuilder {
    path: PathBuf,
    cache_capacity: Option<u64>,
}

impl ContentStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache_capacity: None,
        }
    }

    /// Bytes of page cache sled may hold in memory.
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = Some(bytes);
        self
    }

    pub fn open(self) -> Result<ContentStore, LibraryError> {
        std::fs::create_dir_all(&self.path)?;
        let mut config = sled::Config::new().path(&self.path);
        if let Some(bytes) = self.cache_capacity {
            config = config.cache_capacity(bytes);
        }
        ContentStore::from_db(config.open()?)
    }
}

/// Durable owner of catalogs, pages, and player/character records.
///
/// All reads and writes go through one lock that also guards the in-memory
/// read-through cache, so a `reset` cannot interleave with a half-finished put.
pub struct ContentStore {
    _db: sled::Db,
    records: sled::Tree,
    known_rooms: KnownKeys,
    known_books: KnownKeys,
    cache: Mutex<HashMap<String, IVec>>,
}

impl ContentStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LibraryError> {
        ContentStoreBuilder::new(path.as_ref()).open()
    }

    fn from_db(db: sled::Db) -> Result<Self, LibraryError> {
        let records = db.open_tree(TREE_RECORDS)?;
        let known_rooms = KnownKeys::new(db.open_tree(TREE_KNOWN_ROOMS)?);
        let known_books = KnownKeys::new(db.open_tree(TREE_KNOWN_BOOKS)?);
        Ok(Self {
            _db: db,
            records,
            known_rooms,
            known_books,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn lock_cache(&self) -> Result<MutexGuard<'_, HashMap<String, IVec>>, LibraryError> {
        self.cache
            .lock()
            .map_err(|_| LibraryError::Internal("content store cache lock poisoned".into()))
    }

    fn index(&self, which: KnownIndex) -> &KnownKeys {
        match which {
            KnownIndex::Rooms => &self.known_rooms,
            KnownIndex::Books => &self.known_books,
        }
    }

    /// Fetch a record. `Ok(None)` means the content has never been written.
    pub fn get<F: RecordFamily>(&self, key: &F::Key) -> Result<Option<F::Value>, LibraryError> {
        let storage_key = F::storage_key(key);
        let mut cache = self.lock_cache()?;
        if let Some(bytes) = cache.get(&storage_key) {
            return F::decode(&storage_key, bytes).map(Some);
        }
        let Some(bytes) = self.records.get(storage_key.as_bytes())? else {
            return Ok(None);
        };
        let value = F::decode(&storage_key, &bytes)?;
        cache.insert(storage_key, bytes);
        Ok(Some(value))
    }

    /// Insert or overwrite a record and flush it to disk before returning.
    pub fn put<F: RecordFamily>(&self, key: &F::Key, value: &F::Value) -> Result<(), LibraryError> {
        let storage_key = F::storage_key(key);
        let bytes = IVec::from(F::encode(value)?);
        let mut cache = self.lock_cache()?;
        self.records.insert(storage_key.as_bytes(), bytes.clone())?;
        self.records.flush()?;
        if let (Some(which), Some(id)) = (F::INDEX, F::identifier(key)) {
            let index = self.index(which);
            if index.insert(&id)? {
                index.flush()?;
                debug!("Registered new {} key {}", F::KIND, id);
            }
        }
        cache.insert(storage_key, bytes);
        Ok(())
    }

    pub fn contains<F: RecordFamily>(&self, key: &F::Key) -> Result<bool, LibraryError> {
        let storage_key = F::storage_key(key);
        if self.lock_cache()?.contains_key(&storage_key) {
            return Ok(true);
        }
        Ok(self.records.contains_key(storage_key.as_bytes())?)
    }

    /// Identifiers (`"{x},{y}"`) of every catalog ever written.
    pub fn known_rooms(&self) -> &KnownKeys {
        &self.known_rooms
    }

    /// Identifiers (`"{x},{y}_{book}_{page}"`) of every page ever written.
    pub fn known_books(&self) -> &KnownKeys {
        &self.known_books
    }

    /// Remove every record, every index entry and the read-through cache.
    pub fn reset(&self) -> Result<(), LibraryError> {
        let mut cache = self.lock_cache()?;
        self.records.clear()?;
        self.known_rooms.clear()?;
        self.known_books.clear()?;
        self.records.flush()?;
        self.known_rooms.flush()?;
        self.known_books.flush()?;
        cache.clear();
        info!("Library store reset: all catalogs, pages and records removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (ContentStore, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let store = ContentStoreBuilder::new(dir.path()).open().expect("store");
        (store, dir)
    }

    #[test]
    fn storage_keys_use_namespace_layout() {
        let coord = Coordinate::new(10, 4);
        assert_eq!(Catalogs::storage_key(&coord), "babel_room_10,4");
        assert_eq!(
            Pages::storage_key(&PageKey::new(coord, 7, 2)),
            "babel_book_10,4_7_2"
        );
        assert_eq!(Characters::storage_key(&()), "babel_character");
        assert_eq!(PlayerPositions::storage_key(&()), "babel_player_pos");
    }

    #[test]
    fn catalog_round_trip() {
        let (store, _dir) = create_test_store();
        let coord = Coordinate::new(1, 2);
        let catalog = RoomCatalog::normalized(vec!["Alpha".into()], 5);
        store.put::<Catalogs>(&coord, &catalog).expect("put");
        assert_eq!(store.get::<Catalogs>(&coord).expect("get"), Some(catalog));
    }

    #[test]
    fn missing_record_is_absent_not_error() {
        let (store, _dir) = create_test_store();
        assert!(store
            .get::<Catalogs>(&Coordinate::new(0, 0))
            .expect("get")
            .is_none());
        assert!(store.get::<Characters>(&()).expect("get").is_none());
    }

    #[test]
    fn index_gains_each_key_exactly_once() {
        let (store, _dir) = create_test_store();
        let key = PageKey::new(Coordinate::new(3, 3), 0, 1);
        store.put::<Pages>(&key, &"first".to_string()).expect("put");
        store.put::<Pages>(&key, &"first".to_string()).expect("put again");
        assert_eq!(store.known_books().len(), 1);
        assert_eq!(store.known_books().list().expect("list"), vec!["3,3_0_1"]);
        assert!(store.known_rooms().is_empty());
    }

    #[test]
    fn singleton_records_skip_indices() {
        let (store, _dir) = create_test_store();
        store
            .put::<PlayerPositions>(&(), &PlayerPosition::new(1.0, 2.0, Coordinate::new(4, 5)))
            .expect("put");
        assert!(store.known_rooms().is_empty());
        assert!(store.known_books().is_empty());
    }

    #[test]
    fn fallback_flag_rejects_garbage() {
        let err = FallbackFlag::decode("babel_use_mock_data", b"yes").unwrap_err();
        assert!(matches!(err, LibraryError::Corrupt { .. }));
    }

    #[test]
    fn reset_clears_records_indices_and_cache() {
        let (store, _dir) = create_test_store();
        let coord = Coordinate::new(9, 9);
        store
            .put::<Catalogs>(&coord, &RoomCatalog::placeholder(coord, 3))
            .expect("put");
        store.put::<FallbackFlag>(&(), &true).expect("put flag");
        store.reset().expect("reset");
        assert!(store.get::<Catalogs>(&coord).expect("get").is_none());
        assert!(store.get::<FallbackFlag>(&()).expect("get").is_none());
        assert!(store.known_rooms().is_empty());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let coord = Coordinate::new(7, 1);
        {
            let store = ContentStore::open(dir.path()).expect("store");
            store
                .put::<Pages>(&PageKey::new(coord, 2, 1), &"text".to_string())
                .expect("put");
        }
        let store = ContentStore::open(dir.path()).expect("reopen");
        assert_eq!(
            store
                .get::<Pages>(&PageKey::new(coord, 2, 1))
                .expect("get")
                .as_deref(),
            Some("text")
        );
        assert!(store.known_books().contains("7,1_2_1").expect("contains"));
    }
}
