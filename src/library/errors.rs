use thiserror::Error;

/// Errors that can arise while reading or writing the library's durable state.
///
/// A missing record is not an error: store lookups return `Ok(None)` and the
/// caller generates the content instead.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Page text stored as bytes that are not valid UTF-8.
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// A stored flag or marker held a value no writer produces.
    #[error("corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A book index past the end of the room's catalog.
    #[error("book {index} is outside a room of {books_per_room} books")]
    BookOutOfRange { index: u32, books_per_room: usize },

    /// Internal error (poisoned locks, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}
