//! # babelshelf - an endless library written on demand
//!
//! babelshelf models a grid of rooms, each holding a shelf of books, where no
//! content exists until someone looks at it. The first visit to a room asks a
//! text-generation backend for its catalog of titles; the first time a page
//! is opened its text is generated the same way. Everything generated is
//! persisted, so the second visit shows exactly what the first one did.
//!
//! ## Features
//!
//! - **Lazy generation with a persistent cache**: catalogs and pages are read from a sled store and only generated on a miss.
//! - **Failure-tolerant client**: backend calls are paced by a minimum interval; throttling switches permanently to offline content and any other failure does so for the session. Callers always get content.
//! - **Deterministic offline content**: bundled stories, pages and titles, shuffled per room with a seeded RNG.
//! - **Stable rooms**: catalogs always hold exactly `books_per_room` titles, padded or truncated as needed.
//! - **Shelf geometry**: a pure function placing every book of a room on its aisle and shelf.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use babelshelf::config::Config;
//! use babelshelf::library::{Direction, Library, LibrarySession};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("babelshelf.toml").await?;
//!     let library = Library::open(&config)?;
//!
//!     let mut session = LibrarySession::resume(library).await?;
//!     session.rooms_mut().move_to(Direction::East).await?;
//!     if let Some(mut book) = session.rooms().book(0) {
//!         println!("{}", book.go_to_page(1).await?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`library`] - content store, rooms, books, narrative embedding and sessions
//! - [`generation`] - generation client, backends, rate limiting and catalog parsing
//! - [`config`] - configuration management and validation
//! - [`logutil`] - short single-line previews of generated text for logs
//! - [`testing`] - a scripted backend for driving the client without a network
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Room Manager   │ ← current room, catalog load-or-generate
//! │  Book Pager     │ ← page load-or-generate
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Generation    │ ← rate limiting, fallback modes
//! │   Client        │
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Content Store  │ ← durable catalogs, pages and records
//! └─────────────────┘
//! ```

pub mod config;
pub mod generation;
pub mod library;
pub mod logutil;
pub mod testing;
