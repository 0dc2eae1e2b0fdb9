//! Lazy page resolution for one book.

use std::collections::HashMap;

use log::debug;

use crate::library::errors::LibraryError;
use crate::library::storage::{Pages, RecordFamily};
use crate::library::types::{Coordinate, PageKey};
use crate::library::Library;

/// Reads one book page by page, generating pages the first time anyone opens them.
///
/// Pages already read through this pager are served from memory; otherwise
/// the store is consulted and only then the generation client.
pub struct BookPager {
    library: Library,
    coordinate: Coordinate,
    book_index: u32,
    title: String,
    current_page: u32,
    pages: HashMap<u32, String>,
}

impl BookPager {
    pub fn new(
        library: Library,
        coordinate: Coordinate,
        book_index: u32,
        title: impl Into<String>,
    ) -> Self {
        Self {
            library,
            coordinate,
            book_index,
            title: title.into(),
            current_page: 1,
            pages: HashMap::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn book_index(&self) -> u32 {
        self.book_index
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Open page `n`; anything below 1 opens page 1.
    pub async fn go_to_page(&mut self, n: i64) -> Result<String, LibraryError> {
        let page = n.clamp(1, u32::MAX as i64) as u32;
        self.current_page = page;

        if let Some(text) = self.pages.get(&page) {
            return Ok(text.clone());
        }

        let text = self.load_or_generate(page).await?;
        if !text.trim().is_empty() {
            self.pages.insert(page, text.clone());
        }
        Ok(text)
    }

    pub async fn next_page(&mut self) -> Result<String, LibraryError> {
        self.go_to_page(self.current_page as i64 + 1).await
    }

    pub async fn prev_page(&mut self) -> Result<String, LibraryError> {
        self.go_to_page(self.current_page as i64 - 1).await
    }

    async fn load_or_generate(&self, page: u32) -> Result<String, LibraryError> {
        let key = PageKey::new(self.coordinate, self.book_index, page);
        let _pending = self
            .library
            .pending()
            .acquire(&Pages::storage_key(&key))
            .await?;

        if let Some(text) = self.library.store().get::<Pages>(&key)? {
            debug!("Page {} loaded from store", key.key());
            return Ok(text);
        }

        let text = self.library.generator().generate_page(&self.title, page).await;
        if text.trim().is_empty() {
            debug!("Generated page {} is empty, not storing it", key.key());
        } else {
            self.library.store().put::<Pages>(&key, &text)?;
        }
        Ok(text)
    }
}
