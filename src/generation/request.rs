//! Request kinds and the instruction templates sent to the backend.

use std::fmt;

use crate::library::types::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Story,
    Page,
    Catalog,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestKind::Story => "story",
            RequestKind::Page => "page",
            RequestKind::Catalog => "catalog",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    /// Backstory for a newly created character.
    Story { name: String, description: String },
    /// Text of one page of a titled book.
    Page {
        title: String,
        page: u32,
        words_per_page: u32,
    },
    /// `count` book titles for the room at `coordinate`.
    Catalog { coordinate: Coordinate, count: usize },
}

impl GenerationRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            GenerationRequest::Story { .. } => RequestKind::Story,
            GenerationRequest::Page { .. } => RequestKind::Page,
            GenerationRequest::Catalog { .. } => RequestKind::Catalog,
        }
    }

    /// Natural-language instruction for the user message.
    pub fn prompt(&self) -> String {
        match self {
            GenerationRequest::Story { name, description } => format!(
                "Generate a short story (about 300 words) about a character named {name} who has \
                 arrived at the Library of Babel searching for important information. The character \
                 is described as: {description}. The story should explain why they are in the \
                 library and what specific knowledge they seek."
            ),
            GenerationRequest::Page {
                title,
                page,
                words_per_page,
            } => format!(
                "Generate {words_per_page} words of content for page {page} of a book titled \
                 \"{title}\" in the Library of Babel. The content should be mystical, philosophical, \
                 or contain hidden knowledge. If this is beyond page 1, make the content flow \
                 naturally from the previous pages."
            ),
            GenerationRequest::Catalog { coordinate, count } => format!(
                "Generate a list of {count} book titles that would be found in room ({}, {}) of the \
                 Library of Babel. The titles should be mystical, philosophical, or suggest hidden \
                 knowledge. Return them as a JSON array of strings.",
                coordinate.x, coordinate.y
            ),
        }
    }
}
