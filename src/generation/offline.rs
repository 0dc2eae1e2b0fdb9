//! Deterministic offline generator.
//!
//! Answers every request kind from bundled text without touching the network.
//! The same inputs always produce the same output, so content generated while
//! offline is as stable as anything read back from the store.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::request::GenerationRequest;
use super::{BackendError, GenerationBackend};
use crate::library::types::Coordinate;

const STORIES: [&str; 2] = [
    "As {name} stood at the entrance of the Library of Babel, the weight of their quest pressed \
     heavily upon their shoulders. {description} They had traveled across continents, following \
     whispers and legends, all leading to this mythical repository of all possible knowledge. The \
     librarian had greeted them with knowing eyes, as if expecting their arrival. \"The book you \
     seek contains the cure for your sister's illness,\" they had said. \"But finding it among the \
     infinite shelves will be your true test.\" Now, with determination burning in their heart, \
     {name} steps forward into the labyrinthine corridors, knowing that somewhere in this vast \
     collection lies the knowledge that could save their sister's life.",
    "{name} pushed open the heavy wooden doors of the Library of Babel with trembling hands. \
     {description} For years, they had been haunted by a recurring dream: symbols and texts in a \
     language they couldn't understand, yet somehow knew held the answers to their past. The \
     scholars at the university had directed them here, to the legendary library said to contain \
     every possible combination of letters, and thus every book that could ever be written. \
     \"Your ancestry, your true lineage,\" the head scholar had whispered, \"the secrets erased \
     from history are hidden in a book within these walls.\" With each step deeper into the \
     library, {name} felt closer to uncovering the truth that had been denied to them for so long.",
];

const PAGES: [&str; 2] = [
    "The nature of infinity is such that all possibilities exist simultaneously in the grand \
     tapestry of the cosmos. As you read these words, countless versions of yourself are reading \
     slightly different variations of this same text. The Library of Babel stands as physical \
     proof of this concept, housing every possible arrangement of letters, and therefore \
     containing all knowledge both discovered and yet to be conceived. Within these pages, one \
     might find accurate prophecies of the future, or complete nonsense; the challenge lies in \
     distinguishing between them. The librarians who tend to this collection have developed \
     systems over centuries to navigate the overwhelming vastness, but even they admit that \
     finding specific information is often a matter of chance rather than methodology.",
    "The theory of knowledge preservation suggests that ideas are never truly lost, merely \
     waiting to be rediscovered in the great cycle of human understanding. Ancient wisdom often \
     emerges anew, dressed in contemporary language but containing the same essential truths \
     that have guided humanity since its earliest days. This book serves as a bridge between past \
     insights and future discoveries, drawing connections across the tapestry of time. The \
     careful reader might notice patterns emerging from the seemingly random collection of \
     thoughts presented herein, patterns that reveal the underlying structure of reality itself. \
     Whether you sought this volume or stumbled upon it by chance, know that your encounter with \
     these words was inevitable, a predestined moment in the cosmic dance of cause and effect.",
];

const TITLES: [&str; 10] = [
    "Whispers of Forgotten Knowledge",
    "Celestial Patterns and Mortal Understanding",
    "The Veiled Truth: Revelations of the Inner Cosmos",
    "Threads of Fate in the Tapestry of Time",
    "Echoes from the Void: Messages from Beyond",
    "The Philosopher's Enigma",
    "Codex of Improbable Realities",
    "Symmetries in Chaos: The Hidden Order",
    "The Cartographer's Dream: Mapping the Impossible",
    "Riddles of the Ancient Librarians",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

impl OfflineGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Backstory from a template chosen by the character's name.
    pub fn story(&self, name: &str, description: &str) -> String {
        let pick = name
            .bytes()
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
        STORIES[pick % STORIES.len()]
            .replace("{name}", name)
            .replace("{description}", description)
    }

    /// Page text cycling through the bundled pages, tagged with page and title.
    pub fn page(&self, title: &str, page: u32) -> String {
        let index = page.saturating_sub(1) as usize % PAGES.len();
        format!("{}\n\n(Page {} of \"{}\")", PAGES[index], page, title)
    }

    /// `count` volume titles; the base-title order is seeded by the coordinate.
    pub fn catalog(&self, coordinate: Coordinate, count: usize) -> Vec<String> {
        let seed = coordinate.x as u64 * 1000 + coordinate.y as u64;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut bases = TITLES.to_vec();
        bases.shuffle(&mut rng);
        (0..count)
            .map(|i| {
                format!(
                    "{} (Vol. {}.{})",
                    bases[i % bases.len()],
                    i / 10 + 1,
                    i % 10 + 1
                )
            })
            .collect()
    }
}

#[async_trait]
impl GenerationBackend for OfflineGenerator {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        Ok(match request {
            GenerationRequest::Story { name, description } => self.story(name, description),
            GenerationRequest::Page { title, page, .. } => self.page(title, *page),
            GenerationRequest::Catalog { coordinate, count } => {
                serde_json::to_string(&self.catalog(*coordinate, *count))
                    .map_err(|e| BackendError::Parse(e.to_string()))?
            }
        })
    }

    fn name(&self) -> &str {
        "offline"
    }
}
