use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CHARACTER_SCHEMA_VERSION: u8 = 1;
pub const POSITION_SCHEMA_VERSION: u8 = 1;

/// Width and height of the room grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySize {
    pub width: u32,
    pub height: u32,
}

impl LibrarySize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn total_rooms(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }
}

/// One cell of the room grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Clamp an arbitrary signed pair into the grid.
    pub fn clamped(x: i64, y: i64, size: LibrarySize) -> Self {
        let max_x = size.width.saturating_sub(1) as i64;
        let max_y = size.height.saturating_sub(1) as i64;
        Self {
            x: x.clamp(0, max_x) as u32,
            y: y.clamp(0, max_y) as u32,
        }
    }

    /// Neighbouring room in `direction`, or `None` when it would leave the grid.
    pub fn step(&self, direction: Direction, size: LibrarySize) -> Option<Self> {
        let (dx, dy) = direction.delta();
        let x = self.x as i64 + dx;
        let y = self.y as i64 + dy;
        if !size.contains(x, y) {
            return None;
        }
        Some(Self::new(x as u32, y as u32))
    }

    /// Identifier used in persisted keys: `"{x},{y}"`.
    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// North decrements Y, south increments it; east increments X, west decrements it.
    fn delta(self) -> (i64, i64) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Direction::North),
            "south" | "s" => Ok(Direction::South),
            "east" | "e" => Ok(Direction::East),
            "west" | "w" => Ok(Direction::West),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

/// Ordered book titles of one room.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCatalog(Vec<String>);

impl RoomCatalog {
    pub fn new(titles: Vec<String>) -> Self {
        Self(titles)
    }

    /// Truncate overflow and pad a deficit with `Unnamed Volume N` titles,
    /// where N is the catalog length at the time the title is appended.
    pub fn normalized(mut titles: Vec<String>, books_per_room: usize) -> Self {
        titles.truncate(books_per_room);
        while titles.len() < books_per_room {
            titles.push(format!("Unnamed Volume {}", titles.len() + 1));
        }
        Self(titles)
    }

    /// Deterministic catalog used when generation produced nothing usable.
    pub fn placeholder(coordinate: Coordinate, books_per_room: usize) -> Self {
        Self(
            (0..books_per_room)
                .map(|i| {
                    format!(
                        "Book {} of Room ({},{})",
                        i + 1,
                        coordinate.x,
                        coordinate.y
                    )
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn title(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn titles(&self) -> &[String] {
        &self.0
    }

    /// Replace the title in `index`. Returns `false`, leaving the catalog
    /// untouched, when `index` is past the end.
    pub fn set_title(&mut self, index: usize, title: impl Into<String>) -> bool {
        match self.0.get_mut(index) {
            Some(slot) => {
                *slot = title.into();
                true
            }
            None => false,
        }
    }

    pub fn into_titles(self) -> Vec<String> {
        self.0
    }
}

/// Address of one page of one book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageKey {
    pub coordinate: Coordinate,
    pub book_index: u32,
    pub page: u32,
}

impl PageKey {
    pub fn new(coordinate: Coordinate, book_index: u32, page: u32) -> Self {
        Self {
            coordinate,
            book_index,
            page,
        }
    }

    /// Identifier used in persisted keys: `"{x},{y}_{book}_{page}"`.
    pub fn key(&self) -> String {
        format!(
            "{}_{}_{}",
            self.coordinate.key(),
            self.book_index,
            self.page
        )
    }
}

/// Last known continuous position of the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub x: f32,
    pub y: f32,
    pub room: Coordinate,
    pub schema_version: u8,
}

impl PlayerPosition {
    pub fn new(x: f32, y: f32, room: Coordinate) -> Self {
        Self {
            x,
            y,
            room,
            schema_version: POSITION_SCHEMA_VERSION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub name: String,
    pub description: String,
    pub creation_date: DateTime<Utc>,
    pub schema_version: u8,
}

impl CharacterRecord {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            creation_date: Utc::now(),
            schema_version: CHARACTER_SCHEMA_VERSION,
        }
    }

    /// Title given to the book that holds this character's story.
    pub fn book_title(&self) -> String {
        format!("The Story of {}: Seeker of Knowledge", self.name)
    }
}

/// Where a character's story was shelved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLocation {
    pub coordinate: Coordinate,
    pub book_index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamping_pins_to_grid_edges() {
        let size = LibrarySize::new(256, 256);
        assert_eq!(Coordinate::clamped(-4, 300, size), Coordinate::new(0, 255));
        assert_eq!(Coordinate::clamped(12, 7, size), Coordinate::new(12, 7));
    }

    #[test]
    fn stepping_off_the_grid_is_refused() {
        let size = LibrarySize::new(3, 3);
        let corner = Coordinate::new(0, 0);
        assert_eq!(corner.step(Direction::North, size), None);
        assert_eq!(corner.step(Direction::West, size), None);
        assert_eq!(
            corner.step(Direction::South, size),
            Some(Coordinate::new(0, 1))
        );
        assert_eq!(
            corner.step(Direction::East, size),
            Some(Coordinate::new(1, 0))
        );
    }

    #[test]
    fn normalization_pads_from_current_length() {
        let catalog = RoomCatalog::normalized(vec!["A".into(), "B".into()], 4);
        assert_eq!(
            catalog.titles(),
            &["A", "B", "Unnamed Volume 3", "Unnamed Volume 4"]
        );
        let truncated = RoomCatalog::normalized(vec!["A".into(), "B".into(), "C".into()], 2);
        assert_eq!(truncated.titles(), &["A", "B"]);
    }

    #[test]
    fn retitling_never_grows_the_catalog() {
        let mut catalog = RoomCatalog::placeholder(Coordinate::new(0, 0), 3);
        assert!(catalog.set_title(2, "Mine"));
        assert_eq!(catalog.title(2), Some("Mine"));
        assert!(!catalog.set_title(3, "Too far"));
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn placeholder_catalog_is_derived_from_coordinate() {
        let catalog = RoomCatalog::placeholder(Coordinate::new(3, 9), 2);
        assert_eq!(
            catalog.titles(),
            &["Book 1 of Room (3,9)", "Book 2 of Room (3,9)"]
        );
    }

    #[test]
    fn keys_follow_persisted_layout() {
        let key = PageKey::new(Coordinate::new(10, 4), 7, 2);
        assert_eq!(key.coordinate.key(), "10,4");
        assert_eq!(key.key(), "10,4_7_2");
    }

    #[test]
    fn directions_parse_case_insensitively() {
        assert_eq!("North".parse::<Direction>(), Ok(Direction::North));
        assert_eq!("w".parse::<Direction>(), Ok(Direction::West));
        assert!("up".parse::<Direction>().is_err());
    }
}
