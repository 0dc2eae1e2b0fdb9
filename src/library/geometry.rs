//! Shelf geometry: where a book sits in its room.
//!
//! Rooms are split into vertical aisles of equal width. Each aisle holds
//! `books_per_aisle` books; the first half line the left wall of the aisle and
//! the rest line the right wall. Along a wall, books fill shelf levels of
//! `books_per_shelf` slots from the top down.

use serde::{Deserialize, Serialize};

/// Distance from the top of the room to the first shelf level.
const TOP_MARGIN: f32 = 100.0;
/// Vertical gap between neighbouring books on one level.
const BOOK_GAP: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShelfSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShelfPosition {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub side: ShelfSide,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShelfLayout {
    pub aisles_per_room: u32,
    pub books_per_aisle: u32,
    pub books_per_shelf: u32,
    pub room_width: f32,
    pub shelf_spacing: f32,
    pub book_height: f32,
}

impl ShelfLayout {
    /// Number of books the room's shelves can hold.
    pub fn capacity(&self) -> usize {
        self.aisles_per_room as usize * self.books_per_aisle as usize
    }

    /// Books on the left wall of each aisle; the right wall takes the remainder.
    fn left_wall_books(&self) -> usize {
        (self.books_per_aisle as usize + 1) / 2
    }

    /// Position of the book at `index`, or `None` past the shelf capacity.
    pub fn position(&self, index: usize) -> Option<ShelfPosition> {
        if index >= self.capacity() || self.books_per_shelf == 0 {
            return None;
        }
        let per_aisle = self.books_per_aisle as usize;
        let aisle = index / per_aisle;
        let within = index % per_aisle;
        let left = self.left_wall_books();
        let (side, slot_index) = if within < left {
            (ShelfSide::Left, within)
        } else {
            (ShelfSide::Right, within - left)
        };

        let per_shelf = self.books_per_shelf as usize;
        let level = (slot_index / per_shelf) as f32;
        let slot = (slot_index % per_shelf) as f32;

        let aisle_width = self.room_width / self.aisles_per_room as f32;
        let aisle_x = aisle as f32 * aisle_width + aisle_width / 2.0;
        let x = match side {
            ShelfSide::Left => aisle_x - aisle_width / 4.0,
            ShelfSide::Right => aisle_x + aisle_width / 4.0,
        };
        let y = level * self.shelf_spacing + TOP_MARGIN + slot * (self.book_height + BOOK_GAP);

        Some(ShelfPosition { index, x, y, side })
    }

    /// Positions for the first `count` books of a room.
    pub fn positions(&self, count: usize) -> Vec<ShelfPosition> {
        (0..count).filter_map(|i| self.position(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ShelfLayout {
        ShelfLayout {
            aisles_per_room: 5,
            books_per_aisle: 20,
            books_per_shelf: 4,
            room_width: 800.0,
            shelf_spacing: 120.0,
            book_height: 40.0,
        }
    }

    #[test]
    fn first_book_sits_left_of_first_aisle() {
        let pos = layout().position(0).expect("position");
        assert_eq!(pos.side, ShelfSide::Left);
        assert_eq!(pos.x, 40.0);
        assert_eq!(pos.y, 100.0);
    }

    #[test]
    fn second_half_of_aisle_is_right_wall() {
        let pos = layout().position(10).expect("position");
        assert_eq!(pos.side, ShelfSide::Right);
        assert_eq!(pos.x, 120.0);
        assert_eq!(pos.y, 100.0);
    }

    #[test]
    fn shelf_levels_wrap_after_capacity() {
        // slot 5 on the left wall: level 1, second slot
        let pos = layout().position(5).expect("position");
        assert_eq!(pos.y, 120.0 + 100.0 + 45.0);
    }

    #[test]
    fn later_aisles_shift_right() {
        let pos = layout().position(20).expect("position");
        assert_eq!(pos.side, ShelfSide::Left);
        assert_eq!(pos.x, 160.0 + 80.0 - 40.0);
    }

    #[test]
    fn every_valid_index_has_a_distinct_position() {
        let layout = layout();
        let positions = layout.positions(layout.capacity());
        assert_eq!(positions.len(), 100);
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert!(a.x != b.x || a.y != b.y, "books {} and {} overlap", a.index, b.index);
            }
        }
    }

    #[test]
    fn indices_past_capacity_have_no_position() {
        assert!(layout().position(100).is_none());
    }

    #[test]
    fn odd_aisle_sizes_put_extra_book_on_left() {
        let layout = ShelfLayout {
            books_per_aisle: 5,
            ..layout()
        };
        let sides: Vec<_> = (0..5)
            .map(|i| layout.position(i).expect("position").side)
            .collect();
        assert_eq!(
            sides,
            vec![
                ShelfSide::Left,
                ShelfSide::Left,
                ShelfSide::Left,
                ShelfSide::Right,
                ShelfSide::Right
            ]
        );
    }
}
