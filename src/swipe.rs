//! Pointer gestures → directional swap intents.

use crate::settings::Settings;
use crate::token::Coord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Larger axis wins; horizontal wins ties.
    pub fn from_delta(dx: f32, dy: f32) -> Self {
        if dx.abs() >= dy.abs() {
            if dx > 0.0 { Self::Right } else { Self::Left }
        } else if dy > 0.0 {
            Self::Down
        } else {
            Self::Up
        }
    }

    /// Neighbouring coordinate in this direction, if non-negative.
    pub fn step(self, from: Coord) -> Option<Coord> {
        match self {
            Self::Left => from.offset(-1, 0),
            Self::Right => from.offset(1, 0),
            Self::Up => from.offset(0, -1),
            Self::Down => from.offset(0, 1),
        }
    }
}

/// A recognised swipe: where it started (in viewport units) and which way it went.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swipe {
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
}

impl Swipe {
    /// Grid cell under the swipe's start point; None when left of or above the board.
    pub fn start_cell(&self, tile_width: f32, tile_height: f32) -> Option<Coord> {
        let col = (self.x / tile_width).floor();
        let row = (self.y / tile_height).floor();
        (col >= 0.0 && row >= 0.0).then(|| Coord::new(col as usize, row as usize))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeRecognizer {
    min_distance: f32,
    min_time_ms: u64,
    max_time_ms: u64,
    start: Option<(f32, f32, u64)>,
}

impl SwipeRecognizer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            min_distance: settings.swipe_min_distance,
            min_time_ms: settings.swipe_min_time_ms,
            max_time_ms: settings.swipe_max_time_ms,
            start: None,
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, time_ms: u64) {
        self.start = Some((x, y, time_ms));
    }

    /// Swipe for this press, if its duration and travel are within thresholds.
    pub fn pointer_up(&mut self, x: f32, y: f32, time_ms: u64) -> Option<Swipe> {
        let (sx, sy, st) = self.start.take()?;
        let elapsed = time_ms.checked_sub(st)?;
        if elapsed < self.min_time_ms || elapsed > self.max_time_ms {
            return None;
        }
        let (dx, dy) = (x - sx, y - sy);
        if dx.hypot(dy) < self.min_distance {
            return None;
        }
        Some(Swipe {
            x: sx,
            y: sy,
            direction: Direction::from_delta(dx, dy),
        })
    }
}
