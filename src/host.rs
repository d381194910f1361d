//! Contracts for the collaborators the engine drives: an animator that plays timed
//! transitions and a presenter that owns the visual tokens.
//!
//! Every scheduled animation or delay carries a [`Ticket`]. The host must hand each
//! ticket back to [`crate::cascade::Cascade::complete`] exactly once, after the
//! visual has settled. The engine never assumes synchronous completion.

use crate::token::{Coord, Token, TokenId};

/// Completion handle for one scheduled animation or delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    CubicOut,
    BackOut,
    BounceOut,
}

/// What a track animates on its token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Property {
    /// Move to a cell, from wherever the token is drawn now.
    MoveTo { col: f32, row: f32 },
    /// Vertical fall within the token's column; `from_row` may be negative (above the board).
    Drop { from_row: f32, to_row: f32 },
    /// Pixel displacement from the resting place; pair with `yoyo` to return.
    Offset { dx: f32, dy: f32 },
    /// Relative size, 1.0 = resting gem size.
    Scale { from: f32, to: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub target: TokenId,
    pub property: Property,
}

/// A named scalar the animator re-evaluates every frame (shader time and the like).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    pub name: &'static str,
    pub origin: Coord,
    pub from: f32,
    pub to: f32,
}

/// One animation request. Completes once every track (and the uniform) has finished.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub tracks: Vec<Track>,
    pub uniform: Option<Uniform>,
    pub duration_ms: u32,
    pub easing: Easing,
    /// Play forward then backward; one repeat is one more forward(+back) cycle.
    pub yoyo: bool,
    pub repeat: u32,
}

impl Tween {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            tracks: Vec::new(),
            uniform: None,
            duration_ms,
            easing: Easing::Linear,
            yoyo: false,
            repeat: 0,
        }
    }

    pub fn track(mut self, target: TokenId, property: Property) -> Self {
        self.tracks.push(Track { target, property });
        self
    }

    pub fn tracks(mut self, tracks: impl IntoIterator<Item = Track>) -> Self {
        self.tracks.extend(tracks);
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn yoyo(mut self, repeat: u32) -> Self {
        self.yoyo = true;
        self.repeat = repeat;
        self
    }

    pub fn uniform(mut self, uniform: Uniform) -> Self {
        self.uniform = Some(uniform);
        self
    }

    /// Wall time from start to completion.
    pub fn total_ms(&self) -> u64 {
        let legs = if self.yoyo { 2 } else { 1 };
        u64::from(self.duration_ms) * legs * (u64::from(self.repeat) + 1)
    }
}

pub trait Animator {
    fn animate(&mut self, ticket: Ticket, tween: Tween);
    fn delay(&mut self, ticket: Ticket, ms: u32);
}

/// Mirrors the grid's token lifecycle one to one.
pub trait Presenter {
    fn create_token(&mut self, token: &Token);
    fn destroy_token(&mut self, id: TokenId);
    fn set_selected(&mut self, id: TokenId, selected: bool);
}

/// Everything the cascade controller needs from its surroundings.
pub trait Host: Animator + Presenter {}

impl<T: Animator + Presenter> Host for T {}
