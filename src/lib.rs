//! Jeweltui engine: the rules and animation sequencing of a match-3 board.
//!
//! The engine owns the grid and decides what happens; a host (see [`host`]) plays the
//! animations it requests and reports back when each finishes. Columns that are
//! animating are locked and sit out of matching, swapping and resizing until they settle.

pub mod bomb;
pub mod cascade;
pub mod grid;
pub mod host;
pub mod locks;
pub mod matcher;
pub mod settings;
pub mod swipe;
pub mod token;

pub use cascade::{Cascade, GameState, Phase};
pub use grid::Grid;
pub use host::{Animator, Host, Presenter, Ticket, Tween};
pub use settings::{Settings, SettingsError};
pub use token::{Coord, Kind, Token, TokenId};
