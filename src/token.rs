//! Tokens: identity, kind (colour or bomb) and grid coordinates.

use std::fmt;

/// Opaque handle for a token; stable for the token's whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Grid coordinate. `col` grows to the right, `row` grows downwards (row 0 is the top).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Coord {
    pub col: usize,
    pub row: usize,
}

impl Coord {
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    /// True when the two coordinates share an edge.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.col.abs_diff(other.col) + self.row.abs_diff(other.row) == 1
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev(self, other: Self) -> usize {
        self.col.abs_diff(other.col).max(self.row.abs_diff(other.row))
    }

    /// Coordinate shifted by (dc, dr); None if it would leave the non-negative quadrant.
    pub fn offset(self, dc: isize, dr: isize) -> Option<Self> {
        Some(Self {
            col: self.col.checked_add_signed(dc)?,
            row: self.row.checked_add_signed(dr)?,
        })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.col, self.row)
    }
}

/// What a token is. Bombs carry no colour; the matcher treats them as wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Color(u8),
    Bomb,
}

impl Kind {
    pub fn is_bomb(self) -> bool {
        matches!(self, Self::Bomb)
    }

    /// Colour class, or None for a bomb.
    pub fn color(self) -> Option<u8> {
        match self {
            Self::Color(c) => Some(c),
            Self::Bomb => None,
        }
    }
}

/// A token as stored in the grid. `pos` always mirrors the cell it is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub id: TokenId,
    pub kind: Kind,
    pub pos: Coord,
}

impl Token {
    pub fn is_bomb(&self) -> bool {
        self.kind.is_bomb()
    }
}
