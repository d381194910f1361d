//! Token grid: storage, spawning, column compaction/refill and reshaping.

use crate::token::{Coord, Kind, Token, TokenId};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A token that changed rows while its column was compacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub id: TokenId,
    pub col: usize,
    pub from_row: usize,
    pub to_row: usize,
}

/// Grid of tokens, stored `cells[row][col]`. Row 0 is the top.
///
/// After a shrink, storage may keep rows past `rows` for columns whose trimming was
/// deferred (they were mid-animation); those cells are invisible to every accessor
/// until [`Grid::trim_column`] destroys them.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Option<Token>>>,
    color_kinds: u8,
    next_id: u64,
    rng: SmallRng,
}

impl Grid {
    /// Empty grid of `rows` x `cols`.
    pub fn empty(rows: usize, cols: usize, color_kinds: u8, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        Self {
            rows,
            cols,
            cells: (0..rows).map(|_| vec![None; cols]).collect(),
            color_kinds: color_kinds.max(1),
            next_id: 0,
            rng,
        }
    }

    /// Grid of `rows` x `cols` with every cell filled by a random colour.
    pub fn new(rows: usize, cols: usize, color_kinds: u8, seed: Option<u64>) -> Self {
        let mut grid = Self::empty(rows, cols, color_kinds, seed);
        for row in 0..rows {
            for col in 0..cols {
                let kind = grid.random_kind();
                grid.spawn(Coord::new(col, row), kind);
            }
        }
        grid
    }

    /// Grid built from an explicit layout (`layout[row][col]`); short rows are padded empty.
    pub fn from_layout(layout: &[Vec<Option<Kind>>], color_kinds: u8, seed: Option<u64>) -> Self {
        let cols = layout.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Self::empty(layout.len(), cols, color_kinds, seed);
        for (row, line) in layout.iter().enumerate() {
            for (col, kind) in line.iter().enumerate() {
                if let Some(kind) = kind {
                    grid.spawn(Coord::new(col, row), *kind);
                }
            }
        }
        grid
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn in_bounds(&self, at: Coord) -> bool {
        at.col < self.cols && at.row < self.rows
    }

    /// Token at `at`; None when empty or outside the grid.
    #[inline]
    pub fn get(&self, at: Coord) -> Option<&Token> {
        if !self.in_bounds(at) {
            return None;
        }
        self.cells[at.row][at.col].as_ref()
    }

    /// Overwrite a cell, returning what was there. Out-of-bounds writes are ignored.
    pub fn set(&mut self, at: Coord, token: Option<Token>) -> Option<Token> {
        if !self.in_bounds(at) {
            return None;
        }
        let token = token.map(|mut t| {
            t.pos = at;
            t
        });
        std::mem::replace(&mut self.cells[at.row][at.col], token)
    }

    /// Empty a cell, returning its token.
    pub fn take(&mut self, at: Coord) -> Option<Token> {
        self.set(at, None)
    }

    /// Exchange two cells (either may be empty). False if either is out of bounds.
    pub fn swap(&mut self, a: Coord, b: Coord) -> bool {
        if !self.in_bounds(a) || !self.in_bounds(b) {
            return false;
        }
        let ta = self.take(a);
        let tb = self.take(b);
        self.set(a, tb);
        self.set(b, ta);
        true
    }

    /// Create a token of `kind` in an empty in-bounds cell.
    pub fn spawn(&mut self, at: Coord, kind: Kind) -> Option<Token> {
        if !self.in_bounds(at) || self.cells[at.row][at.col].is_some() {
            return None;
        }
        let token = Token {
            id: TokenId(self.next_id),
            kind,
            pos: at,
        };
        self.next_id += 1;
        self.cells[at.row][at.col] = Some(token);
        Some(token)
    }

    /// A colour drawn uniformly from the configured kinds.
    pub fn random_kind(&mut self) -> Kind {
        Kind::Color(self.rng.random_range(0..self.color_kinds))
    }

    /// Current cell of a token, if it is still on the board.
    pub fn position_of(&self, id: TokenId) -> Option<Coord> {
        self.tokens().find(|t| t.id == id).map(|t| t.pos)
    }

    /// All visible tokens, row by row.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> + '_ {
        self.cells
            .iter()
            .take(self.rows)
            .flat_map(|row| row.iter().flatten())
    }

    pub fn is_full(&self) -> bool {
        self.cells
            .iter()
            .take(self.rows)
            .all(|row| row.iter().all(Option::is_some))
    }

    /// Every stored token records the cell it lives in.
    pub fn positions_consistent(&self) -> bool {
        self.cells.iter().enumerate().all(|(row, line)| {
            line.iter()
                .enumerate()
                .all(|(col, cell)| cell.is_none_or(|t| t.pos == Coord::new(col, row)))
        })
    }

    /// Compact a column downwards, keeping relative order. Returns the tokens that moved.
    pub fn drop_column(&mut self, col: usize) -> Vec<Fall> {
        if col >= self.cols {
            return Vec::new();
        }
        let stack: Vec<Token> = (0..self.rows)
            .filter_map(|row| self.cells[row][col].take())
            .collect();
        let mut falls = Vec::new();
        let mut target = self.rows;
        for mut token in stack.into_iter().rev() {
            target -= 1;
            if token.pos.row != target {
                falls.push(Fall {
                    id: token.id,
                    col,
                    from_row: token.pos.row,
                    to_row: target,
                });
            }
            token.pos = Coord::new(col, target);
            self.cells[target][col] = Some(token);
        }
        falls
    }

    /// Spawn a random token in every empty cell of the column, top to bottom.
    pub fn fill_column(&mut self, col: usize) -> Vec<Token> {
        if col >= self.cols {
            return Vec::new();
        }
        let mut spawned = Vec::new();
        for row in 0..self.rows {
            if self.cells[row][col].is_none() {
                let kind = self.random_kind();
                spawned.extend(self.spawn(Coord::new(col, row), kind));
            }
        }
        spawned
    }

    /// Resize to `new_rows` x `new_cols`, destroying everything that falls outside.
    pub fn reshape(&mut self, new_rows: usize, new_cols: usize) -> Vec<Token> {
        self.reshape_deferring(new_rows, new_cols, |_| false)
    }

    /// Resize, leaving row-overflow tokens of `deferred` columns in place for a later
    /// [`Grid::trim_column`].
    ///
    /// Order: remove columns, remove rows, add columns, add rows. Removed columns are
    /// destroyed outright; a cell in both a removed column and a removed row is
    /// destroyed once, with the columns.
    pub fn reshape_deferring(
        &mut self,
        new_rows: usize,
        new_cols: usize,
        deferred: impl Fn(usize) -> bool,
    ) -> Vec<Token> {
        let mut destroyed = Vec::new();

        if new_cols < self.cols {
            for line in &mut self.cells {
                destroyed.extend(line.drain(new_cols..).flatten());
            }
            self.cols = new_cols;
        }

        if new_rows < self.cells.len() {
            for line in self.cells.iter_mut().skip(new_rows) {
                for (col, cell) in line.iter_mut().enumerate() {
                    if !deferred(col) {
                        destroyed.extend(cell.take());
                    }
                }
            }
        }
        self.rows = new_rows;
        self.compact_storage();

        if new_cols > self.cols {
            for line in &mut self.cells {
                line.resize(new_cols, None);
            }
            self.cols = new_cols;
        }

        while self.cells.len() < new_rows {
            self.cells.push(vec![None; self.cols]);
        }

        tracing::trace!(
            rows = self.rows,
            cols = self.cols,
            destroyed = destroyed.len(),
            overhang = self.cells.len() - self.rows,
            "grid reshaped"
        );
        destroyed
    }

    /// Destroy a column's tokens stored past the current row count.
    pub fn trim_column(&mut self, col: usize) -> Vec<Token> {
        let destroyed: Vec<Token> = self
            .cells
            .iter_mut()
            .skip(self.rows)
            .filter_map(|line| line.get_mut(col).and_then(Option::take))
            .collect();
        self.compact_storage();
        destroyed
    }

    /// Drop trailing overflow rows that no longer hold anything.
    fn compact_storage(&mut self) {
        while self.cells.len() > self.rows
            && self
                .cells
                .last()
                .is_some_and(|line| line.iter().all(Option::is_none))
        {
            self.cells.pop();
        }
    }
}
