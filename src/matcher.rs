//! Run detection: rows and columns scanned for runs of three or more.
//!
//! Bombs are wildcards: they extend a run of whatever colour it already has, and a
//! leading bomb waits for the first coloured token to fix the colour. A run made only
//! of bombs never counts. Empty cells, colour changes and locked columns end a run.

use crate::grid::Grid;
use crate::locks::ColumnLockTable;
use crate::token::{Coord, Kind};

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// One run, in scan order (left to right, or top to bottom).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGroup {
    pub axis: Axis,
    pub color: u8,
    pub cells: Vec<Coord>,
}

impl MatchGroup {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// First-scanned cell: leftmost for a row run, topmost for a column run.
    pub fn anchor(&self) -> Coord {
        self.cells[0]
    }
}

/// Every run on the board, horizontal runs first. Groups are not merged: a token in
/// both a row run and a column run appears in both.
pub fn find_matches(grid: &Grid, locks: &ColumnLockTable) -> Vec<MatchGroup> {
    let mut groups = Vec::new();
    let cell = |col: usize, row: usize| {
        if locks.is_locked(col) {
            return None;
        }
        let at = Coord::new(col, row);
        grid.get(at).map(|t| (at, t.kind))
    };

    for row in 0..grid.rows() {
        let line: Vec<_> = (0..grid.cols()).map(|col| cell(col, row)).collect();
        scan_line(&line, Axis::Horizontal, &mut groups);
    }
    for col in 0..grid.cols() {
        if locks.is_locked(col) {
            continue;
        }
        let line: Vec<_> = (0..grid.rows()).map(|row| cell(col, row)).collect();
        scan_line(&line, Axis::Vertical, &mut groups);
    }

    tracing::trace!(groups = groups.len(), "match scan");
    groups
}

/// Scan one line; `None` entries are breaks (empty or locked).
fn scan_line(line: &[Option<(Coord, Kind)>], axis: Axis, out: &mut Vec<MatchGroup>) {
    let mut i = 0;
    while i < line.len() {
        let mut cells = Vec::new();
        let mut color = None;
        for &(at, kind) in line[i..].iter().map_while(Option::as_ref) {
            match (kind, color) {
                (Kind::Bomb, _) => cells.push(at),
                (Kind::Color(c), None) => {
                    color = Some(c);
                    cells.push(at);
                }
                (Kind::Color(c), Some(run)) if c == run => cells.push(at),
                (Kind::Color(_), Some(_)) => break,
            }
        }
        match color {
            Some(color) if cells.len() >= MIN_RUN => {
                i += cells.len();
                out.push(MatchGroup { axis, color, cells });
            }
            _ => i += 1,
        }
    }
}
