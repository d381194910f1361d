//! Bomb expansion: removal and push sets, chained detonations, shockwave forces.

use crate::grid::Grid;
use crate::locks::ColumnLockTable;
use crate::token::Coord;
use std::collections::BTreeSet;

/// Base of the geometric shockwave falloff.
const FORCE_BASE: f32 = 2.5;
/// Scale applied on top of the falloff, in pixels.
const FORCE_SCALE: f32 = 2.0;
/// Pushes weaker than this (pixels) are not animated.
const FORCE_EPSILON: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlastRadii {
    pub remove: usize,
    pub anim: usize,
}

impl Default for BlastRadii {
    fn default() -> Self {
        Self { remove: 1, anim: 4 }
    }
}

/// Outcome of expanding a removal set through every bomb it reaches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blast {
    /// Cells whose tokens are destroyed.
    pub remove: BTreeSet<Coord>,
    /// Cells that are pushed by a shockwave but survive.
    pub animate_only: BTreeSet<Coord>,
    /// Detonated bombs, in detonation order.
    pub bombs: Vec<Coord>,
    /// Columns touched by removal or push; all of them must be locked.
    pub columns: BTreeSet<usize>,
}

impl Blast {
    pub fn has_bombs(&self) -> bool {
        !self.bombs.is_empty()
    }
}

/// A shockwave displacement for one token, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Push {
    pub at: Coord,
    pub dx: f32,
    pub dy: f32,
}

/// Expand `seeds` (the matched cells) through bombs.
///
/// `own` are the columns the caller already holds locks for. Columns locked by anyone
/// else are left out of the blast entirely. Each token is examined at most once, so
/// bombs that reach each other terminate.
pub fn resolve(
    grid: &Grid,
    locks: &ColumnLockTable,
    own: &BTreeSet<usize>,
    seeds: impl IntoIterator<Item = Coord>,
    radii: BlastRadii,
) -> Blast {
    let mut blast = Blast {
        columns: own.clone(),
        ..Blast::default()
    };
    blast.remove.extend(seeds);
    blast.columns.extend(blast.remove.iter().map(|c| c.col));

    let mut worklist: Vec<Coord> = blast.remove.iter().copied().collect();
    let mut seen = BTreeSet::new();
    let reach = radii.anim as isize;

    while let Some(at) = worklist.pop() {
        if !seen.insert(at) {
            continue;
        }
        if !grid.get(at).is_some_and(|t| t.is_bomb()) {
            continue;
        }
        blast.bombs.push(at);

        for dr in -reach..=reach {
            for dc in -reach..=reach {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let Some(target) = at.offset(dc, dr) else {
                    continue;
                };
                if grid.get(target).is_none() {
                    continue;
                }
                if locks.is_locked(target.col) && !blast.columns.contains(&target.col) {
                    continue;
                }
                blast.columns.insert(target.col);

                if at.chebyshev(target) <= radii.remove {
                    if blast.remove.insert(target) {
                        blast.animate_only.remove(&target);
                        worklist.push(target);
                    }
                } else if !blast.remove.contains(&target) {
                    blast.animate_only.insert(target);
                }
            }
        }
    }

    tracing::debug!(
        bombs = blast.bombs.len(),
        remove = blast.remove.len(),
        pushed = blast.animate_only.len(),
        columns = blast.columns.len(),
        "blast resolved"
    );
    blast
}

/// Shockwave displacement of every removed or pushed cell, summed over all bombs.
///
/// Each bomb within `anim` (Chebyshev, excluding distance 0) pushes away from itself
/// with magnitude `2.5^(anim + 1 - d) * 2` px along the normalised offset.
pub fn shockwave(blast: &Blast, radii: BlastRadii) -> Vec<Push> {
    if !blast.has_bombs() {
        return Vec::new();
    }
    blast
        .animate_only
        .iter()
        .chain(blast.remove.iter())
        .filter_map(|&at| {
            let (mut dx, mut dy) = (0.0f32, 0.0f32);
            for &bomb in &blast.bombs {
                let dist = at.chebyshev(bomb);
                if dist == 0 || dist > radii.anim {
                    continue;
                }
                let ox = at.col as f32 - bomb.col as f32;
                let oy = at.row as f32 - bomb.row as f32;
                let len = ox.hypot(oy);
                let force = FORCE_BASE.powi((radii.anim + 1 - dist) as i32) * FORCE_SCALE;
                dx += ox / len * force;
                dy += oy / len * force;
            }
            (dx.hypot(dy) >= FORCE_EPSILON).then_some(Push { at, dx, dy })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Kind;

    fn board_with_bombs(size: usize, bombs: &[Coord]) -> Grid {
        let layout: Vec<Vec<Option<Kind>>> = (0..size)
            .map(|row| {
                (0..size)
                    .map(|col| {
                        if bombs.contains(&Coord::new(col, row)) {
                            Some(Kind::Bomb)
                        } else {
                            Some(Kind::Color(((col + 2 * row) % 6) as u8))
                        }
                    })
                    .collect()
            })
            .collect();
        Grid::from_layout(&layout, 6, Some(0))
    }

    #[test]
    fn test_single_bomb_area() {
        let center = Coord::new(4, 4);
        let grid = board_with_bombs(10, &[center]);
        let blast = resolve(
            &grid,
            &ColumnLockTable::new(),
            &BTreeSet::new(),
            [center],
            BlastRadii::default(),
        );
        assert_eq!(blast.remove.len(), 9);
        assert!(blast.remove.iter().all(|c| c.chebyshev(center) <= 1));
        // 9x9 square minus the 3x3 core.
        assert_eq!(blast.animate_only.len(), 81 - 9);
        assert!(blast
            .animate_only
            .iter()
            .all(|c| (2..=4).contains(&c.chebyshev(center))));
        assert_eq!(blast.columns, (0..=8).collect());
        assert_eq!(blast.bombs, vec![center]);
    }

    #[test]
    fn test_chained_bombs_upgrade_push_to_remove() {
        let a = Coord::new(2, 2);
        let b = Coord::new(3, 3);
        let grid = board_with_bombs(8, &[a, b]);
        let blast = resolve(
            &grid,
            &ColumnLockTable::new(),
            &BTreeSet::new(),
            [a],
            BlastRadii::default(),
        );
        assert_eq!(blast.bombs.len(), 2);
        assert!(blast.remove.contains(&Coord::new(4, 4)));
        assert!(blast.remove.is_disjoint(&blast.animate_only));
    }

    #[test]
    fn test_mutually_adjacent_bombs_terminate() {
        let bombs = [Coord::new(1, 1), Coord::new(2, 1), Coord::new(1, 2), Coord::new(2, 2)];
        let grid = board_with_bombs(5, &bombs);
        let blast = resolve(
            &grid,
            &ColumnLockTable::new(),
            &BTreeSet::new(),
            [bombs[0]],
            BlastRadii::default(),
        );
        assert_eq!(blast.bombs.len(), 4);
        assert_eq!(blast.remove.len(), 16);
    }

    #[test]
    fn test_foreign_locked_column_is_spared() {
        let center = Coord::new(4, 4);
        let grid = board_with_bombs(9, &[center]);
        let mut locks = ColumnLockTable::new();
        locks.lock(4);
        locks.lock(5);
        let own = BTreeSet::from([4]);
        let blast = resolve(&grid, &locks, &own, [center], BlastRadii::default());
        assert!(blast.remove.iter().all(|c| c.col != 5));
        assert!(blast.animate_only.iter().all(|c| c.col != 5));
        assert!(!blast.columns.contains(&5));
        assert!(blast.columns.contains(&4));
    }

    #[test]
    fn test_no_bomb_no_expansion() {
        let grid = board_with_bombs(5, &[]);
        let seeds = [Coord::new(0, 0), Coord::new(1, 0), Coord::new(2, 0)];
        let blast = resolve(
            &grid,
            &ColumnLockTable::new(),
            &BTreeSet::new(),
            seeds,
            BlastRadii::default(),
        );
        assert_eq!(blast.remove.len(), 3);
        assert!(blast.animate_only.is_empty());
        assert!(shockwave(&blast, BlastRadii::default()).is_empty());
    }

    #[test]
    fn test_shockwave_decays_and_points_outward() {
        let center = Coord::new(4, 4);
        let grid = board_with_bombs(9, &[center]);
        let blast = resolve(
            &grid,
            &ColumnLockTable::new(),
            &BTreeSet::new(),
            [center],
            BlastRadii::default(),
        );
        let pushes = shockwave(&blast, BlastRadii::default());
        // Everything but the bomb itself moves.
        assert_eq!(pushes.len(), 80);
        let near = pushes.iter().find(|p| p.at == Coord::new(5, 4)).unwrap();
        let far = pushes.iter().find(|p| p.at == Coord::new(8, 4)).unwrap();
        assert!((near.dx - 78.125).abs() < 1e-3);
        assert!(near.dy.abs() < 1e-6);
        assert!((far.dx - 5.0).abs() < 1e-3);
        let up = pushes.iter().find(|p| p.at == Coord::new(4, 3)).unwrap();
        assert!(up.dy < 0.0);
    }

    #[test]
    fn test_opposing_bombs_cancel() {
        let bombs = [Coord::new(2, 4), Coord::new(6, 4)];
        let grid = board_with_bombs(9, &bombs);
        let blast = resolve(
            &grid,
            &ColumnLockTable::new(),
            &BTreeSet::new(),
            bombs,
            BlastRadii::default(),
        );
        let pushes = shockwave(&blast, BlastRadii::default());
        // Midway between equal bombs the forces cancel below the epsilon.
        assert!(pushes.iter().all(|p| p.at != Coord::new(4, 4)));
    }
}
