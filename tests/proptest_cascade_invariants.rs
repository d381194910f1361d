//! Property-based invariant tests for the cascade controller.
//!
//! Arbitrary interleavings of swaps, taps, resizes and out-of-order completions must:
//!
//! 1. Keep every stored token's coordinates equal to its cell
//! 2. Never show a token on the board that the presenter does not hold
//! 3. Settle to a full, match-free board whose visuals mirror it exactly
//! 4. Leave no locks, deferred resizes or outstanding tickets behind

mod common;

use common::{Recorder, assert_settled, settle};
use jeweltui::locks::ColumnLockTable;
use jeweltui::matcher::find_matches;
use jeweltui::{Cascade, Coord, Settings};
use proptest::prelude::*;
use std::collections::BTreeSet;

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Swap { col: usize, row: usize, vertical: bool },
    Tap { col: usize, row: usize },
    Resize { cols: usize, rows: usize },
    Complete(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..9, 0usize..9, any::<bool>())
            .prop_map(|(col, row, vertical)| Op::Swap { col, row, vertical }),
        1 => (0usize..9, 0usize..9).prop_map(|(col, row)| Op::Tap { col, row }),
        1 => (3usize..10, 3usize..10).prop_map(|(cols, rows)| Op::Resize { cols, rows }),
        6 => (0usize..32).prop_map(Op::Complete),
    ]
}

fn cascade(seed: u64, cols: usize, rows: usize) -> Cascade {
    let settings = Settings {
        seed: Some(seed),
        ..Settings::default()
    };
    let (w, h) = settings.viewport_for(rows, cols);
    Cascade::new(settings, w, h)
}

fn apply(cascade: &mut Cascade, rec: &mut Recorder, op: &Op) {
    match *op {
        Op::Swap { col, row, vertical } => {
            let to = if vertical {
                Coord::new(col, row + 1)
            } else {
                Coord::new(col + 1, row)
            };
            cascade.try_swap(Coord::new(col, row), to, rec);
        }
        Op::Tap { col, row } => {
            if let Some(id) = cascade.grid().get(Coord::new(col, row)).map(|t| t.id) {
                cascade.tap(id, rec);
            }
        }
        Op::Resize { cols, rows } => {
            let (w, h) = cascade.settings().viewport_for(rows, cols);
            cascade.resize(w, h, rec);
        }
        Op::Complete(skip) => {
            if !rec.queue.is_empty() {
                let idx = skip % rec.queue.len();
                if let Some((ticket, _)) = rec.queue.remove(idx) {
                    cascade.complete(ticket, rec);
                }
            }
        }
    }
}

fn check_running(cascade: &Cascade, rec: &Recorder) -> Result<(), TestCaseError> {
    let grid = cascade.grid();
    prop_assert!(grid.positions_consistent(), "token coordinates drifted");
    let on_board: BTreeSet<_> = grid.tokens().map(|t| t.id).collect();
    prop_assert!(
        on_board.is_subset(&rec.live),
        "board shows tokens the presenter never created"
    );
    prop_assert_eq!(cascade.outstanding(), rec.queue.len());
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// 1-2. Coherence while animations are in flight
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn state_stays_coherent_under_any_interleaving(
        seed in any::<u64>(),
        cols in 3usize..9,
        rows in 3usize..9,
        ops in prop::collection::vec(op_strategy(), 1..120),
    ) {
        let mut cascade = cascade(seed, cols, rows);
        let mut rec = Recorder::default();
        cascade.start(&mut rec);
        for op in &ops {
            apply(&mut cascade, &mut rec, op);
            check_running(&cascade, &rec)?;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3-4. Convergence once every ticket is completed
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_interleaving_settles_to_a_full_quiet_board(
        seed in any::<u64>(),
        cols in 3usize..9,
        rows in 3usize..9,
        ops in prop::collection::vec(op_strategy(), 1..120),
    ) {
        let mut cascade = cascade(seed, cols, rows);
        let mut rec = Recorder::default();
        cascade.start(&mut rec);
        for op in &ops {
            apply(&mut cascade, &mut rec, op);
        }
        settle(&mut cascade, &mut rec);

        assert_settled(&cascade, &rec);
        prop_assert!(cascade.state().locks.is_empty());
        prop_assert!(
            find_matches(cascade.grid(), &ColumnLockTable::new()).is_empty(),
            "settled board still has a run"
        );
    }

    #[test]
    fn resize_lands_on_requested_extent(
        seed in any::<u64>(),
        from in (3usize..9, 3usize..9),
        to in (0usize..10, 0usize..10),
    ) {
        let mut cascade = cascade(seed, from.0, from.1);
        let mut rec = Recorder::default();
        cascade.start(&mut rec);
        settle(&mut cascade, &mut rec);

        let (w, h) = cascade.settings().viewport_for(to.1, to.0);
        cascade.resize(w, h, &mut rec);
        prop_assert_eq!((cascade.grid().cols(), cascade.grid().rows()), to);
        settle(&mut cascade, &mut rec);
        assert_settled(&cascade, &rec);
    }
}
