//! Cascade controller: swap → detect → blast → remove → drop/fill → re-detect, and
//! viewport-driven reshaping, all gated by column locks.
//!
//! Every asynchronous step is recorded in a ticket table (`Step`); the host completes
//! tickets and [`Cascade::complete`] advances exactly that step. Column unlocks are
//! queued by the lock table and drained after every entry point, each one running a
//! pending resize for that column or a fresh match check.

use crate::bomb::{self, BlastRadii};
use crate::grid::Grid;
use crate::host::{Easing, Host, Property, Ticket, Track, Tween, Uniform};
use crate::locks::ColumnLockTable;
use crate::matcher::{self, MatchGroup};
use crate::settings::Settings;
use crate::swipe::SwipeRecognizer;
use crate::token::{Coord, Kind, TokenId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

const STARTUP_CHECK_MS: u32 = 500;
const SWAP_MS: u32 = 200;
const SHAKE_MS: u32 = 50;
const SHAKE_PX: f32 = 4.0;
const SHAKE_REPEATS: u32 = 2;
const SHOCKWAVE_MS: u32 = 100;
const EXPLOSION_MS: u32 = 600;
const VANISH_MS: u32 = 200;
const BOMB_POP_MS: u32 = 400;
const DROP_MS: u32 = 400;

/// Name of the uniform driven while a blast's flash plays.
pub const EXPLOSION_UNIFORM: &str = "explosion";

/// Everything mutable about one game: the board, its locks, deferred resizes, selection.
#[derive(Debug, Clone)]
pub struct GameState {
    pub grid: Grid,
    pub locks: ColumnLockTable,
    /// Columns whose reshape waits for their lock to clear.
    pub pending_resize: BTreeSet<usize>,
    pub selected: Option<TokenId>,
}

/// Coarse view of what the controller is busy with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    SwapPending,
    Resolving,
    Resizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct JobId(u64);

/// A swap participant and the cell it started from.
#[derive(Debug, Clone, Copy)]
struct Slot {
    id: TokenId,
    at: Coord,
}

/// What to do when a ticket completes.
#[derive(Debug, Clone)]
enum Step {
    StartupCheck,
    SwapForward { a: Slot, b: Slot },
    SwapShake { a: Slot, b: Slot },
    SwapReturn { a: Slot, b: Slot },
    Shockwave { job: JobId },
    Explosion,
    Vanish { job: JobId, ids: Vec<TokenId> },
    BombPopIn { job: JobId, col: usize },
    Drop { col: usize, job: Option<JobId> },
    Fill { col: usize, job: Option<JobId> },
}

/// One removal pass and the per-column count of animations it still waits on.
#[derive(Debug, Clone)]
struct RemovalJob {
    remove: BTreeSet<Coord>,
    bomb_spawns: Vec<Coord>,
    columns: BTreeSet<usize>,
    waits: BTreeMap<usize, u32>,
}

#[derive(Debug)]
pub struct Cascade {
    state: GameState,
    settings: Settings,
    swipe: SwipeRecognizer,
    steps: HashMap<Ticket, Step>,
    jobs: BTreeMap<JobId, RemovalJob>,
    next_ticket: u64,
    next_job: u64,
}

impl Cascade {
    /// New random board sized to a viewport.
    pub fn new(settings: Settings, width: f32, height: f32) -> Self {
        let (rows, cols) = settings.grid_extent(width, height);
        let grid = Grid::new(rows, cols, settings.color_kinds, settings.seed);
        Self::with_grid(settings, grid)
    }

    pub fn with_grid(settings: Settings, grid: Grid) -> Self {
        Self {
            state: GameState {
                grid,
                locks: ColumnLockTable::new(),
                pending_resize: BTreeSet::new(),
                selected: None,
            },
            swipe: SwipeRecognizer::new(&settings),
            settings,
            steps: HashMap::new(),
            jobs: BTreeMap::new(),
            next_ticket: 0,
            next_job: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.state.grid
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn selected(&self) -> Option<TokenId> {
        self.state.selected
    }

    pub fn is_locked(&self, col: usize) -> bool {
        self.state.locks.is_locked(col)
    }

    /// Number of tickets handed out and not yet completed.
    pub fn outstanding(&self) -> usize {
        self.steps.len()
    }

    pub fn phase(&self) -> Phase {
        let resizing = !self.state.pending_resize.is_empty()
            || self.steps.values().any(|s| {
                matches!(s, Step::Drop { job: None, .. } | Step::Fill { job: None, .. })
            });
        if resizing {
            return Phase::Resizing;
        }
        let swapping = self.steps.values().any(|s| {
            matches!(
                s,
                Step::SwapForward { .. } | Step::SwapShake { .. } | Step::SwapReturn { .. }
            )
        });
        if swapping {
            Phase::SwapPending
        } else if !self.steps.is_empty() || !self.jobs.is_empty() || !self.state.locks.is_empty()
        {
            Phase::Resolving
        } else {
            Phase::Idle
        }
    }

    /// Create visuals for the initial board and schedule the first match check.
    pub fn start(&mut self, host: &mut impl Host) {
        for token in self.state.grid.tokens() {
            host.create_token(token);
        }
        self.wait(host, STARTUP_CHECK_MS, Step::StartupCheck);
    }

    /// A click on a token: select, deselect, or try to swap with the selection.
    pub fn tap(&mut self, id: TokenId, host: &mut impl Host) {
        let Some(at) = self.state.grid.position_of(id) else {
            return;
        };
        if self.state.locks.is_locked(at.col) {
            return;
        }
        match self.state.selected {
            None => self.select(id, host),
            Some(current) if current == id => self.clear_selection(host),
            Some(current) => {
                self.clear_selection(host);
                match self.state.grid.position_of(current) {
                    Some(first) => {
                        self.try_swap(first, at, host);
                    }
                    None => self.select(id, host),
                }
            }
        }
        self.drain(host);
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, time_ms: u64) {
        self.swipe.pointer_down(x, y, time_ms);
    }

    /// End of a press; swaps the start cell with its neighbour if it was a swipe.
    pub fn pointer_up(&mut self, x: f32, y: f32, time_ms: u64, host: &mut impl Host) {
        let Some(swipe) = self.swipe.pointer_up(x, y, time_ms) else {
            return;
        };
        let Some(start) = swipe
            .start_cell(self.settings.tile_width, self.settings.tile_height)
            .filter(|&c| self.swappable(c))
        else {
            return;
        };
        let Some(next) = swipe.direction.step(start).filter(|&c| self.swappable(c)) else {
            return;
        };
        self.clear_selection(host);
        self.try_swap(start, next, host);
        self.drain(host);
    }

    /// Begin swapping two cells. Rejected (false) unless both hold tokens, are
    /// adjacent, and sit in unlocked columns.
    pub fn try_swap(&mut self, a: Coord, b: Coord, host: &mut impl Host) -> bool {
        if !a.is_adjacent(b) || !self.swappable(a) || !self.swappable(b) {
            return false;
        }
        let (Some(ta), Some(tb)) = (self.state.grid.get(a), self.state.grid.get(b)) else {
            return false;
        };
        let a = Slot { id: ta.id, at: a };
        let b = Slot { id: tb.id, at: b };
        self.state.locks.lock(a.at.col);
        self.state.locks.lock(b.at.col);
        debug!(from = %a.at, to = %b.at, "swap started");
        let tween = Tween::new(SWAP_MS)
            .track(a.id, move_to(b.at))
            .track(b.id, move_to(a.at));
        self.schedule(host, tween, Step::SwapForward { a, b });
        true
    }

    /// Viewport changed: reshape the board, deferring columns that are animating.
    pub fn resize(&mut self, width: f32, height: f32, host: &mut impl Host) {
        self.clear_selection(host);
        let (rows, cols) = self.settings.grid_extent(width, height);
        let grid = &self.state.grid;
        if (rows, cols) == (grid.rows(), grid.cols()) {
            return;
        }
        debug!(
            from_rows = grid.rows(),
            from_cols = grid.cols(),
            rows,
            cols,
            "resize"
        );

        let locks = &self.state.locks;
        let destroyed = self
            .state
            .grid
            .reshape_deferring(rows, cols, |col| locks.is_locked(col));
        for token in destroyed {
            host.destroy_token(token.id);
        }
        self.state.pending_resize.retain(|&col| col < cols);

        for col in 0..cols {
            if self.state.locks.is_locked(col) {
                self.state.pending_resize.insert(col);
            } else {
                self.resize_column(col, host);
            }
        }
        if !self.state.pending_resize.is_empty() {
            debug!(deferred = ?self.state.pending_resize, "resize deferred for locked columns");
        }
        self.drain(host);
    }

    /// The host finished the animation or delay behind `ticket`.
    pub fn complete(&mut self, ticket: Ticket, host: &mut impl Host) {
        let Some(step) = self.steps.remove(&ticket) else {
            warn!(ticket = ticket.0, "completion for unknown ticket");
            return;
        };
        match step {
            Step::StartupCheck => self.check_matches(host),
            Step::SwapForward { a, b } => self.finish_swap(a, b, host),
            Step::SwapShake { a, b } => {
                let tween = Tween::new(SWAP_MS)
                    .track(a.id, move_to(a.at))
                    .track(b.id, move_to(b.at));
                self.schedule(host, tween, Step::SwapReturn { a, b });
            }
            Step::SwapReturn { a, b } => {
                self.state.locks.unlock(a.at.col);
                self.state.locks.unlock(b.at.col);
            }
            Step::Shockwave { job } => self.vanish(job, host),
            Step::Explosion => {}
            Step::Vanish { job, ids } => {
                for id in ids {
                    host.destroy_token(id);
                }
                self.refill(job, host);
            }
            Step::BombPopIn { job, col } => self.settle(col, Some(job)),
            Step::Drop { col, job } => self.fill_step(col, job, host),
            Step::Fill { col, job } => self.settle(col, job),
        }
        self.drain(host);
    }

    fn swappable(&self, at: Coord) -> bool {
        self.state.grid.get(at).is_some() && !self.state.locks.is_locked(at.col)
    }

    fn select(&mut self, id: TokenId, host: &mut impl Host) {
        self.state.selected = Some(id);
        host.set_selected(id, true);
    }

    fn clear_selection(&mut self, host: &mut impl Host) {
        if let Some(id) = self.state.selected.take() {
            host.set_selected(id, false);
        }
    }

    fn finish_swap(&mut self, a: Slot, b: Slot, host: &mut impl Host) {
        let intact = |s: Slot| self.state.grid.get(s.at).is_some_and(|t| t.id == s.id);
        if !intact(a) || !intact(b) {
            // A resize took one of them; put the survivor back and let go.
            let tween = Tween::new(SWAP_MS)
                .track(a.id, move_to(a.at))
                .track(b.id, move_to(b.at));
            self.schedule(host, tween, Step::SwapReturn { a, b });
            return;
        }

        self.state.locks.release(a.at.col);
        self.state.locks.release(b.at.col);
        self.state.grid.swap(a.at, b.at);

        let groups = matcher::find_matches(&self.state.grid, &self.state.locks);
        if groups.is_empty() {
            debug!(from = %a.at, to = %b.at, "swap reverted");
            self.state.locks.lock(a.at.col);
            self.state.locks.lock(b.at.col);
            self.state.grid.swap(a.at, b.at);
            let tween = Tween::new(SHAKE_MS)
                .track(a.id, Property::Offset { dx: SHAKE_PX, dy: 0.0 })
                .track(b.id, Property::Offset { dx: SHAKE_PX, dy: 0.0 })
                .yoyo(SHAKE_REPEATS);
            self.schedule(host, tween, Step::SwapShake { a, b });
        } else {
            debug!(from = %a.at, to = %b.at, groups = groups.len(), "swap committed");
            self.remove_groups(&groups, host);
            // Released without a free notification; a deferred resize must still run.
            for col in [a.at.col, b.at.col] {
                if !self.state.locks.is_locked(col) && self.state.pending_resize.remove(&col) {
                    self.resize_column(col, host);
                }
            }
        }
    }

    fn check_matches(&mut self, host: &mut impl Host) {
        let groups = matcher::find_matches(&self.state.grid, &self.state.locks);
        if !groups.is_empty() {
            self.remove_groups(&groups, host);
        }
    }

    fn remove_groups(&mut self, groups: &[MatchGroup], host: &mut impl Host) {
        let own: BTreeSet<usize> = groups
            .iter()
            .flat_map(|g| g.cells.iter().map(|c| c.col))
            .collect();
        for &col in &own {
            self.state.locks.lock(col);
        }
        let bomb_spawns: Vec<Coord> = groups
            .iter()
            .filter(|g| g.len() >= self.settings.bomb_threshold)
            .map(MatchGroup::anchor)
            .collect();
        debug!(
            groups = groups.len(),
            lengths = ?groups.iter().map(MatchGroup::len).collect::<Vec<_>>(),
            bombs_to_spawn = bomb_spawns.len(),
            "matches found"
        );

        let radii = self.radii();
        let blast = bomb::resolve(
            &self.state.grid,
            &self.state.locks,
            &own,
            groups.iter().flat_map(|g| g.cells.iter().copied()),
            radii,
        );
        for &col in &blast.columns {
            self.state.locks.lock(col);
        }

        let job = JobId(self.next_job);
        self.next_job += 1;
        self.jobs.insert(
            job,
            RemovalJob {
                remove: blast.remove.clone(),
                bomb_spawns,
                columns: blast.columns.clone(),
                waits: BTreeMap::new(),
            },
        );

        if let Some(&origin) = blast.bombs.first() {
            let flash = Tween::new(EXPLOSION_MS).uniform(Uniform {
                name: EXPLOSION_UNIFORM,
                origin,
                from: 0.0,
                to: 1.0,
            });
            self.schedule(host, flash, Step::Explosion);

            let tracks: Vec<Track> = bomb::shockwave(&blast, radii)
                .into_iter()
                .filter_map(|push| {
                    let token = self.state.grid.get(push.at)?;
                    Some(Track {
                        target: token.id,
                        property: Property::Offset {
                            dx: push.dx,
                            dy: push.dy,
                        },
                    })
                })
                .collect();
            if !tracks.is_empty() {
                let tween = Tween::new(SHOCKWAVE_MS)
                    .tracks(tracks)
                    .easing(Easing::CubicOut)
                    .yoyo(0);
                self.schedule(host, tween, Step::Shockwave { job });
                return;
            }
        }
        self.vanish(job, host);
    }

    /// Pull the job's tokens off the board and shrink them away.
    fn vanish(&mut self, job: JobId, host: &mut impl Host) {
        let Some(remove) = self.jobs.get(&job).map(|j| j.remove.clone()) else {
            return;
        };
        let ids: Vec<TokenId> = remove
            .iter()
            .filter_map(|&at| self.state.grid.take(at))
            .map(|t| t.id)
            .collect();
        if ids.is_empty() {
            self.refill(job, host);
            return;
        }
        let tween = Tween::new(VANISH_MS).tracks(ids.iter().map(|&id| Track {
            target: id,
            property: Property::Scale { from: 1.0, to: 0.0 },
        }));
        self.schedule(host, tween, Step::Vanish { job, ids });
    }

    /// Spawn earned bombs, then drop and fill every column of the job.
    fn refill(&mut self, job: JobId, host: &mut impl Host) {
        let Some(entry) = self.jobs.get_mut(&job) else {
            return;
        };
        entry.waits = entry.columns.iter().map(|&col| (col, 1)).collect();
        let spawns = entry.bomb_spawns.clone();
        let columns: Vec<usize> = entry.columns.iter().copied().collect();

        for at in spawns {
            let Some(bomb) = self.state.grid.spawn(at, Kind::Bomb) else {
                continue;
            };
            if let Some(entry) = self.jobs.get_mut(&job) {
                *entry.waits.entry(at.col).or_insert(0) += 1;
            }
            host.create_token(&bomb);
            let tween = Tween::new(BOMB_POP_MS)
                .track(bomb.id, Property::Scale { from: 0.0, to: 1.0 })
                .easing(Easing::BackOut);
            self.schedule(host, tween, Step::BombPopIn { job, col: at.col });
        }

        for col in columns {
            self.drop_step(col, Some(job), host);
        }
    }

    fn drop_step(&mut self, col: usize, job: Option<JobId>, host: &mut impl Host) {
        let falls = self.state.grid.drop_column(col);
        if falls.is_empty() {
            self.fill_step(col, job, host);
            return;
        }
        let tween = Tween::new(DROP_MS)
            .tracks(falls.iter().map(|f| Track {
                target: f.id,
                property: Property::Drop {
                    from_row: f.from_row as f32,
                    to_row: f.to_row as f32,
                },
            }))
            .easing(Easing::BounceOut);
        self.schedule(host, tween, Step::Drop { col, job });
    }

    fn fill_step(&mut self, col: usize, job: Option<JobId>, host: &mut impl Host) {
        // A pending resize restacks and fills this column itself.
        if job.is_some() && self.state.pending_resize.contains(&col) {
            self.settle(col, job);
            return;
        }
        let spawned = self.state.grid.fill_column(col);
        if spawned.is_empty() {
            self.settle(col, job);
            return;
        }
        let lift = spawned.len() as f32;
        let mut tracks = Vec::with_capacity(spawned.len());
        for token in &spawned {
            host.create_token(token);
            let to_row = token.pos.row as f32;
            tracks.push(Track {
                target: token.id,
                property: Property::Drop {
                    from_row: to_row - lift,
                    to_row,
                },
            });
        }
        let tween = Tween::new(DROP_MS)
            .tracks(tracks)
            .easing(Easing::BounceOut);
        self.schedule(host, tween, Step::Fill { col, job });
    }

    /// One of the column's outstanding animations finished; unlock at zero.
    fn settle(&mut self, col: usize, job: Option<JobId>) {
        let Some(job) = job else {
            self.state.locks.unlock(col);
            return;
        };
        let Some(entry) = self.jobs.get_mut(&job) else {
            self.state.locks.unlock(col);
            return;
        };
        let remaining = entry.waits.get_mut(&col).map_or(0, |w| {
            *w = w.saturating_sub(1);
            *w
        });
        if remaining == 0 {
            entry.waits.remove(&col);
            self.state.locks.unlock(col);
        }
        if entry.waits.is_empty() {
            self.jobs.remove(&job);
        }
    }

    /// Reconcile one column with the current extent: trim overflow, drop, fill.
    fn resize_column(&mut self, col: usize, host: &mut impl Host) {
        for token in self.state.grid.trim_column(col) {
            host.destroy_token(token.id);
        }
        self.state.locks.lock(col);
        self.drop_step(col, None, host);
    }

    /// Handle every column that became free since the last drain.
    fn drain(&mut self, host: &mut impl Host) {
        while let Some(col) = self.state.locks.pop_freed() {
            if self.state.pending_resize.remove(&col) {
                debug!(col, "column free, running deferred resize");
                self.resize_column(col, host);
            } else {
                self.check_matches(host);
            }
        }
    }

    fn schedule(&mut self, host: &mut impl Host, tween: Tween, step: Step) -> Ticket {
        let ticket = self.ticket(step);
        host.animate(ticket, tween);
        ticket
    }

    fn wait(&mut self, host: &mut impl Host, ms: u32, step: Step) -> Ticket {
        let ticket = self.ticket(step);
        host.delay(ticket, ms);
        ticket
    }

    fn ticket(&mut self, step: Step) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.steps.insert(ticket, step);
        ticket
    }

    fn radii(&self) -> BlastRadii {
        BlastRadii {
            remove: self.settings.radius_remove,
            anim: self.settings.radius_anim,
        }
    }
}

fn move_to(at: Coord) -> Property {
    Property::MoveTo {
        col: at.col as f32,
        row: at.row as f32,
    }
}
