#![allow(dead_code)]

use jeweltui::host::{Animator, Presenter, Property, Ticket, Tween};
use jeweltui::{Cascade, Coord, Grid, Kind, Settings, Token, TokenId};
use std::collections::{BTreeSet, VecDeque};

#[derive(Debug, Clone)]
pub enum Request {
    Tween(Tween),
    Delay(u32),
}

impl Request {
    pub fn tween(&self) -> Option<&Tween> {
        match self {
            Self::Tween(t) => Some(t),
            Self::Delay(_) => None,
        }
    }
}

/// Host that records everything and plays tickets back on demand.
///
/// Enforces the presenter contract: a token is created once and destroyed once.
#[derive(Debug, Default)]
pub struct Recorder {
    pub queue: VecDeque<(Ticket, Request)>,
    pub live: BTreeSet<TokenId>,
    pub created: Vec<Token>,
    pub destroyed: Vec<TokenId>,
    pub selections: Vec<(TokenId, bool)>,
}

impl Animator for Recorder {
    fn animate(&mut self, ticket: Ticket, tween: Tween) {
        self.queue.push_back((ticket, Request::Tween(tween)));
    }

    fn delay(&mut self, ticket: Ticket, ms: u32) {
        self.queue.push_back((ticket, Request::Delay(ms)));
    }
}

impl Presenter for Recorder {
    fn create_token(&mut self, token: &Token) {
        assert!(self.live.insert(token.id), "token {} created twice", token.id);
        self.created.push(*token);
    }

    fn destroy_token(&mut self, id: TokenId) {
        assert!(self.live.remove(&id), "token {id} destroyed while not live");
        self.destroyed.push(id);
    }

    fn set_selected(&mut self, id: TokenId, selected: bool) {
        self.selections.push((id, selected));
    }
}

impl Recorder {
    pub fn pop(&mut self) -> Option<(Ticket, Request)> {
        self.queue.pop_front()
    }

    /// Complete the oldest outstanding ticket.
    pub fn step(&mut self, cascade: &mut Cascade) -> Option<Request> {
        let (ticket, request) = self.queue.pop_front()?;
        cascade.complete(ticket, self);
        Some(request)
    }

    pub fn tweens(&self) -> impl Iterator<Item = &Tween> {
        self.queue.iter().filter_map(|(_, r)| r.tween())
    }
}

/// Complete tickets until nothing is outstanding.
pub fn settle(cascade: &mut Cascade, rec: &mut Recorder) {
    let mut guard = 0;
    while rec.step(cascade).is_some() {
        guard += 1;
        assert!(guard < 100_000, "cascade did not converge");
    }
    assert_eq!(cascade.outstanding(), 0);
}

/// Board with no runs anywhere: kind = (col + 2*row) % 6.
pub fn pattern_layout(rows: usize, cols: usize) -> Vec<Vec<Option<Kind>>> {
    (0..rows)
        .map(|row| {
            (0..cols)
                .map(|col| Some(Kind::Color(((col + 2 * row) % 6) as u8)))
                .collect()
        })
        .collect()
}

pub fn with_overrides(
    mut layout: Vec<Vec<Option<Kind>>>,
    overrides: &[(usize, usize, Kind)],
) -> Vec<Vec<Option<Kind>>> {
    for &(col, row, kind) in overrides {
        layout[row][col] = Some(kind);
    }
    layout
}

/// Started cascade over `layout`, with initial visuals created and the start-up check run.
pub fn started(layout: &[Vec<Option<Kind>>], seed: u64) -> (Cascade, Recorder) {
    let settings = Settings {
        seed: Some(seed),
        ..Settings::default()
    };
    let grid = Grid::from_layout(layout, settings.color_kinds, settings.seed);
    let mut cascade = Cascade::with_grid(settings, grid);
    let mut rec = Recorder::default();
    cascade.start(&mut rec);
    settle(&mut cascade, &mut rec);
    (cascade, rec)
}

pub fn id_at(cascade: &Cascade, col: usize, row: usize) -> TokenId {
    cascade
        .grid()
        .get(Coord::new(col, row))
        .map(|t| t.id)
        .expect("token present")
}

/// The board is settled: full, coherent, and mirrored exactly by live visuals.
pub fn assert_settled(cascade: &Cascade, rec: &Recorder) {
    let grid = cascade.grid();
    assert!(grid.is_full(), "board has holes");
    assert!(grid.positions_consistent());
    let on_board: BTreeSet<TokenId> = grid.tokens().map(|t| t.id).collect();
    assert_eq!(on_board, rec.live, "visuals diverged from the board");
    assert!(cascade.state().pending_resize.is_empty());
    assert_eq!(cascade.phase(), jeweltui::Phase::Idle);
}

pub fn is_offset(p: &Property) -> bool {
    matches!(p, Property::Offset { .. })
}
