//! Sprite stage: one sprite per token, tween playback per frame, finished tickets out.

use jeweltui::host::{Animator, Easing, Presenter, Property, Ticket, Tween};
use jeweltui::{Coord, Kind, Token, TokenId};
use std::collections::HashMap;
use tachyonfx::Interpolation;

/// Engine offsets are in reference pixels; one terminal cell spans this many.
pub const PX_PER_CELL: f32 = 16.0;

/// Where and how a token is drawn right now, in tile units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub kind: Kind,
    pub col: f32,
    pub row: f32,
    /// Pixel displacement from (col, row).
    pub dx: f32,
    pub dy: f32,
    pub scale: f32,
    pub selected: bool,
}

impl Sprite {
    fn at(token: &Token) -> Self {
        Self {
            kind: token.kind,
            col: token.pos.col as f32,
            row: token.pos.row as f32,
            dx: 0.0,
            dy: 0.0,
            scale: 1.0,
            selected: false,
        }
    }
}

/// A uniform currently being driven, tagged so renderers can tell restarts apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flash {
    pub serial: u64,
    pub origin: Coord,
    pub value: f32,
}

#[derive(Debug)]
struct Playing {
    ticket: Ticket,
    tween: Tween,
    /// Start position per track, captured when the tween begins (used by MoveTo).
    starts: Vec<(f32, f32)>,
    elapsed_ms: f32,
    serial: u64,
}

#[derive(Debug, Default)]
pub struct Stage {
    sprites: HashMap<TokenId, Sprite>,
    playing: Vec<Playing>,
    delays: Vec<(Ticket, f32)>,
    flashes: HashMap<&'static str, Flash>,
    next_serial: u64,
    /// Finish everything on the next tick.
    instant: bool,
}

impl Stage {
    pub fn new(instant: bool) -> Self {
        Self {
            instant,
            ..Self::default()
        }
    }

    pub fn sprites(&self) -> impl Iterator<Item = (&TokenId, &Sprite)> {
        self.sprites.iter()
    }

    #[cfg(test)]
    pub fn sprite(&self, id: TokenId) -> Option<&Sprite> {
        self.sprites.get(&id)
    }

    pub fn flash(&self, name: &str) -> Option<Flash> {
        self.flashes.get(name).copied()
    }

    pub fn is_busy(&self) -> bool {
        !self.playing.is_empty() || !self.delays.is_empty()
    }

    /// Advance every tween and delay by `dt_ms`; returns tickets that finished.
    pub fn tick(&mut self, dt_ms: f32) -> Vec<Ticket> {
        let mut done = Vec::new();

        self.delays.retain_mut(|(ticket, left)| {
            *left -= dt_ms;
            if self.instant || *left <= 0.0 {
                done.push(*ticket);
                false
            } else {
                true
            }
        });

        let mut playing = std::mem::take(&mut self.playing);
        playing.retain_mut(|p| {
            p.elapsed_ms = if self.instant {
                p.tween.total_ms() as f32
            } else {
                p.elapsed_ms + dt_ms
            };
            let (t, finished) = progress(&p.tween, p.elapsed_ms);
            self.apply(p, t);
            if finished {
                if let Some(u) = p.tween.uniform {
                    if self.flashes.get(u.name).is_some_and(|f| f.serial == p.serial) {
                        self.flashes.remove(u.name);
                    }
                }
                done.push(p.ticket);
            }
            !finished
        });
        self.playing = playing;
        done
    }

    fn apply(&mut self, p: &Playing, t: f32) {
        let eased = interpolation(p.tween.easing).alpha(t);
        for (track, &(start_col, start_row)) in p.tween.tracks.iter().zip(&p.starts) {
            let Some(sprite) = self.sprites.get_mut(&track.target) else {
                continue;
            };
            match track.property {
                Property::MoveTo { col, row } => {
                    sprite.col = lerp(start_col, col, eased);
                    sprite.row = lerp(start_row, row, eased);
                }
                Property::Drop { from_row, to_row } => {
                    sprite.row = lerp(from_row, to_row, eased);
                }
                Property::Offset { dx, dy } => {
                    sprite.dx = dx * eased;
                    sprite.dy = dy * eased;
                }
                Property::Scale { from, to } => sprite.scale = lerp(from, to, eased),
            }
        }
        if let Some(u) = p.tween.uniform {
            self.flashes.insert(
                u.name,
                Flash {
                    serial: p.serial,
                    origin: u.origin,
                    value: lerp(u.from, u.to, eased),
                },
            );
        }
    }
}

impl Animator for Stage {
    fn animate(&mut self, ticket: Ticket, tween: Tween) {
        let starts = tween
            .tracks
            .iter()
            .map(|track| {
                self.sprites
                    .get(&track.target)
                    .map_or((0.0, 0.0), |s| (s.col, s.row))
            })
            .collect();
        let serial = self.next_serial;
        self.next_serial += 1;
        let playing = Playing {
            ticket,
            tween,
            starts,
            elapsed_ms: 0.0,
            serial,
        };
        self.apply(&playing, 0.0);
        self.playing.push(playing);
    }

    fn delay(&mut self, ticket: Ticket, ms: u32) {
        self.delays.push((ticket, ms as f32));
    }
}

impl Presenter for Stage {
    fn create_token(&mut self, token: &Token) {
        self.sprites.insert(token.id, Sprite::at(token));
    }

    fn destroy_token(&mut self, id: TokenId) {
        self.sprites.remove(&id);
    }

    fn set_selected(&mut self, id: TokenId, selected: bool) {
        if let Some(sprite) = self.sprites.get_mut(&id) {
            sprite.selected = selected;
        }
    }
}

/// Position within the current leg (0..=1, reversed on yoyo return legs) and whether
/// the tween has run its full course.
fn progress(tween: &Tween, elapsed_ms: f32) -> (f32, bool) {
    let total = tween.total_ms() as f32;
    if tween.duration_ms == 0 || elapsed_ms >= total {
        return (if tween.yoyo { 0.0 } else { 1.0 }, true);
    }
    let leg_ms = tween.duration_ms as f32;
    let leg = (elapsed_ms / leg_ms).floor();
    let t = (elapsed_ms - leg * leg_ms) / leg_ms;
    let returning = tween.yoyo && (leg as u32) % 2 == 1;
    (if returning { 1.0 - t } else { t }, false)
}

fn interpolation(easing: Easing) -> Interpolation {
    match easing {
        Easing::Linear => Interpolation::Linear,
        Easing::CubicOut => Interpolation::CubicOut,
        Easing::BackOut => Interpolation::BackOut,
        Easing::BounceOut => Interpolation::BounceOut,
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
