//! Layout and drawing: gem board, keyboard cursor, status line and explosion flash.

use crate::stage::{PX_PER_CELL, Sprite, Stage};
use crate::theme::Theme;
use jeweltui::cascade::EXPLOSION_UNIFORM;
use jeweltui::{Cascade, Coord, Kind, Phase};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Rows reserved under the board for the status line.
pub const STATUS_HEIGHT: u16 = 1;
const FLASH_MS: u32 = 600;
const BOMB_GLYPH: &str = "✹";

/// Explosion effect in flight, keyed by the stage flash it was built for.
pub struct FlashFx {
    serial: u64,
    effect: Effect,
}

/// Everything one frame needs.
pub struct View<'a> {
    pub cascade: &'a Cascade,
    pub stage: &'a Stage,
    pub theme: &'a Theme,
    pub cursor: Option<Coord>,
    pub no_animation: bool,
}

/// Board rect and status rect for a terminal area.
pub fn split(area: Rect) -> (Rect, Rect) {
    let [board, status] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(STATUS_HEIGHT)]).areas(area);
    (board, status)
}

pub fn draw(frame: &mut Frame, view: &View<'_>, flash: &mut Option<FlashFx>, delta_ms: u32) {
    let (board, status) = split(frame.area());
    let (tw, th) = tile_size(view.cascade);
    draw_board(frame.buffer_mut(), board, view, tw, th);
    draw_status(frame, status, view);
    if !view.no_animation {
        apply_flash(frame, board, view, flash, delta_ms, tw, th);
    }
}

fn tile_size(cascade: &Cascade) -> (u16, u16) {
    let s = cascade.settings();
    (s.tile_width.max(1.0) as u16, s.tile_height.max(1.0) as u16)
}

fn draw_board(buf: &mut Buffer, board: Rect, view: &View<'_>, tw: u16, th: u16) {
    let theme = view.theme;
    let grid = view.cascade.grid();
    buf.set_style(board, Style::default().bg(theme.bg));

    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            if (row + col) % 2 == 0 {
                let tile = tile_rect(board, col as f32, row as f32, tw, th);
                buf.set_style(tile, Style::default().bg(theme.div_line));
            }
        }
    }

    let scale = view.cascade.settings().gem_scale;
    let mut sprites: Vec<&Sprite> = view.stage.sprites().map(|(_, s)| s).collect();
    // Selected first so the highlight sits under neighbours sliding past.
    sprites.sort_by_key(|s| !s.selected);
    for sprite in sprites {
        if sprite.selected {
            let tile = tile_rect(board, sprite.col, sprite.row, tw, th);
            buf.set_style(tile, Style::default().bg(theme.title));
        }
        draw_gem(buf, board, sprite, theme, scale, tw, th);
    }

    if let Some(cursor) = view.cursor {
        let tile = tile_rect(board, cursor.col as f32, cursor.row as f32, tw, th);
        if tile.width >= 2 && tile.height >= 1 {
            let mid = tile.y + tile.height / 2;
            let style = Style::default().fg(theme.title);
            buf[(tile.x, mid)].set_symbol("[").set_style(style);
            buf[(tile.right() - 1, mid)].set_symbol("]").set_style(style);
        }
    }
}

fn draw_gem(
    buf: &mut Buffer,
    board: Rect,
    sprite: &Sprite,
    theme: &Theme,
    gem_scale: f32,
    tw: u16,
    th: u16,
) {
    let w = f32::from(tw) * gem_scale * sprite.scale;
    let h = f32::from(th) * gem_scale * sprite.scale;
    if w < 0.5 || h < 0.5 {
        return;
    }
    let cx = (sprite.col + 0.5) * f32::from(tw) + sprite.dx / PX_PER_CELL;
    let cy = (sprite.row + 0.5) * f32::from(th) + sprite.dy / PX_PER_CELL;
    let left = (cx - w / 2.0).round() as i32 + i32::from(board.x);
    let top = (cy - h / 2.0).round() as i32 + i32::from(board.y);
    let gem = clip(board, left, top, w.round().max(1.0) as i32, h.round().max(1.0) as i32);
    if gem.is_empty() {
        return;
    }
    let color = match sprite.kind {
        Kind::Color(i) => theme.gem_color(i),
        Kind::Bomb => theme.bomb,
    };
    buf.set_style(gem, Style::default().bg(color));
    if sprite.kind == Kind::Bomb {
        let centre = Position::new(gem.x + gem.width / 2, gem.y + gem.height / 2);
        buf[centre]
            .set_symbol(BOMB_GLYPH)
            .set_style(Style::default().fg(theme.bg).bg(color));
    }
}

/// Terminal rect of the tile at (col, row), clipped to the board.
fn tile_rect(board: Rect, col: f32, row: f32, tw: u16, th: u16) -> Rect {
    let left = (col * f32::from(tw)).round() as i32 + i32::from(board.x);
    let top = (row * f32::from(th)).round() as i32 + i32::from(board.y);
    clip(board, left, top, i32::from(tw), i32::from(th))
}

/// Intersection of a possibly off-screen rect with `bounds`.
fn clip(bounds: Rect, x: i32, y: i32, w: i32, h: i32) -> Rect {
    let x0 = x.max(i32::from(bounds.x));
    let y0 = y.max(i32::from(bounds.y));
    let x1 = (x + w).min(i32::from(bounds.right()));
    let y1 = (y + h).min(i32::from(bounds.bottom()));
    if x1 <= x0 || y1 <= y0 {
        return Rect::default();
    }
    Rect::new(x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16)
}

fn draw_status(frame: &mut Frame, area: Rect, view: &View<'_>) {
    let theme = view.theme;
    let cascade = view.cascade;
    let grid = cascade.grid();
    let phase = match cascade.phase() {
        Phase::Idle => "ready",
        Phase::SwapPending => "swapping",
        Phase::Resolving => "clearing",
        Phase::Resizing => "resizing",
    };
    let locked: Vec<String> = cascade
        .state()
        .locks
        .locked()
        .map(|c| c.to_string())
        .collect();
    let mut spans = vec![
        Span::styled(" Jeweltui ", Style::default().fg(theme.title)),
        Span::styled(
            format!(" {}x{}  {phase} ", grid.cols(), grid.rows()),
            Style::default().fg(theme.main_fg),
        ),
    ];
    if !locked.is_empty() {
        spans.push(Span::styled(
            format!(" locked: {} ", locked.join(",")),
            Style::default().fg(theme.inactive_fg),
        ));
    }
    spans.push(Span::styled(
        " | q quit",
        Style::default().fg(theme.inactive_fg),
    ));
    Paragraph::new(Line::from(spans))
        .style(Style::default().bg(theme.bg))
        .render(area, frame.buffer_mut());
}

/// Create or advance the explosion flash (TachyonFX: blast area fades back from white).
fn apply_flash(
    frame: &mut Frame,
    board: Rect,
    view: &View<'_>,
    flash: &mut Option<FlashFx>,
    delta_ms: u32,
    tw: u16,
    th: u16,
) {
    if let Some(current) = view.stage.flash(EXPLOSION_UNIFORM) {
        let stale = flash.as_ref().is_none_or(|f| f.serial != current.serial);
        if stale && current.value < 1.0 {
            let radius = view.cascade.settings().radius_anim as f32 + 0.5;
            let origin = current.origin;
            let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
                let col = f32::from(pos.x.saturating_sub(board.x)) / f32::from(tw);
                let row = f32::from(pos.y.saturating_sub(board.y)) / f32::from(th);
                let dc = col - (origin.col as f32 + 0.5);
                let dr = row - (origin.row as f32 + 0.5);
                dc.hypot(dr) <= radius
            }));
            let effect = fx::fade_from(
                view.theme.flash,
                view.theme.flash,
                (FLASH_MS, Interpolation::QuadOut),
            )
            .with_filter(filter)
            .with_area(board);
            *flash = Some(FlashFx {
                serial: current.serial,
                effect,
            });
        }
    }

    if let Some(f) = flash {
        frame.render_effect(&mut f.effect, board, TfxDuration::from_millis(delta_ms));
        if f.effect.done() {
            *flash = None;
        }
    }
}
