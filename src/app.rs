//! App: terminal init, main loop, mouse/key/resize handling and ticket plumbing.

use crate::input::{Action, key_to_action};
use crate::stage::Stage;
use crate::theme::Theme;
use crate::ui::{self, FlashFx, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use jeweltui::{Cascade, Coord, Settings};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tracing::debug;

/// Frame pacing while something is animating (~60 FPS).
const FRAME_MS: u64 = 16;
/// Poll timeout when the board is still.
const IDLE_POLL_MS: u64 = 250;

pub struct App {
    cascade: Cascade,
    stage: Stage,
    theme: Theme,
    settings: Settings,
    no_animation: bool,
    /// Keyboard cursor; hidden until a key moves it.
    cursor: Option<Coord>,
    flash: Option<FlashFx>,
    started: Instant,
    last_frame: Instant,
}

impl App {
    pub fn new(settings: Settings, theme: Theme, no_animation: bool) -> Self {
        let now = Instant::now();
        Self {
            // Sized for real once the terminal is up.
            cascade: Cascade::new(settings.clone(), 0.0, 0.0),
            stage: Stage::new(no_animation),
            theme,
            settings,
            no_animation,
            cursor: None,
            flash: None,
            started: now,
            last_frame: now,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        // Board sized to the terminal minus the status line.
        let (cols, rows) = size()?;
        let board = ui::split(Rect::new(0, 0, cols, rows)).0;
        self.cascade = Cascade::new(
            self.settings.clone(),
            f32::from(board.width),
            f32::from(board.height),
        );
        self.cascade.start(&mut self.stage);

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let delta = now.saturating_duration_since(self.last_frame);
            self.last_frame = now;
            let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;

            for ticket in self.stage.tick(delta_ms as f32) {
                self.cascade.complete(ticket, &mut self.stage);
            }

            let view = View {
                cascade: &self.cascade,
                stage: &self.stage,
                theme: &self.theme,
                cursor: self.cursor,
                no_animation: self.no_animation,
            };
            let flash = &mut self.flash;
            terminal.draw(|f| ui::draw(f, &view, flash, delta_ms))?;

            let timeout = if self.stage.is_busy() || self.flash.is_some() {
                Duration::from_millis(FRAME_MS).saturating_sub(now.elapsed())
            } else {
                Duration::from_millis(IDLE_POLL_MS)
            };
            if !event::poll(timeout)? {
                continue;
            }
            while event::poll(Duration::ZERO)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if !self.on_action(key_to_action(key)) {
                            return Ok(());
                        }
                    }
                    Event::Mouse(mouse) => self.on_mouse(mouse),
                    Event::Resize(cols, rows) => {
                        let board = ui::split(Rect::new(0, 0, cols, rows)).0;
                        debug!(cols, rows, "terminal resized");
                        self.cascade.resize(
                            f32::from(board.width),
                            f32::from(board.height),
                            &mut self.stage,
                        );
                        self.clamp_cursor();
                    }
                    _ => {}
                }
            }
        }
    }

    /// False when the user asked to quit.
    fn on_action(&mut self, action: Action) -> bool {
        let grid = self.cascade.grid();
        let (max_col, max_row) = (grid.cols().saturating_sub(1), grid.rows().saturating_sub(1));
        let at = self.cursor.unwrap_or_default();
        match action {
            Action::Quit => return false,
            Action::CursorLeft => self.cursor = Some(Coord::new(at.col.saturating_sub(1), at.row)),
            Action::CursorRight => {
                self.cursor = Some(Coord::new((at.col + 1).min(max_col), at.row));
            }
            Action::CursorUp => self.cursor = Some(Coord::new(at.col, at.row.saturating_sub(1))),
            Action::CursorDown => {
                self.cursor = Some(Coord::new(at.col, (at.row + 1).min(max_row)));
            }
            Action::Tap => {
                let at = *self.cursor.get_or_insert_default();
                self.tap_at(at);
            }
            Action::None => {}
        }
        true
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        // Cell centres, in the board's units (terminal cells).
        let x = f32::from(mouse.column) + 0.5;
        let y = f32::from(mouse.row) + 0.5;
        let t = self.elapsed_ms();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.cascade.pointer_down(x, y, t);
                let col = (x / self.settings.tile_width).floor() as usize;
                let row = (y / self.settings.tile_height).floor() as usize;
                self.tap_at(Coord::new(col, row));
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.cascade.pointer_up(x, y, t, &mut self.stage);
            }
            _ => {}
        }
    }

    fn tap_at(&mut self, at: Coord) {
        if let Some(id) = self.cascade.grid().get(at).map(|t| t.id) {
            self.cascade.tap(id, &mut self.stage);
        }
    }

    fn clamp_cursor(&mut self) {
        let grid = self.cascade.grid();
        if let Some(c) = self.cursor {
            self.cursor = (grid.rows() > 0 && grid.cols() > 0).then(|| {
                Coord::new(c.col.min(grid.cols() - 1), c.row.min(grid.rows() - 1))
            });
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
    }
}
