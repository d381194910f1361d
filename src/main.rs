//! Jeweltui: match-3 with bombs and a board that follows the terminal size.

mod app;
mod input;
mod stage;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use jeweltui::Settings;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    let settings = args.settings();
    settings.validate().context("invalid settings")?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    tracing::info!(?settings, "starting");
    let mut app = App::new(settings, theme, args.no_animation);
    app.run()?;
    Ok(())
}

/// The terminal belongs to the board, so logs only go to a file.
fn init_logging(path: &std::path::Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jeweltui=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

/// Match-3 in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "jeweltui",
    version,
    about = "Match-3 in the terminal: swap neighbours, line up three or more, set off bombs.",
    long_about = "Jeweltui is a terminal match-3 game.\n\n\
        Swap two neighbouring gems to line up three or more of a colour. Runs of four or more \
        leave a bomb behind; a bomb caught in a run clears everything around it. The board \
        grows and shrinks with the terminal.\n\n\
        CONTROLS:\n  Mouse       Click to select, click a neighbour to swap, or drag to swipe\n  \
        Arrows/hjkl Move cursor   Enter/Space Select at cursor   Q / Esc Quit"
)]
pub struct Args {
    /// Tile width in terminal columns.
    #[arg(long, default_value = "6", value_name = "COLS")]
    pub tile_width: u16,

    /// Tile height in terminal rows.
    #[arg(long, default_value = "3", value_name = "ROWS")]
    pub tile_height: u16,

    /// Fraction of a tile that may be cut off at the edge and still count as a column or row.
    #[arg(long, default_value = "0.3333", value_name = "FRACTION")]
    pub visibility_threshold: f32,

    /// Minimum drag, in terminal cells, for a press to count as a swipe.
    #[arg(long, default_value = "2.0", value_name = "CELLS")]
    pub swipe_distance: f32,

    /// Shortest press that can be a swipe.
    #[arg(long, default_value = "100", value_name = "MS")]
    pub swipe_min_ms: u64,

    /// Longest press that can be a swipe.
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub swipe_max_ms: u64,

    /// Number of gem colours (1..=6).
    #[arg(short, long, default_value = "6", value_name = "N")]
    pub colors: u8,

    /// Run length that leaves a bomb behind.
    #[arg(long, default_value = "4", value_name = "N")]
    pub bomb_threshold: usize,

    /// Seed for the gem generator; random if not set.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// btop theme file to take gem colours from. One Dark when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Gem colours: the theme's own, high-contrast, or a colourblind-safe set.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Write debug logs to this file (filter with RUST_LOG).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Skip animations: every step lands on the next frame.
    #[arg(long)]
    pub no_animation: bool,
}

impl Args {
    /// Engine settings; board units are terminal cells.
    pub fn settings(&self) -> Settings {
        Settings {
            tile_width: f32::from(self.tile_width),
            tile_height: f32::from(self.tile_height),
            tile_visibility_threshold: self.visibility_threshold,
            swipe_min_distance: self.swipe_distance,
            swipe_min_time_ms: self.swipe_min_ms,
            swipe_max_time_ms: self.swipe_max_ms,
            bomb_threshold: self.bomb_threshold,
            color_kinds: self.colors,
            seed: self.seed,
            ..Settings::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
