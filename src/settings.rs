//! Engine configuration: tile geometry, swipe thresholds, bomb radii, colour count.

use thiserror::Error;

/// Largest number of colour classes the front-end has palette entries for.
pub const MAX_COLOR_KINDS: u8 = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Pixel (or terminal-cell) width of one grid cell.
    pub tile_width: f32,
    pub tile_height: f32,
    /// Gem sprite size relative to its tile.
    pub gem_scale: f32,
    /// Fraction of a tile that must be visible for a partial row/column to count.
    pub tile_visibility_threshold: f32,
    pub swipe_min_distance: f32,
    pub swipe_min_time_ms: u64,
    pub swipe_max_time_ms: u64,
    /// Chebyshev radius a bomb clears.
    pub radius_remove: usize,
    /// Chebyshev radius a bomb's shockwave pushes (outside `radius_remove`).
    pub radius_anim: usize,
    /// Run length from which a bomb is spawned at the run's anchor.
    pub bomb_threshold: usize,
    pub color_kinds: u8,
    /// RNG seed for token colours; None draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tile_width: 80.0,
            tile_height: 80.0,
            gem_scale: 80.0 / 105.0,
            tile_visibility_threshold: 1.0 / 3.0,
            swipe_min_distance: 20.0,
            swipe_min_time_ms: 100,
            swipe_max_time_ms: 1000,
            radius_remove: 1,
            radius_anim: 4,
            bomb_threshold: 4,
            color_kinds: MAX_COLOR_KINDS,
            seed: None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("tile size must be positive, got {width}x{height}")]
    TileSize { width: f32, height: f32 },
    #[error("gem scale must be positive, got {0}")]
    GemScale(f32),
    #[error("visibility threshold must be in [0, 1), got {0}")]
    VisibilityThreshold(f32),
    #[error("swipe distance must be positive, got {0}")]
    SwipeDistance(f32),
    #[error("swipe min time {min}ms exceeds max time {max}ms")]
    SwipeWindow { min: u64, max: u64 },
    #[error("colour kinds must be in 1..={MAX_COLOR_KINDS}, got {0}")]
    ColorKinds(u8),
    #[error("bomb threshold must be at least 3, got {0}")]
    BombThreshold(usize),
    #[error("animation radius {anim} is smaller than removal radius {remove}")]
    Radii { remove: usize, anim: usize },
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.tile_width > 0.0 && self.tile_height > 0.0) {
            return Err(SettingsError::TileSize {
                width: self.tile_width,
                height: self.tile_height,
            });
        }
        if self.gem_scale <= 0.0 {
            return Err(SettingsError::GemScale(self.gem_scale));
        }
        if !(0.0..1.0).contains(&self.tile_visibility_threshold) {
            return Err(SettingsError::VisibilityThreshold(
                self.tile_visibility_threshold,
            ));
        }
        // A zero threshold would turn a still press into a swipe.
        if self.swipe_min_distance.is_nan() || self.swipe_min_distance <= 0.0 {
            return Err(SettingsError::SwipeDistance(self.swipe_min_distance));
        }
        if self.swipe_min_time_ms > self.swipe_max_time_ms {
            return Err(SettingsError::SwipeWindow {
                min: self.swipe_min_time_ms,
                max: self.swipe_max_time_ms,
            });
        }
        if self.color_kinds == 0 || self.color_kinds > MAX_COLOR_KINDS {
            return Err(SettingsError::ColorKinds(self.color_kinds));
        }
        if self.bomb_threshold < 3 {
            return Err(SettingsError::BombThreshold(self.bomb_threshold));
        }
        if self.radius_anim < self.radius_remove {
            return Err(SettingsError::Radii {
                remove: self.radius_remove,
                anim: self.radius_anim,
            });
        }
        Ok(())
    }

    /// (rows, cols) that fit a viewport of the given size.
    ///
    /// A trailing partial tile counts once at least `1 - threshold` of it is visible.
    pub fn grid_extent(&self, width: f32, height: f32) -> (usize, usize) {
        let slack = 1.0 - self.tile_visibility_threshold;
        let fit = |dim: f32, tile: f32| (dim / tile + slack).floor().max(0.0) as usize;
        (
            fit(height, self.tile_height),
            fit(width, self.tile_width),
        )
    }

    /// Viewport size that yields exactly `rows` x `cols` under [`Self::grid_extent`].
    pub fn viewport_for(&self, rows: usize, cols: usize) -> (f32, f32) {
        (
            cols as f32 * self.tile_width,
            rows as f32 * self.tile_height,
        )
    }
}
