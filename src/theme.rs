//! Gem palette. Colours come from One Dark or from a btop theme file.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Gem and board colours, One Dark by default.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Gem colours by kind index (0..=5): green, yellow, red, blue, magenta, cyan.
    pub gems: [Color; 6],
    pub bomb: Color,
    /// Board background.
    pub bg: Color,
    /// Tile checkerboard / grid.
    pub div_line: Color,
    /// Status line text.
    pub main_fg: Color,
    /// Selection and cursor highlight.
    pub title: Color,
    /// Explosion flash.
    pub flash: Color,
    /// Locked column markers.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

const ONEDARK_GEMS: [Color; 6] = [
    rgb(0x98C379),
    rgb(0xE5C07B),
    rgb(0xE06C75),
    rgb(0x61AFEF),
    rgb(0xC678DD),
    rgb(0x56B6C2),
];

impl Theme {
    pub fn onedark_default() -> Self {
        Self {
            gems: ONEDARK_GEMS,
            bomb: rgb(0xD19A66),
            bg: rgb(0x282C34),
            div_line: rgb(0x31353F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
            flash: rgb(0xFFFFFF),
            inactive_fg: rgb(0x5C6370),
        }
    }

    /// Reads gem and board colours from a btop theme, then applies `palette`.
    /// A missing file means One Dark.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.gems = [
                    rgb(0x00FF00),
                    rgb(0xFFFF00),
                    rgb(0xFF0000),
                    rgb(0x0088FF),
                    rgb(0xFF00FF),
                    rgb(0x00FFFF),
                ];
                self.bomb = rgb(0xFFFFFF);
            }
            crate::Palette::Colorblind => {
                self.gems = [
                    rgb(0x0077BB),
                    rgb(0xEE7733),
                    rgb(0x009988),
                    rgb(0xCC3311),
                    rgb(0xEE3377),
                    rgb(0xBBBB00),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let base = Self::onedark_default();
        let gem_keys: [&[&str]; 6] = [
            &["mem_box", "cpu_start"],
            &["title", "cpu_mid"],
            &["cpu_end", "temp_end"],
            &["cpu_box"],
            &["net_box"],
            &["hi_fg", "proc_misc"],
        ];
        let mut gems = base.gems;
        for (gem, keys) in gems.iter_mut().zip(gem_keys) {
            if let Some(c) = keys.iter().find_map(|&k| get(k)) {
                *gem = c;
            }
        }
        Self {
            gems,
            bomb: get("temp_mid").unwrap_or(base.bomb),
            bg: get("main_bg").unwrap_or(base.bg),
            div_line: get("meter_bg").or_else(|| get("div_line")).unwrap_or(base.div_line),
            main_fg: get("main_fg").unwrap_or(base.main_fg),
            title: get("title").unwrap_or(base.title),
            flash: get("selected_fg").unwrap_or(base.flash),
            inactive_fg: get("inactive_fg").unwrap_or(base.inactive_fg),
        }
    }

    #[inline]
    pub fn gem_color(&self, index: u8) -> Color {
        self.gems[(index as usize) % self.gems.len()]
    }
}

/// `theme[key]="value"` lines, quotes optional; everything else is skipped.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// `#RRGGBB`, or the `#RGB` short form.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_long_form() {
        assert_eq!(parse_hex("#E06C75").unwrap(), Color::Rgb(0xE0, 0x6C, 0x75));
    }

    #[test]
    fn test_parse_hex_short_form() {
        assert_eq!(parse_hex("a0f").unwrap(), Color::Rgb(0xAA, 0x00, 0xFF));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGHHII").is_err());
    }

    #[test]
    fn test_parse_theme_file_skips_noise() {
        let map = parse_theme_file("# comment\ntheme[cpu_box] = \"#61AFEF\"\nfoo=bar\ntheme[title]=\"\"");
        assert_eq!(map.len(), 1);
        assert_eq!(map["cpu_box"], "#61AFEF");
    }

    #[test]
    fn test_theme_file_overrides_gems() {
        let map = parse_theme_file("theme[net_box]='#010203'\ntheme[main_bg]=\"#000000\"");
        let theme = Theme::from_map(&map);
        assert_eq!(theme.gem_color(4), Color::Rgb(1, 2, 3));
        assert_eq!(theme.bg, Color::Rgb(0, 0, 0));
        assert_eq!(theme.gem_color(0), ONEDARK_GEMS[0]);
    }

    #[test]
    fn test_palette_swaps_gems_only() {
        let mut theme = Theme::default();
        theme.apply_palette(crate::Palette::Colorblind);
        assert_eq!(theme.gem_color(0), rgb(0x0077BB));
        assert_eq!(theme.bg, Theme::default().bg);
    }
}
