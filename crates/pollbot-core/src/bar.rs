//! Proportional tally bar renderer.
//!
//! Maps a percentage onto a fixed number of cells using full blocks, one
//! eighth-precision partial block and blank padding, colored by tier and
//! wrapped in thin boundary glyphs.

use std::num::NonZeroUsize;

use crate::format::COLOR;

const FULL_CELL: char = '█';

/// Partial cell glyphs indexed by eighths (index 0 draws nothing).
const PARTIAL_CELLS: [&str; 8] = ["", "▏", "▎", "▍", "▌", "▋", "▊", "▉"];

const LEFT_EDGE: &str = "\x0301▕\x03";
const RIGHT_EDGE: &str = "\x0301▏\x03";

/// Color tier of a bar, chosen from the percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarColor {
    Maroon,
    Orange,
    Yellow,
    LightGreen,
    Cyan,
    LightCyan,
}

impl BarColor {
    pub fn for_percent(percent: f64) -> Self {
        if percent < 25.0 {
            BarColor::Maroon
        } else if percent < 50.0 {
            BarColor::Orange
        } else if percent < 66.0 {
            BarColor::Yellow
        } else if percent < 85.0 {
            BarColor::LightGreen
        } else if percent < 100.0 {
            BarColor::Cyan
        } else {
            BarColor::LightCyan
        }
    }

    /// mIRC color number.
    pub fn code(self) -> &'static str {
        match self {
            BarColor::Maroon => "05",
            BarColor::Orange => "07",
            BarColor::Yellow => "08",
            BarColor::LightGreen => "09",
            BarColor::Cyan => "10",
            BarColor::LightCyan => "11",
        }
    }
}

/// Clamp a percentage into `[0, 100]`; NaN becomes 0.
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// Render a `width`-cell bar filled to `percent`.
///
/// Out-of-range percentages are clamped (see [`clamp_percent`]). The visible
/// cell count between the edges is always exactly `width`.
pub fn render_bar(width: NonZeroUsize, percent: f64) -> String {
    let width = width.get();
    let percent = clamp_percent(percent);

    let filled = percent * width as f64 / 100.0;
    let blocks = (filled.floor() as usize).min(width);
    let eighths = (((filled - filled.floor()) * 8.0).floor() as usize).min(7);
    let partial = if blocks < width { PARTIAL_CELLS[eighths] } else { "" };
    let empty = width - blocks - usize::from(!partial.is_empty());

    let color = BarColor::for_percent(percent).code();
    let mut bar = String::with_capacity(width * 3 + 24);
    bar.push_str(LEFT_EDGE);
    bar.push_str(COLOR);
    bar.push_str(color);
    bar.extend(std::iter::repeat_n(FULL_CELL, blocks));
    bar.push_str(partial);
    bar.extend(std::iter::repeat_n(' ', empty));
    bar.push_str(RIGHT_EDGE);
    bar
}
