//! Value types shared across the reel. Colors and points are what timelines
//! animate on the stage; cells and frames are what the renderer hands the
//! player.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Named(NamedColor),
    Rgb { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    /// Resolve to RGB components. Named colors use the xterm defaults.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Rgb { r, g, b } => (r, g, b),
            Color::Named(n) => match n {
                NamedColor::Black => (0, 0, 0),
                NamedColor::Red => (205, 0, 0),
                NamedColor::Green => (0, 205, 0),
                NamedColor::Yellow => (205, 205, 0),
                NamedColor::Blue => (0, 0, 238),
                NamedColor::Magenta => (205, 0, 205),
                NamedColor::Cyan => (0, 205, 205),
                NamedColor::White => (229, 229, 229),
            },
        }
    }

    /// Component-wise linear blend between two colors.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let (r0, g0, b0) = self.to_rgb();
        let (r1, g1, b1) = other.to_rgb();
        let mix = |a: u8, b: u8| -> u8 {
            (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8
        };
        Color::Rgb {
            r: mix(r0, r1),
            g: mix(g0, g1),
            b: mix(b0, b1),
        }
    }
}

/// How one cell is drawn. `dim` is how faded nodes reach the terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub dim: bool,
}

/// A position on the stage, in terminal cells. Fractional values are kept so
/// slow drifts interpolate smoothly; the renderer rounds when rasterizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// The canvas size the show is laid out for, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalContract {
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            style: Style::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    pub x: u16,
    pub y: u16,
    pub cell: Cell,
}

/// One rendered frame: the whole grid the first time, then only what changed.
#[derive(Debug, Clone)]
pub enum Frame {
    Full { cells: Vec<Vec<Cell>> },
    Diff { changes: Vec<CellChange> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_blends_each_channel() {
        let a = Color::rgb(0, 100, 200);
        let b = Color::rgb(100, 200, 0);
        assert_eq!(a.lerp(b, 0.5), Color::rgb(50, 150, 100));
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn named_colors_blend_through_rgb() {
        let black = Color::Named(NamedColor::Black);
        let white = Color::rgb(255, 255, 255);
        assert_eq!(black.lerp(white, 1.0), white);
    }

    #[test]
    fn color_deserializes_named_or_rgb() {
        let named: Color = serde_json::from_str("\"magenta\"").unwrap();
        assert_eq!(named, Color::Named(NamedColor::Magenta));
        let rgb: Color = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
        assert_eq!(rgb, Color::rgb(1, 2, 3));
    }
}
