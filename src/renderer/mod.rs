//! Renderer: the deterministic rasterizer.
//!
//! Takes a flattened stage snapshot and paints it onto a fixed-size cell
//! grid. The first frame after construction (or `invalidate`) is a full
//! frame; every later frame is a diff against the previous grid so the
//! player only repaints what changed.
//!
//! The renderer knows nothing about time, timelines or scenes.

use std::f64::consts::TAU;

use crate::stage::{Sprite, Stage, Visual};
use crate::types::{Cell, CellChange, Frame, Style, TerminalContract};

/// Below this opacity a sprite is not drawn.
const HIDDEN_OPACITY: f64 = 0.15;
/// Below this opacity a sprite is drawn dim.
const DIM_OPACITY: f64 = 0.5;
/// At or below this scale a sprite is not drawn.
const HIDDEN_SCALE: f64 = 0.05;
/// Glyphs scaled at least this much are drawn as a ring of that glyph.
const RING_SCALE: f64 = 2.0;

pub struct Renderer {
    contract: TerminalContract,
    prev: Option<Vec<Vec<Cell>>>,
}

impl Renderer {
    pub fn new(contract: TerminalContract) -> Self {
        Renderer {
            contract,
            prev: None,
        }
    }

    pub fn contract(&self) -> TerminalContract {
        self.contract
    }

    /// Force the next frame to be a full frame.
    pub fn invalidate(&mut self) {
        self.prev = None;
    }

    /// Rasterize the stage and return what changed since the last frame.
    pub fn frame(&mut self, stage: &Stage) -> Frame {
        let grid = Self::rasterize(&stage.snapshot(), &self.contract);
        let frame = match &self.prev {
            None => Frame::Full {
                cells: grid.clone(),
            },
            Some(prev) => Frame::Diff {
                changes: Self::diff(prev, &grid),
            },
        };
        self.prev = Some(grid);
        frame
    }

    /// Rasterize sprites onto a fixed-size cell grid.
    ///
    /// Sprites are painted in layer order, so higher layers paint over lower
    /// ones; within a layer, later sprites win.
    pub fn rasterize(sprites: &[Sprite], contract: &TerminalContract) -> Vec<Vec<Cell>> {
        let w = contract.width as usize;
        let h = contract.height as usize;
        let mut grid = vec![vec![Cell::default(); w]; h];

        let mut ordered: Vec<&Sprite> = sprites.iter().collect();
        ordered.sort_by_key(|s| s.layer);

        for sprite in ordered {
            if sprite.opacity < HIDDEN_OPACITY || sprite.scale <= HIDDEN_SCALE {
                continue;
            }
            let style = Style {
                fg: sprite.fg,
                bg: None,
                bold: false,
                dim: sprite.opacity < DIM_OPACITY,
            };
            let x = sprite.position.x.round() as i64;
            let y = sprite.position.y.round() as i64;

            match &sprite.visual {
                Visual::Group => {}
                Visual::Glyph(ch) if sprite.scale >= RING_SCALE => {
                    let (cx, cy) = (sprite.position.x, sprite.position.y);
                    let r = sprite.scale - 1.0;
                    // Cells are roughly twice as tall as wide.
                    let samples = ((TAU * r * 2.0).ceil() as usize).max(8);
                    for i in 0..samples {
                        let a = TAU * i as f64 / samples as f64;
                        let px = (cx + 2.0 * r * a.cos()).round() as i64;
                        let py = (cy + r * a.sin()).round() as i64;
                        put(&mut grid, px, py, *ch, &style);
                    }
                }
                Visual::Glyph(ch) => put(&mut grid, x, y, *ch, &style),
                Visual::Text(text) => {
                    for (i, ch) in text.chars().enumerate() {
                        put(&mut grid, x + i as i64, y, ch, &style);
                    }
                }
                Visual::Art(lines) => {
                    for (row, line) in lines.iter().enumerate() {
                        for (col, ch) in line.chars().enumerate() {
                            // Spaces in art are transparent.
                            if ch != ' ' {
                                put(&mut grid, x + col as i64, y + row as i64, ch, &style);
                            }
                        }
                    }
                }
            }
        }

        grid
    }

    /// Compute a cell-level diff between two grids.
    fn diff(prev: &[Vec<Cell>], next: &[Vec<Cell>]) -> Vec<CellChange> {
        let mut changes = Vec::new();
        for (y, (prev_row, next_row)) in prev.iter().zip(next.iter()).enumerate() {
            for (x, (prev_cell, next_cell)) in prev_row.iter().zip(next_row.iter()).enumerate() {
                if prev_cell != next_cell {
                    changes.push(CellChange {
                        x: x as u16,
                        y: y as u16,
                        cell: next_cell.clone(),
                    });
                }
            }
        }
        changes
    }
}

fn put(grid: &mut [Vec<Cell>], x: i64, y: i64, ch: char, style: &Style) {
    if x < 0 || y < 0 {
        return;
    }
    if let Some(cell) = grid.get_mut(y as usize).and_then(|row| row.get_mut(x as usize)) {
        *cell = Cell {
            ch,
            style: style.clone(),
        };
    }
}
