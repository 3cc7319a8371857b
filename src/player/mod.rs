//! Player: the real-time terminal front end.
//!
//! Drives a [`Show`] from the wall clock, forwards key presses to it and
//! paints each rendered frame. Only cells that changed since the previous
//! frame are written; a resize forces a full repaint.

mod hints;
mod show;

pub use hints::{hints, print_hints, Hint};
pub use show::{Show, ShowStatus};

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::style::Stylize;
use crossterm::{cursor, execute, queue, style, terminal};

use crate::config::{KeyBindings, ShowConfig};
use crate::renderer::Renderer;
use crate::scene::Phase;
use crate::types::{Cell, Color, Frame, NamedColor, Style};

/// Rows reserved above the canvas for the key hints.
const CANVAS_OFFSET: u16 = 1;
/// Longest clock step taken in one frame. A stalled terminal slows the show
/// down rather than skipping through it.
const MAX_STEP: f64 = 0.25;

pub struct Player {
    show: Show,
    renderer: Renderer,
    bindings: KeyBindings,
    frame_period: Duration,
}

impl Player {
    pub fn new(show: Show, config: &ShowConfig) -> Self {
        let renderer = Renderer::new(show.area());
        Self {
            show,
            renderer,
            bindings: config.key_bindings.clone(),
            frame_period: Duration::from_secs_f64(config.frame_period()),
        }
    }

    /// Play the show until the viewer quits. The terminal is restored on
    /// every exit path, including errors and panics.
    pub fn play(&mut self) -> Result<()> {
        let area = self.renderer.contract();
        let (cols, rows) = terminal::size()?;
        // the canvas plus the hint row and the status row
        let rows_needed = area.height + 2;
        if cols < area.width || rows < rows_needed {
            bail!(
                "Terminal too small for the show: it needs {}x{} but this one is {cols}x{rows}",
                area.width,
                rows_needed,
            );
        }

        let mut out = io::stdout();
        let result = {
            let _screen = Screen::enter(&mut out)?;
            self.run_loop(&mut out)
        };
        self.show.stop();
        result
    }

    fn run_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        self.render_hints(stdout)?;
        let mut last = Instant::now();

        loop {
            if event::poll(self.frame_period)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if self.bindings.is_quit(&key) {
                            tracing::info!("quit requested");
                            break;
                        }
                        if self.bindings.is_advance(&key) {
                            self.show.trigger();
                        }
                    }
                    Event::Resize(_, _) => {
                        queue!(stdout, terminal::Clear(terminal::ClearType::All))?;
                        self.renderer.invalidate();
                        self.render_hints(stdout)?;
                    }
                    _ => {}
                }
            }

            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f64().min(MAX_STEP);
            last = now;
            self.show.advance(dt);

            let frame = self.renderer.frame(self.show.stage());
            self.paint(stdout, &frame)?;
            self.render_status(stdout)?;
        }

        Ok(())
    }

    fn render_hints(&self, stdout: &mut io::Stdout) -> Result<()> {
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
        )?;
        print_hints(stdout, &hints(&self.bindings))?;
        stdout.flush()?;
        Ok(())
    }

    fn paint(&self, stdout: &mut io::Stdout, frame: &Frame) -> Result<()> {
        let print = |out: &mut io::Stdout, x: u16, y: u16, cell: &Cell| -> io::Result<()> {
            let styled = style::StyledContent::new(style::ContentStyle::from(&cell.style), cell.ch);
            queue!(out, cursor::MoveTo(x, y + CANVAS_OFFSET), style::PrintStyledContent(styled))
        };
        match frame {
            Frame::Full { cells } => {
                for (y, row) in cells.iter().enumerate() {
                    for (x, cell) in row.iter().enumerate() {
                        print(stdout, x as u16, y as u16, cell)?;
                    }
                }
            }
            Frame::Diff { changes } => {
                for change in changes {
                    print(stdout, change.x, change.y, &change.cell)?;
                }
            }
        }
        stdout.flush()?;
        Ok(())
    }

    fn render_status(&self, stdout: &mut io::Stdout) -> Result<()> {
        let row = self.renderer.contract().height + CANVAS_OFFSET;
        if row >= terminal::size()?.1 {
            return Ok(());
        }
        let line = status_line(&self.show.status()).dim();
        queue!(
            stdout,
            cursor::MoveTo(0, row),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::PrintStyledContent(line),
        )?;
        stdout.flush()?;
        Ok(())
    }
}

/// Raw mode and the alternate screen for as long as it lives.
struct Screen;

impl Screen {
    fn enter(out: &mut io::Stdout) -> Result<Self> {
        terminal::enable_raw_mode()?;
        let screen = Screen;
        execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;
        Ok(screen)
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn status_line(status: &ShowStatus) -> String {
    let note = match (status.is_transitioning, status.phase) {
        (true, _) => "",
        (false, Some(Phase::Idle)) => " | waiting for you",
        (false, Some(Phase::Transitioning)) if status.index + 1 == status.total => " | the end",
        _ => "",
    };
    format!(" Scene {}/{} {}{} ", status.index + 1, status.total, status.scene, note)
}

impl From<&Style> for style::ContentStyle {
    fn from(s: &Style) -> Self {
        let mut cs = style::ContentStyle {
            foreground_color: s.fg.map(term_color),
            background_color: s.bg.map(term_color),
            ..Default::default()
        };
        for (on, attribute) in [(s.bold, style::Attribute::Bold), (s.dim, style::Attribute::Dim)] {
            if on {
                cs.attributes.set(attribute);
            }
        }
        cs
    }
}

fn term_color(color: Color) -> style::Color {
    use style::Color as Term;
    let Color::Named(named) = color else {
        let (r, g, b) = color.to_rgb();
        return Term::Rgb { r, g, b };
    };
    match named {
        NamedColor::Black => Term::Black,
        NamedColor::Red => Term::DarkRed,
        NamedColor::Green => Term::DarkGreen,
        NamedColor::Yellow => Term::DarkYellow,
        NamedColor::Blue => Term::DarkBlue,
        NamedColor::Magenta => Term::DarkMagenta,
        NamedColor::Cyan => Term::DarkCyan,
        NamedColor::White => Term::Grey,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(index: usize, phase: Phase, is_transitioning: bool) -> ShowStatus {
        ShowStatus {
            scene: "cake".into(),
            index,
            total: 5,
            phase: Some(phase),
            is_transitioning,
        }
    }

    #[test]
    fn status_line_nudges_the_viewer() {
        assert_eq!(status_line(&status(3, Phase::Idle, false)), " Scene 4/5 cake | waiting for you ");
        assert_eq!(status_line(&status(3, Phase::Animating, false)), " Scene 4/5 cake ");
        assert_eq!(status_line(&status(4, Phase::Transitioning, false)), " Scene 5/5 cake | the end ");
        assert_eq!(status_line(&status(3, Phase::Idle, true)), " Scene 4/5 cake ");
    }

    #[test]
    fn styles_convert_to_crossterm() {
        let s = Style {
            fg: Some(Color::rgb(1, 2, 3)),
            bg: Some(Color::Named(NamedColor::White)),
            bold: true,
            dim: false,
        };
        let cs = style::ContentStyle::from(&s);
        assert_eq!(cs.foreground_color, Some(style::Color::Rgb { r: 1, g: 2, b: 3 }));
        assert_eq!(cs.background_color, Some(style::Color::Grey));
        assert!(cs.attributes.has(style::Attribute::Bold));
        assert!(!cs.attributes.has(style::Attribute::Dim));
    }
}
