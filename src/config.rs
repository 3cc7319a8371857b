use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sequencer::CrossfadeConfig;
use crate::types::TerminalContract;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowConfig {
    pub width: u16,
    pub height: u16,
    /// Frames per second in the terminal player.
    pub frame_rate: u32,
    pub crossfade: CrossfadeConfig,
    /// Fixed seed for reproducible particles; fresh entropy when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub asset_dir: PathBuf,
    pub log_file: PathBuf,
    pub key_bindings: KeyBindings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub advance: Vec<String>,
    pub quit: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            advance: vec!["Right".into(), "Space".into(), "Enter".into()],
            quit: vec!["q".into(), "Esc".into(), "Ctrl-c".into()],
        }
    }
}

impl KeyBindings {
    pub fn is_advance(&self, event: &KeyEvent) -> bool {
        self.advance.iter().any(|b| matches_binding(b, event))
    }

    pub fn is_quit(&self, event: &KeyEvent) -> bool {
        self.quit.iter().any(|b| matches_binding(b, event))
    }
}

impl Default for ShowConfig {
    fn default() -> Self {
        ShowConfig {
            width: 80,
            height: 24,
            frame_rate: 30,
            crossfade: CrossfadeConfig::default(),
            seed: None,
            asset_dir: PathBuf::from("assets"),
            log_file: PathBuf::from("ascii-reel.log"),
            key_bindings: KeyBindings::default(),
        }
    }
}

impl ShowConfig {
    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing file at the default location is not an error; a missing
    /// explicit path is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::config_path(), false),
        };
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        let config: ShowConfig =
            serde_json::from_str(&json).map_err(|source| ConfigError::Parse { path, source })?;
        Ok(config.sanitized())
    }

    pub fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("ascii-reel");
        path.push("config.json");
        path
    }

    pub fn contract(&self) -> TerminalContract {
        TerminalContract {
            width: self.width,
            height: self.height,
        }
    }

    /// Seconds per frame.
    pub fn frame_period(&self) -> f64 {
        1.0 / f64::from(self.frame_rate)
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.width == 0 || self.height == 0 {
            tracing::warn!(width = self.width, height = self.height, "ignoring empty stage size");
            self.width = defaults.width;
            self.height = defaults.height;
        }
        if self.frame_rate == 0 {
            tracing::warn!("ignoring zero frame rate");
            self.frame_rate = defaults.frame_rate;
        }
        if !self.crossfade.duration.is_finite() || self.crossfade.duration < 0.0 {
            tracing::warn!(duration = self.crossfade.duration, "ignoring invalid cross-fade duration");
            self.crossfade.duration = defaults.crossfade.duration;
        }
        self
    }
}

/// Check whether a crossterm `KeyEvent` matches a binding string from config.
pub fn matches_binding(binding: &str, event: &KeyEvent) -> bool {
    if let Some(rest) = binding.strip_prefix("Alt-") {
        return event.modifiers.contains(KeyModifiers::ALT) && matches_key(rest, event.code);
    }
    if let Some(rest) = binding.strip_prefix("Ctrl-") {
        return event.modifiers.contains(KeyModifiers::CONTROL) && matches_key(rest, event.code);
    }

    // Plain bindings never fire while Ctrl or Alt is held, so "c" is not Ctrl-c.
    if event.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return false;
    }
    matches_key(binding, event.code)
}

fn matches_key(key: &str, code: KeyCode) -> bool {
    match key {
        "Right" => code == KeyCode::Right,
        "Left" => code == KeyCode::Left,
        "Up" => code == KeyCode::Up,
        "Down" => code == KeyCode::Down,
        "Enter" => code == KeyCode::Enter,
        "Esc" => code == KeyCode::Esc,
        "Space" => code == KeyCode::Char(' '),
        "Tab" => code == KeyCode::Tab,
        "Backspace" => code == KeyCode::Backspace,
        "Home" => code == KeyCode::Home,
        "End" => code == KeyCode::End,
        s => {
            if let Some(n) = s.strip_prefix('F').and_then(|rest| rest.parse::<u8>().ok()) {
                return code == KeyCode::F(n);
            }
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => code == KeyCode::Char(c),
                _ => false,
            }
        }
    }
}
