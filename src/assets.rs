//! Asset loading.
//!
//! Scenes ask for text art by key. A missing or unreadable asset is never
//! fatal: `load_or_fallback` logs it and hands back the scene's built-in
//! stand-in so the show keeps moving.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset `{0}` not found")]
    NotFound(String),
    #[error("invalid asset key `{0}`")]
    InvalidKey(String),
    #[error("asset `{0}` is empty")]
    Empty(String),
    #[error("failed to read asset `{key}`")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

pub trait AssetLoader {
    /// Load multi-line text art.
    fn load_art(&self, key: &str) -> Result<Vec<String>, AssetError>;
}

/// Resolves `key` to `<root>/<key>.txt`.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirAssets { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetLoader for DirAssets {
    fn load_art(&self, key: &str) -> Result<Vec<String>, AssetError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AssetError::InvalidKey(key.to_string()));
        }

        let path = self.root.join(format!("{key}.txt"));
        let text = fs::read_to_string(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => AssetError::NotFound(key.to_string()),
            _ => AssetError::Io {
                key: key.to_string(),
                source,
            },
        })?;

        let mut lines: Vec<String> = text.lines().map(|l| l.trim_end().to_string()).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        if lines.is_empty() {
            return Err(AssetError::Empty(key.to_string()));
        }
        Ok(lines)
    }
}

/// A loader with nothing in it. Every scene falls back to its built-in art.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetLoader for NoAssets {
    fn load_art(&self, key: &str) -> Result<Vec<String>, AssetError> {
        Err(AssetError::NotFound(key.to_string()))
    }
}

/// Load `key`, or log why not and return `fallback`.
pub fn load_or_fallback(loader: &dyn AssetLoader, key: &str, fallback: &[&str]) -> Vec<String> {
    match loader.load_art(key) {
        Ok(art) => art,
        Err(e) => {
            tracing::warn!(key, "using fallback art: {e}");
            fallback.iter().map(|l| l.to_string()).collect()
        }
    }
}
