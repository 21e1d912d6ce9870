//! The read-only theme catalog rooms draw their vote options from.

use std::collections::HashSet;
use std::path::Path;

use ito_protocol::Theme;

use crate::random::{RandomSource, sample_indices};
use crate::RoomError;

const BUILTIN_THEMES: &str = include_str!("../data/themes.json");

/// A fixed list of themes, looked up by exact name.
#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    themes: Vec<Theme>,
}

impl ThemeCatalog {
    /// The catalog shipped with the server.
    pub fn builtin() -> Self {
        // Covered by `test_builtin_catalog_parses`.
        Self::from_json(BUILTIN_THEMES).expect("built-in theme catalog is valid")
    }

    /// Parses a JSON array of themes.
    ///
    /// # Errors
    /// Returns [`RoomError::Catalog`] if the JSON is malformed, the list is
    /// empty, a name is blank, or two themes share a name.
    pub fn from_json(json: &str) -> Result<Self, RoomError> {
        let themes: Vec<Theme> =
            serde_json::from_str(json).map_err(|e| RoomError::Catalog(e.to_string()))?;
        Self::new(themes)
    }

    /// Reads a catalog from a JSON file.
    ///
    /// # Errors
    /// Returns [`RoomError::Catalog`] if the file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RoomError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RoomError::Catalog(format!("{}: {e}", path.display())))?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), themes = catalog.len(), "theme catalog loaded");
        Ok(catalog)
    }

    /// Builds a catalog from themes already in memory.
    ///
    /// # Errors
    /// Same rules as [`from_json`](Self::from_json).
    pub fn new(themes: Vec<Theme>) -> Result<Self, RoomError> {
        if themes.is_empty() {
            return Err(RoomError::Catalog("catalog has no themes".into()));
        }
        let mut seen = HashSet::with_capacity(themes.len());
        for theme in &themes {
            if theme.name.trim().is_empty() {
                return Err(RoomError::Catalog("theme with blank name".into()));
            }
            if !seen.insert(theme.name.as_str()) {
                return Err(RoomError::Catalog(format!(
                    "duplicate theme {:?}",
                    theme.name
                )));
            }
        }
        Ok(Self { themes })
    }

    pub fn get(&self, name: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.name == name)
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Draws `count` distinct themes uniformly at random.
    pub fn draw(&self, count: usize, rng: &dyn RandomSource) -> Vec<Theme> {
        sample_indices(rng, self.themes.len(), count)
            .into_iter()
            .map(|i| self.themes[i].clone())
            .collect()
    }
}
