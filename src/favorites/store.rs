use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("favorites file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("favorites file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize favorites: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Persistence for the favorite-ID set. Writes always replace the whole set.
pub trait FavoritesStore {
    fn load(&self) -> Result<BTreeSet<String>, FavoritesError>;
    fn replace_all(&mut self, ids: &BTreeSet<String>) -> Result<(), FavoritesError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FavoritesFile {
    #[serde(default)]
    favorites: Vec<String>,
}

/// Stores favorites as `favorites = [...]` in a TOML file.
#[derive(Debug, Clone)]
pub struct TomlFavoritesStore {
    path: PathBuf,
}

impl TomlFavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> FavoritesError {
        FavoritesError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl FavoritesStore for TomlFavoritesStore {
    fn load(&self) -> Result<BTreeSet<String>, FavoritesError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            // First run: nothing saved yet.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(self.io_err(e)),
        };

        let file: FavoritesFile = toml::from_str(&text).map_err(|source| FavoritesError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(file.favorites.into_iter().collect())
    }

    fn replace_all(&mut self, ids: &BTreeSet<String>) -> Result<(), FavoritesError> {
        let file = FavoritesFile {
            favorites: ids.iter().cloned().collect(),
        };
        let text = toml::to_string(&file)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        fs::write(&self.path, text).map_err(|e| self.io_err(e))
    }
}

/// In-memory store. Clones share the same set, so a test can keep one clone
/// and observe what the engine persisted through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryFavoritesStore {
    ids: Arc<Mutex<BTreeSet<String>>>,
}

impl MemoryFavoritesStore {
    #[cfg(test)]
    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Arc::new(Mutex::new(ids.into_iter().map(Into::into).collect())),
        }
    }

    pub fn snapshot(&self) -> BTreeSet<String> {
        self.ids
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

impl FavoritesStore for MemoryFavoritesStore {
    fn load(&self) -> Result<BTreeSet<String>, FavoritesError> {
        Ok(self.snapshot())
    }

    fn replace_all(&mut self, ids: &BTreeSet<String>) -> Result<(), FavoritesError> {
        if let Ok(mut stored) = self.ids.lock() {
            *stored = ids.clone();
        }
        Ok(())
    }
}
