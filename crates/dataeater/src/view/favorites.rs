//! Named, reusable rule templates persisted as a JSON array.
//!
//! Column sets differ between files, so every rule's target column is
//! cleared when favorites are read back from disk.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rules::Rule;
use crate::error::{DataEaterError, Result};

/// A saved rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: String,
    pub name: String,
    pub rules: Vec<Rule>,
    pub created_at: DateTime<Utc>,
}

/// Favorites, optionally backed by a file.
#[derive(Debug, Clone, Default)]
pub struct FavoriteStore {
    path: Option<PathBuf>,
    favorites: Vec<Favorite>,
}

fn generate_favorite_id() -> String {
    format!(
        "fav_{}_{:04x}",
        Utc::now().timestamp_millis(),
        fastrand::u16(..)
    )
}

impl FavoriteStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store backed by `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let favorites = if path.exists() {
            Self::read(&path)?
        } else {
            Vec::new()
        };
        debug!(path = %path.display(), count = favorites.len(), "favorites opened");
        Ok(Self {
            path: Some(path),
            favorites,
        })
    }

    fn read(path: &Path) -> Result<Vec<Favorite>> {
        let file = File::open(path).map_err(|e| {
            DataEaterError::Persistence(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let mut favorites: Vec<Favorite> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                DataEaterError::Persistence(format!(
                    "Failed to parse favorites '{}': {}",
                    path.display(),
                    e
                ))
            })?;

        for rule in favorites.iter_mut().flat_map(|f| f.rules.iter_mut()) {
            rule.column.clear();
        }
        Ok(favorites)
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    DataEaterError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let file = File::create(path).map_err(|e| {
            DataEaterError::Persistence(format!(
                "Failed to create file '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.favorites).map_err(|e| {
            DataEaterError::Persistence(format!("Failed to serialize favorites: {}", e))
        })
    }

    pub fn list(&self) -> &[Favorite] {
        &self.favorites
    }

    pub fn get(&self, id: &str) -> Option<&Favorite> {
        self.favorites.iter().find(|f| f.id == id)
    }

    /// Save a rule set under a name and persist the store.
    pub fn add(&mut self, name: impl Into<String>, rules: Vec<Rule>) -> Result<&Favorite> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DataEaterError::InvalidInput(
                "favorite name must not be empty".to_string(),
            ));
        }
        self.favorites.push(Favorite {
            id: generate_favorite_id(),
            name,
            rules,
            created_at: Utc::now(),
        });
        self.save()?;
        Ok(&self.favorites[self.favorites.len() - 1])
    }

    /// Remove a favorite. Returns whether it existed.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let before = self.favorites.len();
        self.favorites.retain(|f| f.id != id);
        if self.favorites.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}
