//! Saved strategy documents — one `{id}.json` per strategy in a directory.
//!
//! The built-in default strategy is always available and is never read from
//! or written to disk.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use laybench_core::strategy::{default_strategy, is_filename_safe_id, DEFAULT_STRATEGY_ID};
use laybench_core::Strategy;

use crate::store::StoreError;

/// Catalogue entry for a stored strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_default: bool,
}

impl StrategySummary {
    fn of(strategy: &Strategy, is_default: bool) -> Self {
        Self {
            id: strategy.id.clone(),
            name: strategy.name.clone(),
            description: strategy.description.clone(),
            is_default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrategyStore {
    dir: PathBuf,
}

impl StrategyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The default strategy first, then saved strategies sorted by id.
    /// Files that fail to read or validate are skipped with a warning.
    pub fn list(&self) -> Result<Vec<StrategySummary>, StoreError> {
        let mut saved = Vec::new();
        if self.dir.is_dir() {
            let entries = std::fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                match read_strategy(&path, stem) {
                    Ok(s) if s.id == DEFAULT_STRATEGY_ID => {
                        debug!(
                            path = %path.display(),
                            "ignoring file shadowing the default strategy"
                        );
                    }
                    Ok(s) => saved.push(StrategySummary::of(&s, false)),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable strategy")
                    }
                }
            }
        }
        saved.sort_by(|a, b| a.id.cmp(&b.id));

        let mut all = Vec::with_capacity(saved.len() + 1);
        all.push(StrategySummary::of(&default_strategy(), true));
        all.extend(saved);
        Ok(all)
    }

    /// Load a strategy by id. `chimera_default` is served from memory.
    pub fn get(&self, id: &str) -> Result<Strategy, StoreError> {
        if id == DEFAULT_STRATEGY_ID {
            return Ok(default_strategy());
        }
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(StoreError::StrategyNotFound(id.to_string()));
        }
        read_strategy(&path, id)
    }

    /// Validate and write `{id}.json` (pretty JSON). Returns the written path.
    pub fn save(&self, strategy: &Strategy) -> Result<PathBuf, StoreError> {
        strategy.validate()?;
        if strategy.id == DEFAULT_STRATEGY_ID {
            return Err(StoreError::InvalidStrategyId(strategy.id.clone()));
        }
        let path = self.path_for(&strategy.id)?;

        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(strategy)
            .map_err(laybench_core::StrategyError::from)?;
        std::fs::write(&path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(id = %strategy.id, path = %path.display(), "strategy saved");
        Ok(path)
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        if !is_filename_safe_id(id) {
            return Err(StoreError::InvalidStrategyId(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

/// Read `{id}.json`; the document's own id must match the file name.
fn read_strategy(path: &Path, id: &str) -> Result<Strategy, StoreError> {
    let json = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let strategy = Strategy::from_json(&json)?;
    if strategy.id != id {
        return Err(StoreError::StrategyIdMismatch {
            path: path.to_path_buf(),
            id: strategy.id,
        });
    }
    Ok(strategy)
}
