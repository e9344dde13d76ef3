//! Tile registry - per-region activity maxima and their on-disk state

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::tile::{TileCoord, TileRecord};

/// Default name of the persisted registry.
pub const REGISTRY_FILE: &str = "world.json";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry io error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("registry file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Extraction progress as implied by the registry size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    NotStarted,
    InProgress(usize),
    Complete,
}

/// Ordered tile records plus a coordinate index.
///
/// Insertion order is the extraction order and is what resume relies on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileRegistry {
    records: Vec<TileRecord>,
    index: HashMap<TileCoord, u64>,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry, rejecting duplicate coordinates.
    pub fn from_records(records: Vec<TileRecord>) -> Result<Self, TileCoord> {
        let mut registry = Self::new();
        for record in records {
            if registry.contains(record.coord) {
                return Err(record.coord);
            }
            registry.append(record);
        }
        Ok(registry)
    }

    /// Adds to the end. Callers must not append a coordinate twice.
    pub fn append(&mut self, record: TileRecord) {
        debug_assert!(
            !self.index.contains_key(&record.coord),
            "duplicate tile {}",
            record.coord
        );
        self.index.insert(record.coord, record.activity_max);
        self.records.push(record);
    }

    pub fn activity(&self, coord: TileCoord) -> Option<u64> {
        self.index.get(&coord).copied()
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        self.index.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[TileRecord] {
        &self.records
    }

    pub fn state(&self, total_tiles: usize) -> ExtractionState {
        match self.len() {
            0 if total_tiles > 0 => ExtractionState::NotStarted,
            n if n >= total_tiles => ExtractionState::Complete,
            n => ExtractionState::InProgress(n),
        }
    }
}

impl<'a> IntoIterator for &'a TileRegistry {
    type Item = &'a TileRecord;
    type IntoIter = std::slice::Iter<'a, TileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Location of the persisted registry.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at `<dir>/world.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(REGISTRY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// `Ok(None)` means extraction has never been run.
    pub fn load(&self) -> Result<Option<TileRegistry>, RegistryError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        let records: Vec<TileRecord> =
            serde_json::from_str(&data).map_err(|err| RegistryError::Corrupt {
                path: self.path.clone(),
                reason: err.to_string(),
            })?;
        let registry =
            TileRegistry::from_records(records).map_err(|coord| RegistryError::Corrupt {
                path: self.path.clone(),
                reason: format!("tile {coord} recorded more than once"),
            })?;
        Ok(Some(registry))
    }

    /// Replaces the stored registry. The new file is written beside the old
    /// one and renamed over it, so readers never see a partial file.
    pub fn save(&self, registry: &TileRegistry) -> Result<(), RegistryError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let json = serde_json::to_string(registry.records()).map_err(|err| {
            RegistryError::Corrupt {
                path: self.path.clone(),
                reason: err.to_string(),
            }
        })?;
        let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.as_file().sync_all())
            .map_err(|e| self.io_error(e))?;
        file.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }

    /// Removes the stored registry; a missing file is not an error.
    pub fn clear(&self) -> Result<bool, RegistryError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: io::Error) -> RegistryError {
        RegistryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
