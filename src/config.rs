//! Trim settings: geometry, thresholds and where trimmed regions go

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tile::TileCoord;

fn default_border_radius() -> u32 {
    6000
}

fn default_spawn_radius() -> u32 {
    16
}

fn default_inhabited_threshold() -> u64 {
    18_000
}

fn default_age_threshold_days() -> u32 {
    60
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("'{}' is not a directory.", .0.display())]
    NotADirectory(PathBuf),
    #[error("World folder missing.")]
    MissingWorld,
    #[error("Please run extract first.")]
    NotExtracted,
}

/// Parameters for classifying and trimming regions.
///
/// All distances are in regions (512 blocks) and measured from `center`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrimSettings {
    #[serde(default)]
    pub center: TileCoord,
    /// Regions farther than this are deleted regardless of activity.
    #[serde(default = "default_border_radius")]
    pub border_radius: u32,
    /// Regions closer than this are always kept.
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: u32,
    /// Ticks of `InhabitedTime` before a chunk counts as inhabited.
    #[serde(default = "default_inhabited_threshold")]
    pub inhabited_threshold: u64,
    /// Regions modified within this many days are never trimmed.
    #[serde(default = "default_age_threshold_days")]
    pub age_threshold_days: u32,
    /// Move trimmed regions here instead of deleting them.
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            center: TileCoord::default(),
            border_radius: default_border_radius(),
            spawn_radius: default_spawn_radius(),
            inhabited_threshold: default_inhabited_threshold(),
            age_threshold_days: default_age_threshold_days(),
            archive_dir: None,
        }
    }
}

impl TrimSettings {
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_center(mut self, center: TileCoord) -> Self {
        self.center = center;
        self
    }

    pub fn with_border_radius(mut self, radius: u32) -> Self {
        self.border_radius = radius;
        self
    }

    pub fn with_spawn_radius(mut self, radius: u32) -> Self {
        self.spawn_radius = radius;
        self
    }

    pub fn with_inhabited_threshold(mut self, ticks: u64) -> Self {
        self.inhabited_threshold = ticks;
        self
    }

    pub fn with_age_threshold_days(mut self, days: u32) -> Self {
        self.age_threshold_days = days;
        self
    }

    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = Some(dir.into());
        self
    }

    /// The archive directory, when set, must already exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dir) = &self.archive_dir {
            if !dir.is_dir() {
                return Err(ConfigError::NotADirectory(dir.clone()));
            }
        }
        if self.spawn_radius >= self.border_radius {
            log::warn!(
                "spawn radius {} is not inside border radius {}",
                self.spawn_radius,
                self.border_radius
            );
        }
        Ok(())
    }
}
