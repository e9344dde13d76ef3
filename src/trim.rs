//! Removing (or archiving) the region files of deletable regions

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local};
use thiserror::Error;

use crate::classify::Classification;
use crate::config::TrimSettings;
use crate::tile::TileCoord;
use crate::world::REGION_DIR;

#[derive(Debug, Error)]
pub enum TrimError {
    #[error("cannot resolve world path {path}: {source}")]
    Resolve { path: PathBuf, source: io::Error },
    #[error("cannot inspect {path}: {source}")]
    Metadata { path: PathBuf, source: io::Error },
    #[error("cannot delete {path}: {source}")]
    Delete { path: PathBuf, source: io::Error },
    #[error("cannot move {path} to {target}: {source}")]
    Archive {
        path: PathBuf,
        target: PathBuf,
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimReport {
    pub deletable: usize,
    /// Files deleted or moved to the archive.
    pub removed: usize,
    pub missing: usize,
    pub too_recent: usize,
}

pub struct Trimmer<'a> {
    world_root: PathBuf,
    settings: &'a TrimSettings,
    now: DateTime<Local>,
}

impl<'a> Trimmer<'a> {
    pub fn new(world_root: impl AsRef<Path>, settings: &'a TrimSettings) -> Self {
        Self {
            world_root: world_root.as_ref().to_path_buf(),
            settings,
            now: Local::now(),
        }
    }

    /// Overrides the clock the age threshold is measured against.
    pub fn with_now(mut self, now: DateTime<Local>) -> Self {
        self.now = now;
        self
    }

    /// Files modified at or after this instant are kept. `None` when the
    /// threshold reaches past the earliest representable date, so every
    /// file counts as recent.
    pub fn cutoff(&self) -> Option<DateTime<Local>> {
        let age = Duration::try_days(i64::from(self.settings.age_threshold_days))?;
        self.now.checked_sub_signed(age)
    }

    pub fn region_path(&self, tile: TileCoord) -> Result<PathBuf, TrimError> {
        let path = self
            .world_root
            .join(REGION_DIR)
            .join(tile.region_file_name());
        if path.is_absolute() {
            return Ok(path);
        }
        let cwd = env::current_dir().map_err(|source| TrimError::Resolve {
            path: self.world_root.clone(),
            source,
        })?;
        Ok(cwd.join(path))
    }

    /// Removes every deletable region file older than the age threshold.
    ///
    /// Any filesystem failure aborts the run; files already handled stay
    /// handled.
    pub fn trim(&self, result: &Classification) -> Result<TrimReport, TrimError> {
        let cutoff = self.cutoff();
        let mut report = TrimReport {
            deletable: result.deletable_count(),
            ..TrimReport::default()
        };

        for tile in result.deletable() {
            let path = self.region_path(tile)?;
            let modified = match fs::metadata(&path) {
                Ok(metadata) => metadata.modified(),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    report.missing += 1;
                    continue;
                }
                Err(source) => Err(source),
            }
            .map_err(|source| TrimError::Metadata {
                path: path.clone(),
                source,
            })?;

            let recent = cutoff.map_or(true, |cutoff| DateTime::<Local>::from(modified) >= cutoff);
            if recent {
                log::debug!("keeping {}, modified too recently", path.display());
                report.too_recent += 1;
                continue;
            }

            match &self.settings.archive_dir {
                Some(dir) => archive(&path, dir)?,
                None => fs::remove_file(&path).map_err(|source| TrimError::Delete {
                    path: path.clone(),
                    source,
                })?,
            }
            report.removed += 1;
        }
        Ok(report)
    }
}

#[cfg(windows)]
const CROSS_DEVICE: i32 = 17; // ERROR_NOT_SAME_DEVICE
#[cfg(not(windows))]
const CROSS_DEVICE: i32 = 18; // EXDEV

/// Moves `path` into `dir`, refusing to replace an earlier archived copy.
fn archive(path: &Path, dir: &Path) -> Result<(), TrimError> {
    let target = match path.file_name() {
        Some(name) => dir.join(name),
        None => dir.to_path_buf(),
    };
    let moved = if target.exists() {
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination path already exists",
        ))
    } else {
        match fs::rename(path, &target) {
            Err(err) if err.raw_os_error() == Some(CROSS_DEVICE) => copy_then_remove(path, &target),
            moved => moved,
        }
    };
    moved.map_err(|source| TrimError::Archive {
        path: path.to_path_buf(),
        target,
        source,
    })
}

fn copy_then_remove(path: &Path, target: &Path) -> io::Result<()> {
    fs::copy(path, target)?;
    if let Err(err) = fs::remove_file(path) {
        // leave a single copy behind
        let _ = fs::remove_file(target);
        return Err(err);
    }
    Ok(())
}
