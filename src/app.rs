//! Application - the `extract`, `trim`, `show` and `clean` commands

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::classify::{classify, Summary};
use crate::config::{ConfigError, TrimSettings};
use crate::extract::{ExtractReport, Extractor};
use crate::interrupt::{InterruptFlag, InterruptGuard};
use crate::registry::{ExtractionState, RegistryStore, TileRegistry};
use crate::render::{render, save_map, MAP_FILE};
use crate::trim::{TrimReport, Trimmer};
use crate::world::AnvilWorld;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Command {
    /// Extract information from regions in the world folder
    Extract,
    /// Remove regions from the world folder
    Trim,
    /// Print information and generate a map of deleted regions
    Show,
    /// Remove all generated files
    Clean,
}

/// Everything one invocation needs.
#[derive(Debug, Clone)]
pub struct App {
    pub command: Command,
    pub world: Option<PathBuf>,
    /// Directory holding `world.json` and `world.png`.
    pub state_dir: PathBuf,
    pub settings: TrimSettings,
}

impl App {
    pub fn new(command: Command, settings: TrimSettings) -> Self {
        Self {
            command,
            world: None,
            state_dir: PathBuf::from("."),
            settings,
        }
    }

    pub fn with_world(mut self, world: impl Into<PathBuf>) -> Self {
        self.world = Some(world.into());
        self
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    pub fn store(&self) -> RegistryStore {
        RegistryStore::in_dir(&self.state_dir)
    }

    pub fn map_path(&self) -> PathBuf {
        self.state_dir.join(MAP_FILE)
    }

    pub fn run(&self) -> Result<()> {
        match self.command {
            Command::Extract => {
                let report = self.extract()?;
                match report.state {
                    ExtractionState::Complete => {
                        println!("{} / {} regions processed", report.total, report.total)
                    }
                    ExtractionState::InProgress(done) => println!(
                        "{done} / {} regions processed, run extract again to continue",
                        report.total
                    ),
                    ExtractionState::NotStarted => {
                        println!("0 / {} regions processed", report.total)
                    }
                }
            }
            Command::Show => {
                let summary = self.show()?;
                print!("{summary}");
                println!("Saved map as {}.", self.map_path().display());
            }
            Command::Trim => {
                let report = self.trim()?;
                let verb = if self.settings.archive_dir.is_some() {
                    "archived"
                } else {
                    "deleted"
                };
                println!("{verb} regions:   {}", report.removed);
            }
            Command::Clean => self.clean()?,
        }
        Ok(())
    }

    fn world_path(&self) -> Result<&Path, ConfigError> {
        self.world.as_deref().ok_or(ConfigError::MissingWorld)
    }

    fn extracted_registry(&self) -> Result<TileRegistry> {
        let store = self.store();
        store
            .load()
            .with_context(|| format!("Failed to load {}", store.path().display()))?
            .ok_or_else(|| ConfigError::NotExtracted.into())
    }

    /// Records every region not yet in the registry, then saves it, also
    /// when the run was interrupted by Ctrl+C.
    pub fn extract(&self) -> Result<ExtractReport> {
        let guard = InterruptGuard::install()?;
        self.extract_with_interrupt(guard.flag())
    }

    /// [`App::extract`] stopped by `interrupt` instead of Ctrl+C.
    pub fn extract_with_interrupt(&self, interrupt: InterruptFlag) -> Result<ExtractReport> {
        let world = AnvilWorld::open(self.world_path()?);
        self.settings.validate()?;
        let store = self.store();
        let mut registry = store
            .load()
            .with_context(|| format!("Failed to load {}", store.path().display()))?
            .unwrap_or_default();
        if !registry.is_empty() {
            println!(
                "{} regions already processed. Run clean first if you want to start over.",
                registry.len()
            );
        }

        let extractor = Extractor::with_interrupt(interrupt);
        let outcome = extractor.run_with_hook(&world, &mut registry, |progress| {
            if progress.recorded % 10 == 0 {
                println!("{} / {} regions processed", progress.recorded, progress.total);
            }
        });

        let report = outcome
            .with_context(|| format!("Failed to read world {}", world.root().display()))?;
        store
            .save(&registry)
            .with_context(|| format!("Failed to save {}", store.path().display()))?;
        if report.failed > 0 {
            log::warn!("{} regions could not be fully read", report.failed);
        }
        Ok(report)
    }

    /// Classifies the recorded regions and writes the map.
    pub fn show(&self) -> Result<Summary> {
        self.settings.validate()?;
        let registry = self.extracted_registry()?;
        let result = classify(&registry, &self.settings);
        let image = render(&result, &self.settings)?;
        let path = self.map_path();
        save_map(&image, &path)
            .with_context(|| format!("Failed to save map {}", path.display()))?;
        Ok(result.summary())
    }

    pub fn trim(&self) -> Result<TrimReport> {
        let world = self.world_path()?;
        self.settings.validate()?;
        let registry = self.extracted_registry()?;
        let result = classify(&registry, &self.settings);
        println!("deletable regions: {}", result.deletable_count());
        let report = Trimmer::new(world, &self.settings).trim(&result)?;
        if report.too_recent > 0 {
            log::info!(
                "{} deletable regions were modified in the last {} days",
                report.too_recent,
                self.settings.age_threshold_days
            );
        }
        Ok(report)
    }

    /// Removes the registry and the map.
    pub fn clean(&self) -> Result<()> {
        let store = self.store();
        store
            .clear()
            .with_context(|| format!("Failed to remove {}", store.path().display()))?;
        let map = self.map_path();
        match fs::remove_file(&map) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("Failed to remove {}", map.display())),
        }
    }
}
