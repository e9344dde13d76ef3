//! Extraction - peak `InhabitedTime` per region, resumable across runs

use crate::interrupt::InterruptFlag;
use crate::registry::{ExtractionState, TileRegistry};
use crate::tile::{TileCoord, TileRecord};
use crate::world::{RegionSource, WorldError, WorldSource};

/// Emitted after each region is recorded.
#[derive(Debug, Clone, Copy)]
pub struct ExtractProgress {
    pub tile: TileCoord,
    pub activity_max: u64,
    /// Registry size after this region.
    pub recorded: usize,
    pub total: usize,
    pub failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractReport {
    pub total: usize,
    /// Regions recorded by earlier runs.
    pub resumed_from: usize,
    pub processed: usize,
    pub failed: usize,
    pub interrupted: bool,
    pub state: ExtractionState,
}

/// Walks a world's regions and records each one's peak `InhabitedTime`.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    interrupt: InterruptFlag,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interrupt(interrupt: InterruptFlag) -> Self {
        Self { interrupt }
    }

    pub fn run<W: WorldSource>(
        &self,
        world: &W,
        registry: &mut TileRegistry,
    ) -> Result<ExtractReport, WorldError> {
        self.run_with_hook(world, registry, |_| {})
    }

    /// Appends every region not yet in `registry`.
    ///
    /// Resumes after the first `registry.len()` regions of the world's
    /// enumeration, which is only sound if the set of region files has not
    /// changed since the registry was written.
    pub fn run_with_hook<W, F>(
        &self,
        world: &W,
        registry: &mut TileRegistry,
        mut hook: F,
    ) -> Result<ExtractReport, WorldError>
    where
        W: WorldSource,
        F: FnMut(&ExtractProgress),
    {
        let tiles = world.region_tiles()?;
        let total = tiles.len();
        let resumed_from = registry.len();
        let mut report = ExtractReport {
            total,
            resumed_from,
            processed: 0,
            failed: 0,
            interrupted: false,
            state: registry.state(total),
        };

        for tile in tiles.into_iter().skip(resumed_from) {
            if self.interrupt.is_set() {
                report.interrupted = true;
                break;
            }
            if registry.contains(tile) {
                log::warn!(
                    "{} is already recorded; the region files changed since the last run",
                    tile.region_file_name()
                );
                continue;
            }

            let (activity_max, error) = scan_region(world, tile);
            if let Some(err) = &error {
                log::warn!(
                    "Ignoring {} because of errors: {err}",
                    tile.region_file_name()
                );
                report.failed += 1;
            }
            registry.append(TileRecord::new(tile, activity_max));
            report.processed += 1;

            hook(&ExtractProgress {
                tile,
                activity_max,
                recorded: registry.len(),
                total,
                failed: error.is_some(),
            });
        }

        report.state = registry.state(total);
        Ok(report)
    }
}

/// Peak activity over a region's chunks.
///
/// The first failing chunk ends the scan; the peak seen up to that point is
/// still returned alongside the error.
fn scan_region<W: WorldSource>(world: &W, tile: TileCoord) -> (u64, Option<WorldError>) {
    let mut region = match world.open_region(tile) {
        Ok(region) => region,
        Err(err) => return (0, Some(err)),
    };
    let mut peak = 0;
    for chunk in region.populated_chunks() {
        match region.inhabited_time(chunk) {
            Ok(ticks) => peak = peak.max(ticks),
            Err(err) => return (peak, Some(err)),
        }
    }
    (peak, None)
}
