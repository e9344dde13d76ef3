//! World access - enumerating regions and reading per-chunk activity

mod anvil;
pub mod nbt;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::tile::{ChunkCoord, TileCoord};

pub use anvil::{AnvilRegion, AnvilWorld, REGION_DIR};

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("io error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("region {region} is malformed: {reason}")]
    Region { region: TileCoord, reason: String },
    #[error("chunk ({}, {}) could not be decoded: {reason}", .chunk.x, .chunk.z)]
    Chunk { chunk: ChunkCoord, reason: String },
    #[error("nbt decode error: {0}")]
    Nbt(#[from] nbt::NbtError),
}

/// Read access to a world's regions.
pub trait WorldSource {
    type Region: RegionSource;

    /// Every region holding at least one chunk, in region file name order.
    ///
    /// The order must be stable between runs for extraction to resume.
    fn region_tiles(&self) -> Result<Vec<TileCoord>, WorldError>;

    fn open_region(&self, tile: TileCoord) -> Result<Self::Region, WorldError>;
}

/// One opened region.
pub trait RegionSource {
    fn coord(&self) -> TileCoord;

    /// Chunks present in the region header, in header order.
    fn populated_chunks(&self) -> Vec<ChunkCoord>;

    /// Ticks the chunk has been loaded near players.
    fn inhabited_time(&mut self, chunk: ChunkCoord) -> Result<u64, WorldError>;
}
