#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use flate2::{write::ZlibEncoder, Compression};
use worldtrim::tile::{ChunkCoord, TileCoord};
use worldtrim::world::{RegionSource, WorldError, WorldSource};

/// What an in-memory chunk yields when read.
#[derive(Debug, Clone, Copy)]
pub enum Reading {
    Ticks(u64),
    Broken,
}

/// World kept entirely in memory; counts chunk reads.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorld {
    pub regions: Vec<(TileCoord, Vec<Reading>)>,
    pub reads: Arc<AtomicUsize>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, tile: TileCoord, chunks: Vec<Reading>) -> Self {
        self.regions.push((tile, chunks));
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

pub struct MemoryRegion {
    coord: TileCoord,
    chunks: Vec<Reading>,
    reads: Arc<AtomicUsize>,
}

impl WorldSource for MemoryWorld {
    type Region = MemoryRegion;

    fn region_tiles(&self) -> Result<Vec<TileCoord>, WorldError> {
        let mut tiles: Vec<_> = self
            .regions
            .iter()
            .filter(|(_, chunks)| !chunks.is_empty())
            .map(|(tile, _)| *tile)
            .collect();
        tiles.sort_by_key(|tile| tile.region_file_name());
        Ok(tiles)
    }

    fn open_region(&self, tile: TileCoord) -> Result<MemoryRegion, WorldError> {
        let (_, chunks) = self
            .regions
            .iter()
            .find(|(coord, _)| *coord == tile)
            .ok_or_else(|| WorldError::Region {
                region: tile,
                reason: "no such region".into(),
            })?;
        Ok(MemoryRegion {
            coord: tile,
            chunks: chunks.clone(),
            reads: self.reads.clone(),
        })
    }
}

impl RegionSource for MemoryRegion {
    fn coord(&self) -> TileCoord {
        self.coord
    }

    fn populated_chunks(&self) -> Vec<ChunkCoord> {
        (0..self.chunks.len())
            .map(|index| self.coord.chunk_at(index))
            .collect()
    }

    fn inhabited_time(&mut self, chunk: ChunkCoord) -> Result<u64, WorldError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.chunks[chunk.header_index()] {
            Reading::Ticks(ticks) => Ok(ticks),
            Reading::Broken => Err(WorldError::Chunk {
                chunk,
                reason: "broken on purpose".into(),
            }),
        }
    }
}

/// Ten regions in a row along x, each with one chunk of `x * 1000` ticks.
pub fn ten_region_world() -> MemoryWorld {
    (0..10).fold(MemoryWorld::new(), |world, x| {
        world.with_region(TileCoord::new(x, 0), vec![Reading::Ticks(x as u64 * 1000)])
    })
}

/// Chunk NBT in either the pre-1.18 (`Level.InhabitedTime`) or the current layout.
pub fn chunk_nbt(inhabited: i64, legacy: bool) -> Vec<u8> {
    fn named(tag: u8, name: &str, out: &mut Vec<u8>) {
        out.push(tag);
        out.extend_from_slice(&(name.len() as u16).to_be_bytes());
        out.extend_from_slice(name.as_bytes());
    }

    let mut out = Vec::new();
    named(10, "", &mut out);
    named(3, "DataVersion", &mut out);
    out.extend_from_slice(&2586i32.to_be_bytes());
    if legacy {
        named(10, "Level", &mut out);
        named(8, "Status", &mut out);
        out.extend_from_slice(&4u16.to_be_bytes());
        out.extend_from_slice(b"full");
    }
    named(4, "InhabitedTime", &mut out);
    out.extend_from_slice(&inhabited.to_be_bytes());
    if legacy {
        out.push(0);
    }
    out.push(0);
    out
}

/// Payload stored for one chunk slot of a synthesized region file.
pub enum StoredChunk {
    Zlib(Vec<u8>),
    /// Length prefix points past the end of the file.
    Truncated,
}

/// Writes `<world>/region/r.<x>.<z>.mca` with the given header slots filled.
pub fn write_region(world: &Path, tile: TileCoord, chunks: &[(usize, StoredChunk)]) {
    let region_dir = world.join("region");
    fs::create_dir_all(&region_dir).unwrap();

    let mut header = vec![0u8; 8192];
    let mut body = Vec::new();
    let mut sector = 2u32;
    for (index, chunk) in chunks {
        let mut record = Vec::new();
        match chunk {
            StoredChunk::Zlib(nbt) => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(nbt).unwrap();
                let data = encoder.finish().unwrap();
                record.extend_from_slice(&(data.len() as u32 + 1).to_be_bytes());
                record.push(2);
                record.extend_from_slice(&data);
            }
            StoredChunk::Truncated => {
                record.extend_from_slice(&100_000u32.to_be_bytes());
                record.push(2);
            }
        }
        let sectors = (record.len() as u32).div_ceil(4096).max(1);
        record.resize(sectors as usize * 4096, 0);
        let location = (sector << 8) | sectors;
        header[index * 4..index * 4 + 4].copy_from_slice(&location.to_be_bytes());
        body.extend_from_slice(&record);
        sector += sectors;
    }

    let mut file = header;
    file.extend_from_slice(&body);
    fs::write(region_dir.join(tile.region_file_name()), file).unwrap();
}
