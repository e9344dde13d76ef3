use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::{GzDecoder, ZlibDecoder};

use super::{nbt, RegionSource, WorldError, WorldSource};
use crate::tile::{ChunkCoord, TileCoord};

/// Subdirectory of the world holding overworld region files.
pub const REGION_DIR: &str = "region";

const SECTOR_BYTES: u64 = 4096;
const HEADER_ENTRIES: usize = 1024;

const COMPRESSION_GZIP: u8 = 1;
const COMPRESSION_ZLIB: u8 = 2;
const COMPRESSION_NONE: u8 = 3;
const COMPRESSION_LZ4: u8 = 4;
const COMPRESSION_EXTERNAL: u8 = 0x80;

/// `InhabitedTime` lives under `Level` before 1.18 and at the root after.
const INHABITED_PATHS: [&[&str]; 2] = [&["InhabitedTime"], &["Level", "InhabitedTime"]];

/// A world in the Anvil (`.mca`) format.
#[derive(Debug, Clone)]
pub struct AnvilWorld {
    root: PathBuf,
}

impl AnvilWorld {
    pub fn open(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn region_dir(&self) -> PathBuf {
        self.root.join(REGION_DIR)
    }

    pub fn region_path(&self, tile: TileCoord) -> PathBuf {
        self.region_dir().join(tile.region_file_name())
    }

    /// Region files sorted by file name, the order extraction walks them in.
    fn region_files(&self) -> Result<Vec<(String, TileCoord)>, WorldError> {
        let dir = self.region_dir();
        let entries = fs::read_dir(&dir).map_err(|source| WorldError::Io {
            path: dir.clone(),
            source,
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| WorldError::Io {
                path: dir.clone(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(coord) = TileCoord::from_region_file_name(&name) {
                files.push((name, coord));
            }
        }
        files.sort();
        Ok(files)
    }
}

impl WorldSource for AnvilWorld {
    type Region = AnvilRegion;

    fn region_tiles(&self) -> Result<Vec<TileCoord>, WorldError> {
        let mut tiles = Vec::new();
        for (name, coord) in self.region_files()? {
            match AnvilRegion::open(self.region_path(coord), coord) {
                Ok(region) if region.is_empty() => {
                    log::debug!("skipping empty region file {name}");
                }
                Ok(_) => tiles.push(coord),
                Err(err) => log::warn!("skipping unreadable region file {name}: {err}"),
            }
        }
        Ok(tiles)
    }

    fn open_region(&self, tile: TileCoord) -> Result<AnvilRegion, WorldError> {
        AnvilRegion::open(self.region_path(tile), tile)
    }
}

/// An open region file and its chunk location table.
#[derive(Debug)]
pub struct AnvilRegion {
    coord: TileCoord,
    path: PathBuf,
    file: File,
    locations: Vec<u32>,
}

impl AnvilRegion {
    pub fn open(path: impl AsRef<Path>, coord: TileCoord) -> Result<Self, WorldError> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path).map_err(|source| WorldError::Io {
            path: path.clone(),
            source,
        })?;
        let mut header = vec![0u8; HEADER_ENTRIES * 4];
        file.read_exact(&mut header).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => WorldError::Region {
                region: coord,
                reason: "file is shorter than the region header".into(),
            },
            _ => WorldError::Io {
                path: path.clone(),
                source: err,
            },
        })?;
        let locations = header
            .chunks_exact(4)
            .map(|entry| u32::from_be_bytes([entry[0], entry[1], entry[2], entry[3]]))
            .collect();
        Ok(Self {
            coord,
            path,
            file,
            locations,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.locations.iter().all(|&location| location == 0)
    }

    fn read_payload(&mut self, chunk: ChunkCoord) -> Result<Vec<u8>, WorldError> {
        let location = self.locations[chunk.header_index()];
        let offset = u64::from(location >> 8) * SECTOR_BYTES;
        let sectors = u64::from(location & 0xFF);
        if offset == 0 {
            return Err(chunk_error(chunk, "chunk is not present"));
        }

        let mut prefix = [0u8; 5];
        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.read_exact(&mut prefix))
            .map_err(|err| chunk_error(chunk, format!("cannot read chunk header: {err}")))?;
        let length = u64::from(u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]));
        let compression = prefix[4];

        if compression & COMPRESSION_EXTERNAL != 0 {
            let external = self
                .path
                .with_file_name(format!("c.{}.{}.mcc", chunk.x, chunk.z));
            let data = fs::read(&external).map_err(|source| WorldError::Io {
                path: external,
                source,
            })?;
            return decompress(chunk, compression & !COMPRESSION_EXTERNAL, &data);
        }

        if length == 0 || length + 4 > sectors * SECTOR_BYTES {
            return Err(chunk_error(
                chunk,
                format!("length {length} does not fit in {sectors} sectors"),
            ));
        }
        let mut data = vec![0u8; (length - 1) as usize];
        self.file
            .read_exact(&mut data)
            .map_err(|err| chunk_error(chunk, format!("cannot read chunk data: {err}")))?;
        decompress(chunk, compression, &data)
    }
}

impl RegionSource for AnvilRegion {
    fn coord(&self) -> TileCoord {
        self.coord
    }

    fn populated_chunks(&self) -> Vec<ChunkCoord> {
        self.locations
            .iter()
            .enumerate()
            .filter(|&(_, &location)| location != 0)
            .map(|(index, _)| self.coord.chunk_at(index))
            .collect()
    }

    fn inhabited_time(&mut self, chunk: ChunkCoord) -> Result<u64, WorldError> {
        if chunk.region() != self.coord {
            return Err(chunk_error(chunk, format!("not part of region {}", self.coord)));
        }
        let data = self.read_payload(chunk)?;
        for path in INHABITED_PATHS {
            if let Some(ticks) = nbt::find_long(data.as_slice(), path)? {
                return Ok(ticks.max(0) as u64);
            }
        }
        Err(chunk_error(chunk, "no InhabitedTime tag"))
    }
}

fn decompress(chunk: ChunkCoord, compression: u8, data: &[u8]) -> Result<Vec<u8>, WorldError> {
    let mut out = Vec::new();
    let result = match compression {
        COMPRESSION_GZIP => GzDecoder::new(data).read_to_end(&mut out),
        COMPRESSION_ZLIB => ZlibDecoder::new(data).read_to_end(&mut out),
        COMPRESSION_NONE => return Ok(data.to_vec()),
        COMPRESSION_LZ4 => return Err(chunk_error(chunk, "lz4 compression is not supported")),
        other => return Err(chunk_error(chunk, format!("unknown compression type {other}"))),
    };
    result.map_err(|err| chunk_error(chunk, format!("decompression failed: {err}")))?;
    Ok(out)
}

fn chunk_error(chunk: ChunkCoord, reason: impl Into<String>) -> WorldError {
    WorldError::Chunk {
        chunk,
        reason: reason.into(),
    }
}
