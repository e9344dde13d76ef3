//! Tile model - region coordinates in the world grid

use std::fmt;

use serde::{Deserialize, Serialize};

/// Chunks along one edge of a region.
pub const CHUNKS_PER_REGION: i32 = 32;

/// Region coordinates whose chunks still fit in `i32`.
pub const REGION_RANGE: std::ops::RangeInclusive<i32> =
    (i32::MIN / CHUNKS_PER_REGION)..=(i32::MAX / CHUNKS_PER_REGION);

/// Region position in the (unbounded) world grid
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TileCoord {
    pub x: i32,
    pub z: i32,
}

impl TileCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chebyshev distance, so border and spawn areas are squares.
    pub fn chebyshev_distance(&self, other: TileCoord) -> u64 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dz = (i64::from(self.z) - i64::from(other.z)).unsigned_abs();
        dx.max(dz)
    }

    /// Neighboring tiles (4-connectivity)
    pub fn neighbors(&self) -> [TileCoord; 4] {
        [
            TileCoord::new(self.x.wrapping_add(1), self.z),
            TileCoord::new(self.x.wrapping_sub(1), self.z),
            TileCoord::new(self.x, self.z.wrapping_add(1)),
            TileCoord::new(self.x, self.z.wrapping_sub(1)),
        ]
    }

    pub fn region_file_name(&self) -> String {
        format!("r.{}.{}.mca", self.x, self.z)
    }

    /// Parses `r.<x>.<z>.mca`; anything else is not a region file.
    ///
    /// Only canonical names are accepted (no `+5` or `05`), and only
    /// coordinates inside [`REGION_RANGE`].
    pub fn from_region_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_prefix("r.")?.strip_suffix(".mca")?;
        let (x, z) = stem.split_once('.')?;
        let coord = Self::new(x.parse().ok()?, z.parse().ok()?);
        let in_range = REGION_RANGE.contains(&coord.x) && REGION_RANGE.contains(&coord.z);
        (in_range && coord.region_file_name() == name).then_some(coord)
    }

    /// Absolute coordinates of the chunk stored at header slot `index`.
    ///
    /// The region must lie inside [`REGION_RANGE`].
    pub fn chunk_at(&self, index: usize) -> ChunkCoord {
        let index = index as i32;
        ChunkCoord {
            x: index % CHUNKS_PER_REGION + self.x * CHUNKS_PER_REGION,
            z: index / CHUNKS_PER_REGION + self.z * CHUNKS_PER_REGION,
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Absolute chunk position; the owning region is `(x >> 5, z >> 5)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn region(&self) -> TileCoord {
        TileCoord::new(self.x.div_euclid(CHUNKS_PER_REGION), self.z.div_euclid(CHUNKS_PER_REGION))
    }

    /// Slot of this chunk in its region header.
    pub fn header_index(&self) -> usize {
        let local_x = self.x.rem_euclid(CHUNKS_PER_REGION);
        let local_z = self.z.rem_euclid(CHUNKS_PER_REGION);
        (local_x + local_z * CHUNKS_PER_REGION) as usize
    }
}

/// One registry entry: a region and the highest `InhabitedTime` among its chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i32, i32, u64)", into = "(i32, i32, u64)")]
pub struct TileRecord {
    pub coord: TileCoord,
    pub activity_max: u64,
}

impl TileRecord {
    pub fn new(coord: TileCoord, activity_max: u64) -> Self {
        Self {
            coord,
            activity_max,
        }
    }
}

impl From<(i32, i32, u64)> for TileRecord {
    fn from((x, z, activity_max): (i32, i32, u64)) -> Self {
        Self::new(TileCoord::new(x, z), activity_max)
    }
}

impl From<TileRecord> for (i32, i32, u64) {
    fn from(record: TileRecord) -> Self {
        (record.coord.x, record.coord.z, record.activity_max)
    }
}
