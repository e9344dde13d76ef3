//! Region classification - decides which regions are kept and which can go

use std::collections::BTreeSet;
use std::fmt;

use crate::config::TrimSettings;
use crate::registry::TileRegistry;
use crate::tile::TileCoord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileClass {
    /// Inside the spawn radius; always kept.
    Spawn,
    /// Activity at or above the threshold.
    Inhabited,
    /// Below the threshold but adjacent to an inhabited region.
    Connected,
    /// Below the threshold and isolated; deletable.
    Uninhabited,
    /// Beyond the border; deletable.
    Outside,
}

impl TileClass {
    pub fn is_deletable(self) -> bool {
        matches!(self, TileClass::Uninhabited | TileClass::Outside)
    }
}

/// Geometric and activity test for a single region, before connectivity.
///
/// Never returns `Connected`; that needs the neighbors.
pub fn provisional_class(coord: TileCoord, activity: u64, settings: &TrimSettings) -> TileClass {
    let distance = coord.chebyshev_distance(settings.center);
    if distance > u64::from(settings.border_radius) {
        TileClass::Outside
    } else if distance < u64::from(settings.spawn_radius) {
        TileClass::Spawn
    } else if activity >= settings.inhabited_threshold {
        TileClass::Inhabited
    } else {
        TileClass::Uninhabited
    }
}

/// Partition of every registry tile into five disjoint sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub spawn: BTreeSet<TileCoord>,
    pub inhabited: BTreeSet<TileCoord>,
    pub connected: BTreeSet<TileCoord>,
    pub uninhabited: BTreeSet<TileCoord>,
    pub outside: BTreeSet<TileCoord>,
}

impl Classification {
    pub fn class_of(&self, coord: TileCoord) -> Option<TileClass> {
        [
            (&self.spawn, TileClass::Spawn),
            (&self.inhabited, TileClass::Inhabited),
            (&self.connected, TileClass::Connected),
            (&self.uninhabited, TileClass::Uninhabited),
            (&self.outside, TileClass::Outside),
        ]
        .into_iter()
        .find_map(|(set, class)| set.contains(&coord).then_some(class))
    }

    /// Uninhabited regions first, then those outside the border.
    pub fn deletable(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.uninhabited.iter().chain(self.outside.iter()).copied()
    }

    pub fn deletable_count(&self) -> usize {
        self.uninhabited.len() + self.outside.len()
    }

    pub fn total(&self) -> usize {
        self.spawn.len()
            + self.inhabited.len()
            + self.connected.len()
            + self.uninhabited.len()
            + self.outside.len()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            total: self.total(),
            spawn: self.spawn.len(),
            inhabited: self.inhabited.len(),
            connected: self.connected.len(),
            uninhabited: self.uninhabited.len(),
            outside: self.outside.len(),
        }
    }
}

/// Classifies every region in the registry.
///
/// Regions never recorded by extraction are not classified at all, so an
/// empty region beyond the border does not show up in `outside`.
pub fn classify(registry: &TileRegistry, settings: &TrimSettings) -> Classification {
    let mut result = Classification::default();
    let mut candidates = Vec::new();

    for record in registry {
        match provisional_class(record.coord, record.activity_max, settings) {
            TileClass::Outside => {
                result.outside.insert(record.coord);
            }
            TileClass::Spawn => {
                result.spawn.insert(record.coord);
            }
            TileClass::Inhabited => {
                result.inhabited.insert(record.coord);
            }
            TileClass::Uninhabited | TileClass::Connected => candidates.push(record.coord),
        }
    }

    // Only direct neighbors of inhabited regions are spared; protection does
    // not chain through other low-activity regions.
    for coord in candidates {
        let touches_inhabited = coord
            .neighbors()
            .iter()
            .any(|neighbor| result.inhabited.contains(neighbor));
        if touches_inhabited {
            result.connected.insert(coord);
        } else {
            result.uninhabited.insert(coord);
        }
    }

    result
}

/// Counts printed by `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub spawn: usize,
    pub inhabited: usize,
    pub connected: usize,
    pub uninhabited: usize,
    pub outside: usize,
}

impl Summary {
    pub fn deletable(&self) -> usize {
        self.uninhabited + self.outside
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.total.to_string().len();
        let rows = [
            ("total regions:", self.total),
            ("spawn regions:", self.spawn),
            ("inhabited regions:", self.inhabited),
            ("connected regions:", self.connected),
            ("uninhabited regions:", self.uninhabited),
            ("outside the border:", self.outside),
            ("deletable regions:", self.deletable()),
        ];
        for (label, count) in rows {
            writeln!(f, "{label:<21}{count:>width$}")?;
        }
        Ok(())
    }
}
