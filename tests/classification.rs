use std::collections::BTreeSet;

use worldtrim::{classify, TileClass, TileCoord, TileRecord, TileRegistry, TrimSettings};

fn registry(records: &[(i32, i32, u64)]) -> TileRegistry {
    let mut registry = TileRegistry::new();
    for &(x, z, ticks) in records {
        registry.append(TileRecord::new(TileCoord::new(x, z), ticks));
    }
    registry
}

fn settings(border: u32, spawn: u32, threshold: u64) -> TrimSettings {
    TrimSettings::default()
        .with_border_radius(border)
        .with_spawn_radius(spawn)
        .with_inhabited_threshold(threshold)
}

#[test]
fn documented_scenario_spares_neighbor_and_drops_far_region() {
    let registry = registry(&[(0, 0, 20_000), (1, 0, 0), (10, 0, 0)]);
    let result = classify(&registry, &settings(5, 0, 18_000));

    assert_eq!(result.inhabited, BTreeSet::from([TileCoord::new(0, 0)]));
    assert_eq!(result.connected, BTreeSet::from([TileCoord::new(1, 0)]));
    assert_eq!(result.outside, BTreeSet::from([TileCoord::new(10, 0)]));
    assert!(result.uninhabited.is_empty());
    assert!(result.spawn.is_empty());
    assert_eq!(
        result.deletable().collect::<Vec<_>>(),
        vec![TileCoord::new(10, 0)]
    );
}

#[test]
fn sets_are_disjoint_and_cover_the_registry() {
    let mut records = Vec::new();
    for x in -8i32..=8 {
        for z in -8..=8 {
            let ticks = ((x * 7 + z * 13).rem_euclid(5) as u64) * 10_000;
            records.push((x, z, ticks));
        }
    }
    let registry = registry(&records);
    let result = classify(&registry, &settings(6, 2, 20_000));

    assert_eq!(result.total(), registry.len());
    for record in &registry {
        let memberships = [
            result.spawn.contains(&record.coord),
            result.inhabited.contains(&record.coord),
            result.connected.contains(&record.coord),
            result.uninhabited.contains(&record.coord),
            result.outside.contains(&record.coord),
        ];
        assert_eq!(
            memberships.iter().filter(|&&member| member).count(),
            1,
            "{} must be in exactly one set",
            record.coord
        );
    }
}

#[test]
fn border_radius_is_inclusive() {
    let registry = registry(&[(5, 0, 0), (6, 0, 0), (-5, 5, 0), (3, -6, 0)]);
    let result = classify(&registry, &settings(5, 0, 100));

    assert_ne!(result.class_of(TileCoord::new(5, 0)), Some(TileClass::Outside));
    assert_ne!(result.class_of(TileCoord::new(-5, 5)), Some(TileClass::Outside));
    assert_eq!(result.class_of(TileCoord::new(6, 0)), Some(TileClass::Outside));
    assert_eq!(result.class_of(TileCoord::new(3, -6)), Some(TileClass::Outside));
}

#[test]
fn spawn_radius_is_exclusive() {
    let registry = registry(&[(2, 0, 0), (3, 0, 0), (0, -2, 0)]);
    let result = classify(&registry, &settings(10, 3, 100));

    assert_eq!(result.class_of(TileCoord::new(2, 0)), Some(TileClass::Spawn));
    assert_eq!(result.class_of(TileCoord::new(0, -2)), Some(TileClass::Spawn));
    assert_eq!(
        result.class_of(TileCoord::new(3, 0)),
        Some(TileClass::Uninhabited)
    );
}

#[test]
fn activity_threshold_is_inclusive() {
    let registry = registry(&[(4, 0, 100), (-4, 0, 99)]);
    let result = classify(&registry, &settings(10, 0, 100));

    assert_eq!(result.class_of(TileCoord::new(4, 0)), Some(TileClass::Inhabited));
    assert_eq!(
        result.class_of(TileCoord::new(-4, 0)),
        Some(TileClass::Uninhabited)
    );
}

#[test]
fn connectivity_is_not_transitive() {
    let registry = registry(&[(0, 0, 500), (2, 0, 0), (0, 1, 0), (0, 2, 0)]);
    let result = classify(&registry, &settings(10, 0, 100));

    // (2, 0) has no recorded (1, 0) between it and the inhabited region.
    assert_eq!(
        result.class_of(TileCoord::new(2, 0)),
        Some(TileClass::Uninhabited)
    );
    assert_eq!(result.class_of(TileCoord::new(0, 1)), Some(TileClass::Connected));
    // A chain of low-activity regions does not extend the protection.
    assert_eq!(
        result.class_of(TileCoord::new(0, 2)),
        Some(TileClass::Uninhabited)
    );
}

#[test]
fn diagonal_neighbors_do_not_protect() {
    let registry = registry(&[(0, 0, 500), (1, 1, 0)]);
    let result = classify(&registry, &settings(10, 0, 100));
    assert_eq!(
        result.class_of(TileCoord::new(1, 1)),
        Some(TileClass::Uninhabited)
    );
}

#[test]
fn spawn_and_outside_neighbors_do_not_protect() {
    // (1, 0) is spawn-protected even though it is busy; it is not "inhabited".
    let registry = registry(&[(1, 0, 50_000), (2, 0, 0), (5, 0, 50_000), (4, 0, 0)]);
    let result = classify(&registry, &settings(4, 2, 100));

    assert_eq!(result.class_of(TileCoord::new(1, 0)), Some(TileClass::Spawn));
    assert_eq!(result.class_of(TileCoord::new(5, 0)), Some(TileClass::Outside));
    assert_eq!(
        result.class_of(TileCoord::new(2, 0)),
        Some(TileClass::Uninhabited)
    );
    assert_eq!(
        result.class_of(TileCoord::new(4, 0)),
        Some(TileClass::Uninhabited)
    );
}

#[test]
fn classification_respects_center_offset() {
    let registry = registry(&[(100, 100, 0), (103, 100, 0), (104, 100, 0)]);
    let settings = settings(3, 1, 100).with_center(TileCoord::new(100, 100));
    let result = classify(&registry, &settings);

    assert_eq!(result.class_of(TileCoord::new(100, 100)), Some(TileClass::Spawn));
    assert_eq!(
        result.class_of(TileCoord::new(103, 100)),
        Some(TileClass::Uninhabited)
    );
    assert_eq!(result.class_of(TileCoord::new(104, 100)), Some(TileClass::Outside));
}

#[test]
fn unrecorded_regions_are_never_classified() {
    let registry = registry(&[(0, 0, 500)]);
    let result = classify(&registry, &settings(5, 0, 100));

    assert_eq!(result.class_of(TileCoord::new(50, 50)), None);
    assert!(result.outside.is_empty());
    assert_eq!(result.total(), 1);
}

#[test]
fn classification_is_repeatable() {
    let registry = registry(&[(0, 0, 500), (1, 0, 0), (3, 3, 0), (9, 9, 0)]);
    let settings = settings(5, 1, 100);
    let first = classify(&registry, &settings);
    let second = classify(&registry, &settings);
    assert_eq!(first, second);
}
