use crate::world::{Position, Target, WorldModel};

/// Default field-of-view radius in world units
pub const DEFAULT_FOV_RADIUS: f64 = 80.0;

/// Field-of-view target detection on the ground plane
#[derive(Debug, Clone, Copy)]
pub struct DetectionEngine {
    fov_radius: f64,
}

impl DetectionEngine {
    pub fn new(fov_radius: f64) -> Self {
        Self { fov_radius }
    }

    /// Mark and return the unfound targets of `region_id` within the FOV radius.
    ///
    /// Distance is planar (x/z). Results keep target insertion order. A
    /// target is returned by exactly one scan over the world's lifetime,
    /// even when scans race, because marking is a compare-exchange.
    pub fn detect(&self, world: &WorldModel, region_id: &str, position: &Position) -> Vec<Target> {
        world
            .slots_in(region_id)
            .filter(|slot| !slot.is_found())
            .filter(|slot| slot.position().planar_distance(position) <= self.fov_radius)
            .filter(|slot| slot.try_mark_found())
            .map(|slot| slot.view())
            .collect()
    }
}

impl Default for DetectionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_FOV_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Region;
    use std::sync::Arc;
    use std::thread;

    fn target(id: &str, region: &str, x: f64, z: f64) -> Target {
        Target {
            id: id.to_string(),
            name: id.to_string(),
            position: Position::new(x, 0.0, z),
            region: region.to_string(),
            found: false,
        }
    }

    fn world() -> WorldModel {
        WorldModel::from_targets(
            800.0,
            vec![
                Region::new("D1", -400.0, 0.0, -400.0, 0.0),
                Region::new("D2", 0.0, 400.0, -400.0, 0.0),
            ],
            vec![
                target("D1_1", "D1", -200.0, -200.0),
                target("D1_2", "D1", -150.0, -200.0),
                target("D1_3", "D1", -300.0, -300.0),
                // Right across the border from D1's scan point
                target("D2_1", "D2", 10.0, -200.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_detects_targets_in_range_in_insertion_order() {
        let world = world();
        let engine = DetectionEngine::default();

        let found = engine.detect(&world, "D1", &Position::new(-180.0, 40.0, -200.0));
        let ids: Vec<&str> = found.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["D1_1", "D1_2"]);
        assert!(found.iter().all(|t| t.found));
    }

    #[test]
    fn test_found_targets_never_reported_twice() {
        let world = world();
        let engine = DetectionEngine::default();
        let pos = Position::new(-200.0, 40.0, -200.0);

        assert_eq!(engine.detect(&world, "D1", &pos).len(), 2);
        assert!(engine.detect(&world, "D1", &pos).is_empty());
        assert_eq!(world.found_count(), 2);
    }

    #[test]
    fn test_radius_is_inclusive() {
        let world = world();
        let engine = DetectionEngine::new(80.0);

        // Exactly 80 units from D1_3 on the x axis
        let found = engine.detect(&world, "D1", &Position::new(-380.0, 40.0, -300.0));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "D1_3");
    }

    #[test]
    fn test_altitude_is_ignored() {
        let world = world();
        let engine = DetectionEngine::default();

        let found = engine.detect(&world, "D1", &Position::new(-300.0, 10_000.0, -300.0));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_never_detects_other_regions_targets() {
        let world = world();
        let engine = DetectionEngine::default();

        // Standing directly on D2_1 while scanning as D1
        let found = engine.detect(&world, "D1", &Position::new(10.0, 40.0, -200.0));
        assert!(found.is_empty());
        assert!(!world.region_targets("D2")[0].found);
    }

    #[test]
    fn test_unknown_region_detects_nothing() {
        let world = world();
        let engine = DetectionEngine::default();
        assert!(engine
            .detect(&world, "X9", &Position::new(-200.0, 40.0, -200.0))
            .is_empty());
    }

    #[test]
    fn test_concurrent_scans_report_each_target_once() {
        let world = Arc::new(world());
        let engine = DetectionEngine::default();
        let mut handles = vec![];

        for _ in 0..8 {
            let world = Arc::clone(&world);
            handles.push(thread::spawn(move || {
                engine.detect(&world, "D1", &Position::new(-200.0, 40.0, -200.0))
            }));
        }

        let mut reported: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .map(|t| t.id)
            .collect();
        reported.sort();
        assert_eq!(reported, vec!["D1_1", "D1_2"]);
    }
}
