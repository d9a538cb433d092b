use crate::error::WorldError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

mod generator;

#[cfg(test)]
mod tests;

pub use generator::generate_targets;

/// Point in world space as `[x, y, z]`; `y` is altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position(pub [f64; 3]);

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }

    pub fn x(&self) -> f64 {
        self.0[0]
    }

    pub fn y(&self) -> f64 {
        self.0[1]
    }

    pub fn z(&self) -> f64 {
        self.0[2]
    }

    /// True when all three components are finite numbers
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }

    /// Euclidean distance on the ground plane, ignoring altitude
    pub fn planar_distance(&self, other: &Position) -> f64 {
        let dx = self.x() - other.x();
        let dz = self.z() - other.z();
        (dx * dx + dz * dz).sqrt()
    }
}

/// Axis-aligned search area statically assigned to one agent identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Region identifier; doubles as the agent identifier it belongs to
    pub id: String,
    #[serde(alias = "x_from")]
    pub x_from: f64,
    #[serde(alias = "x_to")]
    pub x_to: f64,
    #[serde(alias = "z_from")]
    pub z_from: f64,
    #[serde(alias = "z_to")]
    pub z_to: f64,
}

impl Region {
    pub fn new(id: impl Into<String>, x_from: f64, x_to: f64, z_from: f64, z_to: f64) -> Self {
        Self {
            id: id.into(),
            x_from,
            x_to,
            z_from,
            z_to,
        }
    }

    /// Centre of the rectangle at the given altitude
    pub fn center(&self, altitude: f64) -> Position {
        Position::new(
            (self.x_from + self.x_to) / 2.0,
            altitude,
            (self.z_from + self.z_to) / 2.0,
        )
    }

    /// Rectangle inset by `margin` on every edge, or None when nothing is left
    pub fn spawn_area(&self, margin: f64) -> Option<(Range<f64>, Range<f64>)> {
        let x = (self.x_from + margin)..(self.x_to - margin);
        let z = (self.z_from + margin)..(self.z_to - margin);
        if x.start < x.end && z.start < z.end {
            Some((x, z))
        } else {
            None
        }
    }

    /// All four bounds and both spans are finite numbers
    pub fn has_finite_extent(&self) -> bool {
        [self.x_from, self.x_to, self.z_from, self.z_to]
            .iter()
            .all(|b| b.is_finite())
            && (self.x_to - self.x_from).is_finite()
            && (self.z_to - self.z_from).is_finite()
    }
}

/// Stationary point of interest as seen on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub name: String,
    pub position: Position,
    /// Owning region identifier
    pub region: String,
    pub found: bool,
}

/// Stored target: immutable description plus a one-way found flag
#[derive(Debug)]
pub(crate) struct TargetSlot {
    id: String,
    name: String,
    position: Position,
    region: String,
    found: AtomicBool,
}

impl TargetSlot {
    fn from_target(target: Target) -> Self {
        Self {
            id: target.id,
            name: target.name,
            position: target.position,
            region: target.region,
            found: AtomicBool::new(target.found),
        }
    }

    pub(crate) fn region(&self) -> &str {
        &self.region
    }

    pub(crate) fn position(&self) -> &Position {
        &self.position
    }

    pub(crate) fn is_found(&self) -> bool {
        self.found.load(Ordering::Acquire)
    }

    /// Flip found from false to true. Only the caller that wins the
    /// exchange gets `true`, so concurrent scans report a target once.
    pub(crate) fn try_mark_found(&self) -> bool {
        self.found
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn view(&self) -> Target {
        Target {
            id: self.id.clone(),
            name: self.name.clone(),
            position: self.position,
            region: self.region.clone(),
            found: self.is_found(),
        }
    }
}

/// Regions, targets and world bounds for one session lifetime
#[derive(Debug)]
pub struct WorldModel {
    world_size: f64,
    regions: Vec<Region>,
    targets: Vec<TargetSlot>,
}

impl WorldModel {
    /// Build the world and scatter `targets_per_region` targets in each region.
    ///
    /// Coordinates are drawn uniformly inside each region inset by
    /// `margin`. Identifiers are deterministic (`{region}_{n}`).
    pub fn initialize<R: Rng + ?Sized>(
        world_size: f64,
        regions: Vec<Region>,
        targets_per_region: usize,
        margin: f64,
        rng: &mut R,
    ) -> Result<Self, WorldError> {
        let targets = generate_targets(&regions, targets_per_region, margin, rng)?;
        Self::from_targets(world_size, regions, targets)
    }

    /// Build the world from an explicit target list
    pub fn from_targets(
        world_size: f64,
        regions: Vec<Region>,
        targets: Vec<Target>,
    ) -> Result<Self, WorldError> {
        let mut seen = HashSet::new();
        for region in &regions {
            if !seen.insert(region.id.as_str()) {
                return Err(WorldError::DuplicateRegion(region.id.clone()));
            }
        }

        Ok(Self {
            world_size,
            regions,
            targets: targets.into_iter().map(TargetSlot::from_target).collect(),
        })
    }

    pub fn world_size(&self) -> f64 {
        self.world_size
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, region_id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == region_id)
    }

    /// All targets with their current found flags, in insertion order
    pub fn targets(&self) -> Vec<Target> {
        self.targets.iter().map(TargetSlot::view).collect()
    }

    /// Targets owned by one region, in insertion order
    pub fn region_targets(&self, region_id: &str) -> Vec<Target> {
        self.slots_in(region_id).map(TargetSlot::view).collect()
    }

    pub fn found_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_found()).count()
    }

    pub(crate) fn slots_in<'a>(
        &'a self,
        region_id: &'a str,
    ) -> impl Iterator<Item = &'a TargetSlot> + 'a {
        self.targets.iter().filter(move |t| t.region() == region_id)
    }
}
