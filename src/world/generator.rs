use super::{Position, Region, Target};
use crate::error::WorldError;
use rand::Rng;

/// Scatter `per_region` targets uniformly inside each region, inset by `margin`.
///
/// Target ids are `{region}_{n}` with `n` counted from 1 per region;
/// names are `Target_{k}` with `k` counted from 1 across the world.
/// Targets sit on the ground (`y = 0`).
pub fn generate_targets<R: Rng + ?Sized>(
    regions: &[Region],
    per_region: usize,
    margin: f64,
    rng: &mut R,
) -> Result<Vec<Target>, WorldError> {
    if !margin.is_finite() || margin < 0.0 {
        return Err(WorldError::InvalidMargin(margin));
    }

    let mut targets = Vec::with_capacity(regions.len() * per_region);

    for region in regions {
        if !region.has_finite_extent() {
            return Err(WorldError::InvalidBounds(region.id.clone()));
        }

        let (x_range, z_range) =
            region
                .spawn_area(margin)
                .ok_or_else(|| WorldError::RegionTooSmall {
                    region: region.id.clone(),
                    margin,
                })?;

        for n in 1..=per_region {
            let x = rng.gen_range(x_range.clone());
            let z = rng.gen_range(z_range.clone());
            targets.push(Target {
                id: format!("{}_{}", region.id, n),
                name: format!("Target_{}", targets.len() + 1),
                position: Position::new(x, 0.0, z),
                region: region.id.clone(),
                found: false,
            });
        }
    }

    Ok(targets)
}
