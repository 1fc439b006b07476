//! Visibility, range, and line-of-sight checks
//!
//! The observe window (±8 x, ±6 y) and the elevation limit (delta > 2
//! rejected) are opaque game-balance constants inherited from the legacy
//! world rules; they are enforced, not explained.

use crate::core::config::SimulationConfig;
use crate::core::types::Location;
use crate::world::map::TileAccessor;

/// Whether `from` can observe `to` at all (viewport window + elevation)
pub fn can_observe(config: &SimulationConfig, from: Location, to: Location) -> bool {
    let dz = (i16::from(from.z) - i16::from(to.z)).unsigned_abs() as u8;
    if dz > config.max_elevation_delta {
        return false;
    }
    (from.x - to.x).abs() <= config.sight_range_x && (from.y - to.y).abs() <= config.sight_range_y
}

/// Whether `to` is in melee reach of `from` (same floor only)
pub fn in_melee_range(config: &SimulationConfig, from: Location, to: Location) -> bool {
    from.z == to.z && from.chebyshev_distance(&to) <= config.melee_range
}

/// Whether an unobstructed ray exists between the two locations
///
/// The ray is interpolated tile by tile on the origin's floor; a tile with
/// sight-blocking content stops it. Tiles outside the loaded world do not
/// block. Endpoints never block their own ray.
pub fn line_of_sight_clear(tiles: &dyn TileAccessor, from: Location, to: Location) -> bool {
    let steps = (to.x - from.x).abs().max((to.y - from.y).abs());
    if steps <= 1 {
        return true;
    }
    for t in 1..steps {
        let x = from.x + (to.x - from.x) * t / steps;
        let y = from.y + (to.y - from.y) * t / steps;
        let pos = Location::new(x, y, from.z);
        if pos == from || pos == to {
            continue;
        }
        if let Some(tile) = tiles.get_tile_at(pos) {
            if !tile.sight_clear() {
                return false;
            }
        }
    }
    true
}
