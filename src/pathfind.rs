//! A* pathfinding over the 8-directional tile graph
//!
//! Reads the world only through `TileAccessor`. Diagonal steps cost more
//! than orthogonal ones, so paths prefer straight runs with corner cuts
//! only where they pay off.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::AHashMap;

use crate::core::types::{Direction, Location};
use crate::world::map::TileAccessor;

/// Cost of one orthogonal step
const COST_STRAIGHT: f32 = 10.0;
/// Cost of one diagonal step
const COST_DIAGONAL: f32 = 25.0;

/// Outcome of a path search
///
/// When the target was not reached, `end_location` is the closest-approached
/// expanded tile and the directions lead there: a best-effort result, not
/// an error.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub directions: Vec<Direction>,
    pub end_location: Location,
}

impl PathResult {
    pub fn reached(&self, target: Location) -> bool {
        self.end_location == target
    }
}

/// Per-search scratch node
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    g: f32,
    closed: bool,
    parent: Option<(Location, Direction)>,
}

/// Scratch state for one search, dropped on every exit path
#[derive(Default)]
struct PathSearchCache {
    nodes: AHashMap<Location, SearchNode>,
}

/// Entry in the A* open set
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    location: Location,
    f: f32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other.f.partial_cmp(&self.f).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn heuristic(from: Location, to: Location) -> f32 {
    from.euclidean_distance(&to) * COST_STRAIGHT
}

/// Find a direction sequence from `start` toward `target`
///
/// `max_steps` bounds the number of node expansions, which also bounds the
/// returned path length and the per-search memory.
pub fn find_between(
    tiles: &dyn TileAccessor,
    start: Location,
    target: Location,
    max_steps: usize,
) -> PathResult {
    if start == target {
        return PathResult {
            directions: Vec::new(),
            end_location: start,
        };
    }

    let mut cache = PathSearchCache::default();
    let mut open = BinaryHeap::new();

    cache.nodes.insert(
        start,
        SearchNode {
            g: 0.0,
            closed: false,
            parent: None,
        },
    );
    open.push(OpenEntry {
        location: start,
        f: heuristic(start, target),
    });

    let mut best = start;
    let mut best_h = heuristic(start, target);
    let mut expansions = 0usize;

    while let Some(current) = open.pop() {
        let node = cache.nodes[&current.location];
        if node.closed {
            // Stale heap entry superseded by a cheaper path.
            continue;
        }
        cache
            .nodes
            .get_mut(&current.location)
            .expect("node just read")
            .closed = true;

        if current.location == target {
            best = target;
            break;
        }

        let h = heuristic(current.location, target);
        if h < best_h {
            best_h = h;
            best = current.location;
        }

        expansions += 1;
        if expansions >= max_steps {
            break;
        }

        for dir in Direction::ALL {
            let next = current.location.step(dir);
            let Some(tile) = tiles.get_tile_at(next) else {
                continue;
            };
            if !tile.walkable() {
                continue;
            }

            let step_cost = if dir.is_diagonal() {
                COST_DIAGONAL
            } else {
                COST_STRAIGHT
            };
            let tentative = node.g + step_cost;

            let known = cache.nodes.get(&next);
            let improves = match known {
                Some(n) => !n.closed && tentative < n.g,
                None => true,
            };
            if improves {
                cache.nodes.insert(
                    next,
                    SearchNode {
                        g: tentative,
                        closed: false,
                        parent: Some((current.location, dir)),
                    },
                );
                open.push(OpenEntry {
                    location: next,
                    f: tentative + heuristic(next, target),
                });
            }
        }
    }

    backtrack(&cache, start, best)
}

/// Walk parent links back to the start, yielding an ordered direction list
fn backtrack(cache: &PathSearchCache, start: Location, end: Location) -> PathResult {
    let mut directions = Vec::new();
    let mut current = end;
    while current != start {
        let Some(node) = cache.nodes.get(&current) else {
            break;
        };
        let Some((prev, dir)) = node.parent else {
            break;
        };
        directions.push(dir);
        current = prev;
    }
    directions.reverse();
    PathResult {
        directions,
        end_location: end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::item::Item;
    use crate::world::map::{InMemoryLoader, Map};
    use std::sync::Arc;

    fn open_map() -> Map {
        Map::new(Arc::new(InMemoryLoader::flat(32, 32, 7)))
    }

    fn wall(map: &Map, x: i32, y: i32) {
        map.get_tile_at(Location::new(x, y, 7))
            .unwrap()
            .add_item(Item::stone_wall());
    }

    /// Apply a direction sequence to a start location
    fn walk(start: Location, directions: &[Direction]) -> Location {
        directions.iter().fold(start, |loc, d| loc.step(*d))
    }

    #[test]
    fn test_same_start_and_target() {
        let map = open_map();
        let a = Location::new(5, 5, 7);
        let result = find_between(&map, a, a, 100);
        assert!(result.directions.is_empty());
        assert_eq!(result.end_location, a);
    }

    #[test]
    fn test_straight_path() {
        let map = open_map();
        let start = Location::new(2, 2, 7);
        let target = Location::new(7, 2, 7);
        let result = find_between(&map, start, target, 1000);
        assert!(result.reached(target));
        assert_eq!(result.directions.len(), 5);
        assert_eq!(walk(start, &result.directions), target);
    }

    #[test]
    fn test_diagonal_target_reached() {
        let map = open_map();
        let start = Location::new(2, 2, 7);
        let target = Location::new(6, 6, 7);
        let result = find_between(&map, start, target, 1000);
        assert!(result.reached(target));
        assert_eq!(walk(start, &result.directions), target);
    }

    #[test]
    fn test_path_around_wall() {
        let map = open_map();
        for y in 0..10 {
            wall(&map, 5, y);
        }
        let start = Location::new(2, 2, 7);
        let target = Location::new(8, 2, 7);
        let result = find_between(&map, start, target, 5000);
        assert!(result.reached(target));
        let visited: Vec<Location> = result
            .directions
            .iter()
            .scan(start, |loc, d| {
                *loc = loc.step(*d);
                Some(*loc)
            })
            .collect();
        assert!(visited.iter().all(|l| l.x != 5 || l.y >= 10));
        assert_eq!(walk(start, &result.directions), target);
    }

    #[test]
    fn test_unreachable_target_gives_partial_path() {
        let map = open_map();
        // Wall off the target completely.
        let target = Location::new(10, 10, 7);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx != 0 || dy != 0 {
                    wall(&map, 10 + dx, 10 + dy);
                }
            }
        }
        let start = Location::new(2, 10, 7);
        let result = find_between(&map, start, target, 5000);
        assert!(!result.reached(target));
        // Directions walk exactly to the reported end location.
        assert_eq!(walk(start, &result.directions), result.end_location);
        // The closest approach is right outside the wall ring.
        assert!(result.end_location.chebyshev_distance(&target) <= 2);
    }

    #[test]
    fn test_budget_exhaustion_gives_partial_path() {
        let map = open_map();
        let start = Location::new(1, 1, 7);
        let target = Location::new(30, 30, 7);
        let result = find_between(&map, start, target, 8);
        assert!(!result.reached(target));
        assert_eq!(walk(start, &result.directions), result.end_location);
        // The partial path still makes progress toward the target.
        assert!(
            result.end_location.euclidean_distance(&target)
                < start.euclidean_distance(&target)
        );
    }

    #[test]
    fn test_off_map_target_gives_partial_path() {
        let map = open_map();
        let start = Location::new(5, 5, 7);
        let target = Location::new(60, 5, 7);
        let result = find_between(&map, start, target, 20000);
        assert!(!result.reached(target));
        assert_eq!(walk(start, &result.directions), result.end_location);
    }
}
