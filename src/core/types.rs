//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for creatures (players and monsters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatureId(pub Uuid);

impl CreatureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CreatureId {
    fn default() -> Self {
        Self::new()
    }
}

/// Item type identifier, resolved by an external catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemTypeId(pub u32);

/// Opaque event identifier, assigned at schedule time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

/// A 3D tile coordinate: x/y on a floor, z selects the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub z: u8,
}

impl Location {
    pub fn new(x: i32, y: i32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// The location one step in the given direction, same floor
    pub fn step(&self, dir: Direction) -> Location {
        let (dx, dy) = dir.delta();
        Location::new(self.x + dx, self.y + dy, self.z)
    }

    /// Chebyshev distance on the same floor
    pub fn chebyshev_distance(&self, other: &Location) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Straight-line distance, ignoring floors
    pub fn euclidean_distance(&self, other: &Location) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Sector containing this location
    pub fn sector(&self) -> SectorCoord {
        SectorCoord {
            x: self.x.div_euclid(SECTOR_SIZE),
            y: self.y.div_euclid(SECTOR_SIZE),
            z: self.z,
        }
    }
}

/// Side length of a map sector (tiles)
pub const SECTOR_SIZE: i32 = 32;

/// Coordinate of a map sector (a SECTOR_SIZE x SECTOR_SIZE block on one floor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectorCoord {
    pub x: i32,
    pub y: i32,
    pub z: u8,
}

impl SectorCoord {
    /// Top-left tile of this sector
    pub fn origin(&self) -> Location {
        Location::new(self.x * SECTOR_SIZE, self.y * SECTOR_SIZE, self.z)
    }

    /// The 8 neighboring sectors on the same floor
    pub fn neighbors(&self) -> [SectorCoord; 8] {
        let mut out = [*self; 8];
        let deltas = [
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ];
        for (slot, (dx, dy)) in out.iter_mut().zip(deltas) {
            slot.x = self.x + dx;
            slot.y = self.y + dy;
        }
        out
    }
}

/// One of the eight walkable directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    /// (dx, dy) offset of one step
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
            Direction::NorthWest => (-1, -1),
        }
    }

    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            Direction::NorthEast
                | Direction::SouthEast
                | Direction::SouthWest
                | Direction::NorthWest
        )
    }

    /// Direction from one tile to an adjacent tile, if they are adjacent
    pub fn between(from: Location, to: Location) -> Option<Direction> {
        if from.z != to.z {
            return None;
        }
        let delta = (to.x - from.x, to.y - from.y);
        Direction::ALL.iter().copied().find(|d| d.delta() == delta)
    }
}
