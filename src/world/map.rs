//! Map: location-keyed, lazily-paged collection of tiles
//!
//! Tiles are grouped into fixed-size sectors. A sector loads on first access
//! through the `SectorLoader` capability under a coarse load lock; the eight
//! neighboring sectors are then prefetched on background tasks. A lookup
//! inside an already-loaded sector only takes the sector-table read lock and
//! never blocks on loading.

use std::sync::{Arc, Mutex, RwLock};

use ahash::AHashMap;

use crate::core::types::{Location, SectorCoord, SECTOR_SIZE};
use crate::world::item::Item;
use crate::world::tile::Tile;

/// Read-only tile lookup capability
///
/// Pathfinding and sight checks read the world exclusively through this
/// trait, so they work against the real map or a test fixture alike.
pub trait TileAccessor: Send + Sync {
    fn get_tile_at(&self, location: Location) -> Option<Arc<Tile>>;
}

/// Source of sector content (map file reader, generator, ...)
pub trait SectorLoader: Send + Sync {
    /// Produce all tiles of a sector; empty if the sector is outside the world
    fn load(&self, sector: SectorCoord) -> Vec<Tile>;
}

/// One loaded block of tiles
struct Sector {
    tiles: AHashMap<Location, Arc<Tile>>,
}

struct MapInner {
    sectors: RwLock<AHashMap<SectorCoord, Arc<Sector>>>,
    /// Coarse lock serializing sector loads
    load_lock: Mutex<()>,
    loader: Arc<dyn SectorLoader>,
}

/// The spatial index over all loaded tiles
#[derive(Clone)]
pub struct Map {
    inner: Arc<MapInner>,
}

impl Map {
    pub fn new(loader: Arc<dyn SectorLoader>) -> Self {
        Self {
            inner: Arc::new(MapInner {
                sectors: RwLock::new(AHashMap::new()),
                load_lock: Mutex::new(()),
                loader,
            }),
        }
    }

    /// Whether the sector containing `location` is resident
    pub fn has_loaded(&self, sector: SectorCoord) -> bool {
        self.inner.sectors.read().unwrap().contains_key(&sector)
    }

    pub fn loaded_sector_count(&self) -> usize {
        self.inner.sectors.read().unwrap().len()
    }

    /// Load a sector if absent, returning it either way
    fn ensure_loaded(inner: &Arc<MapInner>, sector: SectorCoord) -> Arc<Sector> {
        // Fast path: already resident.
        if let Some(s) = inner.sectors.read().unwrap().get(&sector) {
            return Arc::clone(s);
        }

        let _guard = inner.load_lock.lock().unwrap();
        // Re-check: another loader may have won the race.
        if let Some(s) = inner.sectors.read().unwrap().get(&sector) {
            return Arc::clone(s);
        }

        let tiles = inner.loader.load(sector);
        tracing::debug!(?sector, tile_count = tiles.len(), "loaded sector");
        let sector_data = Arc::new(Sector {
            tiles: tiles
                .into_iter()
                .map(|t| (t.location(), Arc::new(t)))
                .collect(),
        });
        inner
            .sectors
            .write()
            .unwrap()
            .insert(sector, Arc::clone(&sector_data));
        sector_data
    }

    /// Queue background loads for the sectors around `sector`
    ///
    /// Skipped outside a tokio runtime (synchronous tests, tools).
    fn prefetch_neighbors(&self, sector: SectorCoord) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        for neighbor in sector.neighbors() {
            if self.has_loaded(neighbor) {
                continue;
            }
            let inner = Arc::clone(&self.inner);
            handle.spawn_blocking(move || {
                Map::ensure_loaded(&inner, neighbor);
            });
        }
    }
}

impl TileAccessor for Map {
    fn get_tile_at(&self, location: Location) -> Option<Arc<Tile>> {
        let sector = location.sector();
        if let Some(s) = self.inner.sectors.read().unwrap().get(&sector) {
            return s.tiles.get(&location).cloned();
        }
        let loaded = Map::ensure_loaded(&self.inner, sector);
        self.prefetch_neighbors(sector);
        loaded.tiles.get(&location).cloned()
    }
}

/// Rectangular generated world for tests and the demo binary
///
/// Every tile inside the bounds gets a grass ground; everything outside is
/// void. Stands in for the external map-file reader.
pub struct InMemoryLoader {
    pub width: i32,
    pub height: i32,
    pub floor: u8,
}

impl InMemoryLoader {
    pub fn flat(width: i32, height: i32, floor: u8) -> Self {
        Self {
            width,
            height,
            floor,
        }
    }
}

impl SectorLoader for InMemoryLoader {
    fn load(&self, sector: SectorCoord) -> Vec<Tile> {
        if sector.z != self.floor {
            return Vec::new();
        }
        let origin = sector.origin();
        let mut tiles = Vec::new();
        for dy in 0..SECTOR_SIZE {
            for dx in 0..SECTOR_SIZE {
                let loc = Location::new(origin.x + dx, origin.y + dy, sector.z);
                if loc.x < 0 || loc.y < 0 || loc.x >= self.width || loc.y >= self.height {
                    continue;
                }
                tiles.push(Tile::with_ground(loc, Item::grass()));
            }
        }
        tiles
    }
}
