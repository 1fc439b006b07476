//! Tile: layered content at one map coordinate
//!
//! A tile holds at most one ground item plus ordered stacks of stay-on-top
//! items, stay-on-bottom items, creatures, and regular ("down") items. The
//! fixed layer order (ground, top, bottom, creatures, down) defines
//! stack-position addressing for clients.
//!
//! Each layer is guarded by its own lock; cross-layer operations acquire only
//! the layers they touch, so no cross-layer atomicity is promised. Every
//! mutation bumps the last-modified stamp, which invalidates the cached
//! blocking/sight flags.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::core::error::{Result, WorldError};
use crate::core::types::{CreatureId, ItemTypeId, Location};
use crate::world::item::{Item, ItemKind};

/// Anything addressable on a tile by stack position
#[derive(Debug, Clone, PartialEq)]
pub enum Thing {
    Item(Item),
    Creature(CreatureId),
}

/// Derived per-tile properties, recomputed when content changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileFlags {
    /// Some item (or missing ground) forbids walking onto the tile
    pub blocks_walk: bool,
    /// Some item blocks line of sight through the tile
    pub blocks_sight: bool,
}

#[derive(Debug, Default)]
struct FlagsCache {
    stamp: u64,
    flags: TileFlags,
}

/// One cell of the spatial index
#[derive(Debug)]
pub struct Tile {
    location: Location,
    ground: Mutex<Option<Item>>,
    /// Stay-on-top items, oldest first
    top_items: Mutex<VecDeque<Item>>,
    /// Stay-on-bottom items, oldest first
    bottom_items: Mutex<VecDeque<Item>>,
    /// Down items, front = top of stack
    down_items: Mutex<VecDeque<Item>>,
    /// Creatures, front = most recently arrived
    creatures: Mutex<Vec<CreatureId>>,
    /// Bumped on every content mutation
    stamp: AtomicU64,
    flags_cache: Mutex<FlagsCache>,
}

impl Tile {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            ground: Mutex::new(None),
            top_items: Mutex::new(VecDeque::new()),
            bottom_items: Mutex::new(VecDeque::new()),
            down_items: Mutex::new(VecDeque::new()),
            creatures: Mutex::new(Vec::new()),
            stamp: AtomicU64::new(0),
            flags_cache: Mutex::new(FlagsCache::default()),
        }
    }

    /// A tile pre-seeded with a ground item
    pub fn with_ground(location: Location, ground: Item) -> Self {
        let tile = Tile::new(location);
        tile.add_item(ground);
        tile
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Monotonic stamp of the last content mutation
    pub fn last_modified(&self) -> u64 {
        self.stamp.load(Ordering::Acquire)
    }

    fn touch(&self) {
        self.stamp.fetch_add(1, Ordering::AcqRel);
    }

    // === content addition ===

    /// Add an item, routed by its classification
    ///
    /// A second ground item replaces the existing one. Cumulative down items
    /// merge into the current top of the down stack when the type matches and
    /// capacity allows; overflow creates new entries carrying the remainder.
    pub fn add_item(&self, item: Item) {
        match item.kind {
            ItemKind::Ground => {
                *self.ground.lock().unwrap() = Some(item);
            }
            ItemKind::StayOnTop => {
                self.top_items.lock().unwrap().push_back(item);
            }
            ItemKind::StayOnBottom => {
                self.bottom_items.lock().unwrap().push_back(item);
            }
            ItemKind::Down => {
                let mut down = self.down_items.lock().unwrap();
                Self::push_down_item(&mut down, item);
            }
        }
        self.touch();
    }

    fn push_down_item(down: &mut VecDeque<Item>, mut item: Item) {
        if item.is_cumulative() {
            if let Some(top) = down.front_mut() {
                if top.can_merge_with(&item) {
                    let overflow = top.absorb(item.amount);
                    if overflow == 0 {
                        return;
                    }
                    item.amount = overflow;
                    // Fall through: a fresh entry carries the remainder.
                }
            }
            // Entries above the per-type maximum split into full stacks.
            // A zero maximum can only come from a hand-built item; the
            // constructor rejects it. Skip the split so it cannot loop.
            if let Some(max) = item.max_amount.filter(|m| *m > 0) {
                while item.amount > max {
                    let mut full = item.clone();
                    full.amount = max;
                    item.amount -= max;
                    down.push_front(full);
                }
            }
        }
        down.push_front(item);
    }

    /// Put a creature on top of the creature layer
    pub fn add_creature(&self, id: CreatureId) {
        self.creatures.lock().unwrap().insert(0, id);
        self.touch();
    }

    // === content removal ===

    /// Remove a creature, preserving the order of the rest
    pub fn remove_creature(&self, id: CreatureId) -> Result<()> {
        let mut creatures = self.creatures.lock().unwrap();
        let idx = creatures
            .iter()
            .position(|c| *c == id)
            .ok_or(WorldError::ThingNotFound)?;
        creatures.remove(idx);
        drop(creatures);
        self.touch();
        Ok(())
    }

    /// Remove `amount` units of the topmost down item of the given type
    ///
    /// Returns the removed portion. Removing less than a cumulative entry's
    /// amount splits off a remainder item; the entry keeps the rest. A zero
    /// amount is a caller contract violation.
    pub fn remove_item(&self, type_id: ItemTypeId, amount: u16) -> Result<Item> {
        if amount == 0 {
            return Err(WorldError::ZeroAmount);
        }
        let mut down = self.down_items.lock().unwrap();
        let idx = down
            .iter()
            .position(|i| i.type_id == type_id)
            .ok_or(WorldError::ThingNotFound)?;

        let entry = &mut down[idx];
        let removed = if entry.is_cumulative() && amount < entry.amount {
            entry.split(amount)?
        } else if entry.is_cumulative() && amount > entry.amount {
            return Err(WorldError::WrongKind(
                "remove amount exceeds entry amount".into(),
            ));
        } else {
            down.remove(idx).expect("index just found")
        };
        drop(down);
        self.touch();
        Ok(removed)
    }

    /// Remove one matching stay-on-top or stay-on-bottom item in place,
    /// preserving the relative order of the remaining entries
    pub fn remove_fixed_item(&self, item: &Item) -> Result<()> {
        let layer = match item.kind {
            ItemKind::StayOnTop => &self.top_items,
            ItemKind::StayOnBottom => &self.bottom_items,
            _ => {
                return Err(WorldError::WrongKind(
                    "remove_fixed_item expects a stay-on-top/bottom item".into(),
                ))
            }
        };
        let mut items = layer.lock().unwrap();
        let idx = items
            .iter()
            .position(|i| i == item)
            .ok_or(WorldError::ThingNotFound)?;
        items.remove(idx);
        drop(items);
        self.touch();
        Ok(())
    }

    // === stack-position addressing ===

    /// Thing at a client-facing stack position
    ///
    /// Order: ground, stay-on-top, stay-on-bottom, creatures, down items.
    /// An out-of-range index yields None, never a fault.
    pub fn thing_at_stack_position(&self, position: usize) -> Option<Thing> {
        let mut index = position;

        {
            let ground = self.ground.lock().unwrap();
            if let Some(g) = ground.as_ref() {
                if index == 0 {
                    return Some(Thing::Item(g.clone()));
                }
                index -= 1;
            }
        }
        {
            let top = self.top_items.lock().unwrap();
            if index < top.len() {
                return Some(Thing::Item(top[index].clone()));
            }
            index -= top.len();
        }
        {
            let bottom = self.bottom_items.lock().unwrap();
            if index < bottom.len() {
                return Some(Thing::Item(bottom[index].clone()));
            }
            index -= bottom.len();
        }
        {
            let creatures = self.creatures.lock().unwrap();
            if index < creatures.len() {
                return Some(Thing::Creature(creatures[index]));
            }
            index -= creatures.len();
        }
        {
            let down = self.down_items.lock().unwrap();
            if index < down.len() {
                return Some(Thing::Item(down[index].clone()));
            }
        }
        None
    }

    /// Stack position of a thing present on this tile
    pub fn stack_position_of(&self, thing: &Thing) -> Option<usize> {
        let mut offset = 0;

        {
            let ground = self.ground.lock().unwrap();
            if let Some(g) = ground.as_ref() {
                if matches!(thing, Thing::Item(i) if i == g) {
                    return Some(0);
                }
                offset += 1;
            }
        }
        {
            let top = self.top_items.lock().unwrap();
            if let Thing::Item(item) = thing {
                if let Some(idx) = top.iter().position(|i| i == item) {
                    return Some(offset + idx);
                }
            }
            offset += top.len();
        }
        {
            let bottom = self.bottom_items.lock().unwrap();
            if let Thing::Item(item) = thing {
                if let Some(idx) = bottom.iter().position(|i| i == item) {
                    return Some(offset + idx);
                }
            }
            offset += bottom.len();
        }
        {
            let creatures = self.creatures.lock().unwrap();
            if let Thing::Creature(id) = thing {
                if let Some(idx) = creatures.iter().position(|c| c == id) {
                    return Some(offset + idx);
                }
            }
            offset += creatures.len();
        }
        {
            let down = self.down_items.lock().unwrap();
            if let Thing::Item(item) = thing {
                if let Some(idx) = down.iter().position(|i| i == item) {
                    return Some(offset + idx);
                }
            }
        }
        None
    }

    // === queries ===

    /// Total units of a down-item type on this tile
    pub fn count_of(&self, type_id: ItemTypeId) -> u32 {
        self.down_items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.type_id == type_id)
            .map(|i| u32::from(i.amount))
            .sum()
    }

    /// Number of distinct down-stack entries
    pub fn down_entry_count(&self) -> usize {
        self.down_items.lock().unwrap().len()
    }

    pub fn creature_ids(&self) -> Vec<CreatureId> {
        self.creatures.lock().unwrap().clone()
    }

    pub fn has_creatures(&self) -> bool {
        !self.creatures.lock().unwrap().is_empty()
    }

    /// Derived blocking/sight flags, cached against the mutation stamp
    pub fn flags(&self) -> TileFlags {
        let stamp = self.last_modified();
        {
            let cache = self.flags_cache.lock().unwrap();
            if cache.stamp == stamp && stamp != 0 {
                return cache.flags;
            }
        }
        let flags = self.compute_flags();
        let mut cache = self.flags_cache.lock().unwrap();
        // Another thread may have refreshed with a newer stamp; keep ours
        // only if it is not older.
        if stamp >= cache.stamp {
            *cache = FlagsCache { stamp, flags };
        }
        flags
    }

    fn compute_flags(&self) -> TileFlags {
        let mut flags = TileFlags::default();
        {
            let ground = self.ground.lock().unwrap();
            match ground.as_ref() {
                Some(g) => {
                    flags.blocks_walk |= g.flags.blocks_walk;
                    flags.blocks_sight |= g.flags.blocks_sight;
                }
                // No ground means void: never walkable.
                None => flags.blocks_walk = true,
            }
        }
        for layer in [&self.top_items, &self.bottom_items, &self.down_items] {
            for item in layer.lock().unwrap().iter() {
                flags.blocks_walk |= item.flags.blocks_walk;
                flags.blocks_sight |= item.flags.blocks_sight;
            }
        }
        flags
    }

    /// Whether a creature may step onto this tile right now
    pub fn walkable(&self) -> bool {
        !self.flags().blocks_walk && !self.has_creatures()
    }

    /// Whether the tile's content lets sight rays pass
    pub fn sight_clear(&self) -> bool {
        !self.flags().blocks_sight
    }
}
