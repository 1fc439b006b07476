//! World state: tiles, map, creatures, and the shared context bundle

pub mod creature;
pub mod item;
pub mod light;
pub mod map;
pub mod placement;
pub mod registry;
pub mod tile;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::combat::processor::AttackOp;
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, WorldError};
use crate::core::types::{CreatureId, Location};
use crate::notify::{Notification, ScriptDispatcher, SpectatorNotifier};
use crate::world::creature::Creature;
use crate::world::light::WorldLight;
use crate::world::map::{Map, TileAccessor};
use crate::world::registry::CreatureRegistry;

/// Everything a running world hands its collaborators
///
/// Constructed once at bootstrap and passed explicitly; there is no global
/// world instance.
pub struct WorldContext {
    pub config: SimulationConfig,
    pub map: Map,
    pub registry: CreatureRegistry,
    pub light: WorldLight,
    pub notifier: Arc<dyn SpectatorNotifier>,
    pub scripts: Arc<dyn ScriptDispatcher>,
    combat_tx: mpsc::UnboundedSender<AttackOp>,
}

impl WorldContext {
    /// Build the context plus the receiving end of the combat queue
    pub fn new(
        config: SimulationConfig,
        map: Map,
        notifier: Arc<dyn SpectatorNotifier>,
        scripts: Arc<dyn ScriptDispatcher>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<AttackOp>) {
        let (combat_tx, combat_rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(Self {
            config,
            map,
            registry: CreatureRegistry::new(),
            light: WorldLight::new(),
            notifier,
            scripts,
            combat_tx,
        });
        (ctx, combat_rx)
    }

    /// Enqueue an attack operation for the combat processor
    pub fn request_combat_op(&self, op: AttackOp) -> Result<()> {
        self.combat_tx
            .send(op)
            .map_err(|_| WorldError::CombatQueueClosed)
    }

    /// Register a creature and put it on the tile at its position
    pub fn place_creature(&self, creature: Arc<Creature>) -> Result<()> {
        let position = creature.position();
        let tile = self
            .map
            .get_tile_at(position)
            .ok_or(WorldError::TileNotFound(position))?;
        tile.add_creature(creature.id);
        self.registry.register(creature);
        Ok(())
    }

    /// Take a creature out of the world entirely
    pub fn remove_creature(&self, id: CreatureId) -> Result<Arc<Creature>> {
        let creature = self
            .registry
            .unregister(id)
            .ok_or(WorldError::CreatureNotFound(id))?;
        if let Some(tile) = self.map.get_tile_at(creature.position()) {
            // Already gone from the tile is fine here.
            let _ = tile.remove_creature(id);
        }
        Ok(creature)
    }

    /// Move a creature one tile, updating both cells and notifying spectators
    ///
    /// Cooldown re-arming is the walk coordinator's job; this only mutates
    /// world state.
    pub fn move_creature(&self, id: CreatureId, to: Location) -> Result<()> {
        let creature = self
            .registry
            .find_by_id(id)
            .ok_or(WorldError::CreatureNotFound(id))?;
        let from = creature.position();
        let dest = self
            .map
            .get_tile_at(to)
            .ok_or(WorldError::TileNotFound(to))?;
        if !dest.walkable() {
            return Err(WorldError::NotWalkable(to));
        }
        if let Some(origin) = self.map.get_tile_at(from) {
            let _ = origin.remove_creature(id);
        }
        dest.add_creature(id);
        creature.set_position(to);
        self.notifier
            .notify(from, Notification::CreatureMoved { creature: id, from, to });
        Ok(())
    }
}
