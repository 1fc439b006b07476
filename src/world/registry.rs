//! Identity-to-creature lookup shared by every loop

use std::sync::{Arc, RwLock};

use ahash::AHashMap;

use crate::core::types::CreatureId;
use crate::world::creature::Creature;

/// Concurrency-safe id → creature map
#[derive(Default)]
pub struct CreatureRegistry {
    creatures: RwLock<AHashMap<CreatureId, Arc<Creature>>>,
}

impl CreatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, creature: Arc<Creature>) {
        self.creatures
            .write()
            .unwrap()
            .insert(creature.id, creature);
    }

    /// Remove a creature; returns it if it was present
    pub fn unregister(&self, id: CreatureId) -> Option<Arc<Creature>> {
        self.creatures.write().unwrap().remove(&id)
    }

    pub fn find_by_id(&self, id: CreatureId) -> Option<Arc<Creature>> {
        self.creatures.read().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.creatures.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.read().unwrap().is_empty()
    }

    /// Stable snapshot for loop iteration, outside the lock
    pub fn snapshot(&self) -> Vec<Arc<Creature>> {
        self.creatures.read().unwrap().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Location;
    use crate::world::creature::BloodKind;

    #[test]
    fn test_register_find_unregister() {
        let registry = CreatureRegistry::new();
        let creature = Arc::new(Creature::new(
            "rat",
            Location::new(0, 0, 7),
            BloodKind::Blood,
        ));
        let id = creature.id;

        registry.register(Arc::clone(&creature));
        assert!(registry.find_by_id(id).is_some());
        assert_eq!(registry.len(), 1);

        let removed = registry.unregister(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(registry.find_by_id(id).is_none());
        assert!(registry.unregister(id).is_none());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = CreatureRegistry::new();
        let creature = Arc::new(Creature::new(
            "rat",
            Location::new(0, 0, 7),
            BloodKind::Blood,
        ));
        registry.register(Arc::clone(&creature));

        let snapshot = registry.snapshot();
        registry.unregister(creature.id);
        assert_eq!(snapshot.len(), 1);
    }
}
