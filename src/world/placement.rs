//! Bulk creature placement at world bootstrap
//!
//! Spawn descriptors are materialized into creatures (in parallel for big
//! batches), then placed sequentially, since placement mutates shared tile
//! and registry state. A descriptor landing on a blocked or void tile is
//! skipped with a warning rather than failing the whole batch.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::core::types::Location;
use crate::world::creature::{BloodKind, Brain, Creature};
use crate::world::map::TileAccessor;
use crate::world::WorldContext;

/// Everything needed to materialize one creature
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub name: String,
    pub position: Location,
    pub blood: BloodKind,
    pub brain: Brain,
    pub rng_seed: Option<u64>,
}

impl SpawnSpec {
    pub fn new(name: impl Into<String>, position: Location) -> Self {
        Self {
            name: name.into(),
            position,
            blood: BloodKind::Blood,
            brain: Brain::Static,
            rng_seed: None,
        }
    }

    pub fn blood(mut self, blood: BloodKind) -> Self {
        self.blood = blood;
        self
    }

    pub fn brain(mut self, brain: Brain) -> Self {
        self.brain = brain;
        self
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

fn materialize(spec: &SpawnSpec) -> Arc<Creature> {
    let mut creature =
        Creature::new(spec.name.clone(), spec.position, spec.blood).with_brain(spec.brain);
    if let Some(seed) = spec.rng_seed {
        creature = creature.with_rng_seed(seed);
    }
    Arc::new(creature)
}

/// Materialize and place a batch of spawn descriptors
///
/// Returns the number actually placed.
pub fn populate(ctx: &WorldContext, specs: &[SpawnSpec]) -> usize {
    let creatures: Vec<Arc<Creature>> =
        if specs.len() >= ctx.config.parallel_placement_threshold {
            specs.par_iter().map(materialize).collect()
        } else {
            specs.iter().map(materialize).collect()
        };

    let mut placed = 0;
    for creature in creatures {
        let position = creature.position();
        let walkable = ctx
            .map
            .get_tile_at(position)
            .is_some_and(|t| t.walkable());
        if !walkable {
            tracing::warn!(name = %creature.name, ?position, "spawn tile blocked, skipping");
            continue;
        }
        match ctx.place_creature(creature) {
            Ok(()) => placed += 1,
            Err(error) => tracing::warn!(%error, "placement failed"),
        }
    }
    tracing::info!(requested = specs.len(), placed, "populated world");
    placed
}

/// Scatter wandering monsters over open tiles of one floor
///
/// Deterministic for a given seed. Candidate positions are drawn uniformly
/// from the rectangle; blocked draws are retried a bounded number of times.
pub fn scatter_monsters(
    ctx: &WorldContext,
    count: usize,
    width: i32,
    height: i32,
    floor: u8,
    seed: u64,
) -> usize {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut specs = Vec::with_capacity(count);
    let names = ["rat", "bat", "orc", "ghoul", "spider"];
    let bloods = [
        BloodKind::Blood,
        BloodKind::Blood,
        BloodKind::Blood,
        BloodKind::Undead,
        BloodKind::Slime,
    ];

    for n in 0..count {
        let mut position = None;
        for _ in 0..16 {
            let candidate = Location::new(rng.gen_range(0..width), rng.gen_range(0..height), floor);
            let open = ctx
                .map
                .get_tile_at(candidate)
                .is_some_and(|t| t.walkable());
            if open {
                position = Some(candidate);
                break;
            }
        }
        let Some(position) = position else { continue };
        let kind = n % names.len();
        specs.push(
            SpawnSpec::new(names[kind], position)
                .blood(bloods[kind])
                .brain(Brain::Wander)
                .seeded(rng.gen()),
        );
    }
    populate(ctx, &specs)
}
