//! Combat operation queue and its single consumer
//!
//! Coordinators (and event actions) are the producers; exactly one
//! `CombatProcessor` drains the queue. Because world state can change
//! between enqueue and dequeue, every operation is re-validated before
//! resolution and silently discarded on failure, never retried.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::combat::resolution::resolve_attack;
use crate::combat::sight::{can_observe, in_melee_range, line_of_sight_clear};
use crate::core::types::CreatureId;
use crate::notify::Notification;
use crate::world::creature::Creature;
use crate::world::WorldContext;

/// One queued attack, stamped with the cooldown-synchronization instant
#[derive(Debug, Clone, Copy)]
pub struct AttackOp {
    pub attacker: CreatureId,
    pub target: CreatureId,
    /// Instant at which the attacker's cooldown was verified zero
    pub sync_time: Instant,
}

/// Gating check shared by enqueue (coordinator) and dequeue (processor):
/// target observable, in melee reach, and in clear line of sight
pub fn attack_allowed(ctx: &WorldContext, attacker: &Creature, target: &Creature) -> bool {
    let from = attacker.position();
    let to = target.position();
    can_observe(&ctx.config, from, to)
        && in_melee_range(&ctx.config, from, to)
        && line_of_sight_clear(&ctx.map, from, to)
}

/// Single consumer of the shared combat queue
pub struct CombatProcessor {
    rng: StdRng,
}

impl CombatProcessor {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub async fn run(
        mut self,
        ctx: Arc<WorldContext>,
        mut ops: mpsc::UnboundedReceiver<AttackOp>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                op = ops.recv() => {
                    let Some(op) = op else { break };
                    self.process(&ctx, op);
                }
            }
        }
        tracing::debug!("combat processor stopped");
    }

    /// Re-validate and resolve one operation
    pub fn process(&mut self, ctx: &WorldContext, op: AttackOp) {
        let Some(attacker) = ctx.registry.find_by_id(op.attacker) else {
            return;
        };
        let Some(target) = ctx.registry.find_by_id(op.target) else {
            return;
        };
        if !attack_allowed(ctx, &attacker, &target) {
            // State moved between enqueue and dequeue; drop without retry.
            tracing::trace!(
                attacker = %attacker.name,
                target = %target.name,
                "discarding combat op that failed re-validation"
            );
            return;
        }

        // Resolve against the synchronization instant so the cooldown
        // re-arms on the exact cadence the coordinator verified.
        let report = resolve_attack(&attacker, &target, op.sync_time, &ctx.config, &mut self.rng);
        ctx.notifier.notify(
            target.position(),
            Notification::AttackResolved {
                attacker: attacker.id,
                target: target.id,
                effect: report.effect,
                damage: report.damage,
            },
        );
        if report.target_health_after == 0 {
            tracing::info!(target = %target.name, "creature died");
        }
    }
}

impl Default for CombatProcessor {
    fn default() -> Self {
        Self::new()
    }
}
