//! Combat coordination: turning combat focus into queued attack operations
//!
//! Mirrors the walk coordinator: one task scans every creature with a combat
//! target, enqueues an attack operation the moment the combat cooldown hits
//! zero and the target is reachable, and sleeps until the earliest expiry.
//! An unreachable target is retried after one tick rather than dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::time::Instant;

use crate::combat::processor::{attack_allowed, AttackOp};
use crate::world::WorldContext;

pub struct CombatCoordinator {
    wake: Notify,
}

impl CombatCoordinator {
    pub fn new() -> Self {
        Self { wake: Notify::new() }
    }

    /// Nudge the loop: targets changed or a cooldown may have expired
    pub fn signal_attack_ready(&self) {
        self.wake.notify_one();
    }

    /// One scan over all fighters; returns how long to sleep before the next
    pub fn drive(&self, ctx: &WorldContext, now: Instant) -> Option<Duration> {
        let mut min_wait: Option<Duration> = None;
        let mut consider = |wait: Duration| {
            min_wait = Some(min_wait.map_or(wait, |w| w.min(wait)));
        };

        for attacker in ctx.registry.snapshot() {
            if !attacker.is_alive() {
                continue;
            }
            let Some(target_id) = attacker.target() else {
                continue;
            };
            let Some(target) = ctx.registry.find_by_id(target_id) else {
                attacker.clear_target();
                continue;
            };
            if !target.is_alive() {
                attacker.clear_target();
                continue;
            }

            let remaining = attacker.attack_cooldown_remaining(now);
            if remaining > Duration::ZERO {
                consider(remaining);
                continue;
            }
            if !attack_allowed(ctx, &attacker, &target) {
                // Out of reach or sight right now; check again next tick.
                consider(ctx.config.tick_interval());
                continue;
            }

            let op = AttackOp {
                attacker: attacker.id,
                target: target_id,
                sync_time: now,
            };
            if let Err(error) = ctx.request_combat_op(op) {
                tracing::warn!(%error, "combat queue unavailable");
                continue;
            }
            // Re-arm at enqueue so the loop does not spin while the
            // operation waits for the processor.
            let cost = Duration::from_millis(ctx.config.attack_cost_ms);
            attacker.record_attack(now, cost);
            consider(cost);
        }
        min_wait
    }

    pub async fn run(
        self: Arc<Self>,
        ctx: Arc<WorldContext>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let wait = self.drive(&ctx, Instant::now());
            tokio::select! {
                _ = shutdown.changed() => {}
                _ = self.wake.notified() => {}
                _ = async {
                    match wait {
                        Some(wait) => tokio::time::sleep(wait).await,
                        None => std::future::pending().await,
                    }
                } => {}
            }
        }
        tracing::debug!("combat coordinator stopped");
    }
}

impl Default for CombatCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::Location;
    use crate::notify::{NullNotifier, NullScripts};
    use crate::world::creature::{BloodKind, Creature};
    use crate::world::map::{InMemoryLoader, Map};
    use tokio::sync::mpsc;

    fn context() -> (Arc<WorldContext>, mpsc::UnboundedReceiver<AttackOp>) {
        let map = Map::new(Arc::new(InMemoryLoader::flat(64, 64, 7)));
        WorldContext::new(
            SimulationConfig::default(),
            map,
            Arc::new(NullNotifier),
            Arc::new(NullScripts),
        )
    }

    fn fighter(ctx: &WorldContext, name: &str, at: Location) -> Arc<Creature> {
        let creature = Arc::new(Creature::new(name, at, BloodKind::Blood));
        ctx.place_creature(Arc::clone(&creature)).unwrap();
        creature
    }

    #[tokio::test]
    async fn test_ready_attack_enqueued_and_rearmed() {
        let (ctx, mut ops) = context();
        let attacker = fighter(&ctx, "orc", Location::new(10, 10, 7));
        let target = fighter(&ctx, "rat", Location::new(11, 10, 7));
        attacker.set_target(target.id);

        let coordinator = CombatCoordinator::new();
        let now = Instant::now();
        let wait = coordinator.drive(&ctx, now);

        let op = ops.try_recv().unwrap();
        assert_eq!(op.attacker, attacker.id);
        assert_eq!(op.target, target.id);
        assert_eq!(op.sync_time, now);
        assert_eq!(wait, Some(Duration::from_millis(2000)));
        assert!(attacker.attack_cooldown_remaining(now) > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_cooldown_blocks_enqueue_until_expiry() {
        let (ctx, mut ops) = context();
        let attacker = fighter(&ctx, "orc", Location::new(10, 10, 7));
        let target = fighter(&ctx, "rat", Location::new(11, 10, 7));
        attacker.set_target(target.id);

        let now = Instant::now();
        attacker.record_attack(now, Duration::from_millis(2000));

        let coordinator = CombatCoordinator::new();
        // One second in: still cooling down.
        let wait = coordinator.drive(&ctx, now + Duration::from_millis(1000));
        assert!(ops.try_recv().is_err());
        assert_eq!(wait, Some(Duration::from_millis(1000)));

        // Exactly at expiry: accepted.
        coordinator.drive(&ctx, now + Duration::from_millis(2000));
        assert!(ops.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_target_retried_next_tick() {
        let (ctx, mut ops) = context();
        let attacker = fighter(&ctx, "orc", Location::new(10, 10, 7));
        let target = fighter(&ctx, "rat", Location::new(30, 10, 7));
        attacker.set_target(target.id);

        let coordinator = CombatCoordinator::new();
        let wait = coordinator.drive(&ctx, Instant::now());

        assert!(ops.try_recv().is_err());
        assert_eq!(wait, Some(ctx.config.tick_interval()));
        // Focus survives for when the target comes back into reach.
        assert_eq!(attacker.target(), Some(target.id));
    }

    #[tokio::test]
    async fn test_vanished_target_clears_focus() {
        let (ctx, _ops) = context();
        let attacker = fighter(&ctx, "orc", Location::new(10, 10, 7));
        let target = fighter(&ctx, "rat", Location::new(11, 10, 7));
        attacker.set_target(target.id);
        ctx.remove_creature(target.id).unwrap();

        CombatCoordinator::new().drive(&ctx, Instant::now());
        assert_eq!(attacker.target(), None);
    }

    #[tokio::test]
    async fn test_dead_target_clears_focus() {
        let (ctx, mut ops) = context();
        let attacker = fighter(&ctx, "orc", Location::new(10, 10, 7));
        let target = fighter(&ctx, "rat", Location::new(11, 10, 7));
        attacker.set_target(target.id);
        target.apply_damage(1000);

        CombatCoordinator::new().drive(&ctx, Instant::now());
        assert_eq!(attacker.target(), None);
        assert!(ops.try_recv().is_err());
    }
}
