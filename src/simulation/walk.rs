//! Walk coordination: turning queued steps into movement events
//!
//! One long-lived task scans every creature with queued steps, submits the
//! next step as a movement event the moment the movement cooldown hits zero,
//! and sleeps until the earliest cooldown expiry otherwise. The clock and
//! intake paths nudge it awake instead of polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::time::Instant;

use crate::notify::Notification;
use crate::scheduler::{Event, EventScheduler};
use crate::world::WorldContext;

pub struct WalkCoordinator {
    wake: Notify,
}

impl WalkCoordinator {
    pub fn new() -> Self {
        Self { wake: Notify::new() }
    }

    /// Nudge the loop: new steps were queued or a cooldown may have expired
    pub fn signal_walk_available(&self) {
        self.wake.notify_one();
    }

    /// One scan over all walkers; returns how long to sleep before the next
    pub fn drive(
        &self,
        ctx: &WorldContext,
        scheduler: &EventScheduler,
        now: Instant,
    ) -> Option<Duration> {
        let mut min_wait: Option<Duration> = None;
        let mut consider = |wait: Duration| {
            min_wait = Some(min_wait.map_or(wait, |w| w.min(wait)));
        };

        for creature in ctx.registry.snapshot() {
            if !creature.is_alive() || !creature.has_queued_steps() {
                continue;
            }
            let remaining = creature.walk_cooldown_remaining(now);
            if remaining > Duration::ZERO {
                consider(remaining);
                continue;
            }
            let Some(step) = creature.pop_expected_step() else {
                // Everything queued was stale.
                continue;
            };
            let from = creature.position();
            let to = from.step(step.direction);
            let cost = creature.step_cost(
                Duration::from_millis(ctx.config.base_step_cost_ms),
                step.direction,
                ctx.config.diagonal_step_factor,
            );

            if scheduler.schedule_immediate(ctx, Event::step(creature.id, to)) {
                // Re-arm at submission so the loop does not spin while the
                // event is in flight.
                creature.record_step(now, cost);
                if creature.has_queued_steps() {
                    consider(cost);
                }
            } else {
                // Rejected at schedule time: abandon the plan and tell the
                // walker.
                tracing::debug!(creature = %creature.name, ?to, "walk rejected, clearing plan");
                creature.clear_walk_queue();
                ctx.notifier.notify(
                    from,
                    Notification::Cancel {
                        creature: creature.id,
                        message: "Sorry, not possible.".into(),
                    },
                );
            }
        }
        min_wait
    }

    pub async fn run(
        self: Arc<Self>,
        ctx: Arc<WorldContext>,
        scheduler: Arc<EventScheduler>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let wait = self.drive(&ctx, &scheduler, Instant::now());
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
        tracing::debug!("walk coordinator stopped");
    }
}

impl Default for WalkCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::{Direction, Location};
    use crate::notify::{NullScripts, RecordingNotifier, SpectatorNotifier};
    use crate::world::creature::{BloodKind, Creature};
    use crate::world::map::{InMemoryLoader, Map, TileAccessor};

    fn context() -> (Arc<WorldContext>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let map = Map::new(Arc::new(InMemoryLoader::flat(64, 64, 7)));
        let (ctx, _rx) = WorldContext::new(
            SimulationConfig::default(),
            map,
            Arc::clone(&notifier) as Arc<dyn SpectatorNotifier>,
            Arc::new(NullScripts),
        );
        (ctx, notifier)
    }

    fn walker(ctx: &WorldContext, at: Location) -> Arc<Creature> {
        let creature = Arc::new(Creature::new("rat", at, BloodKind::Blood));
        ctx.place_creature(Arc::clone(&creature)).unwrap();
        creature
    }

    #[tokio::test]
    async fn test_ready_step_is_submitted_and_rearms_cooldown() {
        let (ctx, _) = context();
        let scheduler = EventScheduler::new();
        let creature = walker(&ctx, Location::new(10, 10, 7));
        creature.start_walk([Direction::East, Direction::East]);

        let coordinator = WalkCoordinator::new();
        let now = Instant::now();
        let wait = coordinator.drive(&ctx, &scheduler, now);

        assert_eq!(scheduler.pending_count(), 1);
        assert!(creature.walk_cooldown_remaining(now) > Duration::ZERO);
        // Second step waits for the first step's cost.
        assert_eq!(wait, Some(Duration::from_millis(400)));

        scheduler.pump(&ctx);
        assert_eq!(creature.position(), Location::new(11, 10, 7));
    }

    #[tokio::test]
    async fn test_cooldown_blocks_submission() {
        let (ctx, _) = context();
        let scheduler = EventScheduler::new();
        let creature = walker(&ctx, Location::new(10, 10, 7));
        creature.start_walk([Direction::East]);

        let now = Instant::now();
        creature.record_step(now, Duration::from_millis(400));
        let wait = coordinator_drive(&ctx, &scheduler, now);

        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(wait, Some(Duration::from_millis(400)));

        // Cooldown elapsed: the step goes through.
        let later = now + Duration::from_millis(400);
        coordinator_drive(&ctx, &scheduler, later);
        assert_eq!(scheduler.pending_count(), 1);
    }

    fn coordinator_drive(
        ctx: &WorldContext,
        scheduler: &EventScheduler,
        now: Instant,
    ) -> Option<Duration> {
        WalkCoordinator::new().drive(ctx, scheduler, now)
    }

    #[tokio::test]
    async fn test_rejected_step_clears_plan_and_cancels() {
        let (ctx, notifier) = context();
        let scheduler = EventScheduler::new();
        let creature = walker(&ctx, Location::new(63, 10, 7));
        // East leads off the map; admission gating fails.
        creature.start_walk([Direction::East, Direction::East]);

        coordinator_drive(&ctx, &scheduler, Instant::now());

        assert_eq!(scheduler.pending_count(), 0);
        assert!(!creature.has_queued_steps());
        assert_eq!(notifier.cancellations_for(creature.id).len(), 1);
    }

    #[tokio::test]
    async fn test_diagonal_step_rearms_with_scaled_cost() {
        let (ctx, _) = context();
        let scheduler = EventScheduler::new();
        let creature = walker(&ctx, Location::new(10, 10, 7));
        creature.start_walk([Direction::SouthEast]);

        let now = Instant::now();
        coordinator_drive(&ctx, &scheduler, now);
        assert_eq!(
            creature.walk_cooldown_remaining(now),
            Duration::from_millis(1200)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_walks_a_full_plan() {
        let (ctx, _) = context();
        let scheduler = Arc::new(EventScheduler::new());
        let creature = walker(&ctx, Location::new(10, 10, 7));
        creature.start_walk([Direction::East, Direction::East, Direction::South]);

        let (tx, rx) = watch::channel(false);
        let coordinator = Arc::new(WalkCoordinator::new());
        let walk_task = tokio::spawn(Arc::clone(&coordinator).run(
            Arc::clone(&ctx),
            Arc::clone(&scheduler),
            rx.clone(),
        ));
        let sched_task = tokio::spawn(Arc::clone(&scheduler).run(Arc::clone(&ctx), rx));
        coordinator.signal_walk_available();

        // Three steps at 400ms each.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(creature.position(), Location::new(12, 11, 7));

        tx.send(true).unwrap();
        walk_task.await.unwrap();
        sched_task.await.unwrap();

        let tile = ctx.map.get_tile_at(Location::new(12, 11, 7)).unwrap();
        assert!(tile.has_creatures());
    }
}
