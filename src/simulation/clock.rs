//! The fixed-step simulation clock
//!
//! Every 500ms step runs the same phase sequence: thinking, speech,
//! movement, combat, world. Phases hand work to the scheduler and the
//! coordinators; the clock itself never blocks on them. An overrunning
//! tick shortens the following pause instead of skipping a step.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::scheduler::{Action, EvaluationPolicy, Event, EventScheduler};
use crate::simulation::attack::CombatCoordinator;
use crate::simulation::walk::WalkCoordinator;
use crate::world::creature::Intent;
use crate::world::light::WorldLight;
use crate::world::WorldContext;

pub struct SimulationClock {
    tick: u64,
    /// Stop after this many ticks; None runs until shutdown
    tick_limit: Option<u64>,
}

impl SimulationClock {
    pub fn new(tick_limit: Option<u64>) -> Self {
        Self {
            tick: 0,
            tick_limit,
        }
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Run one full phase sequence at the current tick
    ///
    /// Events yielded by the phases are scheduled with their delays reduced
    /// by the time the phases themselves took, so a slow tick does not push
    /// intended fire times outward.
    pub fn step(
        &mut self,
        ctx: &WorldContext,
        scheduler: &EventScheduler,
        walk: &WalkCoordinator,
        combat: &CombatCoordinator,
    ) {
        let started = Instant::now();
        for (event, delay) in self.phases(ctx, walk, combat) {
            let delay = delay.saturating_sub(started.elapsed());
            scheduler.schedule(ctx, event, delay);
        }
        self.tick += 1;
    }

    /// The ordered advancement phases; yields events to schedule
    fn phases(
        &self,
        ctx: &WorldContext,
        walk: &WalkCoordinator,
        combat: &CombatCoordinator,
    ) -> Vec<(Event, Duration)> {
        let mut due = Vec::new();
        let creatures = ctx.registry.snapshot();

        // Thinking: brains queue their own steps.
        for creature in &creatures {
            if !creature.is_alive() {
                continue;
            }
            for intent in creature.think() {
                match intent {
                    Intent::Step(direction) => creature.queue_step(direction),
                }
            }
        }

        // Speech: pending utterances become say events.
        for creature in &creatures {
            for text in creature.drain_speech() {
                let event = Event::new(EvaluationPolicy::OnExecute)
                    .requested_by(creature.id)
                    .then(Action::Say {
                        creature: creature.id,
                        text,
                    });
                due.push((event, Duration::ZERO));
            }
        }

        // Movement and combat: wake the coordinators.
        walk.signal_walk_available();
        combat.signal_attack_ready();

        // World: day/night cycle.
        let level = WorldLight::level_for(self.tick, ctx.config.day_length_ticks);
        if level != ctx.light.level() {
            let event = Event::new(EvaluationPolicy::OnExecute)
                .then(Action::SetAmbientLight { level });
            due.push((event, Duration::ZERO));
        }

        due
    }

    pub async fn run(
        mut self,
        ctx: Arc<WorldContext>,
        scheduler: Arc<EventScheduler>,
        walk: Arc<WalkCoordinator>,
        combat: Arc<CombatCoordinator>,
        mut shutdown: watch::Receiver<bool>,
    ) -> u64 {
        let interval = ctx.config.tick_interval();
        let mut next = Instant::now() + interval;
        loop {
            if *shutdown.borrow() {
                break;
            }
            self.step(&ctx, &scheduler, &walk, &combat);
            if self.tick_limit.is_some_and(|limit| self.tick >= limit) {
                tracing::info!(ticks = self.tick, "tick limit reached");
                break;
            }

            if Instant::now() >= next {
                tracing::warn!(tick = self.tick, "time is slipping");
                next = Instant::now();
            }
            tokio::select! {
                _ = shutdown.changed() => {}
                _ = tokio::time::sleep_until(next) => {}
            }
            next += interval;
        }
        tracing::debug!(ticks = self.tick, "simulation clock stopped");
        self.tick
    }
}
