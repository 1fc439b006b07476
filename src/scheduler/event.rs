//! The event model: conditions, actions, evaluation policy
//!
//! An event is plain data: an ordered condition list gating two ordered
//! action lists, plus a policy saying when the conditions are checked.
//! Conditions and actions are closed enums; new event kinds are composed
//! from them, never subclassed.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::combat::processor::AttackOp;
use crate::core::error::Result;
use crate::core::types::{CreatureId, EventId, Location};
use crate::notify::Notification;
use crate::world::map::TileAccessor;
use crate::world::WorldContext;

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// When an event's conditions are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationPolicy {
    /// Gate admission to the scheduler; fire unconditionally
    OnSchedule,
    /// Admit unconditionally; re-check at fire time
    OnExecute,
    /// Gate admission and re-check at fire time
    OnBoth,
}

/// A single gating condition, evaluated against live world state
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    CreatureAlive(CreatureId),
    CreatureAt {
        creature: CreatureId,
        location: Location,
    },
    TileWalkable(Location),
}

impl Condition {
    pub fn evaluate(&self, ctx: &WorldContext) -> bool {
        match self {
            Condition::CreatureAlive(id) => ctx
                .registry
                .find_by_id(*id)
                .is_some_and(|c| c.is_alive()),
            Condition::CreatureAt { creature, location } => ctx
                .registry
                .find_by_id(*creature)
                .is_some_and(|c| c.position() == *location),
            Condition::TileWalkable(location) => ctx
                .map
                .get_tile_at(*location)
                .is_some_and(|t| t.walkable()),
        }
    }
}

/// A single world mutation or outward request
#[derive(Debug, Clone)]
pub enum Action {
    MoveCreature {
        creature: CreatureId,
        to: Location,
    },
    Say {
        creature: CreatureId,
        text: String,
    },
    /// Short client-facing cancellation notice
    Cancel {
        creature: CreatureId,
        message: String,
    },
    SetAmbientLight {
        level: u8,
    },
    RunScript {
        name: String,
        requestor: Option<CreatureId>,
    },
    EnqueueAttack(AttackOp),
}

impl Action {
    pub fn execute(&self, ctx: &WorldContext) -> Result<()> {
        match self {
            Action::MoveCreature { creature, to } => ctx.move_creature(*creature, *to),
            Action::Say { creature, text } => {
                if let Some(c) = ctx.registry.find_by_id(*creature) {
                    ctx.notifier.notify(
                        c.position(),
                        Notification::CreatureSaid {
                            creature: *creature,
                            text: text.clone(),
                        },
                    );
                }
                Ok(())
            }
            Action::Cancel { creature, message } => {
                if let Some(c) = ctx.registry.find_by_id(*creature) {
                    ctx.notifier.notify(
                        c.position(),
                        Notification::Cancel {
                            creature: *creature,
                            message: message.clone(),
                        },
                    );
                }
                Ok(())
            }
            Action::SetAmbientLight { level } => {
                if ctx.light.set_level(*level) {
                    // Global broadcast; the center is nominal.
                    ctx.notifier
                        .notify(Location::new(0, 0, 0), Notification::AmbientLight {
                            level: *level,
                        });
                }
                Ok(())
            }
            Action::RunScript { name, requestor } => ctx.scripts.dispatch(name, *requestor),
            Action::EnqueueAttack(op) => ctx.request_combat_op(*op),
        }
    }
}

/// A schedulable unit of work: conditions gating pass/fail action lists
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub requestor: Option<CreatureId>,
    pub policy: EvaluationPolicy,
    conditions: Vec<Condition>,
    on_pass: Vec<Action>,
    on_fail: Vec<Action>,
}

impl Event {
    pub fn new(policy: EvaluationPolicy) -> Self {
        Self {
            id: EventId(NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed)),
            requestor: None,
            policy,
            conditions: Vec::new(),
            on_pass: Vec::new(),
            on_fail: Vec::new(),
        }
    }

    pub fn requested_by(mut self, creature: CreatureId) -> Self {
        self.requestor = Some(creature);
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn then(mut self, action: Action) -> Self {
        self.on_pass.push(action);
        self
    }

    pub fn otherwise(mut self, action: Action) -> Self {
        self.on_fail.push(action);
        self
    }

    /// Left-to-right, short-circuiting; an empty list always passes
    pub fn conditions_pass(&self, ctx: &WorldContext) -> bool {
        self.conditions.iter().all(|c| c.evaluate(ctx))
    }

    /// Execute at fire time, consuming the event
    ///
    /// Re-evaluates conditions when the policy asks for it, then runs the
    /// chosen action list. Each action runs independently: a failure is
    /// logged and does not block the remaining actions.
    pub fn run(self, ctx: &WorldContext) {
        let passed = match self.policy {
            EvaluationPolicy::OnSchedule => true,
            EvaluationPolicy::OnExecute | EvaluationPolicy::OnBoth => self.conditions_pass(ctx),
        };
        let actions = if passed { self.on_pass } else { self.on_fail };
        for action in actions {
            if let Err(error) = action.execute(ctx) {
                tracing::warn!(event = self.id.0, %error, "event action failed");
            }
        }
    }

    /// Convenience constructor for a single-step movement event
    pub fn step(creature: CreatureId, to: Location) -> Self {
        Event::new(EvaluationPolicy::OnBoth)
            .requested_by(creature)
            .when(Condition::CreatureAlive(creature))
            .when(Condition::TileWalkable(to))
            .then(Action::MoveCreature { creature, to })
            .otherwise(Action::Cancel {
                creature,
                message: "Sorry, not possible.".into(),
            })
    }
}
