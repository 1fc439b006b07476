//! Creature state: position, vitals, walk plan, combat focus
//!
//! Creatures are shared across the coordinator loops as `Arc<Creature>`;
//! every mutable field sits behind its own lock. Cooldowns are computed from
//! a (last-action stamp, action cost) pair, never stored as a countdown.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::core::types::{CreatureId, Direction, Location};

/// Blood classification, selecting the splatter effect on hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodKind {
    Blood,
    Slime,
    Fire,
    Bones,
    Undead,
}

/// What drives a creature during the thinking phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brain {
    /// Never acts on its own (player avatars, decorations)
    Static,
    /// Occasionally wanders one step in a random direction
    Wander,
}

/// A candidate action yielded by the thinking phase
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Step(Direction),
}

/// One queued walk step with its client sequence id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedStep {
    pub seq: u32,
    pub direction: Direction,
}

#[derive(Debug)]
struct Vitals {
    position: Location,
    health: u32,
    max_health: u32,
    /// Step-cost divisor; 100 walks at base speed
    speed: u32,
}

#[derive(Debug)]
struct WalkPlan {
    steps: VecDeque<QueuedStep>,
    /// Sequence id the next executed step must carry
    expected_seq: u32,
    /// Next sequence id handed out to a queued step
    next_seq: u32,
    last_step: Instant,
    last_step_cost: Duration,
}

#[derive(Debug)]
struct CombatFocus {
    target: Option<CreatureId>,
    last_attack: Instant,
    last_attack_cost: Duration,
}

pub struct Creature {
    pub id: CreatureId,
    pub name: String,
    pub blood: BloodKind,
    brain: Brain,
    vitals: Mutex<Vitals>,
    walk: Mutex<WalkPlan>,
    combat: Mutex<CombatFocus>,
    speech: Mutex<Vec<String>>,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for Creature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Creature")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl Creature {
    pub fn new(name: impl Into<String>, position: Location, blood: BloodKind) -> Self {
        let now = Instant::now();
        Self {
            id: CreatureId::new(),
            name: name.into(),
            blood,
            brain: Brain::Static,
            vitals: Mutex::new(Vitals {
                position,
                health: 100,
                max_health: 100,
                speed: 100,
            }),
            walk: Mutex::new(WalkPlan {
                steps: VecDeque::new(),
                expected_seq: 0,
                next_seq: 0,
                last_step: now,
                last_step_cost: Duration::ZERO,
            }),
            combat: Mutex::new(CombatFocus {
                target: None,
                last_attack: now,
                last_attack_cost: Duration::ZERO,
            }),
            speech: Mutex::new(Vec::new()),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_brain(mut self, brain: Brain) -> Self {
        self.brain = brain;
        self
    }

    pub fn with_rng_seed(self, seed: u64) -> Self {
        *self.rng.lock().unwrap() = StdRng::seed_from_u64(seed);
        self
    }

    // === vitals ===

    pub fn position(&self) -> Location {
        self.vitals.lock().unwrap().position
    }

    pub fn set_position(&self, position: Location) {
        self.vitals.lock().unwrap().position = position;
    }

    pub fn health(&self) -> u32 {
        self.vitals.lock().unwrap().health
    }

    pub fn is_alive(&self) -> bool {
        self.health() > 0
    }

    /// Apply damage, saturating at zero; returns the remaining health
    pub fn apply_damage(&self, damage: u32) -> u32 {
        let mut vitals = self.vitals.lock().unwrap();
        vitals.health = vitals.health.saturating_sub(damage);
        vitals.health
    }

    pub fn heal_full(&self) {
        let mut vitals = self.vitals.lock().unwrap();
        vitals.health = vitals.max_health;
    }

    /// Cost of one step for this creature, scaled by speed
    pub fn step_cost(&self, base_cost: Duration, direction: Direction, diagonal_factor: u32) -> Duration {
        let speed = self.vitals.lock().unwrap().speed.max(1);
        let mut cost = base_cost * 100 / speed;
        if direction.is_diagonal() {
            cost *= diagonal_factor;
        }
        cost
    }

    // === walking ===

    /// Replace the walk plan with a fresh step sequence
    ///
    /// Steps still queued from an older plan become stale: their sequence
    /// ids no longer match the expected counter and are discarded on dequeue.
    pub fn start_walk(&self, directions: impl IntoIterator<Item = Direction>) {
        let mut walk = self.walk.lock().unwrap();
        walk.steps.clear();
        walk.expected_seq = walk.next_seq;
        for direction in directions {
            let seq = walk.next_seq;
            walk.next_seq += 1;
            walk.steps.push_back(QueuedStep { seq, direction });
        }
    }

    /// Append one step under the current plan
    pub fn queue_step(&self, direction: Direction) {
        let mut walk = self.walk.lock().unwrap();
        let seq = walk.next_seq;
        walk.next_seq += 1;
        walk.steps.push_back(QueuedStep { seq, direction });
    }

    /// Inject a step carrying an arbitrary sequence id (stale-request tests)
    pub fn queue_step_with_seq(&self, seq: u32, direction: Direction) {
        let mut walk = self.walk.lock().unwrap();
        walk.steps.push_back(QueuedStep { seq, direction });
    }

    pub fn has_queued_steps(&self) -> bool {
        !self.walk.lock().unwrap().steps.is_empty()
    }

    /// Drop all queued steps and invalidate their sequence ids
    pub fn clear_walk_queue(&self) {
        let mut walk = self.walk.lock().unwrap();
        walk.steps.clear();
        walk.expected_seq = walk.next_seq;
    }

    /// Dequeue the next step whose sequence id matches the expected one
    ///
    /// Stale steps (older plan) are discarded without executing.
    pub fn pop_expected_step(&self) -> Option<QueuedStep> {
        let mut walk = self.walk.lock().unwrap();
        while let Some(step) = walk.steps.pop_front() {
            if step.seq == walk.expected_seq {
                walk.expected_seq += 1;
                return Some(step);
            }
            tracing::trace!(creature = %self.name, seq = step.seq, "discarding stale step");
        }
        None
    }

    pub fn record_step(&self, now: Instant, cost: Duration) {
        let mut walk = self.walk.lock().unwrap();
        walk.last_step = now;
        walk.last_step_cost = cost;
    }

    /// Remaining movement cooldown at `now`; zero when ready
    pub fn walk_cooldown_remaining(&self, now: Instant) -> Duration {
        let walk = self.walk.lock().unwrap();
        (walk.last_step + walk.last_step_cost).saturating_duration_since(now)
    }

    // === combat ===

    pub fn target(&self) -> Option<CreatureId> {
        self.combat.lock().unwrap().target
    }

    pub fn set_target(&self, target: CreatureId) {
        self.combat.lock().unwrap().target = Some(target);
    }

    pub fn clear_target(&self) {
        self.combat.lock().unwrap().target = None;
    }

    pub fn record_attack(&self, now: Instant, cost: Duration) {
        let mut combat = self.combat.lock().unwrap();
        combat.last_attack = now;
        combat.last_attack_cost = cost;
    }

    /// Remaining combat cooldown at `now`; zero when ready
    pub fn attack_cooldown_remaining(&self, now: Instant) -> Duration {
        let combat = self.combat.lock().unwrap();
        (combat.last_attack + combat.last_attack_cost).saturating_duration_since(now)
    }

    // === speech ===

    pub fn say(&self, text: impl Into<String>) {
        self.speech.lock().unwrap().push(text.into());
    }

    pub fn drain_speech(&self) -> Vec<String> {
        std::mem::take(&mut *self.speech.lock().unwrap())
    }

    // === thinking ===

    /// Yield candidate actions for this tick
    ///
    /// Speech is not drained here; the clock's speech phase owns it.
    pub fn think(&self) -> Vec<Intent> {
        let mut intents = Vec::new();

        if self.brain == Brain::Wander && !self.has_queued_steps() {
            let mut rng = self.rng.lock().unwrap();
            // Wander roughly every fourth tick.
            if rng.gen_ratio(1, 4) {
                let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
                intents.push(Intent::Step(direction));
            }
        }
        intents
    }
}
