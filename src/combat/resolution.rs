//! Melee attack resolution
//!
//! One attack draws an outcome from a small probabilistic set; each outcome
//! maps to a damage magnitude and a visual effect. Hits on flesh use the
//! target's blood classification to pick the splatter.

use rand::Rng;
use tokio::time::Instant;

use crate::core::config::SimulationConfig;
use crate::notify::VisualEffect;
use crate::world::creature::{BloodKind, Creature};

/// How an attack landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    Miss,
    /// Full damage to an unprotected target
    HitUnshielded,
    /// Absorbed mostly by the shield
    HitShielded,
    /// Absorbed mostly by armor
    HitArmored,
}

/// Result of one resolved attack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackReport {
    pub outcome: AttackOutcome,
    pub damage: u32,
    pub effect: VisualEffect,
    pub target_health_after: u32,
}

/// Outcome distribution: 20% miss, 25% shielded, 15% armored, 40% clean hit
fn draw_outcome(rng: &mut impl Rng) -> AttackOutcome {
    match rng.gen_range(0..100u32) {
        0..=19 => AttackOutcome::Miss,
        20..=44 => AttackOutcome::HitShielded,
        45..=59 => AttackOutcome::HitArmored,
        _ => AttackOutcome::HitUnshielded,
    }
}

/// Splatter effect for a clean hit, keyed by blood classification
pub fn splatter_for(blood: BloodKind) -> VisualEffect {
    match blood {
        BloodKind::Blood => VisualEffect::BloodSplash,
        BloodKind::Slime => VisualEffect::SlimeSplash,
        BloodKind::Fire => VisualEffect::FireSplash,
        BloodKind::Bones => VisualEffect::BoneHit,
        BloodKind::Undead => VisualEffect::BlackSmoke,
    }
}

/// Resolve one melee attack
///
/// Preconditions (cooldown, range, sight) are the caller's responsibility.
/// The attacker's cooldown is re-armed regardless of the outcome.
pub fn resolve_attack(
    attacker: &Creature,
    target: &Creature,
    now: Instant,
    config: &SimulationConfig,
    rng: &mut impl Rng,
) -> AttackReport {
    let outcome = draw_outcome(rng);
    let (damage, effect) = match outcome {
        AttackOutcome::Miss => (0, VisualEffect::Puff),
        AttackOutcome::HitShielded => (rng.gen_range(0..=4), VisualEffect::SparkShield),
        AttackOutcome::HitArmored => (rng.gen_range(1..=6), VisualEffect::SparkArmor),
        AttackOutcome::HitUnshielded => (rng.gen_range(5..=20), splatter_for(target.blood)),
    };

    let target_health_after = if damage > 0 {
        target.apply_damage(damage)
    } else {
        target.health()
    };

    attacker.record_attack(now, std::time::Duration::from_millis(config.attack_cost_ms));

    AttackReport {
        outcome,
        damage,
        effect,
        target_health_after,
    }
}
