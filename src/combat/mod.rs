//! Combat: visibility checks, attack resolution, and the operation queue

pub mod processor;
pub mod resolution;
pub mod sight;

pub use processor::{attack_allowed, AttackOp, CombatProcessor};
pub use resolution::{resolve_attack, AttackOutcome, AttackReport};
