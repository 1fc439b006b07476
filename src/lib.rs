//! Duskhollow: the simulation core of a persistent multiplayer world
//!
//! Event-driven rather than lockstep: actions become scheduled events with
//! condition gates; cooldown-driven coordinator loops pace movement and
//! combat; a fixed 500ms clock drives ambient phases. World state is a
//! sector-paged tile map shared behind fine-grained locks.

pub mod combat;
pub mod core;
pub mod notify;
pub mod pathfind;
pub mod scheduler;
pub mod simulation;
pub mod world;
