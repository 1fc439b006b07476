//! The driving loops: coordinators and the fixed-step clock

pub mod attack;
pub mod clock;
pub mod walk;

pub use attack::CombatCoordinator;
pub use clock::SimulationClock;
pub use walk::WalkCoordinator;
