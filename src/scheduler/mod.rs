//! Scheduling: the event model and the time-ordered delivery queue

pub mod event;
pub mod queue;

pub use event::{Action, Condition, EvaluationPolicy, Event};
pub use queue::{EventCallback, EventScheduler};
