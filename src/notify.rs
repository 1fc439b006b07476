//! Notification surface toward the connection layer
//!
//! The core only requests "tell the observers around this point"; turning a
//! `Notification` into wire bytes is the (external) protocol layer's job.
//! Script execution is likewise delegated through `ScriptDispatcher`.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{CreatureId, Location};

/// Visual effect shown on a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualEffect {
    BloodSplash,
    SlimeSplash,
    FireSplash,
    BoneHit,
    BlackSmoke,
    Puff,
    SparkShield,
    SparkArmor,
}

/// One observable world change, addressed to spectators around a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    CreatureMoved {
        creature: CreatureId,
        from: Location,
        to: Location,
    },
    CreatureSaid {
        creature: CreatureId,
        text: String,
    },
    AttackResolved {
        attacker: CreatureId,
        target: CreatureId,
        effect: VisualEffect,
        damage: u32,
    },
    /// Short client-facing cancellation message for one creature
    Cancel {
        creature: CreatureId,
        message: String,
    },
    AmbientLight {
        level: u8,
    },
}

/// Observer-notification capability implemented by the connection layer
pub trait SpectatorNotifier: Send + Sync {
    fn notify(&self, center: Location, notification: Notification);
}

/// Externally-resolved script hook invoked by event actions
pub trait ScriptDispatcher: Send + Sync {
    fn dispatch(&self, name: &str, requestor: Option<CreatureId>) -> Result<()>;
}

/// Discards everything; for tools and benchmarks
pub struct NullNotifier;

impl SpectatorNotifier for NullNotifier {
    fn notify(&self, _center: Location, _notification: Notification) {}
}

/// Accepts and ignores every script; for worlds without a script layer
pub struct NullScripts;

impl ScriptDispatcher for NullScripts {
    fn dispatch(&self, name: &str, _requestor: Option<CreatureId>) -> Result<()> {
        tracing::debug!(script = name, "no script dispatcher configured");
        Ok(())
    }
}

/// Captures notifications in order; the test double used across the suite
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Location, Notification)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<(Location, Notification)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn cancellations_for(&self, creature: CreatureId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, n)| match n {
                Notification::Cancel {
                    creature: c,
                    message,
                } if *c == creature => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl SpectatorNotifier for RecordingNotifier {
    fn notify(&self, center: Location, notification: Notification) {
        self.sent.lock().unwrap().push((center, notification));
    }
}
