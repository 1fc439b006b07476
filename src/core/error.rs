use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorldError {
    #[error("Creature not found: {0:?}")]
    CreatureNotFound(crate::core::types::CreatureId),

    #[error("No tile at {0:?}")]
    TileNotFound(crate::core::types::Location),

    #[error("Thing not found on tile")]
    ThingNotFound,

    #[error("Destination not walkable: {0:?}")]
    NotWalkable(crate::core::types::Location),

    #[error("Zero amount for cumulative item")]
    ZeroAmount,

    #[error("Wrong entity kind: {0}")]
    WrongKind(String),

    #[error("Combat queue closed")]
    CombatQueueClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WorldError>;
