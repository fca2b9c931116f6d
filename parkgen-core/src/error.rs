use crate::types::{BodyId, EntranceId, TileId};

/// Contract violations raised by the core.
///
/// Expected generative dead ends (overlaps, exhausted capacity, blocked
/// growth) are never reported through this type; they simply produce no
/// markers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("polygon needs at least 3 points, got {0}")]
    DegeneratePolygon(usize),
    #[error("tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f32),
    #[error("mass must be finite and non-negative, got {0}")]
    InvalidMass(f32),
    #[error("entrance direction must be non-zero")]
    ZeroDirection,
    #[error("unknown tile {0}")]
    UnknownTile(TileId),
    #[error("unknown entrance {0}")]
    UnknownEntrance(EntranceId),
    #[error("unknown body {0}")]
    UnknownBody(BodyId),
    #[error("body {0} is already registered")]
    DuplicateBody(BodyId),
    #[error("rule \"{0}\" is already registered")]
    DuplicateRule(&'static str),
    #[error("no rule named \"{0}\"")]
    UnknownRule(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
