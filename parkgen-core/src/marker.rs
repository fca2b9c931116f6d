use crate::rewrite::Tagged;
use crate::types::{EntranceId, TileId};

/// Side of a tile, relative to its heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// `+1` for left (counter-clockwise of the heading), `-1` for right.
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

/// Where a network starts growing from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeginSource {
    Entrance(EntranceId),
    Tile(TileId),
}

/// A pending local edit of the layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Marker {
    Begin { source: BeginSource },
    Forward { tile: TileId, max_length: Option<f32> },
    Turn { tile: TileId, side: Side },
    AppendParkingSpace { tile: TileId, side: Side },
    Prune { tile: TileId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Begin,
    Forward,
    Turn,
    AppendParkingSpace,
    Prune,
}

impl Tagged for Marker {
    type Kind = MarkerKind;

    fn kind(&self) -> MarkerKind {
        match self {
            Marker::Begin { .. } => MarkerKind::Begin,
            Marker::Forward { .. } => MarkerKind::Forward,
            Marker::Turn { .. } => MarkerKind::Turn,
            Marker::AppendParkingSpace { .. } => MarkerKind::AppendParkingSpace,
            Marker::Prune { .. } => MarkerKind::Prune,
        }
    }
}

impl Marker {
    /// The markers every successful growth step emits for `tile`: keep
    /// going, and try a space on each side.
    pub fn growth(tile: TileId, max_length: Option<f32>) -> Vec<Marker> {
        vec![
            Marker::Forward { tile, max_length },
            Marker::AppendParkingSpace {
                tile,
                side: Side::Left,
            },
            Marker::AppendParkingSpace {
                tile,
                side: Side::Right,
            },
        ]
    }

    /// Tile the marker edits, if any.
    pub fn tile(&self) -> Option<TileId> {
        match *self {
            Marker::Begin {
                source: BeginSource::Tile(tile),
            } => Some(tile),
            Marker::Begin { .. } => None,
            Marker::Forward { tile, .. }
            | Marker::Turn { tile, .. }
            | Marker::AppendParkingSpace { tile, .. }
            | Marker::Prune { tile } => Some(tile),
        }
    }
}
