/// Identifier for a tile in a [`crate::layout::Layout`].
///
/// This is an index into the layout's tile arena. Slots of removed tiles
/// are never reused, so an id stays meaningful for the lifetime of the
/// layout (until [`crate::layout::Layout::clear_tiles`]).
pub type TileId = usize;

/// Identifier for an entrance of a [`crate::layout::Layout`].
pub type EntranceId = usize;

/// Identifier for a body in a [`crate::resolver::BodySet`].
pub type BodyId = usize;
