//! Rules shared by the driveway and bikeway grammars.
//!
//! Every rule tolerates markers naming a tile that has since been pruned:
//! such markers are consumed and produce nothing.

use crate::layout::Network;
use crate::marker::{Marker, MarkerKind, Side};
use crate::rewrite::Rule;
use crate::state::GrowthState;
use crate::types::TileId;

/// Places one space on the marked side while under capacity. Terminal.
pub struct AppendRule;

impl Rule<GrowthState> for AppendRule {
    fn name(&self) -> &'static str {
        "append"
    }

    fn kind(&self) -> MarkerKind {
        MarkerKind::AppendParkingSpace
    }

    fn rewrite(&self, state: &mut GrowthState, marker: &Marker) -> Vec<Marker> {
        let Marker::AppendParkingSpace { tile, side } = *marker else {
            return vec![];
        };
        let Some(network) = state.layout.tile(tile).map(|t| t.network) else {
            return vec![];
        };
        if !state.at_capacity(network) {
            state.builder.append_space(&mut state.layout, tile, side);
        }
        vec![]
    }
}

/// Grows the marked tile by one step, or hands it over to pruning.
///
/// A blocked driveway asks to turn either way before pruning; a blocked
/// bikeway is pruned straight away.
pub struct ForwardRule;

impl Rule<GrowthState> for ForwardRule {
    fn name(&self) -> &'static str {
        "forward"
    }

    fn kind(&self) -> MarkerKind {
        MarkerKind::Forward
    }

    fn rewrite(&self, state: &mut GrowthState, marker: &Marker) -> Vec<Marker> {
        let Marker::Forward { tile, max_length } = *marker else {
            return vec![];
        };
        let Some(network) = state.layout.tile(tile).map(|t| t.network) else {
            return vec![];
        };
        if state.at_capacity(network) {
            return vec![Marker::Prune { tile }];
        }
        let step = state.builder.spec(network).step;
        if max_length.is_some_and(|max| state.layout.chain_length(tile) + step > max) {
            return vec![Marker::Prune { tile }];
        }

        match state.builder.extend(&mut state.layout, tile) {
            Some(next) => Marker::growth(next, max_length),
            None => match network {
                Network::Driveway => vec![
                    Marker::Turn {
                        tile,
                        side: Side::Left,
                    },
                    Marker::Turn {
                        tile,
                        side: Side::Right,
                    },
                    Marker::Prune { tile },
                ],
                Network::Bikeway => vec![Marker::Prune { tile }],
            },
        }
    }
}

/// Fills what is left of the marked tile, then cuts it back to its spaces.
///
/// A tile left without spaces is removed and its predecessor is pruned in
/// turn. Tiles that still anchor children are filled but never cut.
pub struct PruneRule;

impl PruneRule {
    /// Appends to the side with the smaller attainable maximum first, until
    /// the network is full or neither side has a slot left to try. Ties go
    /// to the left side.
    fn restore(state: &mut GrowthState, tile: TileId, network: Network) {
        while !state.at_capacity(network) {
            let Some(t) = state.layout.tile(tile) else {
                return;
            };
            let mut sides = Side::BOTH;
            sides.sort_by_key(|side| state.builder.attainable(&state.layout, tile, *side));
            let Some(side) = sides.into_iter().find(|side| t.area(*side).has_room()) else {
                return;
            };
            state.builder.append_space(&mut state.layout, tile, side);
        }
    }
}

impl Rule<GrowthState> for PruneRule {
    fn name(&self) -> &'static str {
        "prune"
    }

    fn kind(&self) -> MarkerKind {
        MarkerKind::Prune
    }

    fn rewrite(&self, state: &mut GrowthState, marker: &Marker) -> Vec<Marker> {
        let Marker::Prune { tile } = *marker else {
            return vec![];
        };
        let Some(network) = state.layout.tile(tile).map(|t| t.network) else {
            return vec![];
        };

        Self::restore(state, tile, network);
        if state.layout.children(tile).next().is_some() {
            return vec![];
        }
        if state.builder.shrink(&mut state.layout, tile) > 0.0 {
            return vec![];
        }

        let previous = state.layout.remove_tile(tile).and_then(|t| t.previous);
        log::trace!("pruned empty tile {tile}");
        match previous {
            Some(previous) if state.layout.tile(previous).is_some() => {
                vec![Marker::Prune { tile: previous }]
            }
            _ => vec![],
        }
    }
}
