//! Bikeway growth grammar: append, forward, begin, prune.
//!
//! Bikeways run alongside finished driveways, so the driveway grammar has
//! to reach its fixed point before this one is reset.

use crate::error::Result;
use crate::growth::{AppendRule, ForwardRule, PruneRule};
use crate::layout::Network;
use crate::marker::{BeginSource, Marker, MarkerKind};
use crate::rewrite::{Grammar, Rule, RunStats};
use crate::state::GrowthState;

/// Starts a bikeway on both sides of the marked driveway tile.
pub struct BeginBikeway;

impl Rule<GrowthState> for BeginBikeway {
    fn name(&self) -> &'static str {
        "begin"
    }

    fn kind(&self) -> MarkerKind {
        MarkerKind::Begin
    }

    fn rewrite(&self, state: &mut GrowthState, marker: &Marker) -> Vec<Marker> {
        let Marker::Begin {
            source: BeginSource::Tile(source),
        } = *marker
        else {
            return vec![];
        };
        if state.at_capacity(Network::Bikeway) {
            return vec![];
        }
        let max_length = state.max_length(Network::Bikeway);
        state
            .builder
            .begin_bikeway(&mut state.layout, source)
            .into_iter()
            .flat_map(|tile| Marker::growth(tile, max_length))
            .collect()
    }
}

pub struct BikewayGrammar {
    grammar: Grammar<GrowthState>,
}

impl BikewayGrammar {
    pub fn new() -> Result<Self> {
        let mut grammar = Grammar::new();
        grammar.push(AppendRule)?;
        grammar.push(ForwardRule)?;
        grammar.push(BeginBikeway)?;
        grammar.push(PruneRule)?;
        Ok(Self { grammar })
    }

    pub fn reset(&self, state: &mut GrowthState) {
        state.reset(Network::Bikeway);
    }

    pub fn run(&self, state: &mut GrowthState) -> RunStats<MarkerKind> {
        self.grammar.run(state)
    }

    pub fn run_with(
        &self,
        state: &mut GrowthState,
        observe: impl FnMut(&GrowthState, &'static str),
    ) -> RunStats<MarkerKind> {
        self.grammar.run_with(state, observe)
    }

    pub fn grammar(&self) -> &Grammar<GrowthState> {
        &self.grammar
    }
}
