//! Driveway growth grammar.
//!
//! Rule priority, highest first: append, forward, turn, begin, prune. The
//! turn rule can be switched off and on again; it always sits right before
//! begin.

use crate::error::Result;
use crate::growth::{AppendRule, ForwardRule, PruneRule};
use crate::layout::Network;
use crate::marker::{BeginSource, Marker, MarkerKind};
use crate::rewrite::{Grammar, Rule, RunStats};
use crate::state::GrowthState;

/// Starts a driveway at the marked entrance.
pub struct BeginDriveway;

impl Rule<GrowthState> for BeginDriveway {
    fn name(&self) -> &'static str {
        "begin"
    }

    fn kind(&self) -> MarkerKind {
        MarkerKind::Begin
    }

    fn rewrite(&self, state: &mut GrowthState, marker: &Marker) -> Vec<Marker> {
        let Marker::Begin {
            source: BeginSource::Entrance(entrance),
        } = *marker
        else {
            return vec![];
        };
        if state.at_capacity(Network::Driveway) {
            return vec![];
        }
        match state.builder.begin_driveway(&mut state.layout, entrance) {
            Some(tile) => Marker::growth(tile, state.max_length(Network::Driveway)),
            None => vec![],
        }
    }
}

/// Branches a blocked driveway sideways.
pub struct TurnRule;

impl Rule<GrowthState> for TurnRule {
    fn name(&self) -> &'static str {
        "turn"
    }

    fn kind(&self) -> MarkerKind {
        MarkerKind::Turn
    }

    fn rewrite(&self, state: &mut GrowthState, marker: &Marker) -> Vec<Marker> {
        let Marker::Turn { tile, side } = *marker else {
            return vec![];
        };
        if state.at_capacity(Network::Driveway) {
            return vec![];
        }
        match state.builder.turn(&mut state.layout, tile, side) {
            Some(branch) => Marker::growth(branch, state.max_length(Network::Driveway)),
            None => vec![],
        }
    }
}

pub struct DrivewayGrammar {
    grammar: Grammar<GrowthState>,
    turning: bool,
}

impl DrivewayGrammar {
    pub fn new(allow_turning: bool) -> Result<Self> {
        let mut grammar = Grammar::new();
        grammar.push(AppendRule)?;
        grammar.push(ForwardRule)?;
        grammar.push(BeginDriveway)?;
        grammar.push(PruneRule)?;
        let mut this = Self {
            grammar,
            turning: false,
        };
        this.set_turning(allow_turning)?;
        Ok(this)
    }

    /// Adds or removes the turn rule. Turn markers left pending while it is
    /// off are simply never consumed.
    pub fn set_turning(&mut self, enabled: bool) -> Result<()> {
        if enabled && !self.turning {
            self.grammar.insert_before("begin", TurnRule)?;
        } else if !enabled && self.turning {
            self.grammar.remove("turn");
        }
        self.turning = enabled;
        Ok(())
    }

    pub fn turning(&self) -> bool {
        self.turning
    }

    pub fn reset(&self, state: &mut GrowthState) {
        state.reset(Network::Driveway);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::geometry::Polygon;
    use crate::layout::Layout;
    use glam::Vec2;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn state(w: f32, h: f32, entrance_x: f32, max_cars: u32) -> GrowthState {
        let mut layout = Layout::new(Polygon::rect(Vec2::ZERO, Vec2::new(w, h)), 1e-3).unwrap();
        layout.add_entrance(Vec2::new(entrance_x, 0.0), Vec2::Y).unwrap();
        let mut cfg = Config::default();
        cfg.requirements.max_car_spaces = max_cars;
        GrowthState::new(layout, &cfg)
    }

    #[test]
    fn rule_order_keeps_turn_before_begin() {
        let mut g = DrivewayGrammar::new(true).unwrap();
        assert_eq!(g.grammar().rule_names(), ["append", "forward", "turn", "begin", "prune"]);
        g.set_turning(false).unwrap();
        assert_eq!(g.grammar().rule_names(), ["append", "forward", "begin", "prune"]);
        g.set_turning(false).unwrap();
        g.set_turning(true).unwrap();
        assert!(g.turning());
        assert_eq!(g.grammar().rule_names(), ["append", "forward", "turn", "begin", "prune"]);
    }

    #[test]
    fn single_entrance_fills_one_straight_tile() {
        let mut s = state(20.0, 30.0, 10.0, 4);
        let g = DrivewayGrammar::new(false).unwrap();
        g.reset(&mut s);

        let stats = g.run(&mut s);

        let tiles: Vec<_> = s.layout.tiles().collect();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].1.length, 5.0);
        assert_eq!(s.layout.space_count(Network::Driveway), 4);
        assert_eq!(stats.produced(MarkerKind::Turn), 0);
        assert_eq!(stats.applications, 8);
        assert!(s.markers.is_empty());
    }

    #[test]
    fn capacity_holds_after_every_rewrite() {
        let mut s = state(40.0, 60.0, 20.0, 11);
        let g = DrivewayGrammar::new(true).unwrap();
        g.reset(&mut s);
        let mut observed = 0;

        g.run_with(&mut s, |state, _| {
            observed += 1;
            assert!(state.layout.space_count(Network::Driveway) <= 11);
        });

        assert!(observed > 0);
        assert_eq!(s.layout.space_count(Network::Driveway), 11);
    }

    #[test]
    fn blocked_driveway_turns_around_an_obstacle() {
        let mut s = state(40.0, 40.0, 20.0, 40);
        s.layout
            .add_obstacle(Polygon::rect(Vec2::new(0.0, 20.0), Vec2::new(40.0, 22.0)));
        let g = DrivewayGrammar::new(true).unwrap();
        g.reset(&mut s);

        let stats = g.run(&mut s);

        assert!(stats.produced(MarkerKind::Turn) >= 2);
        assert!(s.layout.tiles().any(|(_, t)| t.direction != Vec2::Y));
        assert!(s.layout.space_count(Network::Driveway) <= 40);
        for (_, tile) in s.layout.tiles() {
            assert!(!tile.footprint().overlaps(&s.layout.obstacles()[0], 1e-3));
        }
    }

    #[test]
    fn length_limit_caps_the_chain() {
        let mut s = state(20.0, 60.0, 10.0, 40);
        s.requirements.max_driveway_length = Some(10.0);
        let g = DrivewayGrammar::new(false).unwrap();
        g.reset(&mut s);

        g.run(&mut s);

        let total: f32 = s.layout.tiles().map(|(_, t)| t.length).sum();
        assert!(total <= 10.0);
        assert_eq!(s.layout.space_count(Network::Driveway), 8);
    }

    #[test]
    fn blocked_entrance_grows_nothing() {
        let mut s = state(20.0, 30.0, 10.0, 4);
        s.layout
            .add_obstacle(Polygon::rect(Vec2::new(8.0, 0.0), Vec2::new(12.0, 1.0)));
        let g = DrivewayGrammar::new(true).unwrap();
        g.reset(&mut s);

        let stats = g.run(&mut s);

        assert_eq!(stats.applications, 1);
        assert_eq!(s.layout.tiles().count(), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn growth_reaches_a_fixed_point_within_capacity(seed in any::<u64>(), max in 0u32..30) {
            let mut s = state(40.0, 40.0, 20.0, max);
            let mut rng = StdRng::seed_from_u64(seed);
            s.layout.scatter_obstacles(6, 2.0, &mut rng);
            let g = DrivewayGrammar::new(true).unwrap();
            g.reset(&mut s);

            g.run(&mut s);

            prop_assert!(s.layout.space_count(Network::Driveway) <= max);
            prop_assert!(s.markers.is_empty());
        }
    }
}
