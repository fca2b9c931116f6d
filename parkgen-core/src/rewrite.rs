//! Generic marker-rewriting engine.
//!
//! A [`Grammar`] holds an ordered list of [`Rule`]s. Running it repeatedly
//! picks the first enabled rule (in registration order) that has a
//! matching marker, takes the first such marker (in collection order),
//! rewrites it and appends the produced markers, then starts scanning
//! from the first rule again. It stops once a full scan finds nothing to
//! rewrite.
//!
//! The engine enforces no termination bound of its own: rule sets must be
//! written so they reach a fixed point.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// A marker that can report which kind of rule consumes it.
pub trait Tagged {
    type Kind: Copy + Eq + Hash + Debug;

    fn kind(&self) -> Self::Kind;
}

/// State a grammar rewrites: anything owning an ordered marker collection.
pub trait RewriteState {
    type Marker: Tagged;

    fn markers(&self) -> &[Self::Marker];

    fn markers_mut(&mut self) -> &mut Vec<Self::Marker>;
}

type KindOf<S> = <<S as RewriteState>::Marker as Tagged>::Kind;

pub trait Rule<S: RewriteState> {
    /// Unique name within a grammar.
    fn name(&self) -> &'static str;

    /// Kind of marker this rule consumes.
    fn kind(&self) -> KindOf<S>;

    /// Consumes `marker` (already removed from `state`), mutates the rest of
    /// the state and returns the markers that replace it.
    fn rewrite(&self, state: &mut S, marker: &S::Marker) -> Vec<S::Marker>;

    /// Every marker of this rule's kind, in collection order.
    fn find_markers<'s>(&self, state: &'s S) -> Vec<&'s S::Marker> {
        let kind = self.kind();
        state.markers().iter().filter(|m| m.kind() == kind).collect()
    }

    fn find_marker<'s>(&self, state: &'s S) -> Option<&'s S::Marker> {
        let kind = self.kind();
        state.markers().iter().find(|m| m.kind() == kind)
    }
}

/// Summary of one [`Grammar::run`].
#[derive(Debug)]
pub struct RunStats<K> {
    /// Number of rewrites applied.
    pub applications: usize,
    /// Markers produced by rewrites, per kind. Seeded markers are not counted.
    pub produced: HashMap<K, usize>,
}

impl<K: Copy + Eq + Hash> RunStats<K> {
    pub fn produced(&self, kind: K) -> usize {
        self.produced.get(&kind).copied().unwrap_or(0)
    }
}

impl<K> Default for RunStats<K> {
    fn default() -> Self {
        Self {
            applications: 0,
            produced: HashMap::new(),
        }
    }
}

struct Entry<S: RewriteState> {
    rule: Box<dyn Rule<S>>,
    enabled: bool,
}

pub struct Grammar<S: RewriteState> {
    rules: Vec<Entry<S>>,
}

impl<S: RewriteState> Default for Grammar<S> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<S: RewriteState> Grammar<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `rule` at the lowest priority.
    ///
    /// ### Errors
    /// [`Error::DuplicateRule`] if a rule with the same name is registered.
    pub fn push(&mut self, rule: impl Rule<S> + 'static) -> Result<()> {
        let index = self.rules.len();
        self.insert_at(index, Box::new(rule))
    }

    /// Inserts `rule` immediately before the rule named `anchor`, leaving
    /// the relative order of every other rule untouched.
    ///
    /// ### Errors
    /// - [`Error::UnknownRule`] if `anchor` is not registered.
    /// - [`Error::DuplicateRule`] if a rule with the same name is registered.
    pub fn insert_before(&mut self, anchor: &str, rule: impl Rule<S> + 'static) -> Result<()> {
        let index = self
            .position(anchor)
            .ok_or_else(|| Error::UnknownRule(anchor.to_string()))?;
        self.insert_at(index, Box::new(rule))
    }

    fn insert_at(&mut self, index: usize, rule: Box<dyn Rule<S>>) -> Result<()> {
        if self.contains(rule.name()) {
            return Err(Error::DuplicateRule(rule.name()));
        }
        self.rules.insert(
            index,
            Entry {
                rule,
                enabled: true,
            },
        );
        Ok(())
    }

    /// Removes the rule named `name`, returning it if it was registered.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Rule<S>>> {
        let index = self.position(name)?;
        Some(self.rules.remove(index).rule)
    }

    /// ### Errors
    /// [`Error::UnknownRule`] if `name` is not registered.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::UnknownRule(name.to_string()))?;
        self.rules[index].enabled = enabled;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.position(name).is_some_and(|i| self.rules[i].enabled)
    }

    /// Registered rule names in priority order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|e| e.rule.name()).collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|e| e.rule.name() == name)
    }

    /// Applies a single rewrite.
    ///
    /// ### Returns
    /// The applied rule's name and the markers it produced, or `None` at a
    /// fixed point.
    pub fn step(&self, state: &mut S) -> Option<(&'static str, Vec<KindOf<S>>)> {
        for entry in self.rules.iter().filter(|e| e.enabled) {
            let kind = entry.rule.kind();
            let Some(index) = state.markers().iter().position(|m| m.kind() == kind) else {
                continue;
            };
            let marker = state.markers_mut().remove(index);
            let produced = entry.rule.rewrite(state, &marker);
            let kinds = produced.iter().map(Tagged::kind).collect();
            state.markers_mut().extend(produced);
            return Some((entry.rule.name(), kinds));
        }
        None
    }

    /// Runs the grammar to a fixed point.
    pub fn run(&self, state: &mut S) -> RunStats<KindOf<S>> {
        self.run_with(state, |_, _| {})
    }

    /// Runs the grammar to a fixed point, calling `observe` with the state
    /// and the applied rule's name after every rewrite.
    pub fn run_with(
        &self,
        state: &mut S,
        mut observe: impl FnMut(&S, &'static str),
    ) -> RunStats<KindOf<S>> {
        let mut stats = RunStats::default();
        while let Some((name, kinds)) = self.step(state) {
            stats.applications += 1;
            for kind in kinds {
                *stats.produced.entry(kind).or_insert(0) += 1;
            }
            log::trace!("applied {name}, {} markers pending", state.markers().len());
            observe(state, name);
        }
        log::debug!(
            "fixed point after {} rewrites, {} markers left",
            stats.applications,
            state.markers().len()
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Tok {
        Split(u32),
        Leaf(u32),
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum TokKind {
        Split,
        Leaf,
    }

    impl Tagged for Tok {
        type Kind = TokKind;

        fn kind(&self) -> TokKind {
            match self {
                Tok::Split(_) => TokKind::Split,
                Tok::Leaf(_) => TokKind::Leaf,
            }
        }
    }

    #[derive(Default)]
    struct Log {
        markers: Vec<Tok>,
        trace: Vec<String>,
    }

    impl RewriteState for Log {
        type Marker = Tok;

        fn markers(&self) -> &[Tok] {
            &self.markers
        }

        fn markers_mut(&mut self) -> &mut Vec<Tok> {
            &mut self.markers
        }
    }

    /// Split(n) -> Leaf(n), Split(n - 1) while n > 0.
    struct SplitRule;

    impl Rule<Log> for SplitRule {
        fn name(&self) -> &'static str {
            "split"
        }

        fn kind(&self) -> TokKind {
            TokKind::Split
        }

        fn rewrite(&self, state: &mut Log, marker: &Tok) -> Vec<Tok> {
            let Tok::Split(n) = *marker else {
                return vec![];
            };
            state.trace.push(format!("s{n}"));
            if n == 0 {
                vec![]
            } else {
                vec![Tok::Leaf(n), Tok::Split(n - 1)]
            }
        }
    }

    struct LeafRule(&'static str);

    impl Rule<Log> for LeafRule {
        fn name(&self) -> &'static str {
            self.0
        }

        fn kind(&self) -> TokKind {
            TokKind::Leaf
        }

        fn rewrite(&self, state: &mut Log, marker: &Tok) -> Vec<Tok> {
            if let Tok::Leaf(n) = *marker {
                state.trace.push(format!("{}{n}", self.0));
            }
            vec![]
        }
    }

    fn seeded(markers: Vec<Tok>) -> Log {
        Log {
            markers,
            ..Log::default()
        }
    }

    #[test]
    fn higher_priority_rule_drains_first_and_scan_restarts() {
        let mut g = Grammar::new();
        g.push(LeafRule("leaf")).unwrap();
        g.push(SplitRule).unwrap();
        let mut state = seeded(vec![Tok::Split(2)]);

        let stats = g.run(&mut state);

        // Every produced leaf is consumed before the next split.
        assert_eq!(state.trace, ["s2", "leaf2", "s1", "leaf1", "s0"]);
        assert_eq!(stats.applications, 5);
        assert_eq!(stats.produced(TokKind::Leaf), 2);
        assert_eq!(stats.produced(TokKind::Split), 2);
        assert!(state.markers.is_empty());
    }

    #[test]
    fn markers_of_one_rule_are_taken_in_collection_order() {
        let mut g = Grammar::new();
        g.push(LeafRule("leaf")).unwrap();
        let mut state = seeded(vec![Tok::Leaf(3), Tok::Split(9), Tok::Leaf(1)]);

        g.run(&mut state);

        assert_eq!(state.trace, ["leaf3", "leaf1"]);
        // No rule consumes splits, so they survive the fixed point.
        assert_eq!(state.markers, [Tok::Split(9)]);
    }

    #[test]
    fn find_markers_filters_by_kind() {
        let state = seeded(vec![Tok::Leaf(3), Tok::Split(9), Tok::Leaf(1)]);
        let rule = LeafRule("leaf");
        assert_eq!(rule.find_markers(&state), [&Tok::Leaf(3), &Tok::Leaf(1)]);
        assert_eq!(rule.find_marker(&state), Some(&Tok::Leaf(3)));
        assert_eq!(SplitRule.find_marker(&seeded(vec![])), None);
    }

    #[test]
    fn insert_before_and_remove_keep_relative_order() {
        let mut g: Grammar<Log> = Grammar::new();
        g.push(LeafRule("a")).unwrap();
        g.push(LeafRule("c")).unwrap();
        g.insert_before("c", LeafRule("b")).unwrap();
        assert_eq!(g.rule_names(), ["a", "b", "c"]);

        assert!(g.remove("b").is_some());
        assert!(g.remove("b").is_none());
        assert_eq!(g.rule_names(), ["a", "c"]);

        g.insert_before("c", LeafRule("b")).unwrap();
        assert_eq!(g.rule_names(), ["a", "b", "c"]);
    }

    #[test]
    fn registration_errors() {
        let mut g: Grammar<Log> = Grammar::new();
        g.push(SplitRule).unwrap();
        assert_eq!(g.push(SplitRule), Err(Error::DuplicateRule("split")));
        assert_eq!(
            g.insert_before("missing", LeafRule("x")),
            Err(Error::UnknownRule("missing".into()))
        );
        assert!(g.set_enabled("missing", false).is_err());
    }

    #[test]
    fn disabled_rules_are_skipped() {
        let mut g = Grammar::new();
        g.push(LeafRule("first")).unwrap();
        g.push(LeafRule("second")).unwrap();
        g.set_enabled("first", false).unwrap();
        assert!(!g.is_enabled("first"));
        let mut state = seeded(vec![Tok::Leaf(1)]);

        g.run(&mut state);

        assert_eq!(state.trace, ["second1"]);
    }

    #[test]
    fn observer_sees_every_rewrite() {
        let mut g = Grammar::new();
        g.push(SplitRule).unwrap();
        g.push(LeafRule("leaf")).unwrap();
        let mut state = seeded(vec![Tok::Split(3)]);
        let mut seen = Vec::new();

        g.run_with(&mut state, |s, name| seen.push((name, s.markers.len())));

        assert_eq!(seen.len(), 7);
        assert!(seen[..4].iter().all(|(name, _)| *name == "split"));
        assert_eq!(seen.last(), Some(&("leaf", 0)));
    }
}
