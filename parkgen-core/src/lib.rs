//! Core circulation-network generation and 2-D layout correction library.
//!
//! Main components:
//! - [`rewrite`]: generic marker/rule rewriting engine run to a fixed point.
//! - [`marker`]: the closed set of growth markers and their kinds.
//! - [`layout`]: the site aggregate: entrances, obstacles, tiles, spaces.
//! - [`builder`]: tile creation, extension, turning and shrinking.
//! - [`state`]: grammar state shared by the growth rules.
//! - [`growth`]: rules common to every network (forward, append, prune).
//! - [`driveway`] / [`bikeway`]: the two concrete growth grammars.
//! - [`geometry`]: polygons and tolerance-aware predicates.
//! - [`collision`]: per-entity collision bodies.
//! - [`rigid_body`]: mass classification of collision bodies.
//! - [`contact`]: vertex-penetration contacts and their resolution.
//! - [`resolver`]: worst-first iterative contact resolver.
//! - [`config`]: requirements and dimensional configuration.
//! - [`error`]: error type for contract violations.
//! - [`types`]: shared type aliases and IDs.

pub mod bikeway;
pub mod builder;
pub mod collision;
pub mod config;
pub mod contact;
pub mod driveway;
pub mod error;
pub mod geometry;
pub mod growth;
pub mod layout;
pub mod marker;
pub mod resolver;
pub mod rewrite;
pub mod rigid_body;
pub mod state;
pub mod types;

pub use error::{Error, Result};
