//! Greedy worst-first contact resolution over a set of rigid bodies.
//!
//! Each round:
//! 1. rebuilds every contact between registered pairs ([`get_contacts`]),
//! 2. stops if there is none,
//! 3. resolves the single deepest contact that can move something.
//!
//! When the round budget runs out, or when only contacts between two
//! immovable bodies remain, the last contact set is kept so callers can
//! tell that the configuration is unresolved.

use crate::config::ResolverConfig;
use crate::contact::{Contact, get_contacts, resolve};
use crate::error::{Error, Result};
use crate::rigid_body::RigidBody;
use crate::types::BodyId;

/// Arena of rigid bodies referenced by id from a [`Resolver`].
#[derive(Debug, Default)]
pub struct BodySet {
    bodies: Vec<RigidBody>,
}

impl BodySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, body: RigidBody) -> BodyId {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    pub fn get(&self, id: BodyId) -> Result<&RigidBody> {
        self.bodies.get(id).ok_or(Error::UnknownBody(id))
    }

    pub fn get_mut(&mut self, id: BodyId) -> Result<&mut RigidBody> {
        self.bodies.get_mut(id).ok_or(Error::UnknownBody(id))
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &RigidBody)> {
        self.bodies.iter().enumerate()
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
    }
}

/// Outcome of [`Resolver::resolve_all`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Number of contacts that moved bodies.
    pub rounds: usize,
    /// `true` if the final contact set is empty.
    pub converged: bool,
}

#[derive(Debug)]
pub struct Resolver {
    bodies: Vec<BodyId>,
    contacts: Vec<Contact>,
    cfg: ResolverConfig,
}

impl Resolver {
    /// ### Errors
    /// [`Error::InvalidTolerance`] if the configured epsilon is negative.
    pub fn new(cfg: ResolverConfig) -> Result<Self> {
        if !cfg.epsilon.is_finite() || cfg.epsilon < 0.0 {
            return Err(Error::InvalidTolerance(cfg.epsilon));
        }
        Ok(Self {
            bodies: Vec::new(),
            contacts: Vec::new(),
            cfg,
        })
    }

    /// Adds a body of `set` to the resolution.
    ///
    /// ### Errors
    /// - [`Error::UnknownBody`] if `id` is not in `set`.
    /// - [`Error::DuplicateBody`] if `id` is already registered.
    pub fn register(&mut self, set: &BodySet, id: BodyId) -> Result<()> {
        set.get(id)?;
        if self.bodies.contains(&id) {
            return Err(Error::DuplicateBody(id));
        }
        self.bodies.push(id);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
    }

    pub fn bodies(&self) -> &[BodyId] {
        &self.bodies
    }

    /// Contacts found by the last rebuild. Non-empty after
    /// [`Resolver::resolve_all`] means the layout could not be separated.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Rebuilds the contact set over every registered pair.
    pub fn rebuild_contacts(&mut self, set: &BodySet) -> Result<()> {
        self.contacts.clear();
        for (i, &a) in self.bodies.iter().enumerate() {
            let body_a = set.get(a)?;
            for &b in &self.bodies[i + 1..] {
                let body_b = set.get(b)?;
                self.contacts
                    .extend(get_contacts(a, body_a, b, body_b, self.cfg.epsilon));
            }
        }
        Ok(())
    }

    /// Index of the deepest contact that is not yet resolved.
    fn priority_contact(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, c) in self.contacts.iter().enumerate() {
            if c.resolved {
                continue;
            }
            let depth = c.depth();
            if best.is_none_or(|(_, d)| depth > d) {
                best = Some((i, depth));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Runs up to `max_rounds` resolution rounds.
    ///
    /// ### Parameters
    /// - `set` - Bodies referenced by the registered ids; movable ones are
    ///   translated in place.
    ///
    /// ### Returns
    /// How many contacts were resolved and whether the layout ended free of
    /// contacts. The residual set stays available through
    /// [`Resolver::contacts`].
    ///
    /// ### Errors
    /// [`Error::UnknownBody`] if a registered id is no longer in `set`.
    pub fn resolve_all(&mut self, set: &mut BodySet) -> Result<Resolution> {
        let mut rounds = 0;
        while rounds < self.cfg.max_rounds {
            self.rebuild_contacts(set)?;
            if self.contacts.is_empty() {
                log::debug!("resolver converged after {rounds} rounds");
                return Ok(Resolution {
                    rounds,
                    converged: true,
                });
            }

            for contact in self.contacts.iter_mut() {
                let immovable = !set.get(contact.a)?.is_movable() && !set.get(contact.b)?.is_movable();
                if immovable {
                    resolve(contact, set)?;
                }
            }

            let Some(index) = self.priority_contact() else {
                log::warn!(
                    "resolver stopped with {} irreconcilable contacts",
                    self.contacts.len()
                );
                return Ok(Resolution {
                    rounds,
                    converged: false,
                });
            };
            log::trace!(
                "round {rounds}: resolving contact {index} of {} (depth {:.4})",
                self.contacts.len(),
                self.contacts[index].depth()
            );
            resolve(&mut self.contacts[index], set)?;
            rounds += 1;
        }

        self.rebuild_contacts(set)?;
        let converged = self.contacts.is_empty();
        if !converged {
            log::warn!(
                "resolver exhausted {} rounds with {} contacts left",
                self.cfg.max_rounds,
                self.contacts.len()
            );
        }
        Ok(Resolution { rounds, converged })
    }
}
