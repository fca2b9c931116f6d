//! Vertex-penetration contacts between two rigid bodies and their
//! mass-weighted resolution.
//!
//! A contact is produced for every vertex of one body that violates a
//! polygon of the other:
//! - a vertex inside a solid polygon it must stay out of, or
//! - a vertex outside a space polygon it must stay in.
//!
//! The target point is the closest point on the violated boundary, so
//! moving the vertex there resolves that one violation. Contacts are
//! generated in both directions without deduplication.

use crate::error::Result;
use crate::resolver::BodySet;
use crate::rigid_body::RigidBody;
use crate::types::BodyId;
use glam::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Owner of the penetrating vertex.
    pub a: BodyId,
    /// Owner of the violated boundary.
    pub b: BodyId,
    pub penetration: Vec2,
    pub target: Vec2,
    pub epsilon: f32,
    pub resolved: bool,
}

impl Contact {
    /// Distance the penetrating vertex has to travel.
    pub fn depth(&self) -> f32 {
        self.penetration.distance(self.target)
    }

    pub fn correction(&self) -> Vec2 {
        self.target - self.penetration
    }
}

/// Collects the contacts between `body_a` and `body_b` in both directions:
/// first `a`'s vertices against `b`'s polygons, then the reverse.
///
/// Spaces never contribute penetrating vertices. Vertices closer than
/// `epsilon` to the boundary they are tested against are skipped.
///
/// ### Parameters
/// - `a`, `b` - Ids recorded in the produced contacts.
/// - `body_a`, `body_b` - The two bodies, in world space.
/// - `epsilon` - Boundary tolerance, also copied into each contact.
///
/// ### Returns
/// Every violation found, in vertex order.
pub fn get_contacts(
    a: BodyId,
    body_a: &RigidBody,
    b: BodyId,
    body_b: &RigidBody,
    epsilon: f32,
) -> Vec<Contact> {
    let mut out = Vec::new();
    vertex_contacts(a, body_a, b, body_b, epsilon, &mut out);
    vertex_contacts(b, body_b, a, body_a, epsilon, &mut out);
    out
}

fn vertex_contacts(
    pen_id: BodyId,
    pen: &RigidBody,
    tgt_id: BodyId,
    tgt: &RigidBody,
    epsilon: f32,
    out: &mut Vec<Contact>,
) {
    if pen.is_space {
        return;
    }
    let targets = tgt.body.world_polygons();
    for poly in pen.body.world_polygons() {
        for &vertex in poly.points() {
            for boundary in &targets {
                let target = boundary.closest_boundary_point(vertex);
                if target.distance(vertex) < epsilon {
                    continue;
                }
                // Solids must not hold the vertex, spaces must.
                if boundary.winds_around(vertex) == tgt.is_space {
                    continue;
                }
                out.push(Contact {
                    a: pen_id,
                    b: tgt_id,
                    penetration: vertex,
                    target,
                    epsilon,
                    resolved: false,
                });
            }
        }
    }
}

/// Share of the correction carried by each side, `(a, b)`.
///
/// Two weightless bodies split evenly, an infinite side never moves, and
/// otherwise the lighter body moves proportionally more. Both sides
/// infinite is not a valid input; [`resolve`] handles it before calling.
pub fn split(mass_a: f32, mass_b: f32) -> (f32, f32) {
    if mass_a == 0.0 && mass_b == 0.0 {
        (0.5, 0.5)
    } else if mass_a.is_infinite() {
        (0.0, 1.0)
    } else if mass_b.is_infinite() {
        (1.0, 0.0)
    } else {
        let total = mass_a + mass_b;
        (mass_b / total, mass_a / total)
    }
}

/// Separates the two bodies of `contact` and marks it resolved.
///
/// Each moving side travels its share of the correction plus `epsilon`
/// along the correction direction, so the vertex ends strictly past the
/// boundary. A contact between two immovable bodies is marked resolved
/// without moving anything.
///
/// ### Errors
/// [`crate::Error::UnknownBody`] if either id is missing from `bodies`.
pub fn resolve(contact: &mut Contact, bodies: &mut BodySet) -> Result<()> {
    let mass_a = bodies.get(contact.a)?.effective_mass();
    let mass_b = bodies.get(contact.b)?.effective_mass();
    contact.resolved = true;
    if mass_a.is_infinite() && mass_b.is_infinite() {
        return Ok(());
    }

    let (share_a, share_b) = split(mass_a, mass_b);
    let correction = contact.correction();
    let overshoot = correction.normalize_or_zero() * contact.epsilon;
    if share_a > 0.0 {
        bodies
            .get_mut(contact.a)?
            .body
            .translate_world(correction * share_a + overshoot);
    }
    if share_b > 0.0 {
        bodies
            .get_mut(contact.b)?
            .body
            .translate_world(-(correction * share_b + overshoot));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionBody;
    use crate::error::Error;
    use crate::geometry::Polygon;

    const EPS: f32 = 1e-3;

    fn rect(min: Vec2, max: Vec2) -> CollisionBody {
        CollisionBody::new(vec![Polygon::rect(min, max)], EPS).unwrap()
    }

    fn origin_of(bodies: &BodySet, id: BodyId) -> Vec2 {
        bodies.get(id).unwrap().body.world_polygons()[0].points()[0]
    }

    #[test]
    fn solid_contacts_are_generated_in_both_directions() {
        // Corner-to-corner overlap: one vertex of each lies in the other.
        let a = RigidBody::solid(rect(Vec2::ZERO, Vec2::ONE), 1.0).unwrap();
        let b = RigidBody::solid(rect(Vec2::splat(0.8), Vec2::splat(1.8)), 1.0).unwrap();
        let contacts = get_contacts(0, &a, 1, &b, EPS);
        assert_eq!(contacts.len(), 2);
        assert_eq!((contacts[0].a, contacts[0].b), (0, 1));
        assert_eq!(contacts[0].penetration, Vec2::ONE);
        assert_eq!((contacts[1].a, contacts[1].b), (1, 0));
        assert_eq!(contacts[1].penetration, Vec2::splat(0.8));
        assert!((contacts[1].depth() - 0.2).abs() < 1e-5);
    }

    #[test]
    fn space_contacts_flag_vertices_outside_and_spaces_never_penetrate() {
        let site = RigidBody::space(rect(Vec2::ZERO, Vec2::splat(10.0)));
        let poking = RigidBody::solid(rect(Vec2::new(9.0, 4.0), Vec2::new(11.0, 6.0)), 1.0).unwrap();
        let contacts = get_contacts(0, &site, 1, &poking, EPS);
        assert_eq!(contacts.len(), 2);
        for c in &contacts {
            assert_eq!((c.a, c.b), (1, 0));
            assert_eq!(c.penetration.x, 11.0);
            assert!((c.target.x - 10.0).abs() < 1e-6);
        }
    }

    #[test]
    fn vertices_within_epsilon_of_boundary_are_skipped() {
        let a = RigidBody::solid(rect(Vec2::ZERO, Vec2::ONE), 1.0).unwrap();
        let touching = RigidBody::solid(rect(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0)), 1.0).unwrap();
        assert!(get_contacts(0, &a, 1, &touching, EPS).is_empty());
    }

    #[test]
    fn split_follows_mass_rules() {
        assert_eq!(split(0.0, 0.0), (0.5, 0.5));
        assert_eq!(split(f32::INFINITY, 3.0), (0.0, 1.0));
        assert_eq!(split(3.0, f32::INFINITY), (1.0, 0.0));
        assert_eq!(split(1.0, 3.0), (0.75, 0.25));
        assert_eq!(split(0.0, 2.0), (1.0, 0.0));
    }

    #[test]
    fn resolve_never_moves_two_immovable_bodies() {
        let mut bodies = BodySet::new();
        let a = bodies.add(RigidBody::static_solid(rect(Vec2::ZERO, Vec2::ONE)));
        let b = bodies.add(RigidBody::space(rect(Vec2::splat(0.5), Vec2::splat(3.0))));
        let mut contact = get_contacts(a, bodies.get(a).unwrap(), b, bodies.get(b).unwrap(), EPS)[0];
        resolve(&mut contact, &mut bodies).unwrap();
        assert!(contact.resolved);
        assert_eq!(origin_of(&bodies, a), Vec2::ZERO);
        assert_eq!(origin_of(&bodies, b), Vec2::splat(0.5));
    }

    #[test]
    fn resolve_moves_only_the_movable_side_past_the_boundary() {
        let mut bodies = BodySet::new();
        let wall = bodies.add(RigidBody::static_solid(rect(Vec2::ZERO, Vec2::ONE)));
        let crate_ = bodies.add(
            RigidBody::solid(rect(Vec2::new(0.9, 0.25), Vec2::new(1.9, 0.75)), 4.0).unwrap(),
        );
        let mut contact = get_contacts(wall, bodies.get(wall).unwrap(), crate_, bodies.get(crate_).unwrap(), EPS)[0];
        assert_eq!(contact.a, crate_);
        resolve(&mut contact, &mut bodies).unwrap();
        assert_eq!(origin_of(&bodies, wall), Vec2::ZERO);
        let moved = origin_of(&bodies, crate_);
        assert!((moved.x - (1.0 + EPS)).abs() < 1e-5);
        assert!((moved.y - 0.25).abs() < 1e-6);
    }

    #[test]
    fn resolve_splits_weightless_bodies_evenly() {
        let mut bodies = BodySet::new();
        let a = bodies.add(RigidBody::solid(rect(Vec2::ZERO, Vec2::ONE), 0.0).unwrap());
        let b = bodies.add(
            RigidBody::solid(rect(Vec2::new(0.9, 0.25), Vec2::new(1.9, 0.75)), 0.0).unwrap(),
        );
        let mut contact = get_contacts(a, bodies.get(a).unwrap(), b, bodies.get(b).unwrap(), EPS)[0];
        resolve(&mut contact, &mut bodies).unwrap();
        assert!((origin_of(&bodies, a).x + 0.05 + EPS).abs() < 1e-5);
        assert!((origin_of(&bodies, b).x - (0.95 + EPS)).abs() < 1e-5);
    }

    #[test]
    fn resolve_rejects_unknown_bodies() {
        let mut bodies = BodySet::new();
        let mut contact = Contact {
            a: 0,
            b: 1,
            penetration: Vec2::ZERO,
            target: Vec2::ONE,
            epsilon: EPS,
            resolved: false,
        };
        assert_eq!(resolve(&mut contact, &mut bodies), Err(Error::UnknownBody(0)));
        assert!(!contact.resolved);
    }
}
