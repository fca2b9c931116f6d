use crate::error::{Error, Result};
use crate::geometry::Polygon;
use glam::{Affine2, Vec2};

/// Collision shape of one entity.
///
/// The polygons are stored in local space. The entity's own placement is
/// `local`; `parent` is whatever transform chain the owner sits under
/// (identity for top-level entities), so world space is `parent * local`.
#[derive(Clone, Debug)]
pub struct CollisionBody {
    polygons: Vec<Polygon>,
    local: Affine2,
    parent: Affine2,
    epsilon: f32,
}

impl CollisionBody {
    /// ### Errors
    /// [`Error::InvalidTolerance`] if `epsilon` is negative or not finite.
    pub fn new(polygons: Vec<Polygon>, epsilon: f32) -> Result<Self> {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(Error::InvalidTolerance(epsilon));
        }
        Ok(Self {
            polygons,
            local: Affine2::IDENTITY,
            parent: Affine2::IDENTITY,
            epsilon,
        })
    }

    pub fn with_local(mut self, local: Affine2) -> Self {
        self.local = local;
        self
    }

    pub fn with_parent(mut self, parent: Affine2) -> Self {
        self.parent = parent;
        self
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn local_transform(&self) -> Affine2 {
        self.local
    }

    pub fn world_transform(&self) -> Affine2 {
        self.parent * self.local
    }

    /// Polygons under the full transform chain.
    pub fn world_polygons(&self) -> Vec<Polygon> {
        let world = self.world_transform();
        self.polygons.iter().map(|p| p.transformed(&world)).collect()
    }

    /// Polygons under the local transform only.
    pub fn local_polygons(&self) -> Vec<Polygon> {
        self.polygons.iter().map(|p| p.transformed(&self.local)).collect()
    }

    /// Moves the body by `delta` measured in world space.
    pub fn translate_world(&mut self, delta: Vec2) {
        self.local.translation += self.parent.matrix2.inverse() * delta;
    }

    /// `true` if every world polygon of `other` lies inside some world
    /// polygon of `self`. An entity without a body is trivially contained.
    pub fn contains(&self, other: Option<&CollisionBody>) -> bool {
        let Some(other) = other else {
            return true;
        };
        let eps = self.epsilon.max(other.epsilon);
        let ours = self.world_polygons();
        other
            .world_polygons()
            .iter()
            .all(|theirs| ours.iter().any(|p| p.contains(theirs, eps)))
    }

    /// `true` if any pair of world polygons overlaps beyond the larger of
    /// the two tolerances. A body never overlaps itself.
    pub fn overlaps(&self, other: &CollisionBody) -> bool {
        if std::ptr::eq(self, other) {
            return false;
        }
        let eps = self.epsilon.max(other.epsilon);
        let ours = self.world_polygons();
        let theirs = other.world_polygons();
        ours.iter()
            .any(|a| theirs.iter().any(|b| a.overlaps(b, eps)))
    }

    pub fn overlaps_any<'a>(&self, others: impl IntoIterator<Item = &'a CollisionBody>) -> bool {
        others.into_iter().any(|other| self.overlaps(other))
    }
}
