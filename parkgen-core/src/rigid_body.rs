use crate::collision::CollisionBody;
use crate::error::{Error, Result};

/// A collision body classified for resolution.
///
/// - solid: keeps other solids out, moves in proportion to its mass;
/// - static solid: keeps other solids out, never moves;
/// - space: keeps solids in (e.g. a site boundary), never moves.
#[derive(Clone, Debug)]
pub struct RigidBody {
    pub body: CollisionBody,
    pub is_space: bool,
    pub is_static: bool,
    mass: f32,
}

impl RigidBody {
    /// ### Errors
    /// [`Error::InvalidMass`] if `mass` is negative or NaN.
    pub fn new(body: CollisionBody, mass: f32, is_static: bool, is_space: bool) -> Result<Self> {
        if mass.is_nan() || mass < 0.0 {
            return Err(Error::InvalidMass(mass));
        }
        Ok(Self {
            body,
            is_space,
            is_static,
            mass,
        })
    }

    pub fn solid(body: CollisionBody, mass: f32) -> Result<Self> {
        Self::new(body, mass, false, false)
    }

    pub fn static_solid(body: CollisionBody) -> Self {
        Self {
            body,
            is_space: false,
            is_static: true,
            mass: 0.0,
        }
    }

    pub fn space(body: CollisionBody) -> Self {
        Self {
            body,
            is_space: true,
            is_static: false,
            mass: 0.0,
        }
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        if mass.is_nan() || mass < 0.0 {
            return Err(Error::InvalidMass(mass));
        }
        self.mass = mass;
        Ok(())
    }

    /// Infinite for static bodies and spaces, the plain mass otherwise.
    pub fn effective_mass(&self) -> f32 {
        if self.is_static || self.is_space {
            f32::INFINITY
        } else {
            self.mass
        }
    }

    pub fn is_movable(&self) -> bool {
        self.effective_mass().is_finite()
    }
}
