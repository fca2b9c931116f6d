use crate::error::{Error, Result};

/// Stopping bounds consulted by every growth rule.
#[derive(Clone, Copy, Debug)]
pub struct Requirements {
    pub max_car_spaces: u32,
    pub max_bicycle_spaces: u32,
    /// Longest driveway chain, measured from its entrance tile.
    pub max_driveway_length: Option<f32>,
    /// Longest bikeway chain, measured from its first tile.
    pub max_bikeway_length: Option<f32>,
    pub allow_turning: bool,
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            max_car_spaces: 40,
            max_bicycle_spaces: 20,
            max_driveway_length: None,
            max_bikeway_length: None,
            allow_turning: true,
        }
    }
}

/// Dimensions of one network's tiles and of the spaces attached to them.
///
/// A tile grows by `step` per extension. Once it reaches `segment_length`
/// the next extension starts a new chained tile instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSpec {
    pub width: f32,
    pub step: f32,
    pub segment_length: f32,
    pub space_width: f32,
    pub space_depth: f32,
}

impl TileSpec {
    pub const DRIVEWAY: TileSpec = TileSpec {
        width: 6.0,
        step: 2.5,
        segment_length: 25.0,
        space_width: 2.5,
        space_depth: 5.0,
    };

    pub const BIKEWAY: TileSpec = TileSpec {
        width: 2.0,
        step: 1.0,
        segment_length: 10.0,
        space_width: 1.0,
        space_depth: 2.0,
    };

    fn validate(&self) -> Result<()> {
        let dims = [
            self.width,
            self.step,
            self.segment_length,
            self.space_width,
            self.space_depth,
        ];
        if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(Error::InvalidConfig("tile dimensions must be positive"));
        }
        if self.segment_length < self.step {
            return Err(Error::InvalidConfig("segment length shorter than one step"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ResolverConfig {
    pub max_rounds: usize,
    pub epsilon: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_rounds: 256,
            epsilon: 1e-3,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub requirements: Requirements,
    pub driveway: TileSpec,
    pub bikeway: TileSpec,
    pub resolver: ResolverConfig,
    /// Geometric tolerance of the layout's placement gate.
    pub tolerance: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            requirements: Requirements::default(),
            driveway: TileSpec::DRIVEWAY,
            bikeway: TileSpec::BIKEWAY,
            resolver: ResolverConfig::default(),
            tolerance: 1e-3,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.driveway.validate()?;
        self.bikeway.validate()?;
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::InvalidTolerance(self.tolerance));
        }
        if !self.resolver.epsilon.is_finite() || self.resolver.epsilon < 0.0 {
            return Err(Error::InvalidTolerance(self.resolver.epsilon));
        }
        let lengths = [
            self.requirements.max_driveway_length,
            self.requirements.max_bikeway_length,
        ];
        if lengths.into_iter().flatten().any(|l| l.is_nan() || l < 0.0) {
            return Err(Error::InvalidConfig("maximum lengths must be non-negative"));
        }
        Ok(())
    }
}
