use crate::builder::TileBuilder;
use crate::config::{Config, Requirements};
use crate::layout::{Layout, Network};
use crate::marker::{BeginSource, Marker};
use crate::rewrite::RewriteState;

/// Everything the growth rules read and write.
///
/// The state owns its layout; drivers reuse one state across evaluations by
/// clearing the layout's tiles and calling [`GrowthState::reset`].
#[derive(Debug)]
pub struct GrowthState {
    pub layout: Layout,
    pub requirements: Requirements,
    pub builder: TileBuilder,
    pub markers: Vec<Marker>,
}

impl GrowthState {
    pub fn new(layout: Layout, cfg: &Config) -> Self {
        Self {
            layout,
            requirements: cfg.requirements,
            builder: TileBuilder::from_config(cfg),
            markers: Vec::new(),
        }
    }

    /// Drops pending markers and seeds one `Begin` per growth source of
    /// `network`: every entrance for driveways, every driveway chain root
    /// for bikeways.
    pub fn reset(&mut self, network: Network) {
        self.markers.clear();
        let sources: Vec<BeginSource> = match network {
            Network::Driveway => (0..self.layout.entrances().len())
                .map(BeginSource::Entrance)
                .collect(),
            Network::Bikeway => self
                .layout
                .tiles()
                .filter(|(_, t)| t.network == Network::Driveway && t.previous.is_none())
                .map(|(id, _)| BeginSource::Tile(id))
                .collect(),
        };
        log::debug!("reset {network:?}: {} begin markers", sources.len());
        self.markers
            .extend(sources.into_iter().map(|source| Marker::Begin { source }));
    }

    pub fn capacity(&self, network: Network) -> u32 {
        match network {
            Network::Driveway => self.requirements.max_car_spaces,
            Network::Bikeway => self.requirements.max_bicycle_spaces,
        }
    }

    pub fn at_capacity(&self, network: Network) -> bool {
        self.layout.space_count(network) >= self.capacity(network)
    }

    pub fn max_length(&self, network: Network) -> Option<f32> {
        match network {
            Network::Driveway => self.requirements.max_driveway_length,
            Network::Bikeway => self.requirements.max_bikeway_length,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn into_layout(self) -> Layout {
        self.layout
    }
}

impl RewriteState for GrowthState {
    type Marker = Marker;

    fn markers(&self) -> &[Marker] {
        &self.markers
    }

    fn markers_mut(&mut self) -> &mut Vec<Marker> {
        &mut self.markers
    }
}
