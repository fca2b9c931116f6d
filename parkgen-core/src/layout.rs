use crate::error::{Error, Result};
use crate::geometry::Polygon;
use crate::marker::Side;
use crate::types::{EntranceId, TileId};
use glam::{Affine2, Mat2, Vec2};
use rand::Rng;

/// Which circulation network a tile belongs to. Driveway tiles carry car
/// spaces, bikeway tiles carry bicycle spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Network {
    Driveway,
    Bikeway,
}

/// A point on the roadside where a driveway may start, heading inwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entrance {
    pub position: Vec2,
    pub direction: Vec2,
}

/// Parking slots along one side of a tile.
///
/// Slot `i` covers `[i, i + 1) * space_width` along the tile. Slots are
/// tried in order; one that does not fit is skipped for good.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParkingArea {
    /// Spaces placed on this side.
    pub count: u32,
    /// Next slot to try.
    pub next: u32,
    /// Slots that fit along the tile's current length, blocked or not.
    /// [`TileBuilder::attainable`](crate::builder::TileBuilder::attainable)
    /// counts the ones that can still take a space.
    pub max: u32,
    /// One past the highest occupied slot.
    pub extent: u32,
}

impl ParkingArea {
    pub fn has_room(&self) -> bool {
        self.next < self.max
    }

    pub(crate) fn fit(&mut self, slots: u32) {
        self.max = slots;
        self.next = self.next.min(slots);
    }
}

#[derive(Clone, Debug)]
pub struct Tile {
    pub network: Network,
    pub origin: Vec2,
    /// Unit heading.
    pub direction: Vec2,
    pub length: f32,
    pub width: f32,
    pub previous: Option<TileId>,
    pub forward: Option<TileId>,
    pub left: ParkingArea,
    pub right: ParkingArea,
}

impl Tile {
    pub fn new_root(network: Network, origin: Vec2, direction: Vec2, length: f32, width: f32) -> Self {
        Self {
            network,
            origin,
            direction: direction.normalize_or_zero(),
            length,
            width,
            previous: None,
            forward: None,
            left: ParkingArea::default(),
            right: ParkingArea::default(),
        }
    }

    pub fn new_child(
        network: Network,
        origin: Vec2,
        direction: Vec2,
        length: f32,
        width: f32,
        previous: TileId,
    ) -> Self {
        Self {
            previous: Some(previous),
            ..Self::new_root(network, origin, direction, length, width)
        }
    }

    /// Local frame: +x along the heading from the origin, +y to the left.
    pub fn transform(&self) -> Affine2 {
        Affine2::from_mat2_translation(
            Mat2::from_cols(self.direction, self.direction.perp()),
            self.origin,
        )
    }

    pub fn end(&self) -> Vec2 {
        self.origin + self.direction * self.length
    }

    /// Outward unit normal of the given side.
    pub fn normal(&self, side: Side) -> Vec2 {
        self.direction.perp() * side.sign()
    }

    pub fn footprint(&self) -> Polygon {
        self.footprint_with_length(self.length)
    }

    pub fn footprint_with_length(&self, length: f32) -> Polygon {
        let half = self.width / 2.0;
        Polygon::rect(Vec2::new(0.0, -half), Vec2::new(length, half)).transformed(&self.transform())
    }

    /// World polygon of slot `index` on `side`.
    pub fn slot(&self, side: Side, index: u32, space_width: f32, space_depth: f32) -> Polygon {
        let half = self.width / 2.0;
        let (x0, x1) = (index as f32 * space_width, (index + 1) as f32 * space_width);
        let (y0, y1) = match side {
            Side::Left => (half, half + space_depth),
            Side::Right => (-half - space_depth, -half),
        };
        Polygon::rect(Vec2::new(x0, y0), Vec2::new(x1, y1)).transformed(&self.transform())
    }

    pub fn area(&self, side: Side) -> &ParkingArea {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn area_mut(&mut self, side: Side) -> &mut ParkingArea {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParkingSpace {
    pub tile: TileId,
    pub side: Side,
    pub index: u32,
    pub network: Network,
    pub polygon: Polygon,
}

/// The site and every piece of geometry accepted into it so far.
///
/// Tiles live in an arena indexed by [`TileId`]; removed tiles leave an
/// empty slot so ids held by pending markers never alias a newer tile.
#[derive(Debug)]
pub struct Layout {
    site: Polygon,
    tolerance: f32,
    entrances: Vec<Entrance>,
    obstacles: Vec<Polygon>,
    tiles: Vec<Option<Tile>>,
    spaces: Vec<ParkingSpace>,
    car_spaces: u32,
    bicycle_spaces: u32,
}

impl Layout {
    /// ### Errors
    /// [`Error::InvalidTolerance`] if `tolerance` is negative or not finite.
    pub fn new(site: Polygon, tolerance: f32) -> Result<Self> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(Error::InvalidTolerance(tolerance));
        }
        Ok(Self {
            site,
            tolerance,
            entrances: Vec::new(),
            obstacles: Vec::new(),
            tiles: Vec::new(),
            spaces: Vec::new(),
            car_spaces: 0,
            bicycle_spaces: 0,
        })
    }

    pub fn site(&self) -> &Polygon {
        &self.site
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// ### Errors
    /// [`Error::ZeroDirection`] if `direction` has no length.
    pub fn add_entrance(&mut self, position: Vec2, direction: Vec2) -> Result<EntranceId> {
        let direction = direction.try_normalize().ok_or(Error::ZeroDirection)?;
        self.entrances.push(Entrance {
            position,
            direction,
        });
        Ok(self.entrances.len() - 1)
    }

    /// ### Errors
    /// [`Error::UnknownEntrance`] if `id` was never added.
    pub fn entrance(&self, id: EntranceId) -> Result<&Entrance> {
        self.entrances.get(id).ok_or(Error::UnknownEntrance(id))
    }

    pub fn entrances(&self) -> &[Entrance] {
        &self.entrances
    }

    pub fn clear_entrances(&mut self) {
        self.entrances.clear();
    }

    pub fn add_obstacle(&mut self, obstacle: Polygon) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Polygon] {
        &self.obstacles
    }

    /// Drops up to `count` square obstacles at random positions.
    ///
    /// Candidates are drawn uniformly over the site's bounding box. Those
    /// not fully inside the site or overlapping an earlier obstacle are
    /// discarded.
    ///
    /// ### Parameters
    /// - `count` - Number of candidates to draw.
    /// - `half_size` - Half the side length of each square.
    /// - `rng` - Random source.
    ///
    /// ### Returns
    /// How many obstacles were added.
    pub fn scatter_obstacles(&mut self, count: usize, half_size: f32, rng: &mut impl Rng) -> usize {
        let (lo, hi) = self.site.bounds();
        let mut added = 0;
        for _ in 0..count {
            let x = rng.random_range(lo.x..=hi.x);
            let y = rng.random_range(lo.y..=hi.y);
            let square = Polygon::square(Vec2::new(x, y), half_size);
            if self.site.contains(&square, self.tolerance)
                && !self.obstacles.iter().any(|o| o.overlaps(&square, self.tolerance))
            {
                self.obstacles.push(square);
                added += 1;
            }
        }
        added
    }

    /// Inserts `tile` and, if its previous tile has no forward link yet,
    /// links it forward to the new tile.
    ///
    /// ### Errors
    /// [`Error::UnknownTile`] if `tile.previous` names no live tile. A new
    /// tile can therefore never be its own predecessor.
    pub fn add_tile(&mut self, tile: Tile) -> Result<TileId> {
        let id = self.tiles.len();
        if let Some(previous) = tile.previous {
            let prev = self.tile_mut(previous).ok_or(Error::UnknownTile(previous))?;
            if prev.forward.is_none() {
                prev.forward = Some(id);
            }
        }
        self.tiles.push(Some(tile));
        Ok(id)
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id).and_then(Option::as_ref)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(id).and_then(Option::as_mut)
    }

    /// Live tiles in id order.
    pub fn tiles(&self) -> impl Iterator<Item = (TileId, &Tile)> {
        self.tiles
            .iter()
            .enumerate()
            .filter_map(|(id, t)| t.as_ref().map(|t| (id, t)))
    }

    pub fn tile_count(&self, network: Network) -> usize {
        self.tiles().filter(|(_, t)| t.network == network).count()
    }

    /// Live tiles whose previous tile is `id`.
    pub fn children(&self, id: TileId) -> impl Iterator<Item = TileId> + '_ {
        self.tiles()
            .filter(move |(_, t)| t.previous == Some(id))
            .map(|(child, _)| child)
    }

    /// Length of `id` plus every tile reachable through previous links.
    pub fn chain_length(&self, id: TileId) -> f32 {
        let mut total = 0.0;
        let mut cursor = Some(id);
        // Bounded by the arena size in case a caller wired a cycle by hand.
        for _ in 0..self.tiles.len() {
            let Some(tile) = cursor.and_then(|c| self.tile(c)) else {
                break;
            };
            total += tile.length;
            cursor = tile.previous;
        }
        total
    }

    /// Removes a tile together with its parking spaces and unlinks it from
    /// its neighbours.
    pub fn remove_tile(&mut self, id: TileId) -> Option<Tile> {
        let tile = self.tiles.get_mut(id)?.take()?;
        self.release_spaces(|s| s.tile == id);
        if let Some(prev) = tile.previous.and_then(|p| self.tile_mut(p))
            && prev.forward == Some(id)
        {
            prev.forward = None;
        }
        for other in self.tiles.iter_mut().flatten() {
            if other.previous == Some(id) {
                other.previous = None;
            }
        }
        Some(tile)
    }

    /// Removes every generated tile and space, keeping the site, entrances
    /// and obstacles.
    pub fn clear_tiles(&mut self) {
        self.tiles.clear();
        self.spaces.clear();
        self.car_spaces = 0;
        self.bicycle_spaces = 0;
    }

    pub fn add_space(&mut self, space: ParkingSpace) {
        *self.counter_mut(space.network) += 1;
        self.spaces.push(space);
    }

    /// Removes the spaces matching `pred` and returns how many went.
    pub fn release_spaces(&mut self, mut pred: impl FnMut(&ParkingSpace) -> bool) -> u32 {
        let mut released = [0u32; 2];
        self.spaces.retain(|s| {
            if pred(s) {
                released[s.network as usize] += 1;
                false
            } else {
                true
            }
        });
        for network in [Network::Driveway, Network::Bikeway] {
            let counter = self.counter_mut(network);
            *counter = counter.saturating_sub(released[network as usize]);
        }
        released.iter().sum()
    }

    pub fn spaces(&self) -> &[ParkingSpace] {
        &self.spaces
    }

    pub fn spaces_of(&self, tile: TileId) -> impl Iterator<Item = &ParkingSpace> {
        self.spaces.iter().filter(move |s| s.tile == tile)
    }

    /// Running space counter of `network`.
    pub fn space_count(&self, network: Network) -> u32 {
        match network {
            Network::Driveway => self.car_spaces,
            Network::Bikeway => self.bicycle_spaces,
        }
    }

    fn counter_mut(&mut self, network: Network) -> &mut u32 {
        match network {
            Network::Driveway => &mut self.car_spaces,
            Network::Bikeway => &mut self.bicycle_spaces,
        }
    }

    /// Recomputes `count` and `extent` of one side of `tile` from the
    /// spaces actually placed there.
    pub fn refresh_area(&mut self, tile: TileId, side: Side) {
        let (count, extent) = self
            .spaces_of(tile)
            .filter(|s| s.side == side)
            .fold((0, 0), |(n, e), s| (n + 1, e.max(s.index + 1)));
        if let Some(t) = self.tile_mut(tile) {
            let area = t.area_mut(side);
            area.count = count;
            area.extent = extent;
        }
    }

    /// Overlap gate for new geometry: `polygon` must lie inside the site and
    /// clear every obstacle, tile and space. Tiles listed in `ignore`, and
    /// the spaces attached to them, are skipped.
    pub fn is_placement_valid(&self, polygon: &Polygon, ignore: &[TileId]) -> bool {
        let eps = self.tolerance;
        self.site.contains(polygon, eps)
            && !self.obstacles.iter().any(|o| o.overlaps(polygon, eps))
            && !self
                .tiles()
                .any(|(id, t)| !ignore.contains(&id) && t.footprint().overlaps(polygon, eps))
            && !self
                .spaces
                .iter()
                .any(|s| !ignore.contains(&s.tile) && s.polygon.overlaps(polygon, eps))
    }
}
