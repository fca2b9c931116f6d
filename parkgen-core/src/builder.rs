//! Tile construction for both networks.
//!
//! The builder owns no geometry. Every method takes the [`Layout`], checks
//! the candidate footprint through [`Layout::is_placement_valid`] and only
//! then commits it, so a failed call leaves the layout untouched.

use crate::config::{Config, TileSpec};
use crate::layout::{Layout, Network, ParkingSpace, Tile};
use crate::marker::Side;
use crate::types::{EntranceId, TileId};

/// Slack when fitting whole slots into a length, so `5.0 / 2.5` stays 2.
const SLOT_SLACK: f32 = 1e-4;

#[derive(Clone, Copy, Debug)]
pub struct TileBuilder {
    pub driveway: TileSpec,
    pub bikeway: TileSpec,
}

impl Default for TileBuilder {
    fn default() -> Self {
        Self {
            driveway: TileSpec::DRIVEWAY,
            bikeway: TileSpec::BIKEWAY,
        }
    }
}

impl TileBuilder {
    pub fn new(driveway: TileSpec, bikeway: TileSpec) -> Self {
        Self { driveway, bikeway }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.driveway, cfg.bikeway)
    }

    pub fn spec(&self, network: Network) -> &TileSpec {
        match network {
            Network::Driveway => &self.driveway,
            Network::Bikeway => &self.bikeway,
        }
    }

    /// Starts a driveway with a single step-long tile at `entrance`.
    pub fn begin_driveway(&self, layout: &mut Layout, entrance: EntranceId) -> Option<TileId> {
        let entrance = *layout.entrance(entrance).ok()?;
        let spec = self.driveway;
        let tile = Tile::new_root(
            Network::Driveway,
            entrance.position,
            entrance.direction,
            spec.step,
            spec.width,
        );
        self.place(layout, tile, &[])
    }

    /// Starts a bikeway on each side of driveway tile `source`, clear of the
    /// car spaces along it and heading the same way.
    ///
    /// ### Returns
    /// The tiles that could be placed, left side first.
    pub fn begin_bikeway(&self, layout: &mut Layout, source: TileId) -> Vec<TileId> {
        let Some(src) = layout.tile(source).cloned() else {
            return Vec::new();
        };
        let spec = self.bikeway;
        let offset = src.width / 2.0 + self.driveway.space_depth + spec.width / 2.0;
        Side::BOTH
            .into_iter()
            .filter_map(|side| {
                let origin = src.origin + src.normal(side) * offset;
                let tile = Tile::new_root(Network::Bikeway, origin, src.direction, spec.step, spec.width);
                self.place(layout, tile, &[])
            })
            .collect()
    }

    /// Grows tile `id` by one step.
    ///
    /// Below the segment length the tile is lengthened in place; otherwise a
    /// new step-long tile is chained to its end.
    ///
    /// ### Returns
    /// The tile that continues the chain, or `None` when blocked.
    pub fn extend(&self, layout: &mut Layout, id: TileId) -> Option<TileId> {
        let tile = layout.tile(id)?.clone();
        let spec = *self.spec(tile.network);
        let grown = tile.length + spec.step;

        if grown <= spec.segment_length + SLOT_SLACK {
            let mut ignore = vec![id];
            ignore.extend(tile.previous);
            if !layout.is_placement_valid(&tile.footprint_with_length(grown), &ignore) {
                return None;
            }
            let tile = layout.tile_mut(id)?;
            tile.length = grown;
            fit_areas(tile, &spec);
            return Some(id);
        }

        let next = Tile::new_child(
            tile.network,
            tile.end(),
            tile.direction,
            spec.step,
            tile.width,
            id,
        );
        self.place(layout, next, &[id])
    }

    /// Branches a step-long driveway tile off the far end of `id`, starting
    /// at its `side` edge and heading along that side's normal.
    ///
    /// Spaces of `id` covered by the branch are released.
    pub fn turn(&self, layout: &mut Layout, id: TileId, side: Side) -> Option<TileId> {
        let tile = layout.tile(id)?.clone();
        if tile.network != Network::Driveway {
            return None;
        }
        let spec = self.driveway;
        let normal = tile.normal(side);
        let origin = tile.end() - tile.direction * (spec.width / 2.0) + normal * (tile.width / 2.0);
        let branch = Tile::new_child(Network::Driveway, origin, normal, spec.step, spec.width, id);
        let footprint = branch.footprint();

        let branch = self.place(layout, branch, &[id])?;
        let eps = layout.tolerance();
        let released = layout.release_spaces(|s| s.tile == id && s.polygon.overlaps(&footprint, eps));
        if released > 0 {
            log::trace!("turn off tile {id} released {released} spaces");
            for side in Side::BOTH {
                layout.refresh_area(id, side);
            }
        }
        Some(branch)
    }

    /// Tries the next slot on `side` of tile `id`. The slot is consumed
    /// whether or not the space fits.
    ///
    /// ### Returns
    /// `true` if a space was placed.
    pub fn append_space(&self, layout: &mut Layout, id: TileId, side: Side) -> bool {
        let Some(tile) = layout.tile(id) else {
            return false;
        };
        let area = *tile.area(side);
        if !area.has_room() {
            return false;
        }
        let network = tile.network;
        let spec = self.spec(network);
        let index = area.next;
        let polygon = tile.slot(side, index, spec.space_width, spec.space_depth);
        let fits = layout.is_placement_valid(&polygon, &[]);

        let Some(tile) = layout.tile_mut(id) else {
            return false;
        };
        let area = tile.area_mut(side);
        area.next += 1;
        if !fits {
            return false;
        }
        area.count += 1;
        area.extent = area.extent.max(index + 1);
        layout.add_space(ParkingSpace {
            tile: id,
            side,
            index,
            network,
            polygon,
        });
        true
    }

    /// Spaces `side` of tile `id` could still hold: the ones already placed
    /// plus every untried slot that passes the placement gate right now.
    pub fn attainable(&self, layout: &Layout, id: TileId, side: Side) -> u32 {
        let Some(tile) = layout.tile(id) else {
            return 0;
        };
        let spec = self.spec(tile.network);
        let area = tile.area(side);
        let open = (area.next..area.max)
            .filter(|&index| {
                let polygon = tile.slot(side, index, spec.space_width, spec.space_depth);
                layout.is_placement_valid(&polygon, &[])
            })
            .count() as u32;
        area.count + open
    }

    /// Cuts tile `id` back to the furthest occupied slot on either side.
    ///
    /// ### Returns
    /// The new length, `0.0` if the tile carries no spaces or is gone.
    pub fn shrink(&self, layout: &mut Layout, id: TileId) -> f32 {
        let spec = match layout.tile(id) {
            Some(tile) => *self.spec(tile.network),
            None => return 0.0,
        };
        let Some(tile) = layout.tile_mut(id) else {
            return 0.0;
        };
        let extent = tile.left.extent.max(tile.right.extent);
        tile.length = tile.length.min(extent as f32 * spec.space_width);
        fit_areas(tile, &spec);
        tile.length
    }

    fn place(&self, layout: &mut Layout, mut tile: Tile, ignore: &[TileId]) -> Option<TileId> {
        if !layout.is_placement_valid(&tile.footprint(), ignore) {
            return None;
        }
        let spec = *self.spec(tile.network);
        fit_areas(&mut tile, &spec);
        layout.add_tile(tile).ok()
    }
}

/// Recomputes how many slots fit along the tile on each side.
fn fit_areas(tile: &mut Tile, spec: &TileSpec) {
    let slots = ((tile.length + SLOT_SLACK) / spec.space_width).floor() as u32;
    tile.left.fit(slots);
    tile.right.fit(slots);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use glam::Vec2;

    fn site(w: f32, h: f32) -> Layout {
        Layout::new(Polygon::rect(Vec2::ZERO, Vec2::new(w, h)), 1e-3).unwrap()
    }

    fn started(layout: &mut Layout, builder: &TileBuilder) -> TileId {
        let entrance = layout.add_entrance(Vec2::new(10.0, 0.0), Vec2::Y).unwrap();
        builder.begin_driveway(layout, entrance).unwrap()
    }

    #[test]
    fn begin_places_one_step_at_the_entrance() {
        let builder = TileBuilder::default();
        let mut layout = site(20.0, 30.0);
        let id = started(&mut layout, &builder);
        let tile = layout.tile(id).unwrap();
        assert_eq!(tile.origin, Vec2::new(10.0, 0.0));
        assert_eq!(tile.length, 2.5);
        assert_eq!(tile.left.max, 1);
        assert!(builder.begin_driveway(&mut layout, 7).is_none());
    }

    #[test]
    fn extend_grows_in_place_then_chains() {
        let builder = TileBuilder::default();
        let mut layout = site(20.0, 60.0);
        let id = started(&mut layout, &builder);
        for _ in 0..9 {
            assert_eq!(builder.extend(&mut layout, id), Some(id));
        }
        assert_eq!(layout.tile(id).unwrap().length, 25.0);
        assert_eq!(layout.tile(id).unwrap().right.max, 10);

        let next = builder.extend(&mut layout, id).unwrap();
        assert_ne!(next, id);
        let tile = layout.tile(next).unwrap();
        assert_eq!(tile.previous, Some(id));
        assert_eq!(tile.origin, Vec2::new(10.0, 25.0));
        assert_eq!(layout.tile(id).unwrap().forward, Some(next));
    }

    #[test]
    fn extend_is_blocked_by_the_site_edge() {
        let builder = TileBuilder::default();
        let mut layout = site(20.0, 5.0);
        let id = started(&mut layout, &builder);
        assert_eq!(builder.extend(&mut layout, id), Some(id));
        assert_eq!(builder.extend(&mut layout, id), None);
        assert_eq!(layout.tile(id).unwrap().length, 5.0);
    }

    #[test]
    fn append_skips_slots_that_do_not_fit() {
        let builder = TileBuilder::default();
        let mut layout = site(20.0, 30.0);
        layout.add_obstacle(Polygon::rect(Vec2::new(3.0, 0.0), Vec2::new(4.0, 1.0)));
        let id = started(&mut layout, &builder);
        builder.extend(&mut layout, id);

        assert!(!builder.append_space(&mut layout, id, Side::Left));
        assert!(builder.append_space(&mut layout, id, Side::Left));
        assert!(!builder.append_space(&mut layout, id, Side::Left));
        let left = layout.tile(id).unwrap().left;
        assert_eq!((left.count, left.next, left.extent), (1, 2, 2));
        assert_eq!(layout.space_count(Network::Driveway), 1);
    }

    #[test]
    fn shrink_cuts_back_to_the_occupied_extent() {
        let builder = TileBuilder::default();
        let mut layout = site(20.0, 30.0);
        let id = started(&mut layout, &builder);
        for _ in 0..3 {
            builder.extend(&mut layout, id);
        }
        builder.append_space(&mut layout, id, Side::Right);
        builder.append_space(&mut layout, id, Side::Right);
        assert_eq!(builder.shrink(&mut layout, id), 5.0);
        assert_eq!(layout.tile(id).unwrap().right.max, 2);

        let bare = builder.begin_driveway(&mut layout, 0);
        assert!(bare.is_none(), "entrance already covered by a tile");
    }

    #[test]
    fn turn_branches_from_the_side_edge_and_releases_covered_spaces() {
        let builder = TileBuilder::default();
        let mut layout = site(40.0, 40.0);
        let entrance = layout.add_entrance(Vec2::new(20.0, 0.0), Vec2::Y).unwrap();
        let id = builder.begin_driveway(&mut layout, entrance).unwrap();
        for _ in 0..3 {
            builder.extend(&mut layout, id);
        }
        for _ in 0..4 {
            builder.append_space(&mut layout, id, Side::Left);
        }
        assert_eq!(layout.tile(id).unwrap().left.count, 4);

        let branch = builder.turn(&mut layout, id, Side::Left).unwrap();

        let tile = layout.tile(branch).unwrap();
        assert_eq!(tile.origin, Vec2::new(17.0, 7.0));
        assert_eq!(tile.direction, Vec2::new(-1.0, 0.0));
        assert_eq!(tile.previous, Some(id));
        // Slots 1 to 3 reach into the branch footprint at y 4..10.
        let left = layout.tile(id).unwrap().left;
        assert_eq!((left.count, left.extent), (1, 1));
        assert_eq!(layout.space_count(Network::Driveway), 1);
        assert_eq!(layout.children(id).collect::<Vec<_>>(), [branch]);
    }

    #[test]
    fn bikeways_start_beside_the_car_spaces() {
        let builder = TileBuilder::default();
        let mut layout = site(20.0, 30.0);
        let id = started(&mut layout, &builder);
        let bikes = builder.begin_bikeway(&mut layout, id);
        assert_eq!(bikes.len(), 2);
        assert_eq!(layout.tile(bikes[0]).unwrap().origin, Vec2::new(1.0, 0.0));
        assert_eq!(layout.tile(bikes[1]).unwrap().origin, Vec2::new(19.0, 0.0));
        assert_eq!(layout.tile_count(Network::Bikeway), 2);
    }
}
