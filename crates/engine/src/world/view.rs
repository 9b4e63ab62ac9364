use super::entity::Entity;
use super::geometry::{GridGeometry, Position};
use super::grid::{tile_index, Tile};
use super::image::ImageAsset;

/// Read-only snapshot of engine state handed to listeners and move
/// authorizers.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineView<'a> {
    entities: &'a [Entity],
    tiles: &'a [Tile],
    images: &'a [ImageAsset],
    geometry: GridGeometry,
    paused: bool,
    initialized: bool,
}

impl<'a> EngineView<'a> {
    pub(crate) fn new(
        entities: &'a [Entity],
        tiles: &'a [Tile],
        images: &'a [ImageAsset],
        geometry: GridGeometry,
        paused: bool,
        initialized: bool,
    ) -> Self {
        Self {
            entities,
            tiles,
            images,
            geometry,
            paused,
            initialized,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_entities(entities: &'a [Entity]) -> Self {
        Self {
            entities,
            ..Self::default()
        }
    }

    pub fn entities(&self) -> &'a [Entity] {
        self.entities
    }

    pub fn tiles(&self) -> &'a [Tile] {
        self.tiles
    }

    pub fn images(&self) -> &'a [ImageAsset] {
        self.images
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// First entity with `key`, in collection order.
    pub fn entity(&self, key: &str) -> Option<&'a Entity> {
        self.entities.iter().find(|entity| entity.key() == key)
    }

    pub fn entities_at(&self, position: Position) -> impl Iterator<Item = &'a Entity> {
        self.entities
            .iter()
            .filter(move |entity| entity.is_at(position))
    }

    pub fn tile_at(&self, position: Position) -> Option<&'a Tile> {
        tile_index(self.geometry, self.tiles, position).map(|index| &self.tiles[index])
    }

    pub fn image(&self, key: &str) -> Option<&'a ImageAsset> {
        self.images.iter().find(|image| image.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{EntitySpawn, TileGrid};

    fn geometry(columns: u32, rows: u32) -> GridGeometry {
        GridGeometry {
            tile_width: 1,
            tile_height: 1,
            columns,
            rows,
        }
    }

    #[test]
    fn tile_lookup_matches_grid_order() {
        let geometry = geometry(3, 2);
        let tiles = TileGrid::cell_positions(geometry)
            .map(Tile::new)
            .collect::<Vec<_>>();
        let view = EngineView::new(&[], &tiles, &[], geometry, false, true);

        assert_eq!(
            view.tile_at(Position::new(2, 1)).map(Tile::position),
            Some(Position::new(2, 1))
        );
        assert!(view.tile_at(Position::new(3, 0)).is_none());
        assert!(view.tile_at(Position::new(0, -1)).is_none());

        let partial = EngineView::new(&[], &tiles[..2], &[], geometry, false, false);
        assert!(partial.tile_at(Position::new(0, 1)).is_some());
        assert!(partial.tile_at(Position::new(1, 0)).is_none());
    }

    #[test]
    fn entities_at_yields_every_occupant_in_order() {
        let entities = vec![
            Entity::new(EntitySpawn::new("a").at(1, 1)),
            Entity::new(EntitySpawn::new("b").at(0, 1)),
            Entity::new(EntitySpawn::new("c").at(1, 1)),
        ];
        let view = EngineView::from_entities(&entities);
        let keys = view
            .entities_at(Position::new(1, 1))
            .map(Entity::key)
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["a", "c"]);
        assert_eq!(view.entities_at(Position::new(5, 5)).count(), 0);
    }
}
