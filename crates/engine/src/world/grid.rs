use serde_json::{Map, Value};

use crate::color::Color;

use super::geometry::{GridGeometry, Position};

pub type TileData = Map<String, Value>;

pub const DEFAULT_TILE_COLOR: Color = Color::WHITE;

/// One grid cell. The position is fixed at construction; color and data are
/// mutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    position: Position,
    pub color: Color,
    pub data: TileData,
}

impl Tile {
    pub(crate) fn new(position: Position) -> Self {
        Self {
            position,
            color: DEFAULT_TILE_COLOR,
            data: TileData::new(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }
}

/// Fields left as `None` are not touched. `data` replaces the whole map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilePatch {
    pub color: Option<Color>,
    pub data: Option<TileData>,
}

impl TilePatch {
    pub fn color(color: Color) -> Self {
        Self {
            color: Some(color),
            data: None,
        }
    }

    pub fn data(data: TileData) -> Self {
        Self {
            color: None,
            data: Some(data),
        }
    }

    pub(crate) fn apply(self, tile: &mut Tile) {
        if let Some(color) = self.color {
            tile.color = color;
        }
        if let Some(data) = self.data {
            tile.data = data;
        }
    }
}

/// Tiles in creation order: `x` outer, `y` inner.
#[derive(Debug, Default)]
pub struct TileGrid {
    geometry: GridGeometry,
    tiles: Vec<Tile>,
}

impl TileGrid {
    pub(crate) fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            tiles: Vec::with_capacity(geometry.tile_count()),
        }
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.tiles.len() == self.geometry.tile_count()
    }

    /// Cell positions in creation order.
    pub(crate) fn cell_positions(geometry: GridGeometry) -> impl Iterator<Item = Position> {
        (0..geometry.columns as i32)
            .flat_map(move |x| (0..geometry.rows as i32).map(move |y| Position::new(x, y)))
    }

    pub(crate) fn push(&mut self, tile: Tile) {
        self.tiles.push(tile);
    }

    pub fn index_of(&self, position: Position) -> Option<usize> {
        tile_index(self.geometry, &self.tiles, position)
    }

    pub fn tile_at(&self, position: Position) -> Option<&Tile> {
        self.index_of(position).map(|index| &self.tiles[index])
    }

    pub(crate) fn tile_at_mut(&mut self, position: Position) -> Option<&mut Tile> {
        self.index_of(position).map(|index| &mut self.tiles[index])
    }
}

/// Index of the tile at `position` in an x-major tile slice, which may still
/// be filling up during grid creation.
pub(crate) fn tile_index(
    geometry: GridGeometry,
    tiles: &[Tile],
    position: Position,
) -> Option<usize> {
    if position.x < 0
        || position.y < 0
        || position.x >= geometry.columns as i32
        || position.y >= geometry.rows as i32
    {
        return None;
    }
    let index = position.x as usize * geometry.rows as usize + position.y as usize;
    tiles
        .get(index)
        .filter(|tile| tile.position == position)
        .map(|_| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filled_grid(columns: u32, rows: u32) -> TileGrid {
        let geometry = GridGeometry {
            tile_width: 1,
            tile_height: 1,
            columns,
            rows,
        };
        let mut grid = TileGrid::new(geometry);
        for position in TileGrid::cell_positions(geometry) {
            grid.push(Tile::new(position));
        }
        grid
    }

    #[test]
    fn cell_positions_are_x_major() {
        let geometry = GridGeometry {
            tile_width: 1,
            tile_height: 1,
            columns: 2,
            rows: 3,
        };
        let positions = TileGrid::cell_positions(geometry).collect::<Vec<_>>();
        assert_eq!(
            positions,
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(0, 2),
                Position::new(1, 0),
                Position::new(1, 1),
                Position::new(1, 2),
            ]
        );
    }

    #[test]
    fn lookup_matches_exact_position_and_rejects_out_of_bounds() {
        let grid = filled_grid(4, 3);
        assert!(grid.is_complete());
        assert_eq!(
            grid.tile_at(Position::new(3, 2)).map(Tile::position),
            Some(Position::new(3, 2))
        );
        assert!(grid.tile_at(Position::new(4, 0)).is_none());
        assert!(grid.tile_at(Position::new(0, -1)).is_none());
    }

    #[test]
    fn lookup_on_partially_built_grid_misses_unbuilt_cells() {
        let geometry = GridGeometry {
            tile_width: 1,
            tile_height: 1,
            columns: 2,
            rows: 2,
        };
        let mut grid = TileGrid::new(geometry);
        grid.push(Tile::new(Position::new(0, 0)));
        assert!(grid.tile_at(Position::new(0, 0)).is_some());
        assert!(grid.tile_at(Position::new(1, 1)).is_none());
    }

    #[test]
    fn patch_replaces_only_present_fields() {
        let mut tile = Tile::new(Position::new(0, 0));
        let mut data = TileData::new();
        data.insert("kind".to_string(), json!("water"));
        TilePatch::data(data.clone()).apply(&mut tile);

        TilePatch::color(Color::BLACK).apply(&mut tile);
        assert_eq!(tile.color, Color::BLACK);
        assert_eq!(tile.data, data);

        TilePatch::data(TileData::new()).apply(&mut tile);
        assert!(tile.data.is_empty());
        assert_eq!(tile.color, Color::BLACK);
    }
}
