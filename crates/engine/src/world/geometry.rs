use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::config::{GridConfig, SurfaceSize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown direction '{0}' (expected up, down, left or right)")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

/// Half-open rectangle: `start` is inclusive, `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestrictionArea {
    pub start: Position,
    pub end: Position,
}

impl RestrictionArea {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.start.x
            && position.x < self.end.x
            && position.y >= self.start.y
            && position.y < self.end.y
    }

    /// Nearest position inside the area. An empty axis collapses onto `start`.
    pub fn clamp(&self, position: Position) -> Position {
        let last_x = self.end.x.saturating_sub(1).max(self.start.x);
        let last_y = self.end.y.saturating_sub(1).max(self.start.y);
        Position::new(
            position.x.clamp(self.start.x, last_x),
            position.y.clamp(self.start.y, last_y),
        )
    }
}

impl Default for RestrictionArea {
    fn default() -> Self {
        Self {
            start: Position::new(0, 0),
            end: Position::new(8, 8),
        }
    }
}

/// Tile dimensions in pixels plus the derived column/row counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridGeometry {
    pub tile_width: u32,
    pub tile_height: u32,
    pub columns: u32,
    pub rows: u32,
}

impl GridGeometry {
    /// Floor division of the surface by the tile size. A zero tile dimension
    /// yields an empty axis.
    pub fn derive(surface: SurfaceSize, grid: &GridConfig) -> Self {
        Self {
            tile_width: grid.tile_width,
            tile_height: grid.tile_height,
            columns: surface.width.checked_div(grid.tile_width).unwrap_or(0),
            rows: surface.height.checked_div(grid.tile_height).unwrap_or(0),
        }
    }

    pub fn tile_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    pub fn bounds(&self) -> RestrictionArea {
        RestrictionArea::new(
            Position::new(0, 0),
            Position::new(self.columns as i32, self.rows as i32),
        )
    }

    /// Pixel origin of the cell at `position`.
    pub fn cell_origin_px(&self, position: Position) -> (i32, i32) {
        (
            position.x.saturating_mul(self.tile_width as i32),
            position.y.saturating_mul(self.tile_height as i32),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn grid(tile_width: u32, tile_height: u32) -> GridConfig {
        GridConfig {
            tile_width,
            tile_height,
            background_color: Color::WHITE,
        }
    }

    #[test]
    fn geometry_uses_floor_division() {
        let geometry = GridGeometry::derive(
            SurfaceSize {
                width: 100,
                height: 70,
            },
            &grid(32, 32),
        );
        assert_eq!(geometry.columns, 3);
        assert_eq!(geometry.rows, 2);
        assert_eq!(geometry.tile_count(), 6);
    }

    #[test]
    fn zero_tile_size_produces_empty_grid() {
        let geometry = GridGeometry::derive(SurfaceSize::default(), &grid(0, 32));
        assert_eq!(geometry.columns, 0);
        assert_eq!(geometry.tile_count(), 0);
    }

    #[test]
    fn restriction_area_is_half_open() {
        let area = RestrictionArea::new(Position::new(0, 0), Position::new(2, 2));
        assert!(area.contains(Position::new(0, 0)));
        assert!(area.contains(Position::new(1, 1)));
        assert!(!area.contains(Position::new(2, 1)));
        assert!(!area.contains(Position::new(1, 2)));
        assert!(!area.contains(Position::new(-1, 0)));
    }

    #[test]
    fn cell_origin_scales_by_tile_size() {
        let geometry = GridGeometry::derive(SurfaceSize::default(), &grid(32, 16));
        assert_eq!(geometry.cell_origin_px(Position::new(3, 2)), (96, 32));
    }

    #[test]
    fn direction_round_trips_through_names() {
        for direction in Direction::ALL {
            assert_eq!(direction.as_str().parse::<Direction>(), Ok(direction));
        }
        assert!("north".parse::<Direction>().is_err());
    }
}
