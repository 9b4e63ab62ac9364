use std::time::Duration;

use serde::Deserialize;

use crate::color::Color;

pub const DEFAULT_SURFACE_WIDTH: u32 = 1024;
pub const DEFAULT_SURFACE_HEIGHT: u32 = 768;
pub const DEFAULT_TILE_SIZE: u32 = 32;
pub const DEFAULT_REFRESH_RATE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_SURFACE_WIDTH,
            height: DEFAULT_SURFACE_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    pub tile_width: u32,
    pub tile_height: u32,
    pub background_color: Color,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
            background_color: Color::WHITE,
        }
    }
}

/// Fully resolved engine configuration.
///
/// Defaults: 1024x768 surface, 32x32 tiles, white background, one update
/// every 100 ms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub surface_size: SurfaceSize,
    pub grid: GridConfig,
    pub refresh_rate: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            surface_size: SurfaceSize::default(),
            grid: GridConfig::default(),
            refresh_rate: DEFAULT_REFRESH_RATE,
        }
    }
}

impl EngineConfig {
    /// Applies every option that is present. Zero is a legitimate value and
    /// is applied like any other; no range validation is performed.
    pub fn with_options(mut self, options: &EngineOptions) -> Self {
        if let Some(surface) = &options.surface_size {
            if let Some(width) = surface.width {
                self.surface_size.width = width;
            }
            if let Some(height) = surface.height {
                self.surface_size.height = height;
            }
        }
        if let Some(grid) = &options.grid {
            if let Some(tile_width) = grid.tile_width {
                self.grid.tile_width = tile_width;
            }
            if let Some(tile_height) = grid.tile_height {
                self.grid.tile_height = tile_height;
            }
            if let Some(background_color) = grid.background_color {
                self.grid.background_color = background_color;
            }
        }
        if let Some(refresh_rate_ms) = options.refresh_rate_ms {
            self.refresh_rate = Duration::from_millis(refresh_rate_ms);
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SurfaceSizeOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub tile_width: Option<u32>,
    pub tile_height: Option<u32>,
    pub background_color: Option<Color>,
}

/// Partial configuration as read from a config file; every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub surface_size: Option<SurfaceSizeOptions>,
    pub grid: Option<GridOptions>,
    pub refresh_rate_ms: Option<u64>,
}
