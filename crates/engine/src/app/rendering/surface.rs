use std::path::{Path, PathBuf};

use crate::color::Color;
use crate::config::SurfaceSize;
use crate::world::{DisplaySize, ImageHandle};

/// Drawing primitives the engine renders through. Coordinates are pixels
/// relative to the surface's top-left corner.
pub trait RenderSurface {
    fn resize(&mut self, size: SurfaceSize);
    fn clear_region(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color);
    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color);
    fn draw_image(&mut self, handle: ImageHandle, x: i32, y: i32, width: u32, height: u32);
    /// Requests a decode; completion is not reported back to the engine.
    fn load_image(&mut self, handle: ImageHandle, source: &Path, size: DisplaySize);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    Clear {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: Color,
    },
    FillRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: Color,
    },
    DrawImage {
        handle: ImageHandle,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLoadRequest {
    pub handle: ImageHandle,
    pub source: PathBuf,
    pub size: DisplaySize,
}

/// Headless surface that keeps every call for inspection.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    size: Option<SurfaceSize>,
    commands: Vec<DrawCommand>,
    image_requests: Vec<ImageLoadRequest>,
}

impl RecordingSurface {
    pub fn size(&self) -> Option<SurfaceSize> {
        self.size
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn image_requests(&self) -> &[ImageLoadRequest] {
        &self.image_requests
    }
}

impl RenderSurface for RecordingSurface {
    fn resize(&mut self, size: SurfaceSize) {
        self.size = Some(size);
    }

    fn clear_region(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        self.commands.push(DrawCommand::Clear {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        self.commands.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn draw_image(&mut self, handle: ImageHandle, x: i32, y: i32, width: u32, height: u32) {
        self.commands.push(DrawCommand::DrawImage {
            handle,
            x,
            y,
            width,
            height,
        });
    }

    fn load_image(&mut self, handle: ImageHandle, source: &Path, size: DisplaySize) {
        self.image_requests.push(ImageLoadRequest {
            handle,
            source: source.to_path_buf(),
            size,
        });
    }
}
