use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::color::Color;
use crate::config::SurfaceSize;
use crate::world::{DisplaySize, ImageHandle};

use super::raster::{blit_scaled, fill_rect_rgba, DecodedImage, PixelRect};
use super::surface::RenderSurface;

/// Window-backed surface: a `pixels` frame buffer of the engine's surface
/// size, scaled onto the window.
pub struct PixelsSurface {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    buffer_size: SurfaceSize,
    images: HashMap<ImageHandle, Option<DecodedImage>>,
    warned_images: HashSet<ImageHandle>,
}

impl PixelsSurface {
    pub fn new(window: Arc<Window>, buffer_size: SurfaceSize) -> Result<Self, Error> {
        let window_size = window.inner_size();
        let pixels = Self::build_pixels(
            Arc::clone(&window),
            window_size.width,
            window_size.height,
            buffer_size,
        )?;
        Ok(Self {
            window,
            pixels,
            buffer_size,
            images: HashMap::new(),
            warned_images: HashSet::new(),
        })
    }

    /// Rebuilds the swap chain for a new window size. Zero sizes (minimized
    /// windows) are ignored.
    pub fn resize_window(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels =
            Self::build_pixels(Arc::clone(&self.window), width, height, self.buffer_size)?;
        Ok(())
    }

    pub fn present(&mut self) -> Result<(), Error> {
        self.pixels.render()
    }

    fn build_pixels(
        window: Arc<Window>,
        window_width: u32,
        window_height: u32,
        buffer_size: SurfaceSize,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(window_width, window_height, window);
        Pixels::new(buffer_size.width, buffer_size.height, surface)
    }

    fn warn_image_once(&mut self, handle: ImageHandle, source: Option<&Path>, reason: &str) {
        if !self.warned_images.insert(handle) {
            return;
        }
        let source = source
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<unregistered>".to_string());
        warn!(
            handle = handle.0,
            source = %source,
            reason,
            "surface_image_unavailable"
        );
    }
}

impl RenderSurface for PixelsSurface {
    fn resize(&mut self, size: SurfaceSize) {
        if size == self.buffer_size || size.width == 0 || size.height == 0 {
            return;
        }
        match self.pixels.resize_buffer(size.width, size.height) {
            Ok(()) => self.buffer_size = size,
            Err(error) => warn!(
                width = size.width,
                height = size.height,
                error = %error,
                "surface_buffer_resize_failed"
            ),
        }
    }

    fn clear_region(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        let SurfaceSize {
            width: frame_width,
            height: frame_height,
        } = self.buffer_size;
        fill_rect_rgba(
            self.pixels.frame_mut(),
            frame_width,
            frame_height,
            PixelRect::new(x, y, width, height),
            color.to_rgba_bytes(),
        );
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        let SurfaceSize {
            width: frame_width,
            height: frame_height,
        } = self.buffer_size;
        fill_rect_rgba(
            self.pixels.frame_mut(),
            frame_width,
            frame_height,
            PixelRect::new(x, y, width, height),
            color.to_rgba_bytes(),
        );
    }

    fn draw_image(&mut self, handle: ImageHandle, x: i32, y: i32, width: u32, height: u32) {
        let SurfaceSize {
            width: frame_width,
            height: frame_height,
        } = self.buffer_size;
        match self.images.get(&handle) {
            Some(Some(image)) => blit_scaled(
                self.pixels.frame_mut(),
                frame_width,
                frame_height,
                PixelRect::new(x, y, width, height),
                image,
            ),
            // Decode failure was already reported.
            Some(None) => {}
            None => self.warn_image_once(handle, None, "unknown_handle"),
        }
    }

    fn load_image(&mut self, handle: ImageHandle, source: &Path, size: DisplaySize) {
        match decode_image(source, size) {
            Ok(image) => {
                self.images.insert(handle, Some(image));
            }
            Err(reason) => {
                self.images.insert(handle, None);
                self.warn_image_once(handle, Some(source), &reason);
            }
        }
    }
}

fn decode_image(source: &Path, size: DisplaySize) -> Result<DecodedImage, String> {
    if size.width == 0 || size.height == 0 {
        return Err("zero_display_size".to_string());
    }
    let reader = ImageReader::open(source).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?
        .to_rgba8();
    let resized = if decoded.dimensions() == (size.width, size.height) {
        decoded
    } else {
        imageops::resize(&decoded, size.width, size.height, FilterType::Nearest)
    };
    Ok(DecodedImage {
        width: resized.width(),
        height: resized.height(),
        rgba: resized.into_raw(),
    })
}
