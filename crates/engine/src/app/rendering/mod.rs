mod pixels_surface;
mod raster;
mod surface;

pub use pixels_surface::PixelsSurface;
pub use surface::{DrawCommand, ImageLoadRequest, RecordingSurface, RenderSurface};
