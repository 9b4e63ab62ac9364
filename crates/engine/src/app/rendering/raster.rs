//! Software rasterization into an RGBA8 frame buffer.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PixelRect {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl PixelRect {
    pub(crate) fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersection with a `frame_width` x `frame_height` frame as
    /// `(left, top, right, bottom)`, right/bottom exclusive.
    fn clip(&self, frame_width: u32, frame_height: u32) -> Option<(i32, i32, i32, i32)> {
        let right = self.x.saturating_add(self.width.min(i32::MAX as u32) as i32);
        let bottom = self.y.saturating_add(self.height.min(i32::MAX as u32) as i32);
        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = right.min(frame_width.min(i32::MAX as u32) as i32);
        let bottom = bottom.min(frame_height.min(i32::MAX as u32) as i32);
        if left >= right || top >= bottom {
            return None;
        }
        Some((left, top, right, bottom))
    }
}

/// Decoded image already resized to its display size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecodedImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba: Vec<u8>,
}

pub(crate) fn fill_rect_rgba(
    frame: &mut [u8],
    frame_width: u32,
    frame_height: u32,
    rect: PixelRect,
    color: [u8; 4],
) {
    if frame.len() < frame_width as usize * frame_height as usize * 4 {
        return;
    }
    let Some((left, top, right, bottom)) = rect.clip(frame_width, frame_height) else {
        return;
    };
    let stride = frame_width as usize * 4;
    for y in top..bottom {
        let row_start = y as usize * stride;
        let row = &mut frame[row_start + left as usize * 4..row_start + right as usize * 4];
        for pixel in row.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }
}

/// Nearest-neighbour blit of `image` stretched over `rect`. Fully
/// transparent source pixels are skipped.
pub(crate) fn blit_scaled(
    frame: &mut [u8],
    frame_width: u32,
    frame_height: u32,
    rect: PixelRect,
    image: &DecodedImage,
) {
    if image.width == 0 || image.height == 0 || rect.width == 0 || rect.height == 0 {
        return;
    }
    if image.rgba.len() < image.width as usize * image.height as usize * 4
        || frame.len() < frame_width as usize * frame_height as usize * 4
    {
        return;
    }
    let Some((left, top, right, bottom)) = rect.clip(frame_width, frame_height) else {
        return;
    };

    let stride = frame_width as usize * 4;
    let source_stride = image.width as usize * 4;
    for out_y in top..bottom {
        let dy = (out_y - rect.y) as u64;
        let src_y = (dy * image.height as u64 / rect.height as u64).min(image.height as u64 - 1);
        let src_row = src_y as usize * source_stride;
        let dst_row = out_y as usize * stride;

        for out_x in left..right {
            let dx = (out_x - rect.x) as u64;
            let src_x = (dx * image.width as u64 / rect.width as u64).min(image.width as u64 - 1);
            let src = src_row + src_x as usize * 4;
            if image.rgba[src + 3] == 0 {
                continue;
            }
            let dst = dst_row + out_x as usize * 4;
            frame[dst..dst + 4].copy_from_slice(&image.rgba[src..src + 4]);
        }
    }
}
