use std::path::PathBuf;

/// Opaque reference to an image the rendering surface was asked to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u64);

#[derive(Debug, Default)]
pub(crate) struct ImageHandleAllocator {
    next: u64,
}

impl ImageHandleAllocator {
    pub(crate) fn allocate(&mut self) -> ImageHandle {
        let handle = ImageHandle(self.next);
        self.next = self.next.saturating_add(1);
        handle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub key: String,
    pub source: PathBuf,
    pub handle: ImageHandle,
    pub size: DisplaySize,
}

/// Registration request; unset dimensions default to the tile size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub key: String,
    pub source: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageRequest {
    pub fn new(key: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
            width: None,
            height: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub(crate) fn display_size(&self, fallback: DisplaySize) -> DisplaySize {
        DisplaySize {
            width: self.width.unwrap_or(fallback.width),
            height: self.height.unwrap_or(fallback.height),
        }
    }
}
