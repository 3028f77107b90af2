//! Document abstraction shared by every display

use std::path::PathBuf;
use std::sync::Arc;

use image::{Rgb, RgbImage};

use super::geometry::{Geometry, PixelSize};

/// Intrinsic page size in document units (points for PDF)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// US Letter portrait, the size most slide exporters default to
    pub const LETTER: Self = Self::new(612.0, 792.0);
}

/// Rasterized page at one specific pixel size.
///
/// Pixel data is packed RGB (3 bytes per pixel), the same layout the
/// rasterizer hands back, so a surface can be moved between threads and
/// shared behind an `Arc` without copying.
#[derive(Clone)]
pub struct Surface {
    image: RgbImage,
}

impl Surface {
    #[must_use]
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Surface of the given size filled with a single colour
    #[must_use]
    pub fn filled(size: PixelSize, rgb: [u8; 3]) -> Self {
        Self::new(RgbImage::from_pixel(size.width, size.height, Rgb(rgb)))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[must_use]
    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.width(), self.height())
    }

    #[must_use]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Pixel at `(x, y)` as `0x00RRGGBB`
    #[must_use]
    pub fn xrgb_at(&self, x: u32, y: u32) -> u32 {
        let Rgb([r, g, b]) = *self.image.get_pixel(x, y);
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

/// Errors raised while opening a document. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to parse {}: {detail}", .path.display())]
    Parse { path: PathBuf, detail: String },

    #[error("document has no pages: {}", .0.display())]
    Empty(PathBuf),
}

/// Errors raised while producing a page surface. Recoverable: the host keeps
/// its last good frame and tries again on the next redraw or resize.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("page {page} is outside the document (page count {page_count})")]
    InvalidPage { page: usize, page_count: usize },

    #[error("geometry {width}x{height} has no drawable area")]
    DegenerateGeometry { width: u32, height: u32 },

    #[error("failed to render page {page}: {detail}")]
    Backend { page: usize, detail: String },
}

impl RenderError {
    pub fn backend(page: usize, detail: impl Into<String>) -> Self {
        Self::Backend {
            page,
            detail: detail.into(),
        }
    }
}

/// Read-only view of a loaded document.
///
/// Implementations behave as pure functions of their inputs: the engine does
/// all caching, so `render_page` must not keep rendered pages around.
pub trait Document {
    /// Number of pages, always at least one for an opened document
    fn page_count(&self) -> usize;

    /// Intrinsic size of `page`. `page` is always below `page_count()`.
    fn page_size(&self, page: usize) -> PageSize;

    /// Rasterize `page` into a surface of exactly `geometry.pixel_size()`
    fn render_page(&self, page: usize, geometry: &Geometry) -> Result<Surface, RenderError>;

    /// Human readable title, used for window titles
    fn title(&self) -> Option<String> {
        None
    }
}

/// Opens a fresh document instance. Render workers each open their own,
/// since rasterizer handles are generally not `Send`.
pub type DocumentOpener =
    Arc<dyn Fn() -> Result<Box<dyn Document>, DocumentError> + Send + Sync>;
