//! MuPDF-backed document

use std::path::Path;
use std::sync::Arc;

use image::{Rgb, RgbImage};
use log::{debug, info};
use mupdf::{Colorspace, Matrix, Pixmap};

use super::document::{Document, DocumentError, DocumentOpener, PageSize, RenderError, Surface};
use super::geometry::Geometry;

/// Paper colour used where the rasterizer output falls short of the target size
const PAPER: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);

/// PDF document opened through MuPDF.
///
/// Page sizes are read once at open time; rendering loads the page on demand.
pub struct MupdfDocument {
    doc: mupdf::Document,
    sizes: Vec<PageSize>,
    title: Option<String>,
}

impl MupdfDocument {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        if !path.is_file() {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }

        let parse_error = |e: mupdf::error::Error| DocumentError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        };

        let doc = mupdf::Document::open(path.to_string_lossy().as_ref()).map_err(parse_error)?;
        let page_count = doc.page_count().map_err(parse_error)?.max(0) as usize;
        if page_count == 0 {
            return Err(DocumentError::Empty(path.to_path_buf()));
        }

        let mut sizes = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let page = doc.load_page(index as i32).map_err(parse_error)?;
            let bounds = page.bounds().map_err(parse_error)?;
            sizes.push(PageSize::new(
                f64::from(bounds.x1 - bounds.x0),
                f64::from(bounds.y1 - bounds.y0),
            ));
        }

        let title = doc
            .metadata(mupdf::MetadataName::Title)
            .ok()
            .filter(|t| !t.trim().is_empty());

        info!("opened {} ({page_count} pages)", path.display());

        Ok(Self {
            doc,
            sizes,
            title,
        })
    }

    /// Opener for render workers; each call opens an independent instance
    pub fn opener(path: &Path) -> DocumentOpener {
        let path = path.to_path_buf();
        Arc::new(move || Ok(Box::new(Self::open(&path)?) as Box<dyn Document>))
    }
}

impl Document for MupdfDocument {
    fn page_count(&self) -> usize {
        self.sizes.len()
    }

    fn page_size(&self, page: usize) -> PageSize {
        self.sizes[page]
    }

    fn render_page(&self, page: usize, geometry: &Geometry) -> Result<Surface, RenderError> {
        let fail = |e: mupdf::error::Error| RenderError::backend(page, e.to_string());

        let (scale_x, scale_y) = geometry.axis_scales(self.sizes[page]);
        let transform = Matrix::new_scale(scale_x as f32, scale_y as f32);

        let loaded = self.doc.load_page(page as i32).map_err(fail)?;
        let rgb = Colorspace::device_rgb();
        let pixmap = loaded.to_pixmap(&transform, &rgb, false, false).map_err(fail)?;

        let image = pixmap_to_image(&pixmap, geometry)
            .ok_or_else(|| RenderError::backend(page, "pixmap buffer size mismatch"))?;
        debug!(
            "rasterized page {page}: {}x{} -> {}x{}",
            pixmap.width(),
            pixmap.height(),
            geometry.width,
            geometry.height
        );

        Ok(Surface::new(image))
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }
}

/// Copy the pixmap into an image of exactly the geometry's pixel size.
///
/// MuPDF rounds the transformed page bounds itself, so the pixmap can be a
/// pixel off in either direction; the excess is cropped and any shortfall is
/// left as paper.
fn pixmap_to_image(pixmap: &Pixmap, geometry: &Geometry) -> Option<RgbImage> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return None;
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    if samples.len() < stride.saturating_mul(height) || width * n > stride {
        return None;
    }

    let mut image = RgbImage::from_pixel(geometry.width, geometry.height, PAPER);
    let copy_width = width.min(geometry.width as usize);
    let copy_height = height.min(geometry.height as usize);

    for y in 0..copy_height {
        let row = &samples[y * stride..y * stride + width * n];
        for x in 0..copy_width {
            let px = &row[x * n..x * n + 3];
            image.put_pixel(x as u32, y as u32, Rgb([px[0], px[1], px[2]]));
        }
    }

    Some(image)
}
