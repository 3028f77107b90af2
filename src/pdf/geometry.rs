//! Fit-to-viewport scale calculation
//!
//! A page is scaled uniformly so it fits entirely inside the viewport on both
//! axes. The resulting pixel size doubles as the page cache key, so the
//! rounding applied here must stay the same everywhere.

use super::document::PageSize;

/// Drawable area of a display in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Pixel dimensions of a rendered page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Scale factor and resulting pixel size for one page in one viewport
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geometry {
    pub scale: f64,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    /// Zero-area result for degenerate inputs
    pub const EMPTY: Self = Self {
        scale: 0.0,
        width: 0,
        height: 0,
    };

    #[must_use]
    pub const fn pixel_size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Whether the renderer may be invoked for this geometry
    #[must_use]
    pub const fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Horizontal and vertical scale that maps the page exactly onto the
    /// pixel size. Differs from `scale` only by rounding.
    #[must_use]
    pub fn axis_scales(&self, page: PageSize) -> (f64, f64) {
        (
            f64::from(self.width) / page.width,
            f64::from(self.height) / page.height,
        )
    }
}

/// Compute the aspect-preserving fit of `page` into `viewport`.
///
/// Pixel dimensions are rounded to nearest and never exceed the viewport.
/// Any non-positive or non-finite input yields [`Geometry::EMPTY`].
#[must_use]
pub fn compute_geometry(page: PageSize, viewport: Viewport) -> Geometry {
    let valid_page = page.width.is_finite()
        && page.height.is_finite()
        && page.width > 0.0
        && page.height > 0.0;
    if !valid_page || viewport.is_empty() {
        return Geometry::EMPTY;
    }

    let view_width = f64::from(viewport.width);
    let view_height = f64::from(viewport.height);

    let scale = (view_width / page.width).min(view_height / page.height);

    let width = fit_axis(page.width * scale, viewport.width);
    let height = fit_axis(page.height * scale, viewport.height);

    if width == 0 || height == 0 {
        return Geometry::EMPTY;
    }

    Geometry {
        scale,
        width,
        height,
    }
}

fn fit_axis(scaled: f64, limit: u32) -> u32 {
    let rounded = scaled.round();
    if rounded <= 0.0 {
        0
    } else {
        (rounded as u32).min(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_page_in_4_3_viewport() {
        let geometry = compute_geometry(PageSize::LETTER, Viewport::new(800, 600));

        assert!((geometry.scale - 600.0 / 792.0).abs() < 1e-12);
        assert_eq!(geometry.pixel_size(), PixelSize::new(464, 600));
    }

    #[test]
    fn wide_page_is_limited_by_width() {
        let geometry = compute_geometry(PageSize::new(1600.0, 900.0), Viewport::new(800, 800));

        assert_eq!(geometry.scale, 0.5);
        assert_eq!(geometry.pixel_size(), PixelSize::new(800, 450));
    }

    #[test]
    fn degenerate_inputs_are_not_drawable() {
        let cases = [
            (PageSize::LETTER, Viewport::new(0, 600)),
            (PageSize::LETTER, Viewport::new(800, 0)),
            (PageSize::new(0.0, 792.0), Viewport::new(800, 600)),
            (PageSize::new(612.0, -1.0), Viewport::new(800, 600)),
            (PageSize::new(f64::NAN, 792.0), Viewport::new(800, 600)),
        ];

        for (page, viewport) in cases {
            let geometry = compute_geometry(page, viewport);
            assert_eq!(geometry, Geometry::EMPTY, "{page:?} in {viewport:?}");
            assert!(!geometry.is_drawable());
        }
    }

    #[test]
    fn extreme_aspect_collapses_to_empty() {
        // 1 px tall viewport cannot hold any width of a very tall page
        let geometry = compute_geometry(PageSize::new(1.0, 10_000.0), Viewport::new(1, 1));
        assert!(!geometry.is_drawable());
    }

    #[test]
    fn fit_never_overflows_and_is_tight_on_limiting_axis() {
        let pages = [
            PageSize::LETTER,
            PageSize::new(842.0, 595.0),
            PageSize::new(960.0, 540.0),
            PageSize::new(100.3, 77.7),
        ];
        let viewports = [
            Viewport::new(800, 600),
            Viewport::new(1920, 1080),
            Viewport::new(333, 1001),
            Viewport::new(1, 1),
            Viewport::new(7, 3000),
        ];

        for page in pages {
            for viewport in viewports {
                let geometry = compute_geometry(page, viewport);
                let expected =
                    (f64::from(viewport.width) / page.width).min(f64::from(viewport.height) / page.height);

                assert_eq!(geometry.scale, expected);
                assert!(geometry.width <= viewport.width);
                assert!(geometry.height <= viewport.height);
                assert!(
                    geometry.width == viewport.width || geometry.height == viewport.height,
                    "{page:?} in {viewport:?} gave {geometry:?}"
                );
            }
        }
    }
}
