//! Single-geometry page cache for rendered surfaces

use std::sync::Arc;

use log::debug;

use super::document::{Document, RenderError, Surface};
use super::geometry::{Geometry, PixelSize};

/// One slot per document page, all rendered at the same pixel size.
///
/// The cache only ever holds surfaces for a single geometry. Rendering a
/// surface at a different pixel size clears every other slot, so a resize
/// discards the whole cache instead of rescaling entries.
pub struct PageCache {
    slots: Vec<Option<Arc<Surface>>>,
    geometry: Option<PixelSize>,
}

impl PageCache {
    /// Create an empty cache for a document with `page_count` pages
    #[must_use]
    pub fn new(page_count: usize) -> Self {
        Self {
            slots: vec![None; page_count],
            geometry: None,
        }
    }

    /// Return the surface for `page` at `geometry`, rendering it on a miss.
    ///
    /// A geometry whose pixel size differs from the cached one invalidates
    /// everything once the new page has rendered; a failed render leaves the
    /// cache as it was. Invalid pages and non-drawable geometry
    /// are rejected without touching `document`.
    pub fn get_surface(
        &mut self,
        page: usize,
        geometry: &Geometry,
        document: &dyn Document,
    ) -> Result<Arc<Surface>, RenderError> {
        self.check_page(page)?;
        if !geometry.is_drawable() {
            return Err(RenderError::DegenerateGeometry {
                width: geometry.width,
                height: geometry.height,
            });
        }

        let size = geometry.pixel_size();
        if let Some(surface) = self.lookup(page, size) {
            debug!("cache hit: page {page} at {}x{}", size.width, size.height);
            return Ok(surface);
        }

        debug!("cache miss: rendering page {page} at {}x{}", size.width, size.height);
        let surface = Arc::new(document.render_page(page, geometry)?);

        // Only a successful render may move the cache to a new geometry
        self.sync_geometry(size);
        self.slots[page] = Some(Arc::clone(&surface));
        Ok(surface)
    }

    /// Cached surface for `page` at `size`, without rendering
    #[must_use]
    pub fn lookup(&self, page: usize, size: PixelSize) -> Option<Arc<Surface>> {
        if self.geometry != Some(size) {
            return None;
        }
        self.slots.get(page).and_then(Clone::clone)
    }

    /// Check if `page` is cached at `size`
    #[must_use]
    pub fn contains(&self, page: usize, size: PixelSize) -> bool {
        self.lookup(page, size).is_some()
    }

    /// Store a surface rendered elsewhere.
    ///
    /// Returns `false` and drops the surface when `size` is not the cache's
    /// current geometry: a result rendered for a stale geometry must never
    /// land in the cache. An empty cache adopts `size`. Existing entries are
    /// kept.
    pub fn store(&mut self, page: usize, size: PixelSize, surface: Arc<Surface>) -> bool {
        if page >= self.slots.len() || surface.size() != size {
            return false;
        }
        match self.geometry {
            Some(current) if current != size => return false,
            Some(_) => {}
            None => self.geometry = Some(size),
        }

        let slot = &mut self.slots[page];
        if slot.is_none() {
            *slot = Some(surface);
        }
        true
    }

    /// Clear every stored surface and forget the cached geometry
    pub fn invalidate_all(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.geometry = None;
    }

    /// Pixel size the current entries were rendered at
    #[must_use]
    pub fn geometry(&self) -> Option<PixelSize> {
        self.geometry
    }

    /// Make `size` the current geometry, clearing entries of any other size
    pub fn sync_geometry(&mut self, size: PixelSize) {
        if self.geometry != Some(size) {
            if self.geometry.is_some() {
                debug!(
                    "geometry changed to {}x{}, invalidating {} cached pages",
                    size.width,
                    size.height,
                    self.len()
                );
            }
            self.invalidate_all();
            self.geometry = Some(size);
        }
    }

    /// Number of cached pages
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Check if cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots, equal to the document's page count
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn check_page(&self, page: usize) -> Result<(), RenderError> {
        if page < self.slots.len() {
            Ok(())
        } else {
            Err(RenderError::InvalidPage {
                page,
                page_count: self.slots.len(),
            })
        }
    }
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("slots", &self.slots.len())
            .field("cached", &self.len())
            .field("geometry", &self.geometry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::super::document::PageSize;
    use super::super::geometry::{Viewport, compute_geometry};
    use super::*;

    struct CountingDocument {
        pages: usize,
        renders: Cell<usize>,
        failing: RefCell<Vec<usize>>,
    }

    impl CountingDocument {
        fn new(pages: usize) -> Self {
            Self {
                pages,
                renders: Cell::new(0),
                failing: RefCell::new(Vec::new()),
            }
        }
    }

    impl Document for CountingDocument {
        fn page_count(&self) -> usize {
            self.pages
        }

        fn page_size(&self, _page: usize) -> PageSize {
            PageSize::LETTER
        }

        fn render_page(&self, page: usize, geometry: &Geometry) -> Result<Surface, RenderError> {
            self.renders.set(self.renders.get() + 1);
            if self.failing.borrow().contains(&page) {
                return Err(RenderError::backend(page, "injected"));
            }
            Ok(Surface::filled(geometry.pixel_size(), [255, 255, 255]))
        }
    }

    fn geometry(width: u32, height: u32) -> Geometry {
        compute_geometry(PageSize::LETTER, Viewport::new(width, height))
    }

    #[test]
    fn repeated_request_renders_once() {
        let doc = CountingDocument::new(5);
        let mut cache = PageCache::new(doc.page_count());
        let g = geometry(800, 600);

        let first = cache.get_surface(2, &g, &doc).unwrap();
        let second = cache.get_surface(2, &g, &doc).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(doc.renders.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn geometry_change_forces_rerender_without_resurrecting_entries() {
        let doc = CountingDocument::new(5);
        let mut cache = PageCache::new(doc.page_count());
        let g1 = geometry(800, 600);
        let g2 = geometry(1024, 768);
        assert_ne!(g1.pixel_size(), g2.pixel_size());

        cache.get_surface(0, &g1, &doc).unwrap();
        cache.get_surface(1, &g1, &doc).unwrap();
        let resized = cache.get_surface(0, &g2, &doc).unwrap();
        assert_eq!(resized.size(), g2.pixel_size());
        assert_eq!(cache.len(), 1);

        let back = cache.get_surface(0, &g1, &doc).unwrap();
        assert_eq!(back.size(), g1.pixel_size());
        assert_eq!(doc.renders.get(), 4);
    }

    #[test]
    fn invalid_page_never_reaches_backend() {
        let doc = CountingDocument::new(3);
        let mut cache = PageCache::new(doc.page_count());

        let err = cache.get_surface(3, &geometry(800, 600), &doc).unwrap_err();

        assert_eq!(
            err,
            RenderError::InvalidPage {
                page: 3,
                page_count: 3
            }
        );
        assert_eq!(doc.renders.get(), 0);
    }

    #[test]
    fn degenerate_geometry_skips_render_and_keeps_entries() {
        let doc = CountingDocument::new(3);
        let mut cache = PageCache::new(doc.page_count());
        let g = geometry(800, 600);
        cache.get_surface(0, &g, &doc).unwrap();

        let err = cache.get_surface(0, &geometry(0, 600), &doc).unwrap_err();

        assert!(matches!(err, RenderError::DegenerateGeometry { .. }));
        assert_eq!(doc.renders.get(), 1);
        assert!(cache.contains(0, g.pixel_size()));
    }

    #[test]
    fn render_failure_is_not_cached() {
        let doc = CountingDocument::new(3);
        doc.failing.borrow_mut().push(1);
        let mut cache = PageCache::new(doc.page_count());
        let g = geometry(800, 600);

        assert!(cache.get_surface(1, &g, &doc).is_err());
        assert!(cache.get_surface(1, &g, &doc).is_err());
        assert_eq!(doc.renders.get(), 2);

        doc.failing.borrow_mut().clear();
        assert!(cache.get_surface(1, &g, &doc).is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_render_at_new_size_keeps_old_entries() {
        let doc = CountingDocument::new(3);
        let mut cache = PageCache::new(doc.page_count());
        let g1 = geometry(800, 600);
        let g2 = geometry(1024, 768);
        cache.get_surface(0, &g1, &doc).unwrap();

        doc.failing.borrow_mut().push(1);
        assert!(cache.get_surface(1, &g2, &doc).is_err());

        assert_eq!(cache.geometry(), Some(g1.pixel_size()));
        assert!(cache.contains(0, g1.pixel_size()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn store_rejects_stale_geometry() {
        let mut cache = PageCache::new(4);
        let current = PixelSize::new(464, 600);
        let stale = PixelSize::new(400, 517);
        cache.sync_geometry(current);

        let stale_surface = Arc::new(Surface::filled(stale, [0, 0, 0]));
        assert!(!cache.store(2, stale, stale_surface));
        assert!(cache.is_empty());

        let fresh = Arc::new(Surface::filled(current, [0, 0, 0]));
        assert!(cache.store(2, current, fresh));
        assert!(cache.contains(2, current));
        assert!(!cache.contains(2, stale));
    }

    #[test]
    fn store_keeps_existing_entry() {
        let mut cache = PageCache::new(2);
        let size = PixelSize::new(10, 10);
        let first = Arc::new(Surface::filled(size, [1, 1, 1]));
        let second = Arc::new(Surface::filled(size, [2, 2, 2]));

        assert!(cache.store(0, size, Arc::clone(&first)));
        assert!(cache.store(0, size, second));

        let cached = cache.lookup(0, size).unwrap();
        assert!(Arc::ptr_eq(&cached, &first));
    }

    #[test]
    fn invalidate_all_clears_everything() {
        let doc = CountingDocument::new(5);
        let mut cache = PageCache::new(doc.page_count());
        let g = geometry(800, 600);
        for page in 0..5 {
            cache.get_surface(page, &g, &doc).unwrap();
        }
        assert_eq!(cache.len(), 5);

        cache.invalidate_all();

        assert!(cache.is_empty());
        assert_eq!(cache.geometry(), None);
        assert_eq!(cache.slot_count(), 5);
    }
}
