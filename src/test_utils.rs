//! Fakes shared by unit and integration tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use flume::{Receiver, Sender};

use crate::pdf::{
    Document, DocumentError, DocumentOpener, Geometry, PageSize, PixelSize, RenderError, Surface,
};

/// Shared count of backend render calls
#[derive(Clone, Debug, Default)]
pub struct RenderCounter(Arc<AtomicUsize>);

impl RenderCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory document with instrumented rendering.
///
/// Clones share their counters, failure set and render log, so a test can
/// keep one handle while workers open their own copies through
/// [`FakeDocument::opener`].
#[derive(Clone)]
pub struct FakeDocument {
    sizes: Arc<Vec<PageSize>>,
    renders: RenderCounter,
    failing: Arc<Mutex<HashSet<usize>>>,
    log: Arc<Mutex<Vec<(usize, PixelSize)>>>,
    gate: Option<Receiver<()>>,
}

impl FakeDocument {
    /// Document with `pages` US Letter pages
    pub fn new(pages: usize) -> Self {
        Self::with_page_sizes(vec![PageSize::LETTER; pages])
    }

    pub fn with_page_sizes(sizes: Vec<PageSize>) -> Self {
        Self {
            sizes: Arc::new(sizes),
            renders: RenderCounter::default(),
            failing: Arc::new(Mutex::new(HashSet::new())),
            log: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    /// Every render blocks until a unit is sent on the returned channel
    pub fn gated(mut self) -> (Self, Sender<()>) {
        let (tx, rx) = flume::unbounded();
        self.gate = Some(rx);
        (self, tx)
    }

    pub fn render_counter(&self) -> RenderCounter {
        self.renders.clone()
    }

    /// Make every render of `page` fail until [`Self::heal_page`]
    pub fn fail_page(&self, page: usize) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(page);
    }

    pub fn heal_page(&self, page: usize) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&page);
    }

    /// `(page, size)` of every render call so far, in call order
    pub fn render_log(&self) -> Vec<(usize, PixelSize)> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Opener handing out clones of this document
    pub fn opener(&self) -> DocumentOpener {
        let doc = self.clone();
        Arc::new(move || Ok(Box::new(doc.clone()) as Box<dyn Document>))
    }

    /// Opener that always fails, for exercising worker faults
    pub fn failing_opener() -> DocumentOpener {
        Arc::new(|| Err(DocumentError::NotFound("missing.pdf".into())))
    }

    /// Fill colour used for `page`, so tests can tell surfaces apart
    pub fn page_colour(page: usize) -> [u8; 3] {
        [(page % 256) as u8, 0x80, 0xFF]
    }
}

impl Document for FakeDocument {
    fn page_count(&self) -> usize {
        self.sizes.len()
    }

    fn page_size(&self, page: usize) -> PageSize {
        self.sizes[page]
    }

    fn render_page(&self, page: usize, geometry: &Geometry) -> Result<Surface, RenderError> {
        self.renders.bump();
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((page, geometry.pixel_size()));

        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }

        if self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&page)
        {
            return Err(RenderError::backend(page, "injected failure"));
        }

        Ok(Surface::filled(
            geometry.pixel_size(),
            Self::page_colour(page),
        ))
    }
}
