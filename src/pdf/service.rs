//! Render service - background prefetch into a display's page cache

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use flume::{Receiver, Sender};
use log::{info, warn};

use super::cache::PageCache;
use super::document::DocumentOpener;
use super::geometry::Geometry;
use super::request::{RenderKey, RenderRequest, RenderResponse, RequestId};
use super::worker::render_worker;

/// Default number of prefetch workers per display
pub const DEFAULT_WORKERS: usize = 1;

/// Renders pages ahead of time on worker threads.
///
/// Each service feeds exactly one display's cache. Requests for a page at a
/// pixel size that is already cached or already in flight are coalesced, and
/// workers drop results whose geometry went stale while they were rendering.
pub struct RenderService {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    next_request_id: u64,
    pending_requests: HashMap<RequestId, RenderKey>,
    in_flight: HashSet<RenderKey>,
    cache: Arc<Mutex<PageCache>>,
    num_workers: usize,
    faulted: bool,
}

impl RenderService {
    /// Create a new render service with default configuration
    #[must_use]
    pub fn new(opener: DocumentOpener, cache: Arc<Mutex<PageCache>>) -> Self {
        Self::with_workers(opener, cache, DEFAULT_WORKERS)
    }

    /// Create a new render service with a custom worker count
    #[must_use]
    pub fn with_workers(
        opener: DocumentOpener,
        cache: Arc<Mutex<PageCache>>,
        num_workers: usize,
    ) -> Self {
        // flume channels are MPMC: every worker pulls from the same queue
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let num_workers = num_workers.max(1);
        for _ in 0..num_workers {
            let opener = Arc::clone(&opener);
            let rx = request_rx.clone();
            let tx = response_tx.clone();
            let cache_clone = Arc::clone(&cache);

            std::thread::spawn(move || {
                render_worker(opener, rx, tx, cache_clone);
            });
        }
        info!("started {num_workers} prefetch worker(s)");

        Self {
            request_tx,
            response_rx,
            next_request_id: 1,
            pending_requests: HashMap::new(),
            in_flight: HashSet::new(),
            cache,
            num_workers,
            faulted: false,
        }
    }

    /// Queue `page` for rendering at `geometry`.
    ///
    /// Returns `None` when nothing was queued: the page is already cached or
    /// in flight at this size, the geometry is not drawable, or the workers
    /// are gone.
    pub fn prefetch(&mut self, page: usize, geometry: &Geometry) -> Option<RequestId> {
        if self.faulted || !geometry.is_drawable() {
            return None;
        }

        let key = RenderKey::new(page, geometry);
        if self.in_flight.contains(&key) || self.is_cached(&key) {
            return None;
        }

        let id = self.next_id();
        let request = RenderRequest::Prefetch {
            id,
            page,
            geometry: *geometry,
        };
        if self.request_tx.send(request).is_err() {
            self.faulted = true;
            return None;
        }

        self.pending_requests.insert(id, key);
        self.in_flight.insert(key);
        Some(id)
    }

    /// Poll for completed render responses
    pub fn poll_responses(&mut self) -> Vec<RenderResponse> {
        let mut responses = vec![];

        while let Ok(response) = self.response_rx.try_recv() {
            self.settle(&response);
            responses.push(response);
        }

        responses
    }

    /// Get the response receiver for blocking usage
    #[must_use]
    pub fn response_receiver(&self) -> &Receiver<RenderResponse> {
        &self.response_rx
    }

    /// Bookkeeping for a response taken from [`Self::response_receiver`]
    pub fn settle(&mut self, response: &RenderResponse) {
        match response {
            RenderResponse::Error { key, error, .. } => {
                warn!("prefetch of page {} failed: {error}", key.page);
            }
            RenderResponse::Fault(fault) => {
                warn!("prefetch worker stopped: {fault}");
                self.faulted = true;
                self.pending_requests.clear();
                self.in_flight.clear();
                return;
            }
            _ => {}
        }

        if let Some(key) = response.id().and_then(|id| self.pending_requests.remove(&id)) {
            self.in_flight.remove(&key);
        }
    }

    /// Block until the render for `page` at `geometry` has settled, so a
    /// caller about to render the same key can take the worker's result from
    /// the cache instead
    pub fn wait_for(&mut self, page: usize, geometry: &Geometry) -> Vec<RenderResponse> {
        let key = RenderKey::new(page, geometry);
        let mut responses = vec![];

        while self.in_flight.contains(&key) {
            match self.response_rx.recv() {
                Ok(response) => {
                    self.settle(&response);
                    responses.push(response);
                }
                Err(_) => {
                    warn!("prefetch workers are gone");
                    self.faulted = true;
                    self.pending_requests.clear();
                    self.in_flight.clear();
                }
            }
        }

        responses
    }

    /// Check if a render for `page` at `geometry` is queued or running
    #[must_use]
    pub fn is_in_flight(&self, page: usize, geometry: &Geometry) -> bool {
        self.in_flight.contains(&RenderKey::new(page, geometry))
    }

    /// Number of requests without a response yet
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending_requests.len()
    }

    /// Whether a worker failed and prefetching is disabled
    #[must_use]
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Shutdown all workers
    pub fn shutdown(&self) {
        for _ in 0..self.num_workers {
            let _ = self.request_tx.send(RenderRequest::Shutdown);
        }
    }

    fn is_cached(&self, key: &RenderKey) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key.page, key.size)
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::document::{Document, PageSize};
    use super::super::geometry::{Viewport, compute_geometry};
    use super::super::request::WorkerFault;
    use super::*;
    use crate::test_utils::FakeDocument;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn geometry(width: u32, height: u32) -> Geometry {
        compute_geometry(PageSize::LETTER, Viewport::new(width, height))
    }

    fn recv(service: &mut RenderService) -> RenderResponse {
        let response = service
            .response_receiver()
            .recv_timeout(TIMEOUT)
            .expect("worker response");
        service.settle(&response);
        response
    }

    #[test]
    fn prefetch_stores_into_shared_cache() {
        let doc = FakeDocument::new(4);
        let cache = Arc::new(Mutex::new(PageCache::new(doc.page_count())));
        let mut service = RenderService::new(doc.opener(), Arc::clone(&cache));
        let g = geometry(800, 600);

        assert!(service.prefetch(2, &g).is_some());

        assert!(matches!(recv(&mut service), RenderResponse::Stored { .. }));
        assert!(cache.lock().unwrap().contains(2, g.pixel_size()));
        assert_eq!(service.pending(), 0);
    }

    #[test]
    fn duplicate_requests_coalesce_into_one_render() {
        let (doc, gate) = FakeDocument::new(4).gated();
        let renders = doc.render_counter();
        let cache = Arc::new(Mutex::new(PageCache::new(doc.page_count())));
        let mut service = RenderService::new(doc.opener(), cache);
        let g = geometry(800, 600);

        assert!(service.prefetch(1, &g).is_some());
        assert!(service.prefetch(1, &g).is_none());
        assert!(service.is_in_flight(1, &g));

        gate.send(()).unwrap();
        assert!(matches!(recv(&mut service), RenderResponse::Stored { .. }));

        // Cached now, so still nothing to queue
        assert!(service.prefetch(1, &g).is_none());
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn result_for_stale_geometry_is_discarded() {
        let (doc, gate) = FakeDocument::new(4).gated();
        let cache = Arc::new(Mutex::new(PageCache::new(doc.page_count())));
        let mut service = RenderService::new(doc.opener(), Arc::clone(&cache));
        let old = geometry(800, 600);
        let new = geometry(1024, 768);
        cache.lock().unwrap().sync_geometry(old.pixel_size());

        service.prefetch(3, &old).unwrap();
        cache.lock().unwrap().sync_geometry(new.pixel_size());
        gate.send(()).unwrap();

        assert!(matches!(recv(&mut service), RenderResponse::Discarded { .. }));
        let cache = cache.lock().unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.geometry(), Some(new.pixel_size()));
    }

    #[test]
    fn wait_for_returns_once_the_key_is_cached() {
        let (doc, gate) = FakeDocument::new(4).gated();
        let cache = Arc::new(Mutex::new(PageCache::new(doc.page_count())));
        let mut service = RenderService::new(doc.opener(), Arc::clone(&cache));
        let g = geometry(800, 600);
        service.prefetch(2, &g).unwrap();

        let release = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            gate.send(()).unwrap();
        });
        let responses = service.wait_for(2, &g);
        release.join().unwrap();

        assert!(matches!(responses.as_slice(), [RenderResponse::Stored { .. }]));
        assert!(!service.is_in_flight(2, &g));
        assert!(cache.lock().unwrap().contains(2, g.pixel_size()));
    }

    #[test]
    fn wait_for_idle_key_returns_immediately() {
        let doc = FakeDocument::new(4);
        let cache = Arc::new(Mutex::new(PageCache::new(doc.page_count())));
        let mut service = RenderService::new(doc.opener(), cache);

        assert!(service.wait_for(1, &geometry(800, 600)).is_empty());
    }

    #[test]
    fn render_errors_free_the_key() {
        let doc = FakeDocument::new(4);
        doc.fail_page(0);
        let cache = Arc::new(Mutex::new(PageCache::new(doc.page_count())));
        let mut service = RenderService::new(doc.opener(), cache);
        let g = geometry(800, 600);

        service.prefetch(0, &g).unwrap();
        assert!(matches!(recv(&mut service), RenderResponse::Error { .. }));
        assert!(!service.is_in_flight(0, &g));
    }

    #[test]
    fn open_failure_disables_prefetch() {
        let cache = Arc::new(Mutex::new(PageCache::new(1)));
        let mut service = RenderService::new(FakeDocument::failing_opener(), cache);

        assert!(matches!(recv(&mut service), RenderResponse::Fault(_)));
        assert!(service.is_faulted());
        assert!(service.prefetch(0, &geometry(800, 600)).is_none());
    }

    #[test]
    fn page_count_mismatch_disables_prefetch() {
        let cache = Arc::new(Mutex::new(PageCache::new(6)));
        let mut service = RenderService::new(FakeDocument::new(4).opener(), cache);

        assert!(matches!(
            recv(&mut service),
            RenderResponse::Fault(WorkerFault::Generic { .. })
        ));
        assert!(service.is_faulted());
    }

    #[test]
    fn degenerate_geometry_is_not_queued() {
        let doc = FakeDocument::new(2);
        let cache = Arc::new(Mutex::new(PageCache::new(doc.page_count())));
        let mut service = RenderService::new(doc.opener(), cache);

        assert!(service.prefetch(0, &geometry(0, 0)).is_none());
        assert_eq!(service.pending(), 0);
    }
}
