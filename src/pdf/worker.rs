//! Render worker - runs in separate thread(s)

use std::sync::{Arc, Mutex, PoisonError};

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::cache::PageCache;
use super::document::{Document, DocumentOpener};
use super::geometry::Geometry;
use super::request::{RenderKey, RenderRequest, RenderResponse, RequestId, WorkerFault};

/// Main worker function - runs in a dedicated thread
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker(
    opener: DocumentOpener,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
    cache: Arc<Mutex<PageCache>>,
) {
    let doc = match opener() {
        Ok(d) => d,
        Err(e) => {
            warn!("render worker exiting: {e}");
            let _ = responses.send(RenderResponse::Fault(WorkerFault::Open(e)));
            return;
        }
    };

    // The file may have changed on disk since the display opened it
    let slots = cache.lock().unwrap_or_else(PoisonError::into_inner).slot_count();
    if doc.page_count() != slots {
        let fault = WorkerFault::generic(format!(
            "document has {} pages, display expects {slots}",
            doc.page_count()
        ));
        warn!("render worker exiting: {fault}");
        let _ = responses.send(RenderResponse::Fault(fault));
        return;
    }

    for request in requests {
        match request {
            RenderRequest::Prefetch { id, page, geometry } => {
                let response = handle_prefetch(doc.as_ref(), id, page, &geometry, &cache);
                let _ = responses.send(response);
            }

            RenderRequest::Shutdown => break,
        }
    }
}

fn handle_prefetch(
    doc: &dyn Document,
    id: RequestId,
    page: usize,
    geometry: &Geometry,
    cache: &Arc<Mutex<PageCache>>,
) -> RenderResponse {
    let key = RenderKey::new(page, geometry);

    {
        let cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        if cache.contains(page, key.size) {
            return RenderResponse::AlreadyCached { id, key };
        }
        if cache.geometry().is_some_and(|current| current != key.size) {
            return RenderResponse::Discarded { id, key };
        }
    }

    // Rendering happens outside the lock so the display thread never waits on it
    let surface = match doc.render_page(page, geometry) {
        Ok(surface) => Arc::new(surface),
        Err(error) => return RenderResponse::Error { id, key, error },
    };

    let stored = cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .store(page, key.size, surface);

    if stored {
        debug!("prefetched page {page} at {}x{}", key.size.width, key.size.height);
        RenderResponse::Stored { id, key }
    } else {
        debug!("dropped stale prefetch of page {page}");
        RenderResponse::Discarded { id, key }
    }
}
