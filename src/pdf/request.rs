//! Render request and response types

use super::document::{DocumentError, RenderError};
use super::geometry::{Geometry, PixelSize};

/// Unique identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Identity of a render: one page at one pixel size.
/// At most one request per key is in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderKey {
    pub page: usize,
    pub size: PixelSize,
}

impl RenderKey {
    #[must_use]
    pub const fn new(page: usize, geometry: &Geometry) -> Self {
        Self {
            page,
            size: geometry.pixel_size(),
        }
    }
}

/// Request sent to render workers
#[derive(Debug)]
pub enum RenderRequest {
    /// Render a page into the shared cache (low priority)
    Prefetch {
        id: RequestId,
        page: usize,
        geometry: Geometry,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Errors from render workers
#[derive(Debug, thiserror::Error)]
pub enum WorkerFault {
    #[error("worker could not open document: {0}")]
    Open(#[from] DocumentError),

    #[error("{detail}")]
    Generic { detail: String },
}

impl WorkerFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Response from render workers
#[derive(Debug)]
pub enum RenderResponse {
    /// Page is now in the cache
    Stored { id: RequestId, key: RenderKey },

    /// Page was already cached when the worker picked the request up
    AlreadyCached { id: RequestId, key: RenderKey },

    /// The cache moved to another geometry while the page was rendering;
    /// the result was dropped
    Discarded { id: RequestId, key: RenderKey },

    /// Error during rendering
    Error {
        id: RequestId,
        key: RenderKey,
        error: RenderError,
    },

    /// Worker stopped and will not answer further requests
    Fault(WorkerFault),
}

impl RenderResponse {
    /// Request this response answers, if any
    #[must_use]
    pub fn id(&self) -> Option<RequestId> {
        match self {
            RenderResponse::Stored { id, .. }
            | RenderResponse::AlreadyCached { id, .. }
            | RenderResponse::Discarded { id, .. }
            | RenderResponse::Error { id, .. } => Some(*id),
            RenderResponse::Fault(_) => None,
        }
    }
}
