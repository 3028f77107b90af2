//! PDF page engine: scaling, caching, navigation and display coordination

mod cache;
mod coordinator;
mod document;
mod geometry;
#[cfg(feature = "pdf")]
mod mupdf_doc;
mod navigator;
mod request;
mod service;
mod worker;

pub use cache::PageCache;
pub use coordinator::{
    Command, Coordinator, CoordinatorConfig, Display, DisplayRole, Effect, Frame,
};
pub use document::{
    Document, DocumentError, DocumentOpener, PageSize, RenderError, Surface,
};
pub use geometry::{Geometry, PixelSize, Viewport, compute_geometry};
#[cfg(feature = "pdf")]
pub use mupdf_doc::MupdfDocument;
pub use navigator::{BoundaryPolicy, PageNavigator};
pub use request::{RenderKey, RenderRequest, RenderResponse, RequestId, WorkerFault};
pub use service::{DEFAULT_WORKERS, RenderService};
