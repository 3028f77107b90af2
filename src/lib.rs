// Export modules for use in tests
pub mod panic_handler;
pub mod pdf;
pub mod presenter;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the presenter entry points
pub use pdf::{Coordinator, CoordinatorConfig, DisplayRole};
pub use presenter::{PresenterApp, Session};
