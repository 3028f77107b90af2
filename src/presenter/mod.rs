//! Display hosts: windows, input mapping and the event session

pub mod app;
pub mod blit;
pub mod clock;
pub mod events;
pub mod input;
pub mod session;
pub mod window;

pub use app::PresenterApp;
pub use clock::{ElapsedClock, PanelKind};
pub use events::{EventSource, HostEvent, SimulatedEventSource};
pub use input::Action;
pub use session::{DisplaySink, Flow, Session};
pub use window::{DisplayHost, HostConfig, HostError};
