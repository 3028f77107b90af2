//! Host event vocabulary and event sources

use crate::pdf::{DisplayRole, Viewport};

use super::input::Action;

/// Something a display host reports to the presenter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// The host's drawable area changed
    Resized { role: DisplayRole, viewport: Viewport },
    /// The host needs its frame painted again
    RedrawRequested(DisplayRole),
    /// Mapped user input from either window
    Input(Action),
    /// The 1 Hz clock ticked
    Tick,
    /// A window was closed
    Closed(DisplayRole),
}

/// Trait for abstracting event sources to enable testing
pub trait EventSource {
    /// Next event, or `None` when the source is exhausted
    fn next_event(&mut self) -> Option<HostEvent>;
}

/// Scripted event source for testing
pub struct SimulatedEventSource {
    pub(crate) events: Vec<HostEvent>,
    current_index: usize,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<HostEvent>) -> Self {
        Self {
            events,
            current_index: 0,
        }
    }

    /// Helper method to create a resize event
    pub fn resize(role: DisplayRole, width: u32, height: u32) -> HostEvent {
        HostEvent::Resized {
            role,
            viewport: Viewport::new(width, height),
        }
    }

    /// Helper method to create an input event
    pub fn input(action: Action) -> HostEvent {
        HostEvent::Input(action)
    }

    /// Events still to be delivered
    pub fn remaining(&self) -> usize {
        self.events.len() - self.current_index
    }
}

impl EventSource for SimulatedEventSource {
    fn next_event(&mut self) -> Option<HostEvent> {
        let event = self.events.get(self.current_index).copied();
        if event.is_some() {
            self.current_index += 1;
        }
        event
    }
}
