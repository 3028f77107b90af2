//! Routes host events through the coordinator and back out to the hosts

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, info, warn};

use crate::pdf::{
    Command, Coordinator, DisplayRole, DocumentOpener, Effect, Frame, RenderError, RenderService,
    compute_geometry,
};

use super::clock::{ElapsedClock, PanelKind};
use super::events::{EventSource, HostEvent};
use super::input::Action;

/// Receiving end of the presenter: one implementation drives real windows,
/// tests record what would have been shown.
pub trait DisplaySink {
    /// A frame is ready to be blitted on `role`'s window
    fn frame_ready(&mut self, role: DisplayRole, frame: &Frame);

    /// Rendering for `role` failed; keep the last good frame on screen
    fn render_failed(&mut self, role: DisplayRole, error: &RenderError) {
        let _ = (role, error);
    }

    /// Both windows enter or leave fullscreen
    fn fullscreen_changed(&mut self, fullscreen: bool);

    /// New text for `role`'s extra panel
    fn panel_changed(&mut self, role: DisplayRole, text: &str) {
        let _ = (role, text);
    }
}

/// Whether the event loop should keep running
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Presenter state between the hosts and the page engine
pub struct Session {
    coordinator: Coordinator,
    prefetchers: HashMap<DisplayRole, RenderService>,
    panels: HashMap<DisplayRole, PanelKind>,
    clock: ElapsedClock,
}

impl Session {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            prefetchers: HashMap::new(),
            panels: HashMap::new(),
            clock: ElapsedClock::start(Instant::now()),
        }
    }

    /// Render upcoming pages in the background, one service per display
    pub fn with_prefetch(mut self, opener: DocumentOpener, workers: usize) -> Self {
        for role in DisplayRole::ALL {
            let cache = self.coordinator.display(role).cache().clone();
            let service = RenderService::with_workers(opener.clone(), cache, workers);
            self.prefetchers.insert(role, service);
        }
        self
    }

    /// Attach an extra panel to `role`'s host
    pub fn with_panel(mut self, role: DisplayRole, panel: PanelKind) -> Self {
        self.panels.insert(role, panel);
        self
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn clock(&self) -> &ElapsedClock {
        &self.clock
    }

    /// Whether any host shows the clock and needs the 1 Hz tick
    pub fn wants_ticks(&self) -> bool {
        !self.panels.is_empty()
    }

    /// Handle one host event
    pub fn handle(&mut self, event: HostEvent, sink: &mut dyn DisplaySink) -> Flow {
        match event {
            HostEvent::Resized { role, viewport } => {
                self.execute(Command::Resize { role, viewport }, sink)
            }
            HostEvent::RedrawRequested(role) => {
                self.redraw(role, sink);
                Flow::Continue
            }
            HostEvent::Input(action) => {
                let command = self.command_for(action);
                self.execute(command, sink)
            }
            HostEvent::Tick => {
                self.tick(sink);
                Flow::Continue
            }
            HostEvent::Closed(role) => {
                info!("{} window closed", role.label());
                self.execute(Command::Close, sink)
            }
        }
    }

    /// Feed every event from `source` until it runs dry or a host quits
    pub fn run_with_event_source(
        &mut self,
        source: &mut dyn EventSource,
        sink: &mut dyn DisplaySink,
    ) -> Flow {
        while let Some(event) = source.next_event() {
            if self.handle(event, sink) == Flow::Quit {
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Paint `role`'s current page at its last reported viewport
    pub fn redraw(&mut self, role: DisplayRole, sink: &mut dyn DisplaySink) {
        let viewport = self.coordinator.display(role).viewport();
        self.await_prefetch(role);
        match self.coordinator.frame(role, viewport) {
            Ok(Some(frame)) => sink.frame_ready(role, &frame),
            Ok(None) => debug!("{} display has nothing to draw yet", role.label()),
            Err(error) => {
                warn!("{} display: {error}", role.label());
                sink.render_failed(role, &error);
            }
        }
    }

    /// Push fresh panel text to every host that has a panel
    pub fn tick(&mut self, sink: &mut dyn DisplaySink) {
        let Some(label) = self.clock.tick(Instant::now()) else {
            return;
        };
        for (&role, panel) in &self.panels {
            match panel {
                PanelKind::ElapsedTime => sink.panel_changed(role, &label),
            }
        }
    }

    /// Drain finished background renders
    pub fn poll_prefetch(&mut self) {
        for service in self.prefetchers.values_mut() {
            service.poll_responses();
        }
    }

    fn command_for(&self, action: Action) -> Command {
        match action {
            Action::Next => Command::NextSlide,
            Action::Previous => Command::PreviousSlide,
            Action::First => Command::GoToPage(0),
            Action::Last => Command::GoToPage(self.coordinator.last_slide_page()),
            Action::ToggleFullscreen => Command::ToggleFullscreen,
            Action::Quit => Command::Close,
        }
    }

    fn execute(&mut self, command: Command, sink: &mut dyn DisplaySink) -> Flow {
        let effects = self.coordinator.apply(command);
        let mut flow = Flow::Continue;

        for effect in effects {
            match effect {
                Effect::Redraw(role) => self.redraw(role, sink),
                Effect::SetFullscreen(fullscreen) => sink.fullscreen_changed(fullscreen),
                Effect::Prefetch { role, page } => self.prefetch(role, page),
                Effect::Quit => flow = Flow::Quit,
            }
        }

        flow
    }

    /// A worker already rendering the page about to be shown finishes it;
    /// the frame then comes from the cache instead of a second render
    fn await_prefetch(&mut self, role: DisplayRole) {
        let Some(service) = self.prefetchers.get_mut(&role) else {
            return;
        };
        let display = self.coordinator.display(role);
        let page = display.navigator().current_index();
        let geometry =
            compute_geometry(self.coordinator.document().page_size(page), display.viewport());
        if service.is_in_flight(page, &geometry) {
            debug!("{} display: waiting for prefetch of page {page}", role.label());
            service.wait_for(page, &geometry);
        }
    }

    fn prefetch(&mut self, role: DisplayRole, page: usize) {
        let Some(service) = self.prefetchers.get_mut(&role) else {
            return;
        };
        let viewport = self.coordinator.display(role).viewport();
        let geometry = compute_geometry(self.coordinator.document().page_size(page), viewport);
        if service.prefetch(page, &geometry).is_some() {
            debug!("{} display: prefetching page {page}", role.label());
        }
    }
}
