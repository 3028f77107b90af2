//! winit application driving both display hosts

use std::collections::HashMap;
use std::time::Instant;

use log::{error, info};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::WindowId;

use crate::pdf::{DisplayRole, Frame, RenderError};

use super::clock::TICK;
use super::events::HostEvent;
use super::input::{action_for_button, action_for_key};
use super::session::{DisplaySink, Flow, Session};
use super::window::{DisplayHost, HostConfig};

/// Both host windows, addressed by role
#[derive(Default)]
struct Hosts {
    windows: HashMap<DisplayRole, DisplayHost>,
}

impl DisplaySink for Hosts {
    fn frame_ready(&mut self, role: DisplayRole, frame: &Frame) {
        if let Some(host) = self.windows.get_mut(&role) {
            host.show(frame);
        }
    }

    fn render_failed(&mut self, role: DisplayRole, _error: &RenderError) {
        if let Some(host) = self.windows.get_mut(&role) {
            host.present();
        }
    }

    fn fullscreen_changed(&mut self, fullscreen: bool) {
        for host in self.windows.values() {
            host.set_fullscreen(fullscreen);
        }
    }

    fn panel_changed(&mut self, role: DisplayRole, text: &str) {
        if let Some(host) = self.windows.get(&role) {
            host.set_panel_text(text);
        }
    }
}

/// Event loop handler: one session, two windows
pub struct PresenterApp {
    session: Session,
    configs: Vec<HostConfig>,
    hosts: Hosts,
    roles: HashMap<WindowId, DisplayRole>,
}

impl PresenterApp {
    pub fn new(session: Session, configs: Vec<HostConfig>) -> Self {
        Self {
            session,
            configs,
            hosts: Hosts::default(),
            roles: HashMap::new(),
        }
    }

    fn dispatch(&mut self, event: HostEvent, event_loop: &ActiveEventLoop) {
        if self.session.handle(event, &mut self.hosts) == Flow::Quit {
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for PresenterApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.hosts.windows.is_empty() {
            return;
        }

        for config in self.configs.drain(..) {
            let role = config.role;
            match DisplayHost::create(event_loop, config) {
                Ok(host) => {
                    self.roles.insert(host.id(), role);
                    self.hosts.windows.insert(role, host);
                }
                Err(e) => {
                    error!("{} window: {e}", role.label());
                    event_loop.exit();
                    return;
                }
            }
        }
        info!("presenter windows ready");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(&role) = self.roles.get(&id) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => self.dispatch(HostEvent::Closed(role), event_loop),

            WindowEvent::Resized(size) => {
                let Some(host) = self.hosts.windows.get_mut(&role) else {
                    return;
                };
                let viewport = host.resize(size);
                self.dispatch(HostEvent::Resized { role, viewport }, event_loop);
            }

            WindowEvent::RedrawRequested => {
                self.dispatch(HostEvent::RedrawRequested(role), event_loop);
            }

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if let Some(action) = action_for_key(&event.logical_key) {
                    self.dispatch(HostEvent::Input(action), event_loop);
                }
            }

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button,
                ..
            } => {
                if let Some(action) = action_for_button(button) {
                    self.dispatch(HostEvent::Input(action), event_loop);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.session.poll_prefetch();

        if self.session.wants_ticks() {
            let now = Instant::now();
            self.session.tick(&mut self.hosts);
            let deadline = self.session.clock().next_deadline(now);
            event_loop.set_control_flow(ControlFlow::WaitUntil(deadline.min(now + TICK)));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }
}
