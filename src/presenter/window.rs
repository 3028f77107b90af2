//! One presenter window backed by a software framebuffer

use std::num::NonZeroU32;
use std::sync::Arc;

use log::{debug, warn};
use softbuffer::{Context, SoftBufferError};
use thiserror::Error;
use winit::dpi::PhysicalSize;
use winit::error::OsError;
use winit::event_loop::{ActiveEventLoop, OwnedDisplayHandle};
use winit::window::{Fullscreen, Window, WindowId};

use crate::pdf::{DisplayRole, Frame, Surface, Viewport};

use super::blit;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to create window: {0}")]
    Window(#[from] OsError),
    #[error("framebuffer error: {0}")]
    Framebuffer(#[from] SoftBufferError),
}

/// How a host window is set up
#[derive(Clone, Debug)]
pub struct HostConfig {
    pub role: DisplayRole,
    /// Document title, shown ahead of the role in the window title
    pub title: String,
    /// `0x00RRGGBB` fill around the page
    pub background: u32,
}

impl HostConfig {
    fn window_title(&self, panel_text: Option<&str>) -> String {
        match panel_text {
            Some(text) => format!("{} - {} [{text}]", self.title, self.role.label()),
            None => format!("{} - {}", self.title, self.role.label()),
        }
    }
}

/// A window showing one display's current page, letterboxed on the
/// background colour
pub struct DisplayHost {
    config: HostConfig,
    window: Arc<Window>,
    _context: Context<OwnedDisplayHandle>,
    framebuffer: softbuffer::Surface<OwnedDisplayHandle, Arc<Window>>,
    last_page: Option<Arc<Surface>>,
}

impl DisplayHost {
    pub fn create(event_loop: &ActiveEventLoop, config: HostConfig) -> Result<Self, HostError> {
        let attributes = Window::default_attributes()
            .with_title(config.window_title(None))
            .with_inner_size(PhysicalSize::new(1024, 768));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let context = Context::new(event_loop.owned_display_handle())?;
        let framebuffer = softbuffer::Surface::new(&context, window.clone())?;

        debug!("created {} window {:?}", config.role.label(), window.id());

        Ok(Self {
            config,
            window,
            _context: context,
            framebuffer,
            last_page: None,
        })
    }

    pub fn id(&self) -> WindowId {
        self.window.id()
    }

    pub fn viewport(&self) -> Viewport {
        let size = self.window.inner_size();
        Viewport::new(size.width, size.height)
    }

    /// Match the framebuffer to the window's new inner size
    pub fn resize(&mut self, size: PhysicalSize<u32>) -> Viewport {
        if let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
            if let Err(e) = self.framebuffer.resize(w, h) {
                warn!("{} framebuffer resize failed: {e}", self.config.role.label());
            }
        }
        Viewport::new(size.width, size.height)
    }

    /// Present `frame` and remember its page for later repaints
    pub fn show(&mut self, frame: &Frame) {
        self.last_page = Some(Arc::clone(&frame.surface));
        self.present();
    }

    /// Repaint with whatever page was shown last
    pub fn present(&mut self) {
        if let Err(e) = self.try_present() {
            warn!("{} present failed: {e}", self.config.role.label());
        }
    }

    fn try_present(&mut self) -> Result<(), SoftBufferError> {
        let viewport = self.viewport();
        if viewport.is_empty() {
            return Ok(());
        }

        let mut buffer = self.framebuffer.buffer_mut()?;
        if buffer.len() != viewport.width as usize * viewport.height as usize {
            // Framebuffer not resized yet; the pending Resized event repaints
            return Ok(());
        }
        blit::compose(
            self.last_page.as_deref(),
            viewport,
            self.config.background,
            &mut buffer,
        );

        self.window.pre_present_notify();
        buffer.present()
    }

    pub fn set_fullscreen(&self, fullscreen: bool) {
        let mode = fullscreen.then(|| Fullscreen::Borderless(None));
        self.window.set_fullscreen(mode);
    }

    pub fn set_panel_text(&self, text: &str) {
        self.window.set_title(&self.config.window_title(Some(text)));
    }
}
