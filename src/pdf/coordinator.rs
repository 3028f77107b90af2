//! Lock-step navigation across the audience and notes displays

use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};

use super::cache::PageCache;
use super::document::{Document, RenderError, Surface};
use super::geometry::{Geometry, Viewport, compute_geometry};
use super::navigator::{BoundaryPolicy, PageNavigator};

/// Which of the two displays an operation targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayRole {
    /// Full-page view for the audience
    Main,
    /// Presenter view, ahead of the main display by the display offset
    Notes,
}

impl DisplayRole {
    pub const ALL: [DisplayRole; 2] = [DisplayRole::Main, DisplayRole::Notes];

    pub fn label(&self) -> &'static str {
        match self {
            DisplayRole::Main => "Audience",
            DisplayRole::Notes => "Notes",
        }
    }
}

/// Navigation parameters fixed for the lifetime of a coordinator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Starting index of the notes display relative to the main display
    pub display_offset: usize,
    /// Pages per slide step; 2 for decks that interleave slide and notes pages
    pub step: usize,
    pub policy: BoundaryPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            display_offset: 1,
            step: 2,
            policy: BoundaryPolicy::Clamp,
        }
    }
}

/// Navigator and cache pair owned by one display
pub struct Display {
    navigator: PageNavigator,
    cache: Arc<Mutex<PageCache>>,
    viewport: Viewport,
}

impl Display {
    fn new(navigator: PageNavigator) -> Self {
        let cache = PageCache::new(navigator.page_count());
        Self {
            navigator,
            cache: Arc::new(Mutex::new(cache)),
            viewport: Viewport::default(),
        }
    }

    #[must_use]
    pub fn navigator(&self) -> &PageNavigator {
        &self.navigator
    }

    /// Cache shared with this display's background prefetcher
    #[must_use]
    pub fn cache(&self) -> &Arc<Mutex<PageCache>> {
        &self.cache
    }

    /// Last viewport reported by the host
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

/// A page ready to be presented
#[derive(Clone, Debug)]
pub struct Frame {
    pub page: usize,
    pub geometry: Geometry,
    pub surface: Arc<Surface>,
}

/// Requests coming from the display hosts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Move both displays forward by a page count
    Advance(usize),
    /// Move both displays back by a page count
    Retreat(usize),
    /// Advance by the configured slide step
    NextSlide,
    /// Retreat by the configured slide step
    PreviousSlide,
    /// Put the main display on a page, the notes display at the same offset
    GoToPage(usize),
    /// A host's drawable area changed
    Resize { role: DisplayRole, viewport: Viewport },
    ToggleFullscreen,
    /// A host window was closed
    Close,
}

/// Work the hosts must carry out after a command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Request a new frame for this display
    Redraw(DisplayRole),
    /// Enter or leave fullscreen on both displays
    SetFullscreen(bool),
    /// Warm the cache for a page this display is likely to show next
    Prefetch { role: DisplayRole, page: usize },
    Quit,
}

/// Owns both displays and broadcasts every navigation command to them.
///
/// The two navigators are stepped independently, each under its own bounds.
/// Their distance is only guaranteed at construction: once one of them hits a
/// boundary the other may keep moving, and nothing re-derives one index from
/// the other.
pub struct Coordinator {
    document: Rc<dyn Document>,
    config: CoordinatorConfig,
    main: Display,
    notes: Display,
    fullscreen: bool,
}

impl Coordinator {
    /// Main display at page 0, notes display at `display_offset`.
    /// Returns `None` for a document without pages.
    #[must_use]
    pub fn new(document: Rc<dyn Document>, config: CoordinatorConfig) -> Option<Self> {
        let page_count = document.page_count();
        let main = PageNavigator::new(page_count, config.policy)?;
        let notes = main.clone().starting_at(config.display_offset);

        info!(
            "coordinating {page_count} pages: offset {}, step {}, {} at boundaries",
            config.display_offset,
            config.step,
            config.policy.as_str()
        );

        Some(Self {
            document,
            config,
            main: Display::new(main),
            notes: Display::new(notes),
            fullscreen: false,
        })
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::Advance(step) => {
                let moved = self.advance(step);
                self.navigation_effects(moved)
            }
            Command::Retreat(step) => {
                let moved = self.retreat(step);
                self.navigation_effects(moved)
            }
            Command::NextSlide => {
                let moved = self.next_slide();
                self.navigation_effects(moved)
            }
            Command::PreviousSlide => {
                let moved = self.previous_slide();
                self.navigation_effects(moved)
            }
            Command::GoToPage(page) => {
                let moved = self.go_to_page(page);
                self.navigation_effects(moved)
            }

            Command::Resize { role, viewport } => {
                let display = self.display_mut(role);
                if display.viewport == viewport {
                    vec![]
                } else {
                    display.viewport = viewport;
                    let mut effects = vec![Effect::Redraw(role)];
                    effects.extend(self.prefetch_effect(role));
                    effects
                }
            }

            Command::ToggleFullscreen => vec![Effect::SetFullscreen(self.toggle_fullscreen())],

            Command::Close => vec![Effect::Quit],
        }
    }

    /// Step both displays forward. Returns the displays whose page changed.
    pub fn advance(&mut self, step: usize) -> Vec<DisplayRole> {
        self.step_each(|navigator| navigator.forward(step))
    }

    /// Step both displays back. Returns the displays whose page changed.
    pub fn retreat(&mut self, step: usize) -> Vec<DisplayRole> {
        self.step_each(|navigator| navigator.back(step))
    }

    pub fn next_slide(&mut self) -> Vec<DisplayRole> {
        self.advance(self.config.step)
    }

    pub fn previous_slide(&mut self) -> Vec<DisplayRole> {
        self.retreat(self.config.step)
    }

    /// Jump the main display to `page` and the notes display to
    /// `page + display_offset`, each under the boundary policy
    pub fn go_to_page(&mut self, page: usize) -> Vec<DisplayRole> {
        let notes_page = page.saturating_add(self.config.display_offset);
        let mut moved = Vec::with_capacity(2);
        if self.main.navigator.set_page(page) {
            moved.push(DisplayRole::Main);
        }
        if self.notes.navigator.set_page(notes_page) {
            moved.push(DisplayRole::Notes);
        }
        moved
    }

    /// Flip the fullscreen flag shared by both hosts. Returns the new state.
    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        debug!("fullscreen {}", self.fullscreen);
        self.fullscreen
    }

    /// Produce the frame `role` should present in `viewport`.
    ///
    /// `Ok(None)` means the viewport or page has no drawable area yet; the
    /// host should keep whatever it shows and wait for the next resize.
    pub fn frame(
        &mut self,
        role: DisplayRole,
        viewport: Viewport,
    ) -> Result<Option<Frame>, RenderError> {
        let document = Rc::clone(&self.document);
        let display = self.display_mut(role);
        display.viewport = viewport;

        let page = display.navigator.current_index();
        let geometry = compute_geometry(display.navigator.current_page(document.as_ref()), viewport);
        if !geometry.is_drawable() {
            debug!("{} display not drawable at {viewport:?}", role.label());
            return Ok(None);
        }

        let surface = display
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_surface(page, &geometry, document.as_ref())?;

        Ok(Some(Frame {
            page,
            geometry,
            surface,
        }))
    }

    /// Geometry the page after the next step would use in this display's
    /// current viewport, paired with that page
    #[must_use]
    pub fn prefetch_target(&self, role: DisplayRole) -> Option<(usize, Geometry)> {
        let display = self.display(role);
        let page = display
            .navigator
            .current_index()
            .checked_add(self.config.step)
            .filter(|&page| page < display.navigator.page_count())?;
        let geometry = compute_geometry(self.document.page_size(page), display.viewport);
        geometry.is_drawable().then_some((page, geometry))
    }

    /// Main display page of the last slide: the highest multiple of the
    /// slide step inside the document
    #[must_use]
    pub fn last_slide_page(&self) -> usize {
        let last = self.main.navigator.page_count() - 1;
        match self.config.step {
            0 => last,
            step => last / step * step,
        }
    }

    #[must_use]
    pub fn display(&self, role: DisplayRole) -> &Display {
        match role {
            DisplayRole::Main => &self.main,
            DisplayRole::Notes => &self.notes,
        }
    }

    #[must_use]
    pub fn current_index(&self, role: DisplayRole) -> usize {
        self.display(role).navigator.current_index()
    }

    /// Current `(main, notes)` page indices
    #[must_use]
    pub fn indices(&self) -> (usize, usize) {
        (
            self.current_index(DisplayRole::Main),
            self.current_index(DisplayRole::Notes),
        )
    }

    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    #[must_use]
    pub fn config(&self) -> CoordinatorConfig {
        self.config
    }

    #[must_use]
    pub fn document(&self) -> &Rc<dyn Document> {
        &self.document
    }

    fn display_mut(&mut self, role: DisplayRole) -> &mut Display {
        match role {
            DisplayRole::Main => &mut self.main,
            DisplayRole::Notes => &mut self.notes,
        }
    }

    fn step_each(
        &mut self,
        mut step: impl FnMut(&mut PageNavigator) -> bool,
    ) -> Vec<DisplayRole> {
        let mut moved = Vec::with_capacity(2);
        for role in DisplayRole::ALL {
            if step(&mut self.display_mut(role).navigator) {
                moved.push(role);
            }
        }
        debug!("pages now {:?}", self.indices());
        moved
    }

    fn navigation_effects(&self, moved: Vec<DisplayRole>) -> Vec<Effect> {
        let mut effects: Vec<Effect> = moved.iter().map(|&role| Effect::Redraw(role)).collect();
        for role in moved {
            effects.extend(self.prefetch_effect(role));
        }
        effects
    }

    fn prefetch_effect(&self, role: DisplayRole) -> Option<Effect> {
        self.prefetch_target(role)
            .map(|(page, _)| Effect::Prefetch { role, page })
    }
}
