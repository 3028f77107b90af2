//! Input mapping from window events to presenter actions

use winit::event::MouseButton;
use winit::keyboard::{Key, NamedKey};

/// What the presenter should do in response to one input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Forward by one slide step
    Next,
    /// Back by one slide step
    Previous,
    /// First slide
    First,
    /// Last slide
    Last,
    ToggleFullscreen,
    Quit,
}

/// Map a logical key press to an action.
///
/// Rightward or downward movement advances, leftward or upward movement
/// goes back.
pub fn action_for_key(key: &Key) -> Option<Action> {
    match key {
        Key::Named(named) => match named {
            NamedKey::ArrowRight | NamedKey::ArrowDown | NamedKey::PageDown | NamedKey::Space => {
                Some(Action::Next)
            }
            NamedKey::ArrowLeft | NamedKey::ArrowUp | NamedKey::PageUp | NamedKey::Backspace => {
                Some(Action::Previous)
            }
            NamedKey::Home => Some(Action::First),
            NamedKey::End => Some(Action::Last),
            NamedKey::F11 => Some(Action::ToggleFullscreen),
            NamedKey::Escape => Some(Action::Quit),
            _ => None,
        },
        Key::Character(text) => match text.as_str() {
            "f" | "F" => Some(Action::ToggleFullscreen),
            "q" | "Q" => Some(Action::Quit),
            _ => None,
        },
        _ => None,
    }
}

/// Primary button advances, secondary button goes back
pub fn action_for_button(button: MouseButton) -> Option<Action> {
    match button {
        MouseButton::Left => Some(Action::Next),
        MouseButton::Right => Some(Action::Previous),
        _ => None,
    }
}
