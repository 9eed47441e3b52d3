//! Keyboard shortcuts for the timer.
//!
//! Maps key presses to timer actions based on the current state:
//! - Space: start, pause or resume
//! - Escape: cancel the interval in progress
//!
//! Both are ignored while focus is in a text-entry field, so typing a
//! space into a duration field never toggles the timer.

use std::fmt;

use crate::types::TimerState;

// ============================================================================
// Key events
// ============================================================================

/// Key identity, reduced to what the shortcuts care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Space,
    Escape,
    Char(char),
    Other,
}

/// Where keyboard focus was when the key was pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusTarget {
    /// Single-line text entry
    TextInput,
    /// Multi-line text entry
    TextArea,
    /// Anywhere else
    #[default]
    Elsewhere,
}

impl FocusTarget {
    /// Returns true if keystrokes belong to a text field.
    pub fn is_text_entry(&self) -> bool {
        matches!(self, FocusTarget::TextInput | FocusTarget::TextArea)
    }
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub focus: FocusTarget,
}

impl KeyEvent {
    pub fn new(code: KeyCode, focus: FocusTarget) -> Self {
        Self { code, focus }
    }
}

// ============================================================================
// KeyAction
// ============================================================================

/// Timer actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Start,
    Pause,
    Resume,
    Cancel,
}

impl fmt::Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAction::Start => write!(f, "start"),
            KeyAction::Pause => write!(f, "pause"),
            KeyAction::Resume => write!(f, "resume"),
            KeyAction::Cancel => write!(f, "cancel"),
        }
    }
}

/// What to do with a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyDispatch {
    /// Timer action to run, if any
    pub action: Option<KeyAction>,
    /// The key's normal effect must be suppressed
    pub prevent_default: bool,
}

impl KeyDispatch {
    fn ignored() -> Self {
        Self::default()
    }

    /// Returns true if the shortcut consumed the key.
    pub fn is_handled(&self) -> bool {
        self.action.is_some() || self.prevent_default
    }
}

// ============================================================================
// KeyboardController
// ============================================================================

/// Converts key presses into timer actions.
#[derive(Debug, Default)]
pub struct KeyboardController;

impl KeyboardController {
    pub fn new() -> Self {
        Self
    }

    /// Decides what a key press means in `state`.
    pub fn handle(&self, event: &KeyEvent, state: TimerState) -> KeyDispatch {
        if event.focus.is_text_entry() {
            return KeyDispatch::ignored();
        }

        match event.code {
            KeyCode::Space => KeyDispatch {
                action: Some(match state {
                    TimerState::Idle => KeyAction::Start,
                    TimerState::Running => KeyAction::Pause,
                    TimerState::Paused => KeyAction::Resume,
                }),
                prevent_default: true,
            },
            KeyCode::Escape if state.is_active() => KeyDispatch {
                action: Some(KeyAction::Cancel),
                prevent_default: false,
            },
            _ => KeyDispatch::ignored(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
