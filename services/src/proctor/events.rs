//! Input events for the proctored session state machine.

use serde::Deserialize;

/// Environment signals that all mean "the student left the secure context".
///
/// Browsers report leaving fullscreen, switching tabs, and unfocusing the
/// window through different APIs; the state machine treats them as one logical
/// focus-loss event and debounces overlapping signals from the same episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusSignal {
    FullscreenExited,
    VisibilityHidden,
    WindowBlurred,
}

impl FocusSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusSignal::FullscreenExited => "fullscreen_exited",
            FocusSignal::VisibilityHidden => "visibility_hidden",
            FocusSignal::WindowBlurred => "window_blurred",
        }
    }
}

/// Direction of question navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavDirection {
    Previous,
    Next,
}

/// One input to [`super::ProctorSession::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The client confirmed fullscreen; arms violation detection and starts
    /// the timer.
    EnterSecureMode,
    /// Any [`FocusSignal`], already collapsed.
    FocusLost,
    /// The student picked `option` for the question at `question_index`.
    SelectAnswer { question_index: usize, option: String },
    /// Move the current-question pointer one step.
    Navigate(NavDirection),
    /// One second of wall clock elapsed.
    Tick,
    /// Explicit submission.
    Submit,
}

impl From<FocusSignal> for SessionEvent {
    fn from(signal: FocusSignal) -> Self {
        log::debug!("focus signal received: {}", signal.as_str());
        SessionEvent::FocusLost
    }
}
