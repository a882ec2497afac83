use serde::{Deserialize, Serialize};

use crate::driver::adapter::{ElementHandle, Selector};

/// A visible element found by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub handle: ElementHandle,

    /// Candidate that matched
    pub selector: Selector,

    /// Position of that candidate in the caller's list
    pub candidate_index: usize,
}

/// Phases of a scroll-retry search.
///
/// `Init -> Searching -> Found`, or
/// `Searching -> Scrolling -> Searching -> ... -> Exhausted`.
/// `Found` and `Exhausted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchPhase {
    Init,
    Searching,
    Scrolling,
    Found,
    Exhausted,
}

impl SearchPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchPhase::Found | SearchPhase::Exhausted)
    }
}

/// Call-local bookkeeping for one scroll-retry search.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollAttemptState {
    /// Scroll gestures performed successfully
    pub attempts_made: u32,
    pub max_attempts: u32,
    pub phase: SearchPhase,

    /// The last scroll gesture was rejected by the driver
    pub gesture_failed: bool,
}

impl ScrollAttemptState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts_made: 0,
            max_attempts,
            phase: SearchPhase::Init,
            gesture_failed: false,
        }
    }

    pub fn can_scroll(&self) -> bool {
        !self.gesture_failed && self.attempts_made < self.max_attempts
    }
}

/// Outcome of a scroll-retry search. `located: None` is the normal
/// "not found" result, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSearch {
    pub located: Option<Located>,
    pub state: ScrollAttemptState,
}

impl ScrollSearch {
    pub fn found(&self) -> bool {
        self.located.is_some()
    }

    pub fn scrolls(&self) -> u32 {
        self.state.attempts_made
    }
}

/// Outcome of filling a text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFillResult {
    pub filled: bool,

    /// Value read back after the last write, when verification was requested
    pub verified_value: Option<String>,

    /// Clear/set cycles performed (0 when the field was never found)
    pub write_attempts: u32,
}

impl FieldFillResult {
    pub fn not_found() -> Self {
        Self {
            filled: false,
            verified_value: None,
            write_attempts: 0,
        }
    }
}

/// How a preferred dropdown option is matched against option labels.
/// Both modes are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionMatch {
    Exact(String),
    Contains(String),
}

impl OptionMatch {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            OptionMatch::Exact(text) => label == text,
            OptionMatch::Contains(text) => label.contains(text.as_str()),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            OptionMatch::Exact(text) | OptionMatch::Contains(text) => text,
        }
    }
}

/// The dropdown option that was tapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub label: String,

    /// Position among the valid (non-sentinel) options
    pub index: usize,

    /// False when the fallback policy chose the option
    pub matched_preferred: bool,
}

/// Outcome of scrolling towards the end of a scrollable region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollToEnd {
    /// Target became visible, or the end of the region was detected
    pub reached: bool,
    pub scrolls: u32,
}

/// A visible validation hint matched by a caller-supplied probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    pub selector: Selector,
    pub text: String,
}
