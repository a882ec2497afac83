use serde::{Deserialize, Serialize};

use crate::driver::adapter::{Point, Selector, Viewport};

/// Timings and policies for every locator operation.
///
/// The fixed delays are animation settle times observed on Flutter builds,
/// not a substitute for polling: readiness is always checked by polling
/// through the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorSettings {
    /// Pause between resolver poll cycles
    pub poll_interval_ms: u64,

    /// Resolver timeout used between scrolls
    pub probe_timeout_ms: u64,

    pub max_scroll_attempts: u32,

    /// Wait after a swipe for the fling to settle
    pub scroll_settle_ms: u64,

    /// Wait after hiding the keyboard for the viewport to resize
    pub keyboard_hide_delay_ms: u64,

    /// Wait after tapping a field for focus to move
    pub focus_settle_ms: u64,

    /// Wait after typing before reading the value back
    pub type_settle_ms: u64,

    /// Re-resolve attempts when a tap hits a stale element
    pub tap_retries: u32,

    /// Screenshot before and after every scroll (needs an artifact sink)
    pub capture_scroll_screenshots: bool,

    /// Tap here when the driver cannot hide the keyboard
    pub keyboard_fallback_tap: Option<Point>,

    pub gesture: ScrollGesture,

    pub dropdown: DropdownSettings,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            probe_timeout_ms: 2000,
            max_scroll_attempts: 5,
            scroll_settle_ms: 1500,
            keyboard_hide_delay_ms: 500,
            focus_settle_ms: 500,
            type_settle_ms: 1000,
            tap_retries: 3,
            capture_scroll_screenshots: false,
            keyboard_fallback_tap: None,
            gesture: ScrollGesture::default(),
            dropdown: DropdownSettings::default(),
        }
    }
}

/// Fixed-vector vertical swipe, expressed as fractions of the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollGesture {
    pub x_fraction: f64,
    pub from_y_fraction: f64,
    pub to_y_fraction: f64,
    pub duration_ms: u64,
}

impl Default for ScrollGesture {
    fn default() -> Self {
        Self {
            x_fraction: 0.5,
            from_y_fraction: 0.75,
            to_y_fraction: 0.25,
            duration_ms: 1000,
        }
    }
}

impl ScrollGesture {
    /// Start and end points of the swipe on the given viewport.
    pub fn points(&self, viewport: &Viewport) -> (Point, Point) {
        (
            viewport.point_at(self.x_fraction, self.from_y_fraction),
            viewport.point_at(self.x_fraction, self.to_y_fraction),
        )
    }
}

/// How dropdown options are enumerated and picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropdownSettings {
    /// Wait after opening the dropdown for the option list to render
    pub settle_ms: u64,

    /// Query matching every candidate option element
    pub option_selector: Selector,

    /// Attribute carrying the option label
    pub label_attribute: String,

    /// Labels of decorative elements that match the option query
    pub sentinel_labels: Vec<String>,

    /// Skip options whose `clickable` attribute is not "true"
    pub require_clickable: bool,

    pub fallback: FallbackPolicy,
}

impl Default for DropdownSettings {
    fn default() -> Self {
        Self {
            settle_ms: 2000,
            option_selector: Selector::XPath("//android.view.View[@clickable=\"true\"]".into()),
            label_attribute: "content-desc".into(),
            sentinel_labels: vec!["Scrim".into()],
            require_clickable: true,
            fallback: FallbackPolicy::First,
        }
    }
}

/// Which option to pick when no preferred option matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// First valid option in list order
    #[default]
    First,

    /// Option at `seed % option_count`, for reproducible coverage sweeps
    Seeded(u64),
}

impl FallbackPolicy {
    pub fn pick(&self, option_count: usize) -> Option<usize> {
        if option_count == 0 {
            return None;
        }
        match self {
            FallbackPolicy::First => Some(0),
            FallbackPolicy::Seeded(seed) => Some((*seed % option_count as u64) as usize),
        }
    }
}
