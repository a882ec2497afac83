use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DriverError, LocatorError};

// ============================================================================
// Selector
// ============================================================================

/// A descriptor used to locate a UI element.
///
/// Written in the familiar WebdriverIO shorthand:
/// - `~Register`: accessibility id (Flutter `Semantics` label / content-desc)
/// - `//android.widget.EditText[@hint="e.g. John"]`, `/hierarchy/...`, `./x`: XPath
/// - `android=new UiSelector().textContains("Residence")`: UiAutomator
/// - `id=com.example:id/submit` or bare text: resource id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selector {
    AccessibilityId(String),
    XPath(String),
    UiAutomator(String),
    ResourceId(String),
}

impl Selector {
    pub fn parse(raw: &str) -> Result<Self, LocatorError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(LocatorError::EmptySelector);
        }

        let selector = if let Some(label) = raw.strip_prefix('~') {
            Selector::AccessibilityId(label.to_string())
        } else if is_xpath(raw) {
            Selector::XPath(raw.to_string())
        } else if let Some(expr) = raw.strip_prefix("android=") {
            Selector::UiAutomator(expr.to_string())
        } else if let Some(id) = raw.strip_prefix("id=") {
            Selector::ResourceId(id.to_string())
        } else {
            Selector::ResourceId(raw.to_string())
        };

        if selector.value().is_empty() {
            return Err(LocatorError::EmptySelector);
        }
        Ok(selector)
    }

    /// Parse a list of candidate strings, preserving order.
    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Self>, LocatorError> {
        raw.iter().map(|s| Selector::parse(s.as_ref())).collect()
    }

    /// W3C `using` strategy understood by Appium.
    pub fn strategy(&self) -> &'static str {
        match self {
            Selector::AccessibilityId(_) => "accessibility id",
            Selector::XPath(_) => "xpath",
            Selector::UiAutomator(_) => "-android uiautomator",
            Selector::ResourceId(_) => "id",
        }
    }

    /// Same strategy, different value.
    pub fn with_value(&self, value: String) -> Selector {
        match self {
            Selector::AccessibilityId(_) => Selector::AccessibilityId(value),
            Selector::XPath(_) => Selector::XPath(value),
            Selector::UiAutomator(_) => Selector::UiAutomator(value),
            Selector::ResourceId(_) => Selector::ResourceId(value),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Selector::AccessibilityId(v)
            | Selector::XPath(v)
            | Selector::UiAutomator(v)
            | Selector::ResourceId(v) => v,
        }
    }
}

/// Absolute, relative and parenthesised location paths.
fn is_xpath(raw: &str) -> bool {
    let path = raw.strip_prefix('(').unwrap_or(raw);
    path.starts_with('/') || path.starts_with("./")
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::AccessibilityId(v) => write!(f, "~{}", v),
            Selector::XPath(v) => write!(f, "{}", v),
            Selector::UiAutomator(v) => write!(f, "android={}", v),
            Selector::ResourceId(v) => write!(f, "id={}", v),
        }
    }
}

impl FromStr for Selector {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl TryFrom<String> for Selector {
    type Error = LocatorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Selector::parse(&value)
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.to_string()
    }
}

// ============================================================================
// Element handles and geometry
// ============================================================================

/// Opaque reference to a located element at a point in time.
///
/// Handles are not kept across scrolls: a recycled list item may now show
/// different content, so callers re-resolve after every scroll.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        ElementHandle(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Point at the given fractions of width and height.
    pub fn point_at(&self, x_fraction: f64, y_fraction: f64) -> Point {
        Point {
            x: (self.width as f64 * x_fraction).round() as i32,
            y: (self.height as f64 * y_fraction).round() as i32,
        }
    }
}

// ============================================================================
// Driver trait
// ============================================================================

/// The UI automation boundary.
///
/// One instance drives one device. Every call is a blocking round trip that
/// completes before the next begins; implementations need no locking.
pub trait Driver {
    /// Locate the first element matching `selector`. `Ok(None)` when absent.
    fn find(&mut self, selector: &Selector) -> Result<Option<ElementHandle>, DriverError>;

    /// Locate every element matching `selector`, in document order.
    fn find_all(&mut self, selector: &Selector) -> Result<Vec<ElementHandle>, DriverError>;

    fn is_visible(&mut self, element: &ElementHandle) -> Result<bool, DriverError>;

    fn tap(&mut self, element: &ElementHandle) -> Result<(), DriverError>;

    fn clear_text(&mut self, element: &ElementHandle) -> Result<(), DriverError>;

    fn set_text(&mut self, element: &ElementHandle, text: &str) -> Result<(), DriverError>;

    fn get_text(&mut self, element: &ElementHandle) -> Result<String, DriverError>;

    /// Read an element attribute such as `content-desc` or `clickable`.
    fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    fn viewport(&mut self) -> Result<Viewport, DriverError>;

    fn perform_swipe(&mut self, from: Point, to: Point, duration_ms: u64)
    -> Result<(), DriverError>;

    /// Tap at absolute screen coordinates.
    fn tap_point(&mut self, point: Point) -> Result<(), DriverError>;

    fn is_soft_input_shown(&mut self) -> Result<bool, DriverError>;

    /// Hide the on-screen keyboard. Returns whether one was hidden.
    fn hide_soft_input(&mut self) -> Result<bool, DriverError>;

    /// PNG bytes of the current screen.
    fn screenshot(&mut self) -> Result<Vec<u8>, DriverError>;

    /// UI hierarchy dump of the current screen.
    fn page_source(&mut self) -> Result<String, DriverError>;

    fn pause(&mut self, ms: u64);
}
