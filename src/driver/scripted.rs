use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::adapter::{Driver, ElementHandle, Point, Selector, Viewport};
use crate::error::DriverError;

// ============================================================================
// Screen description (YAML-loadable)
// ============================================================================

/// One element of a scripted screen.
///
/// Elements with a `row` live in the scrollable list and are only displayed
/// while their row is inside the viewport window. Elements without a row are
/// pinned (app bars, floating buttons, dropdown overlays).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptedElement {
    /// Selectors this element answers to
    pub selectors: Vec<Selector>,

    /// `content-desc` attribute
    #[serde(default)]
    pub label: Option<String>,

    /// Initial text content
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub row: Option<u32>,

    #[serde(default)]
    pub editable: bool,

    #[serde(default = "default_true")]
    pub clickable: bool,

    /// Present in the tree but never displayed
    #[serde(default)]
    pub hidden: bool,

    /// Number of leading `set_text` calls whose first keystroke is lost
    #[serde(default)]
    pub drops_first_writes: u32,

    /// Dropdown options rendered in an overlay when this element is tapped
    #[serde(default)]
    pub options: Vec<ScriptedElement>,
}

fn default_true() -> bool {
    true
}

impl ScriptedElement {
    pub fn new(selectors: Vec<Selector>) -> Self {
        ScriptedElement {
            selectors,
            clickable: true,
            ..Default::default()
        }
    }

    pub fn at_row(mut self, row: u32) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn not_clickable(mut self) -> Self {
        self.clickable = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn dropping_first_writes(mut self, count: u32) -> Self {
        self.drops_first_writes = count;
        self
    }

    pub fn with_options(mut self, options: Vec<ScriptedElement>) -> Self {
        self.options = options;
        self
    }
}

/// A scrollable screen for the scripted driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedScreen {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// Rows shown at once
    #[serde(default = "default_rows")]
    pub rows_per_screen: u32,

    /// Rows moved by one swipe
    #[serde(default = "default_rows")]
    pub rows_per_swipe: u32,

    /// Length of the scrollable list; defaults to just past the last row used
    #[serde(default)]
    pub total_rows: Option<u32>,

    pub elements: Vec<ScriptedElement>,
}

fn default_width() -> u32 {
    1080
}
fn default_height() -> u32 {
    2400
}
fn default_rows() -> u32 {
    5
}

impl ScriptedScreen {
    pub fn new(elements: Vec<ScriptedElement>) -> Self {
        ScriptedScreen {
            width: default_width(),
            height: default_height(),
            rows_per_screen: default_rows(),
            rows_per_swipe: default_rows(),
            total_rows: None,
            elements,
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

// ============================================================================
// Call log
// ============================================================================

/// Every call the scripted driver received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Find(String),
    FindAll(String),
    IsVisible(String),
    Tap(String),
    Clear(String),
    SetText(String, String),
    GetText(String),
    Attribute(String, String),
    Viewport,
    Swipe { from: Point, to: Point, duration_ms: u64 },
    TapPoint(Point),
    IsKeyboardShown,
    HideKeyboard { hidden: bool },
    Screenshot,
    PageSource,
    Pause(u64),
}

// ============================================================================
// Driver
// ============================================================================

#[derive(Debug)]
struct ElementState {
    spec: ScriptedElement,
    overlay_of: Option<usize>,
    value: String,
    writes_seen: u32,
}

/// Deterministic in-memory [`Driver`].
///
/// Models the behaviours the locator has to cope with on a real device:
/// off-screen rows, handles going stale after a scroll, a soft keyboard that
/// swallows swipes while it is open, text fields that drop keystrokes, and
/// dropdown overlays with a scrim.
#[derive(Debug)]
pub struct ScriptedDriver {
    elements: Vec<ElementState>,
    width: u32,
    height: u32,
    rows_per_screen: u32,
    rows_per_swipe: u32,
    max_offset: u32,
    offset: u32,
    generation: u64,
    keyboard_shown: bool,
    open_overlay: Option<usize>,
    fail_swipes: bool,
    fail_taps: bool,
    stale_taps: u32,
    fail_keyboard_hide: bool,
    session_lost: bool,
    calls: Vec<DriverCall>,
}

impl ScriptedDriver {
    pub fn new(screen: ScriptedScreen) -> Self {
        let mut elements = Vec::new();
        let mut last_row = 0;

        for spec in screen.elements {
            if let Some(row) = spec.row {
                last_row = last_row.max(row + 1);
            }
            let mut spec = spec;
            let options = std::mem::take(&mut spec.options);
            let parent = elements.len();
            elements.push(ElementState::new(spec, None));
            for option in options {
                elements.push(ElementState::new(option, Some(parent)));
            }
        }

        let total_rows = screen.total_rows.unwrap_or(last_row);
        ScriptedDriver {
            elements,
            width: screen.width,
            height: screen.height,
            rows_per_screen: screen.rows_per_screen.max(1),
            rows_per_swipe: screen.rows_per_swipe.max(1),
            max_offset: total_rows.saturating_sub(screen.rows_per_screen),
            offset: 0,
            generation: 0,
            keyboard_shown: false,
            open_overlay: None,
            fail_swipes: false,
            fail_taps: false,
            stale_taps: 0,
            fail_keyboard_hide: false,
            session_lost: false,
            calls: Vec::new(),
        }
    }

    pub fn with_failing_swipes(mut self) -> Self {
        self.fail_swipes = true;
        self
    }

    pub fn with_failing_taps(mut self) -> Self {
        self.fail_taps = true;
        self
    }

    /// The next `count` element taps find the view re-rendered: they fail
    /// with `StaleElement` and invalidate every handle handed out so far.
    pub fn with_stale_taps(mut self, count: u32) -> Self {
        self.stale_taps = count;
        self
    }

    pub fn with_failing_keyboard_hide(mut self) -> Self {
        self.fail_keyboard_hide = true;
        self
    }

    pub fn with_keyboard_shown(mut self) -> Self {
        self.keyboard_shown = true;
        self
    }

    /// Every subsequent call fails with `SessionLost`.
    pub fn lose_session(&mut self) {
        self.session_lost = true;
    }

    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    pub fn swipe_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DriverCall::Swipe { .. }))
            .count()
    }

    pub fn set_text_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DriverCall::SetText(..)))
            .count()
    }

    pub fn total_paused_ms(&self) -> u64 {
        self.calls
            .iter()
            .map(|c| match c {
                DriverCall::Pause(ms) => *ms,
                _ => 0,
            })
            .sum()
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn keyboard_shown(&self) -> bool {
        self.keyboard_shown
    }

    /// Current value of the first element answering to `selector`.
    pub fn value_of(&self, selector: &Selector) -> Option<&str> {
        self.elements
            .iter()
            .find(|e| e.spec.selectors.contains(selector))
            .map(|e| e.value.as_str())
    }

    fn check_session(&self) -> Result<(), DriverError> {
        if self.session_lost {
            Err(DriverError::SessionLost("scripted session closed".into()))
        } else {
            Ok(())
        }
    }

    fn is_present(&self, index: usize) -> bool {
        match self.elements[index].overlay_of {
            Some(parent) => self.open_overlay == Some(parent),
            None => true,
        }
    }

    fn is_displayed(&self, index: usize) -> bool {
        let element = &self.elements[index];
        if !self.is_present(index) || element.spec.hidden {
            return false;
        }
        if element.overlay_of.is_some() {
            return true;
        }
        match element.spec.row {
            Some(row) => row >= self.offset && row < self.offset + self.rows_per_screen,
            None => true,
        }
    }

    fn handle_for(&self, index: usize) -> ElementHandle {
        ElementHandle::new(format!("{}@{}", index, self.generation))
    }

    fn lookup(&self, handle: &ElementHandle) -> Result<usize, DriverError> {
        let stale = || DriverError::StaleElement(handle.id().to_string());
        let (index, generation) = handle.id().split_once('@').ok_or_else(stale)?;
        let index: usize = index.parse().map_err(|_| stale())?;
        let generation: u64 = generation.parse().map_err(|_| stale())?;

        if generation != self.generation || index >= self.elements.len() || !self.is_present(index)
        {
            return Err(stale());
        }
        Ok(index)
    }

    fn matching(&self, selector: &Selector) -> Vec<usize> {
        (0..self.elements.len())
            .filter(|&i| self.is_present(i) && self.elements[i].spec.selectors.contains(selector))
            .collect()
    }
}

impl ElementState {
    fn new(spec: ScriptedElement, overlay_of: Option<usize>) -> Self {
        let value = spec.text.clone();
        ElementState {
            spec,
            overlay_of,
            value,
            writes_seen: 0,
        }
    }
}

impl Driver for ScriptedDriver {
    fn find(&mut self, selector: &Selector) -> Result<Option<ElementHandle>, DriverError> {
        self.calls.push(DriverCall::Find(selector.to_string()));
        self.check_session()?;
        Ok(self
            .matching(selector)
            .first()
            .map(|&i| self.handle_for(i)))
    }

    fn find_all(&mut self, selector: &Selector) -> Result<Vec<ElementHandle>, DriverError> {
        self.calls.push(DriverCall::FindAll(selector.to_string()));
        self.check_session()?;
        Ok(self
            .matching(selector)
            .into_iter()
            .map(|i| self.handle_for(i))
            .collect())
    }

    fn is_visible(&mut self, element: &ElementHandle) -> Result<bool, DriverError> {
        self.calls.push(DriverCall::IsVisible(element.id().to_string()));
        self.check_session()?;
        let index = self.lookup(element)?;
        Ok(self.is_displayed(index))
    }

    fn tap(&mut self, element: &ElementHandle) -> Result<(), DriverError> {
        self.calls.push(DriverCall::Tap(element.id().to_string()));
        self.check_session()?;
        let index = self.lookup(element)?;
        if self.stale_taps > 0 {
            self.stale_taps -= 1;
            self.generation += 1;
            return Err(DriverError::StaleElement(element.id().to_string()));
        }
        if self.fail_taps {
            return Err(DriverError::command("click", "injected tap failure"));
        }
        if !self.is_displayed(index) {
            return Err(DriverError::command("click", "element not interactable"));
        }

        if let Some(parent) = self.elements[index].overlay_of {
            // Choosing an option writes its label into the trigger and closes the list
            let label = self.elements[index].spec.label.clone().unwrap_or_default();
            self.elements[parent].value = label;
            self.open_overlay = None;
        } else if self.elements.iter().any(|e| e.overlay_of == Some(index)) {
            self.open_overlay = Some(index);
        }

        if self.elements[index].spec.editable {
            self.keyboard_shown = true;
        }
        Ok(())
    }

    fn clear_text(&mut self, element: &ElementHandle) -> Result<(), DriverError> {
        self.calls.push(DriverCall::Clear(element.id().to_string()));
        self.check_session()?;
        let index = self.lookup(element)?;
        self.elements[index].value.clear();
        Ok(())
    }

    fn set_text(&mut self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.calls
            .push(DriverCall::SetText(element.id().to_string(), text.to_string()));
        self.check_session()?;
        let index = self.lookup(element)?;
        let state = &mut self.elements[index];
        state.writes_seen += 1;
        state.value = if state.writes_seen <= state.spec.drops_first_writes {
            text.chars().skip(1).collect()
        } else {
            text.to_string()
        };
        Ok(())
    }

    fn get_text(&mut self, element: &ElementHandle) -> Result<String, DriverError> {
        self.calls.push(DriverCall::GetText(element.id().to_string()));
        self.check_session()?;
        let index = self.lookup(element)?;
        Ok(self.elements[index].value.clone())
    }

    fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        self.calls.push(DriverCall::Attribute(
            element.id().to_string(),
            name.to_string(),
        ));
        self.check_session()?;
        let index = self.lookup(element)?;
        let state = &self.elements[index];
        Ok(match name {
            "content-desc" => state.spec.label.clone(),
            "text" => Some(state.value.clone()),
            "clickable" => Some(state.spec.clickable.to_string()),
            "displayed" => Some(self.is_displayed(index).to_string()),
            _ => None,
        })
    }

    fn viewport(&mut self) -> Result<Viewport, DriverError> {
        self.calls.push(DriverCall::Viewport);
        self.check_session()?;
        Ok(Viewport {
            width: self.width,
            height: self.height,
        })
    }

    fn perform_swipe(
        &mut self,
        from: Point,
        to: Point,
        duration_ms: u64,
    ) -> Result<(), DriverError> {
        self.calls.push(DriverCall::Swipe {
            from,
            to,
            duration_ms,
        });
        self.check_session()?;
        if self.fail_swipes {
            return Err(DriverError::command("perform_actions", "injected swipe failure"));
        }
        if self.keyboard_shown {
            debug!("scripted swipe absorbed by soft keyboard");
            return Ok(());
        }

        let before = self.offset;
        if from.y > to.y {
            self.offset = (self.offset + self.rows_per_swipe).min(self.max_offset);
        } else if from.y < to.y {
            self.offset = self.offset.saturating_sub(self.rows_per_swipe);
        }
        if self.offset != before {
            self.generation += 1;
        }
        Ok(())
    }

    fn tap_point(&mut self, point: Point) -> Result<(), DriverError> {
        self.calls.push(DriverCall::TapPoint(point));
        self.check_session()?;
        self.keyboard_shown = false;
        Ok(())
    }

    fn is_soft_input_shown(&mut self) -> Result<bool, DriverError> {
        self.calls.push(DriverCall::IsKeyboardShown);
        self.check_session()?;
        Ok(self.keyboard_shown)
    }

    fn hide_soft_input(&mut self) -> Result<bool, DriverError> {
        self.check_session()?;
        if self.fail_keyboard_hide && self.keyboard_shown {
            self.calls.push(DriverCall::HideKeyboard { hidden: false });
            return Err(DriverError::command("hide_keyboard", "injected keyboard failure"));
        }
        let hidden = self.keyboard_shown;
        self.keyboard_shown = false;
        self.calls.push(DriverCall::HideKeyboard { hidden });
        Ok(hidden)
    }

    fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        self.calls.push(DriverCall::Screenshot);
        self.check_session()?;
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png.extend_from_slice(&self.offset.to_be_bytes());
        Ok(png)
    }

    fn page_source(&mut self) -> Result<String, DriverError> {
        self.calls.push(DriverCall::PageSource);
        self.check_session()?;
        let mut source = String::from("<hierarchy>\n");
        for index in 0..self.elements.len() {
            if !self.is_displayed(index) {
                continue;
            }
            let state = &self.elements[index];
            let selector = state
                .spec
                .selectors
                .first()
                .map(|s| s.to_string())
                .unwrap_or_default();
            source.push_str(&format!(
                "  <node selector=\"{}\" content-desc=\"{}\" text=\"{}\" />\n",
                selector,
                state.spec.label.as_deref().unwrap_or(""),
                state.value
            ));
        }
        source.push_str("</hierarchy>\n");
        Ok(source)
    }

    fn pause(&mut self, ms: u64) {
        self.calls.push(DriverCall::Pause(ms));
    }
}
