use tracing::{debug, info, warn};

use crate::driver::adapter::{ElementHandle, Selector};
use crate::error::{DriverError, LocatorError};
use crate::locator::Locator;
use crate::locator::model::{OptionMatch, SelectedOption};
use crate::locator::settings::DropdownSettings;

impl Locator<'_> {
    /// Open a dropdown and tap one of its options.
    ///
    /// The preferred option wins when it is offered; otherwise the fallback
    /// policy picks one (the first valid option by default), so repeated runs
    /// select the same thing. Returns `Ok(None)` when the trigger cannot be
    /// found or the list renders no valid options.
    pub fn select_from_dropdown(
        &mut self,
        trigger: &[Selector],
        preferred: Option<&OptionMatch>,
    ) -> Result<Option<SelectedOption>, LocatorError> {
        let search = self.locate_with_scroll(trigger)?;
        let Some(located) = search.located else {
            warn!(dropdown = %trigger[0], "dropdown trigger not found");
            return Ok(None);
        };

        self.hide_keyboard()?;
        self.driver
            .tap(&located.handle)
            .map_err(|e| LocatorError::gesture("tap", e))?;
        self.driver.pause(self.settings.dropdown.settle_ms);

        let mut options = self.enumerate_options()?;
        if options.is_empty() {
            warn!(dropdown = %located.selector, "dropdown opened without selectable options");
            return Ok(None);
        }

        let preferred_index =
            preferred.and_then(|p| options.iter().position(|(label, _)| p.matches(label)));
        let (index, matched_preferred) = match preferred_index {
            Some(index) => (index, true),
            None => {
                if let Some(p) = preferred {
                    warn!(preferred = p.text(), "preferred option not offered, using fallback");
                }
                match self.settings.dropdown.fallback.pick(options.len()) {
                    Some(index) => (index, false),
                    None => return Ok(None),
                }
            }
        };

        let (label, handle) = options.swap_remove(index);
        self.driver
            .tap(&handle)
            .map_err(|e| LocatorError::gesture("tap", e))?;
        info!(dropdown = %located.selector, option = %label, matched_preferred, "option selected");

        Ok(Some(SelectedOption {
            label,
            index,
            matched_preferred,
        }))
    }

    /// Labels of the options currently rendered, in list order.
    pub fn dropdown_options(&mut self) -> Result<Vec<String>, LocatorError> {
        Ok(self
            .enumerate_options()?
            .into_iter()
            .map(|(label, _)| label)
            .collect())
    }

    fn enumerate_options(&mut self) -> Result<Vec<(String, ElementHandle)>, LocatorError> {
        let settings = self.settings.dropdown.clone();
        let handles = self.driver.find_all(&settings.option_selector)?;

        let mut options = Vec::new();
        for handle in handles {
            match self.option_label(&handle, &settings) {
                Ok(Some(label)) => options.push((label, handle)),
                Ok(None) => {}
                Err(e) if e.is_session_lost() => return Err(e.into()),
                Err(e) => debug!(element = %handle, "skipping option: {}", e),
            }
        }
        Ok(options)
    }

    /// Label of a selectable option, or `None` for hidden, disabled and
    /// decorative elements (scrims, separators, empty labels).
    fn option_label(
        &mut self,
        handle: &ElementHandle,
        settings: &DropdownSettings,
    ) -> Result<Option<String>, DriverError> {
        if !self.driver.is_visible(handle)? {
            return Ok(None);
        }
        if settings.require_clickable
            && self.driver.attribute(handle, "clickable")?.as_deref() != Some("true")
        {
            return Ok(None);
        }

        let label = self
            .driver
            .attribute(handle, &settings.label_attribute)?
            .unwrap_or_default();
        let label = label.trim();
        if label.is_empty() || settings.sentinel_labels.iter().any(|s| s == label) {
            return Ok(None);
        }
        Ok(Some(label.to_string()))
    }
}
