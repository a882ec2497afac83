use tracing::{info, warn};

use crate::driver::adapter::Selector;
use crate::error::LocatorError;
use crate::locator::Locator;
use crate::locator::model::FieldFillResult;

/// Clear/set cycles allowed when the read-back does not match.
/// Flutter text fields sometimes drop the first keystrokes sent right
/// after focus moves; a second write lands reliably.
const VERIFIED_WRITE_ATTEMPTS: u32 = 2;

impl Locator<'_> {
    /// Scroll to a text field, focus it, replace its content with `value`
    /// and optionally read it back.
    ///
    /// A missing field or a value that still reads back wrong after the retry
    /// is reported with `filled: false`; only gesture failures are errors.
    pub fn fill_field(
        &mut self,
        candidates: &[Selector],
        value: &str,
        verify: bool,
    ) -> Result<FieldFillResult, LocatorError> {
        let search = self.locate_with_scroll(candidates)?;
        let Some(located) = search.located else {
            warn!(field = %candidates[0], "field not found, nothing written");
            return Ok(FieldFillResult::not_found());
        };
        let handle = located.handle;

        self.driver
            .tap(&handle)
            .map_err(|e| LocatorError::gesture("tap", e))?;
        self.driver.pause(self.settings.focus_settle_ms);

        let max_writes = if verify { VERIFIED_WRITE_ATTEMPTS } else { 1 };
        let mut read_back = None;

        for attempt in 1..=max_writes {
            self.driver
                .clear_text(&handle)
                .map_err(|e| LocatorError::gesture("clear", e))?;
            self.driver
                .set_text(&handle, value)
                .map_err(|e| LocatorError::gesture("set_text", e))?;
            self.driver.pause(self.settings.type_settle_ms);

            if !verify {
                info!(field = %located.selector, "field filled");
                return Ok(FieldFillResult {
                    filled: true,
                    verified_value: None,
                    write_attempts: attempt,
                });
            }

            let actual = self.driver.get_text(&handle)?;
            if actual == value {
                info!(field = %located.selector, attempt, "field filled and verified");
                return Ok(FieldFillResult {
                    filled: true,
                    verified_value: Some(actual),
                    write_attempts: attempt,
                });
            }

            warn!(
                field = %located.selector,
                attempt,
                expected = value,
                actual = %actual,
                "read-back mismatch"
            );
            read_back = Some(actual);
        }

        Ok(FieldFillResult {
            filled: false,
            verified_value: read_back,
            write_attempts: max_writes,
        })
    }
}
