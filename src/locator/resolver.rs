use std::time::{Duration, Instant};

use tracing::debug;

use crate::driver::adapter::Selector;
use crate::error::LocatorError;
use crate::locator::Locator;
use crate::locator::model::Located;

impl Locator<'_> {
    /// Return the first candidate that resolves to a visible element.
    ///
    /// Candidates are tried in order on every poll cycle, so an earlier
    /// candidate always wins over a later one visible at the same time.
    /// Cycles repeat every `poll_interval_ms` until `timeout_ms` is spent;
    /// a zero timeout makes exactly one pass.
    ///
    /// `Ok(None)` means nothing became visible in time.
    pub fn resolve(
        &mut self,
        candidates: &[Selector],
        timeout_ms: u64,
    ) -> Result<Option<Located>, LocatorError> {
        if candidates.is_empty() {
            return Err(LocatorError::NoCandidates);
        }

        let poll_ms = self.settings.poll_interval_ms.max(1);
        let max_cycles = timeout_ms.div_ceil(poll_ms).max(1);
        let deadline = Duration::from_millis(timeout_ms);
        let started = Instant::now();

        for cycle in 0..max_cycles {
            if let Some(located) = self.probe(candidates)? {
                debug!(
                    selector = %located.selector,
                    candidate = located.candidate_index,
                    cycle,
                    "resolved"
                );
                return Ok(Some(located));
            }

            if cycle + 1 >= max_cycles || started.elapsed() >= deadline {
                break;
            }
            self.driver.pause(poll_ms);
        }

        Ok(None)
    }

    /// One pass over the candidates. Lookup errors count as "no match"
    /// except a lost session, which no amount of polling will fix.
    fn probe(&mut self, candidates: &[Selector]) -> Result<Option<Located>, LocatorError> {
        for (index, selector) in candidates.iter().enumerate() {
            let handle = match self.driver.find(selector) {
                Ok(Some(handle)) => handle,
                Ok(None) => continue,
                Err(e) if e.is_session_lost() => return Err(e.into()),
                Err(e) => {
                    debug!(%selector, "lookup failed: {}", e);
                    continue;
                }
            };

            match self.driver.is_visible(&handle) {
                Ok(true) => {
                    return Ok(Some(Located {
                        handle,
                        selector: selector.clone(),
                        candidate_index: index,
                    }));
                }
                Ok(false) => {}
                Err(e) if e.is_session_lost() => return Err(e.into()),
                Err(e) => debug!(%selector, "visibility check failed: {}", e),
            }
        }
        Ok(None)
    }
}
