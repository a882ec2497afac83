use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::driver::adapter::Selector;
use crate::locator::model::{ScrollAttemptState, SearchPhase};

/// One locator state transition, written as a JSONL line.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub sequence: u64,

    pub phase: String,

    pub candidates: Vec<String>,
    pub matched: Option<String>,

    pub attempt: Option<u32>,
    pub max_attempts: Option<u32>,

    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn now(sequence: u64, phase: SearchPhase) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            sequence,
            phase: format!("{:?}", phase),
            candidates: vec![],
            matched: None,
            attempt: None,
            max_attempts: None,
            detail: None,
        }
    }

    pub fn with_candidates(mut self, candidates: &[Selector]) -> Self {
        self.candidates = candidates.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_matched(mut self, selector: &Selector) -> Self {
        self.matched = Some(selector.to_string());
        self
    }

    pub fn with_attempts(mut self, state: &ScrollAttemptState) -> Self {
        self.attempt = Some(state.attempts_made);
        self.max_attempts = Some(state.max_attempts);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
