//! Merger lifecycle states.

use serde::Serialize;

/// Lifecycle of a merger.
///
/// `Idle → Reading ⇄ WaitingForData → Closed`. `Paused` is entered and left
/// explicitly; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergerState {
    /// Built but no step has run yet.
    Idle,
    /// Gathering candidates and selecting.
    Reading,
    /// No candidate is ready; waiting for data, a new feed, or close.
    WaitingForData,
    /// Held by `pause()` until `resume()`.
    Paused,
    Closed,
}

impl MergerState {
    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }
}
