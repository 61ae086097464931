//! Relative timestamps between consecutive processed events
use crate::urb::Timestamp;

/// Tracks the previous absolute timestamp of a capture session
#[derive(Debug, Default, Clone)]
pub struct TimestampTracker {
    previous: Option<Timestamp>,
}

impl TimestampTracker {
    /// New tracker with no baseline
    pub fn new() -> Self {
        Default::default()
    }

    /// Seconds since the previously observed timestamp; exactly zero for the first call
    ///
    /// The difference is taken in whole microseconds before conversion so no precision is lost to
    /// the magnitude of epoch seconds. Always records `ts` as the new baseline.
    pub fn observe(&mut self, ts: Timestamp) -> f64 {
        let delta = match self.previous {
            Some(prev) => (ts.as_micros() - prev.as_micros()) as f64 / 1_000_000.0,
            None => 0.0,
        };
        self.previous = Some(ts);
        delta
    }

    /// Last observed timestamp
    pub fn previous(&self) -> Option<Timestamp> {
        self.previous
    }
}
