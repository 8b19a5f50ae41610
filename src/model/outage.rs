use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed time interval during which a client expects downtime
///
/// `start <= end` is not enforced here; the validator rejects inverted windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutageWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl OutageWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `at` lies inside the window, both ends inclusive
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// Whether the window is in effect right now
    pub fn is_active(&self) -> bool {
        self.contains(Utc::now())
    }

    pub fn is_well_formed(&self) -> bool {
        self.start <= self.end
    }
}
