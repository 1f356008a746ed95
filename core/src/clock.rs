//! Release clock: owns "now" for every timestamp a release writes.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseClock {
    /// Wall-clock UTC.
    #[default]
    System,
    /// Pinned instant (tests and replays).
    Fixed(DateTime<Utc>),
}

impl ReleaseClock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(at) => *at,
        }
    }
}
