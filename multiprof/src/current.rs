use std::time::SystemTime;

use crate::model::Timestamp;

/// Current system state useful in lifecycle and collection decisions
///
/// Currently this struct only contains the current system time. A garbage
/// collection sweep captures it once so every entry is judged against the
/// same instant.
#[derive(Clone, Debug)]
pub struct Current {
    pub now: SystemTime,
}

impl Default for Current {
    fn default() -> Self {
        Self::new()
    }
}

impl Current {
    pub fn new() -> Self {
        Self {
            now: SystemTime::now(),
        }
    }

    pub fn at(now: SystemTime) -> Self {
        Self { now }
    }

    pub fn timestamp(&self) -> Timestamp {
        Timestamp::from(self.now)
    }
}
