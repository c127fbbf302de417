//! Author priorities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Author-facing priority, strictly between 0 and 1000. Lower runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Priority(i64);

impl Priority {
    pub const DEFAULT: Priority = Priority(500);
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 999;

    pub fn new(value: i64) -> Result<Priority, EngineError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Priority(value))
        } else {
            Err(EngineError::InvalidPriority { priority: value })
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::DEFAULT
    }
}

impl TryFrom<i64> for Priority {
    type Error = EngineError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Priority::new(value)
    }
}

impl From<Priority> for i64 {
    fn from(p: Priority) -> i64 {
        p.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
