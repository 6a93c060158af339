//! Evaluation window and session open for a replay run.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ReplayError;

/// Inclusive `[start, end]` evaluation window plus the time from which bars
/// accumulate. All times are exchange local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayWindow {
    start: NaiveTime,
    end: NaiveTime,
    session_open: NaiveTime,
}

/// Only called with literal in-range times.
pub(crate) fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

pub fn default_session_open() -> NaiveTime {
    hm(9, 30)
}

impl ReplayWindow {
    /// Window with the default 09:30 session open.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ReplayError> {
        Self::with_open(start, end, default_session_open())
    }

    /// Rejects `start > end` and a window starting before `session_open`.
    pub fn with_open(
        start: NaiveTime,
        end: NaiveTime,
        session_open: NaiveTime,
    ) -> Result<Self, ReplayError> {
        if start > end {
            return Err(ReplayError::InvalidWindow { start, end });
        }
        if start < session_open {
            return Err(ReplayError::WindowBeforeOpen {
                start,
                session_open,
            });
        }
        Ok(Self {
            start,
            end,
            session_open,
        })
    }

    /// Bars before `open` are auction prints and never accumulate.
    pub fn with_session_open(self, open: NaiveTime) -> Result<Self, ReplayError> {
        Self::with_open(self.start, self.end, open)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn session_open(&self) -> NaiveTime {
        self.session_open
    }

    /// Inclusive at both ends.
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t <= self.end
    }
}

impl Default for ReplayWindow {
    /// 13:00 to 15:00, session open 09:30.
    fn default() -> Self {
        Self {
            start: hm(13, 0),
            end: hm(15, 0),
            session_open: default_session_open(),
        }
    }
}
