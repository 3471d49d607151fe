use std::time::Duration;

use time::OffsetDateTime;

use crate::error::ModelError;

/// Absolute time range scanned by one metrics request.
///
/// Invariant: `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    duration: Duration,
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl TimeWindow {
    /// Scan duration used when a request does not name one.
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(60 * 60);

    pub fn new(duration: Duration, end: OffsetDateTime) -> Result<Self, ModelError> {
        if duration.is_zero() {
            return Err(ModelError::EmptyWindow);
        }
        let span = time::Duration::try_from(duration).map_err(|_| ModelError::WindowOutOfRange)?;
        let start = end
            .checked_sub(span)
            .ok_or(ModelError::WindowOutOfRange)?;

        Ok(Self {
            duration,
            start,
            end,
        })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    pub fn end(&self) -> OffsetDateTime {
        self.end
    }

    /// Unix seconds of the window start.
    pub fn start_unix(&self) -> i64 {
        self.start.unix_timestamp()
    }

    /// Unix seconds of the window end.
    pub fn end_unix(&self) -> i64 {
        self.end.unix_timestamp()
    }
}
