//! Time window policy: request parameters to an absolute window and a query step.

use std::time::Duration;

use qdash_model::{ModelError, TimeWindow};
use time::OffsetDateTime;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Point budget for windows longer than thirty days.
const LONG_WINDOW_POINTS: u32 = 3000;

/// Builds the window for a metrics request.
///
/// Absent or empty parameters fall back to the last 60 minutes ending at `now`.
/// Both parameters must be non-negative integers (seconds / unix seconds).
pub fn resolve_window(
    duration: Option<&str>,
    end_time: Option<&str>,
    now: OffsetDateTime,
) -> Result<TimeWindow, ModelError> {
    let duration = match non_empty(duration) {
        Some(raw) => Duration::from_secs(parse_seconds("duration", raw)?),
        None => TimeWindow::DEFAULT_DURATION,
    };
    let end = match non_empty(end_time) {
        Some(raw) => {
            let secs = parse_seconds("endtime", raw)?;
            i64::try_from(secs)
                .ok()
                .and_then(|s| OffsetDateTime::from_unix_timestamp(s).ok())
                .ok_or_else(|| invalid("endtime", raw))?
        }
        None => now,
    };
    TimeWindow::new(duration, end).map_err(|e| match e {
        ModelError::EmptyWindow | ModelError::WindowOutOfRange => {
            invalid("duration", &duration.as_secs().to_string())
        }
        other => other,
    })
}

/// Resolution to request for a window of `duration`.
///
/// The longer the window the coarser the step, which bounds the number of
/// points the backend returns.
pub fn step(duration: Duration) -> Duration {
    if duration <= Duration::from_secs(6 * HOUR) {
        // 6h / 10s = 2160 points
        Duration::from_secs(10)
    } else if duration <= Duration::from_secs(DAY) {
        // 24h / 1m = 1440 points
        Duration::from_secs(MINUTE)
    } else if duration <= Duration::from_secs(8 * DAY) {
        // 8d / 3m = 3840 points
        Duration::from_secs(3 * MINUTE)
    } else if duration <= Duration::from_secs(30 * DAY) {
        // 30d / 10m = 4320 points
        Duration::from_secs(10 * MINUTE)
    } else {
        duration / LONG_WINDOW_POINTS
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.is_empty())
}

fn parse_seconds(param: &'static str, raw: &str) -> Result<u64, ModelError> {
    raw.parse::<u64>().map_err(|_| invalid(param, raw))
}

fn invalid(param: &'static str, raw: &str) -> ModelError {
    ModelError::InvalidParameter {
        param,
        value: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_800_000_000).unwrap()
    }

    #[test]
    fn step_thresholds_are_exact() {
        let cases = [
            (secs(1), secs(10)),
            (secs(6 * HOUR), secs(10)),
            (secs(6 * HOUR + 1), secs(60)),
            (secs(DAY), secs(60)),
            (secs(DAY + 1), secs(180)),
            (secs(8 * DAY), secs(180)),
            (secs(8 * DAY + 1), secs(600)),
            (secs(30 * DAY), secs(600)),
            (secs(30 * DAY + 1), secs(30 * DAY + 1) / 3000),
        ];
        for (duration, want) in cases {
            assert_eq!(step(duration), want, "duration {duration:?}");
        }
        assert_eq!(step(secs(30 * DAY + 1)).as_secs(), 30 * DAY / 3000);
    }

    #[test]
    fn step_is_non_decreasing() {
        let mut prev = Duration::ZERO;
        let mut d = 1;
        while d < 400 * DAY {
            let s = step(secs(d));
            assert!(s >= prev, "step dropped at {d}s");
            prev = s;
            d += d / 7 + 1;
        }
    }

    #[test]
    fn sub_second_overshoot_moves_to_next_step() {
        let just_over = secs(6 * HOUR) + Duration::from_millis(1);
        assert_eq!(step(just_over), secs(60));
    }

    #[test]
    fn defaults_to_last_hour() {
        let window = resolve_window(None, None, now()).unwrap();
        assert_eq!(window.duration(), secs(3600));
        assert_eq!(window.end(), now());

        let window = resolve_window(Some(""), Some(""), now()).unwrap();
        assert_eq!(window.duration(), secs(3600));
    }

    #[test]
    fn explicit_parameters() {
        let window = resolve_window(Some("3600"), Some("1700000000"), now()).unwrap();
        assert_eq!(window.start_unix(), 1_699_996_400);
        assert_eq!(window.end_unix(), 1_700_000_000);
        assert_eq!(step(window.duration()), secs(10));
    }

    #[test]
    fn malformed_parameters_name_the_offender() {
        let err = resolve_window(Some("1h"), None, now()).unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidParameter {
                param: "duration",
                value: "1h".into()
            }
        );

        let err = resolve_window(None, Some("-5"), now()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameter { param: "endtime", .. }));

        let err = resolve_window(Some("0"), None, now()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameter { param: "duration", .. }));
    }
}
