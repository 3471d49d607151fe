//! Query template engine: catalog templates to concrete range queries.

use std::time::Duration;

use qdash_model::{QueueFilter, TimeWindow};
use reqwest::Url;

use crate::error::CoreError;

/// Placeholder replaced by the queue matcher in every template.
pub const QUEUE_FILTER: &str = "QUEUE_FILTER";

/// Range-query path of the metrics backend.
pub const RANGE_QUERY_PATH: &str = "/api/v1/query_range";

/// One concrete range query, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    pub query: String,
    /// Unix seconds.
    pub start: i64,
    /// Unix seconds.
    pub end: i64,
    /// Seconds between samples.
    pub step_secs: u64,
}

impl RangeQuery {
    pub fn new(query: String, window: &TimeWindow, step: Duration) -> Self {
        Self {
            query,
            start: window.start_unix(),
            end: window.end_unix(),
            step_secs: step.as_secs(),
        }
    }
}

/// Substitutes the queue filter into `template`.
///
/// No filter yields an empty substitution; otherwise the placeholder becomes
/// `queue=~"a|b"` in filter order. Names are regex-escaped, so a name only
/// ever matches itself.
pub fn build_query(template: &str, filter: &QueueFilter) -> String {
    template.replace(QUEUE_FILTER, &queue_matcher(filter))
}

/// Full request URL for `query` against the backend at `base`.
///
/// A trailing slash on `base` is ignored.
pub fn build_request_url(base: &str, query: &RangeQuery) -> Result<Url, CoreError> {
    let endpoint = format!("{}{}", base.trim_end_matches('/'), RANGE_QUERY_PATH);
    let start = query.start.to_string();
    let end = query.end.to_string();
    let step = query.step_secs.to_string();

    Url::parse_with_params(
        &endpoint,
        [
            ("query", query.query.as_str()),
            ("start", start.as_str()),
            ("end", end.as_str()),
            ("step", step.as_str()),
        ],
    )
    .map_err(|e| CoreError::InvalidAddress(format!("{base}: {e}")))
}

fn queue_matcher(filter: &QueueFilter) -> String {
    if filter.is_empty() {
        return String::new();
    }
    let alternation = filter
        .names()
        .iter()
        .map(|name| escape_literal(&escape_regex(name)))
        .collect::<Vec<_>>()
        .join("|");
    format!("queue=~\"{alternation}\"")
}

fn escape_regex(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// Label matcher values are double-quoted string literals.
fn escape_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn filter(names: &[&str]) -> QueueFilter {
        QueueFilter::from_names(names.iter().copied()).unwrap()
    }

    #[test]
    fn empty_filter_removes_placeholder() {
        let q = build_query("asynq_queue_size{QUEUE_FILTER}", &QueueFilter::all());
        assert_eq!(q, "asynq_queue_size{}");

        let q = build_query(
            r#"asynq_tasks_enqueued_total{state="retry",QUEUE_FILTER}"#,
            &QueueFilter::all(),
        );
        assert_eq!(q, r#"asynq_tasks_enqueued_total{state="retry",}"#);
    }

    #[test]
    fn names_are_pipe_joined_in_order() {
        let q = build_query("asynq_queue_size{QUEUE_FILTER}", &filter(&["a", "b", "c"]));
        assert_eq!(q, r#"asynq_queue_size{queue=~"a|b|c"}"#);
    }

    #[test]
    fn every_placeholder_is_replaced() {
        let q = build_query(
            "rate(x{QUEUE_FILTER}[5m]) / rate(y{QUEUE_FILTER}[5m])",
            &filter(&["default"]),
        );
        assert_eq!(q, r#"rate(x{queue=~"default"}[5m]) / rate(y{queue=~"default"}[5m])"#);
    }

    #[test]
    fn metacharacters_are_escaped() {
        let q = build_query("m{QUEUE_FILTER}", &filter(&["a.b", "x|y", r#"q"t"#]));
        assert_eq!(q, r#"m{queue=~"a\\.b|x\\|y|q\"t"}"#);
    }

    #[test]
    fn url_carries_bounds_and_step() {
        let end = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let window = TimeWindow::new(Duration::from_secs(3600), end).unwrap();
        let range = RangeQuery::new("up".to_string(), &window, Duration::from_secs(10));

        let url = build_request_url("http://prom:9090/", &range).unwrap();
        assert_eq!(url.path(), "/api/v1/query_range");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("query".to_string(), "up".to_string()),
                ("start".to_string(), "1699996400".to_string()),
                ("end".to_string(), "1700000000".to_string()),
                ("step".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn url_without_trailing_slash_is_identical() {
        let end = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let window = TimeWindow::new(Duration::from_secs(60), end).unwrap();
        let range = RangeQuery::new(r#"m{queue=~"a|b"}"#.to_string(), &window, Duration::from_secs(10));

        let a = build_request_url("http://prom:9090", &range).unwrap();
        let b = build_request_url("http://prom:9090/", &range).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bad_base_address_is_reported() {
        let range = RangeQuery {
            query: "up".into(),
            start: 0,
            end: 1,
            step_secs: 10,
        };
        assert!(matches!(
            build_request_url("not a url", &range),
            Err(CoreError::InvalidAddress(_))
        ));
    }
}
