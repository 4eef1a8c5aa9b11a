//! GitHub rate-limit signaling and backoff.
//!
//! GitHub reports its primary limit through `x-ratelimit-*` headers and
//! secondary limits through `retry-after`. The backoff here only waits; it
//! never repeats the request.

use chrono::{DateTime, TimeZone, Utc};
use mirror_core::{RateLimit, ResponseMeta};
use reqwest::header::HeaderMap;
use std::time::Duration;
use tracing::{info, warn};

/// Extra wait past the advertised reset so the window has really rolled over
const RESET_MARGIN: Duration = Duration::from_secs(1);

/// Parse rate-limit headers, if any are present.
pub fn parse_headers(headers: &HeaderMap) -> Option<RateLimit> {
    let number = |name: &str| -> Option<u64> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
    };

    let limit = number("x-ratelimit-limit");
    let remaining = number("x-ratelimit-remaining");
    let reset_at = number("x-ratelimit-reset")
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    let retry_after = number("retry-after").map(Duration::from_secs);

    if limit.is_none() && remaining.is_none() && reset_at.is_none() && retry_after.is_none() {
        return None;
    }

    Some(RateLimit {
        limit,
        remaining,
        reset_at,
        retry_after,
    })
}

/// Build response metadata from a status code and headers.
pub fn response_meta(status: u16, headers: &HeaderMap) -> ResponseMeta {
    ResponseMeta {
        status,
        rate_limit: parse_headers(headers),
    }
}

/// Whether a response signals an exhausted rate limit.
pub fn is_rate_limited(meta: &ResponseMeta) -> bool {
    if meta.status == 429 {
        return true;
    }
    match &meta.rate_limit {
        Some(rl) if rl.is_exhausted() => true,
        Some(rl) => meta.status == 403 && rl.retry_after.is_some(),
        None => false,
    }
}

/// How long to wait before the next request, capped at `ceiling`.
///
/// Returns `None` when the response does not signal an exhausted limit.
pub fn backoff_delay(meta: &ResponseMeta, now: DateTime<Utc>, ceiling: Duration) -> Option<Duration> {
    if !is_rate_limited(meta) {
        return None;
    }

    let (until_reset, retry_after) = match &meta.rate_limit {
        Some(rl) => (
            rl.reset_at
                .and_then(|reset| (reset - now).to_std().ok())
                .map(|d| d + RESET_MARGIN),
            rl.retry_after,
        ),
        None => (None, None),
    };

    let wait = until_reset
        .unwrap_or_default()
        .max(retry_after.unwrap_or_default());
    Some(wait.min(ceiling))
}

/// Block the calling task until the limit resets, bounded by `ceiling`.
///
/// Returns the time actually waited (zero if the limit was not exhausted).
pub async fn wait_for_reset(meta: &ResponseMeta, ceiling: Duration) -> Duration {
    let Some(delay) = backoff_delay(meta, Utc::now(), ceiling) else {
        return Duration::ZERO;
    };

    if delay == ceiling {
        warn!(
            wait_secs = delay.as_secs(),
            "Rate limit reset is beyond the wait ceiling, waiting for the ceiling only"
        );
    } else {
        info!(wait_secs = delay.as_secs(), "Rate limit exhausted, waiting for reset");
    }

    tokio::time::sleep(delay).await;
    delay
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn exhausted(reset_at: DateTime<Utc>) -> ResponseMeta {
        ResponseMeta::new(403).with_rate_limit(RateLimit {
            limit: Some(60),
            remaining: Some(0),
            reset_at: Some(reset_at),
            retry_after: None,
        })
    }

    #[test]
    fn test_parse_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("60"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));

        let rl = parse_headers(&headers).unwrap();
        assert_eq!(rl.limit, Some(60));
        assert!(rl.is_exhausted());
        assert_eq!(rl.reset_at.unwrap().timestamp(), 1_700_000_000);
        assert!(rl.retry_after.is_none());
    }

    #[test]
    fn test_parse_no_headers() {
        assert!(parse_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_not_limited_means_no_delay() {
        let now = Utc::now();
        let meta = ResponseMeta::new(500);
        assert!(backoff_delay(&meta, now, Duration::from_secs(60)).is_none());

        let meta = ResponseMeta::new(200).with_rate_limit(RateLimit {
            limit: Some(60),
            remaining: Some(12),
            reset_at: Some(now),
            retry_after: None,
        });
        assert!(backoff_delay(&meta, now, Duration::from_secs(60)).is_none());
    }

    #[test]
    fn test_delay_until_reset() {
        let now = Utc::now();
        let meta = exhausted(now + chrono::Duration::seconds(30));

        let delay = backoff_delay(&meta, now, Duration::from_secs(600)).unwrap();
        assert_eq!(delay, Duration::from_secs(31));
    }

    #[test]
    fn test_delay_capped_by_ceiling() {
        let now = Utc::now();
        let meta = exhausted(now + chrono::Duration::hours(2));

        let delay = backoff_delay(&meta, now, Duration::from_secs(60)).unwrap();
        assert_eq!(delay, Duration::from_secs(60));
    }

    #[test]
    fn test_reset_in_the_past() {
        let now = Utc::now();
        let meta = exhausted(now - chrono::Duration::seconds(5));
        let delay = backoff_delay(&meta, now, Duration::from_secs(60)).unwrap();
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn test_secondary_limit_retry_after() {
        let now = Utc::now();
        let meta = ResponseMeta::new(403).with_rate_limit(RateLimit {
            limit: None,
            remaining: None,
            reset_at: None,
            retry_after: Some(Duration::from_secs(45)),
        });
        assert!(is_rate_limited(&meta));
        assert_eq!(
            backoff_delay(&meta, now, Duration::from_secs(600)),
            Some(Duration::from_secs(45))
        );
    }

    #[test]
    fn test_plain_forbidden_is_not_rate_limited() {
        assert!(!is_rate_limited(&ResponseMeta::new(403)));
        assert!(is_rate_limited(&ResponseMeta::new(429)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_blocks_until_reset() {
        let meta = exhausted(Utc::now() + chrono::Duration::seconds(20));
        let start = tokio::time::Instant::now();

        let waited = wait_for_reset(&meta, Duration::from_secs(600)).await;

        assert!(waited >= Duration::from_secs(20));
        assert!(start.elapsed() >= Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_immediately_when_not_limited() {
        let start = tokio::time::Instant::now();
        let waited = wait_for_reset(&ResponseMeta::new(404), Duration::from_secs(600)).await;
        assert_eq!(waited, Duration::ZERO);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
