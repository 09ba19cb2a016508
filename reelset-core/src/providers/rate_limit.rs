use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::HeaderMap;
use tokio::time::Instant;
use tracing::info;

pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Quota state reported by the provider on one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
    pub remaining: u32,
    /// Unix timestamp (seconds) at which the quota window resets.
    pub reset_at: i64,
}

impl RateLimitWindow {
    /// Reads the quota headers; `None` when either is absent or malformed.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_number(headers, RATE_LIMIT_REMAINING_HEADER)?;
        let reset_at = header_number(headers, RATE_LIMIT_RESET_HEADER)?;
        Some(Self {
            remaining: u32::try_from(remaining.max(0)).unwrap_or(u32::MAX),
            reset_at,
        })
    }

    /// True when the response consumed the last call of the window.
    pub fn is_exhausted(&self) -> bool {
        self.remaining < 1
    }

    pub fn wait_from(&self, now_unix: i64) -> Duration {
        Duration::from_secs(self.reset_at.saturating_sub(now_unix).max(0) as u64)
    }
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Process-wide pause shared by every provider request.
#[derive(Debug, Default)]
pub struct RateLimitGate {
    blocked_until: Mutex<Option<Instant>>,
}

impl RateLimitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps until the quota window has reset, if a previous response
    /// exhausted it.
    pub async fn wait(&self) {
        let deadline = self
            .blocked_until
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());

        if let Some(deadline) = deadline {
            let now = Instant::now();
            if deadline > now {
                info!(
                    wait_secs = (deadline - now).as_secs(),
                    "metadata provider quota exhausted; waiting for reset"
                );
                tokio::time::sleep_until(deadline).await;
            }
        }
    }

    /// Records the window reported by a response.
    pub fn observe(&self, window: &RateLimitWindow) {
        if !window.is_exhausted() {
            return;
        }
        let wait = window.wait_from(Utc::now().timestamp());
        if let Ok(mut guard) = self.blocked_until.lock() {
            *guard = Some(Instant::now() + wait);
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked_until
            .lock()
            .map(|guard| guard.is_some_and(|deadline| deadline > Instant::now()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(remaining: &str, reset: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            RATE_LIMIT_REMAINING_HEADER,
            HeaderValue::from_str(remaining).expect("header value"),
        );
        map.insert(
            RATE_LIMIT_RESET_HEADER,
            HeaderValue::from_str(reset).expect("header value"),
        );
        map
    }

    #[test]
    fn parses_quota_headers() {
        let window = RateLimitWindow::from_headers(&headers("38", "1700000010"))
            .expect("window");
        assert_eq!(window.remaining, 38);
        assert_eq!(window.reset_at, 1_700_000_010);
        assert!(!window.is_exhausted());
    }

    #[test]
    fn missing_header_is_not_a_window() {
        let mut map = HeaderMap::new();
        map.insert(
            RATE_LIMIT_REMAINING_HEADER,
            HeaderValue::from_static("3"),
        );
        assert_eq!(RateLimitWindow::from_headers(&map), None);
        assert_eq!(RateLimitWindow::from_headers(&HeaderMap::new()), None);
        assert_eq!(
            RateLimitWindow::from_headers(&headers("many", "1")),
            None
        );
    }

    #[test]
    fn wait_never_goes_negative() {
        let window = RateLimitWindow {
            remaining: 0,
            reset_at: 100,
        };
        assert!(window.is_exhausted());
        assert_eq!(window.wait_from(90), Duration::from_secs(10));
        assert_eq!(window.wait_from(150), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_window_blocks_until_reset() {
        let gate = RateLimitGate::new();
        let window = RateLimitWindow {
            remaining: 0,
            reset_at: Utc::now().timestamp() + 5,
        };
        gate.observe(&window);
        assert!(gate.is_blocked());

        let started = Instant::now();
        gate.wait().await;
        assert!(started.elapsed() >= Duration::from_secs(4));
        assert!(!gate.is_blocked());
    }

    #[tokio::test(start_paused = true)]
    async fn open_window_does_not_block() {
        let gate = RateLimitGate::new();
        gate.observe(&RateLimitWindow {
            remaining: 10,
            reset_at: Utc::now().timestamp() + 60,
        });
        assert!(!gate.is_blocked());

        let started = Instant::now();
        gate.wait().await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
