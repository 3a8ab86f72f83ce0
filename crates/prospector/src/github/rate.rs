//! Quota tracking and throttling for the upstream API.
//!
//! Quota state comes from two places: the `/rate_limit` endpoint (pre-flight)
//! and the `x-ratelimit-*` headers on every response (post-response check).
//! Both are consulted because `remaining` can stay at zero for a short window
//! after the reset epoch passes.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota as GovernorQuota, RateLimiter};

use crate::config::ThrottlePolicy;

use super::transport::{HttpHeaders, header_get};
use super::types::RateLimitWindow;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Fallback cool-down when the quota is exhausted but no reset time is known.
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Upper bound on a single throttle sleep, in case the reset epoch is bogus.
const MAX_THROTTLE: Duration = Duration::from_secs(3600);

/// A snapshot of the core API quota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub remaining: Option<u64>,
    pub reset_at: Option<DateTime<Utc>>,
}

impl QuotaSnapshot {
    /// Read `x-ratelimit-remaining` / `x-ratelimit-reset` off a response.
    /// Responses without quota headers yield an empty snapshot.
    #[must_use]
    pub fn from_headers(headers: &HttpHeaders) -> Self {
        let remaining =
            header_get(headers, "x-ratelimit-remaining").and_then(|v| v.parse::<u64>().ok());
        let reset_at = header_get(headers, "x-ratelimit-reset")
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|epoch| DateTime::from_timestamp(epoch, 0));
        Self { remaining, reset_at }
    }

    /// Build a snapshot from a `/rate_limit` response window.
    #[must_use]
    pub fn from_window(window: &RateLimitWindow) -> Self {
        Self {
            remaining: Some(window.remaining),
            reset_at: DateTime::from_timestamp(window.reset, 0),
        }
    }

    /// Whether the snapshot carries any quota information at all.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.remaining.is_some()
    }

    /// Whether the quota window is spent.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// Decides how long to wait when the quota runs out, and optionally paces
/// requests proactively with a requests-per-second bound.
#[derive(Clone)]
pub struct RateGovernor {
    policy: ThrottlePolicy,
    pacer: Option<Arc<DirectLimiter>>,
}

impl RateGovernor {
    pub fn new(policy: ThrottlePolicy, requests_per_second: Option<u32>) -> Self {
        let pacer = requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rps| Arc::new(RateLimiter::direct(GovernorQuota::per_second(rps))));
        Self { policy, pacer }
    }

    /// Wait until the proactive pacer allows another request. No-op when no
    /// requests-per-second bound is configured.
    pub async fn pace(&self) {
        if let Some(ref pacer) = self.pacer {
            pacer.until_ready().await;
        }
    }

    /// How long to sleep for an exhausted quota, or `None` when the quota
    /// still has headroom.
    #[must_use]
    pub fn throttle_delay(&self, quota: &QuotaSnapshot, now: DateTime<Utc>) -> Option<Duration> {
        if !quota.exhausted() {
            return None;
        }
        let delay = match self.policy {
            ThrottlePolicy::Cooldown(delay) => delay,
            ThrottlePolicy::UntilReset => match quota.reset_at {
                Some(reset) => (reset - now).to_std().unwrap_or(Duration::ZERO),
                None => DEFAULT_COOLDOWN,
            },
        };
        Some(delay.clamp(Duration::from_secs(1), MAX_THROTTLE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn headers(remaining: &str, reset: &str) -> HttpHeaders {
        vec![
            ("x-ratelimit-remaining".to_string(), remaining.to_string()),
            ("x-ratelimit-reset".to_string(), reset.to_string()),
        ]
    }

    #[test]
    fn test_snapshot_from_headers() {
        let snapshot = QuotaSnapshot::from_headers(&headers("42", "1735689600"));
        assert_eq!(snapshot.remaining, Some(42));
        assert_eq!(
            snapshot.reset_at,
            DateTime::from_timestamp(1735689600, 0)
        );
        assert!(snapshot.is_known());
        assert!(!snapshot.exhausted());
    }

    #[test]
    fn test_snapshot_from_headers_without_quota() {
        let snapshot = QuotaSnapshot::from_headers(&Vec::new());
        assert!(!snapshot.is_known());
        assert!(!snapshot.exhausted());
    }

    #[test]
    fn test_snapshot_exhausted() {
        let snapshot = QuotaSnapshot::from_headers(&headers("0", "1735689600"));
        assert!(snapshot.exhausted());
    }

    #[test]
    fn test_cooldown_policy_uses_fixed_delay() {
        let governor = RateGovernor::new(ThrottlePolicy::Cooldown(Duration::from_secs(15)), None);
        let quota = QuotaSnapshot {
            remaining: Some(0),
            reset_at: None,
        };
        assert_eq!(
            governor.throttle_delay(&quota, Utc::now()),
            Some(Duration::from_secs(15))
        );
    }

    #[test]
    fn test_until_reset_policy_sleeps_to_reset_epoch() {
        let governor = RateGovernor::new(ThrottlePolicy::UntilReset, None);
        let now = Utc::now();
        let quota = QuotaSnapshot {
            remaining: Some(0),
            reset_at: Some(now + TimeDelta::seconds(300)),
        };
        let delay = governor.throttle_delay(&quota, now).unwrap();
        assert_eq!(delay, Duration::from_secs(300));
    }

    #[test]
    fn test_until_reset_in_the_past_clamps_to_minimum() {
        let governor = RateGovernor::new(ThrottlePolicy::UntilReset, None);
        let now = Utc::now();
        let quota = QuotaSnapshot {
            remaining: Some(0),
            reset_at: Some(now - TimeDelta::seconds(30)),
        };
        assert_eq!(
            governor.throttle_delay(&quota, now),
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_no_delay_with_headroom() {
        let governor = RateGovernor::new(ThrottlePolicy::UntilReset, None);
        let quota = QuotaSnapshot {
            remaining: Some(100),
            reset_at: None,
        };
        assert_eq!(governor.throttle_delay(&quota, Utc::now()), None);
    }

    #[tokio::test]
    async fn test_pace_without_bound_is_noop() {
        let governor = RateGovernor::new(ThrottlePolicy::UntilReset, None);
        governor.pace().await;
    }

    #[tokio::test]
    async fn test_pace_with_bound_allows_first_request() {
        let governor = RateGovernor::new(ThrottlePolicy::UntilReset, Some(10));
        governor.pace().await;
    }
}
