//! Rate limit classification for GitHub responses.
//!
//! GitHub reports both exhausted quotas and permission problems as HTTP 403, so
//! a 403 only counts as rate limited when the remaining-quota header reads `0`.
//! HTTP 429 is always rate limited.

use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RESET: &str = "x-ratelimit-reset";
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Backoff reported for secondary limits that carry no reset header.
pub const DEFAULT_FALLBACK_SECS: u64 = 60;

/// Outcome of classifying one response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub is_rate_limited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u64>,
}

impl RateLimitInfo {
    pub fn not_limited() -> Self {
        Self::default()
    }

    /// Whole minutes until the quota resets, rounded up.
    pub fn minutes_until_reset(&self) -> Option<u64> {
        self.remaining_seconds.map(|secs| secs.div_ceil(60))
    }
}

/// Classifies HTTP responses into rate-limited or not.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitMonitor {
    fallback_secs: u64,
}

impl Default for RateLimitMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_SECS)
    }
}

impl RateLimitMonitor {
    pub fn new(fallback_secs: u64) -> Self {
        Self { fallback_secs }
    }

    pub fn classify(&self, status: StatusCode, headers: &HeaderMap) -> RateLimitInfo {
        self.classify_at(status, headers, Utc::now())
    }

    /// Classify against an explicit clock.
    pub fn classify_at(
        &self,
        status: StatusCode,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> RateLimitInfo {
        let limited = match status {
            StatusCode::TOO_MANY_REQUESTS => true,
            StatusCode::FORBIDDEN => header_str(headers, HEADER_REMAINING) == Some("0"),
            _ => false,
        };
        if !limited {
            return RateLimitInfo::not_limited();
        }

        if let Some(reset_secs) = header_str(headers, HEADER_RESET).and_then(|v| v.parse::<i64>().ok())
        {
            if let Some(reset_time) = Utc.timestamp_opt(reset_secs, 0).single() {
                let remaining_ms = (reset_time - now).num_milliseconds();
                let remaining = if remaining_ms <= 0 {
                    0
                } else {
                    (remaining_ms as u64).div_ceil(1000)
                };
                return RateLimitInfo {
                    is_rate_limited: true,
                    reset_time: Some(reset_time),
                    remaining_seconds: Some(remaining),
                };
            }
        }

        // Secondary limits: prefer Retry-After, otherwise the fixed backoff.
        let wait = header_str(headers, HEADER_RETRY_AFTER)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(self.fallback_secs);
        RateLimitInfo {
            is_rate_limited: true,
            reset_time: Some(now + Duration::seconds(wait as i64)),
            remaining_seconds: Some(wait),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}
