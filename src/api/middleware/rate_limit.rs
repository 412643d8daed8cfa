//! Rate limiting for API endpoints.
//!
//! Fixed-window counters keyed by a normalized identifier (usually
//! `namespace:ip`). The store is owned by [`crate::routes::AppState`] and
//! shared through an `Arc`; nothing here is a process-wide singleton.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

/// Requests allowed per window when a call site supplies an invalid limit.
pub const DEFAULT_MAX_REQUESTS: u32 = 50;
/// Window length used when a call site supplies an invalid window.
pub const DEFAULT_WINDOW_MS: u64 = 3_600_000;
/// Shortest window accepted after normalization.
pub const MIN_WINDOW_MS: u64 = 1_000;
/// Expired entries are swept at most once per this interval.
pub const CLEANUP_INTERVAL_MS: i64 = 60_000;
/// Maximum length of the namespace portion of a rate-limit key.
pub const MAX_NAMESPACE_LEN: usize = 64;
/// Bucket name used when a namespace normalizes to nothing.
pub const FALLBACK_NAMESPACE: &str = "api";

/// Per call site limit: `max_requests` per `window_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    max_requests: u32,
    window_ms: u64,
}

impl RateLimitConfig {
    /// Create a normalized config. Zero values fall back to the defaults and
    /// windows shorter than one second are raised to one second.
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self::from_raw(f64::from(max_requests), window_ms as f64)
    }

    /// Normalize untrusted numeric input (e.g. parsed from the environment).
    ///
    /// Non-finite or non-positive values are replaced by the defaults, the
    /// request limit is floored to at least 1 and the window to at least
    /// [`MIN_WINDOW_MS`].
    pub fn from_raw(max_requests: f64, window_ms: f64) -> Self {
        let max_requests = if max_requests.is_finite() && max_requests > 0.0 {
            max_requests.floor().clamp(1.0, f64::from(u32::MAX)) as u32
        } else {
            DEFAULT_MAX_REQUESTS
        };

        let window_ms = if window_ms.is_finite() && window_ms > 0.0 {
            window_ms.floor().clamp(MIN_WINDOW_MS as f64, u64::MAX as f64) as u64
        } else {
            DEFAULT_WINDOW_MS
        };

        Self {
            max_requests,
            window_ms,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window_ms: DEFAULT_WINDOW_MS,
        }
    }
}

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub success: bool,
    pub remaining: u32,
    /// Milliseconds until the current window resets.
    pub reset_in_ms: u64,
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    /// Absolute reset timestamp in epoch milliseconds.
    reset_time: i64,
}

struct RateLimiterInner {
    entries: HashMap<String, RateLimitEntry>,
    last_cleanup: i64,
}

/// In-memory fixed-window rate limiter.
///
/// The whole check-then-increment runs under one mutex, so concurrent
/// requests for the same identifier never both observe the last free slot.
pub struct RateLimiter {
    inner: Mutex<RateLimiterInner>,
}

impl RateLimiter {
    /// Create an empty limiter.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RateLimiterInner {
                entries: HashMap::new(),
                last_cleanup: 0,
            }),
        }
    }

    /// Check and record one request for `identifier` against the wall clock.
    pub fn check(&self, identifier: &str, config: RateLimitConfig) -> RateLimitResult {
        self.check_at(identifier, config, Utc::now().timestamp_millis())
    }

    /// Check and record one request at an explicit epoch-millisecond instant.
    ///
    /// A window stays valid while `now <= reset_time`; the first request with
    /// `now > reset_time` opens a fresh window.
    pub fn check_at(&self, identifier: &str, config: RateLimitConfig, now: i64) -> RateLimitResult {
        let key = normalize_identifier(identifier);
        let window_ms = i64::try_from(config.window_ms()).unwrap_or(i64::MAX);
        let max_requests = config.max_requests();

        let mut inner = self.lock();

        if now.saturating_sub(inner.last_cleanup) >= CLEANUP_INTERVAL_MS {
            let before = inner.entries.len();
            inner.entries.retain(|_, entry| entry.reset_time >= now);
            inner.last_cleanup = now;
            let purged = before - inner.entries.len();
            if purged > 0 {
                tracing::debug!(purged, "Purged expired rate limit entries");
            }
        }

        match inner.entries.get_mut(&key) {
            Some(entry) if now <= entry.reset_time => {
                let reset_in_ms = remaining_ms(entry.reset_time, now);
                if entry.count >= max_requests {
                    return RateLimitResult {
                        success: false,
                        remaining: 0,
                        reset_in_ms,
                    };
                }

                entry.count += 1;
                RateLimitResult {
                    success: true,
                    remaining: max_requests.saturating_sub(entry.count),
                    reset_in_ms,
                }
            }
            _ => {
                inner.entries.insert(
                    key,
                    RateLimitEntry {
                        count: 1,
                        reset_time: now.saturating_add(window_ms),
                    },
                );
                RateLimitResult {
                    success: true,
                    remaining: max_requests - 1,
                    reset_in_ms: config.window_ms(),
                }
            }
        }
    }

    /// Number of identifiers currently tracked (expired entries included
    /// until the next sweep).
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, RateLimiterInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn remaining_ms(reset_time: i64, now: i64) -> u64 {
    u64::try_from(reset_time.saturating_sub(now)).unwrap_or(0)
}

/// Normalize a full rate-limit identifier so cosmetic variants share a bucket.
///
/// Lowercases and keeps only `[a-z0-9._:-]`, which preserves the separators
/// that distinguish IPv4 and IPv6 addresses.
pub fn normalize_identifier(raw: &str) -> String {
    let normalized: String = raw
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '_' | '-'))
        .collect();

    if normalized.is_empty() {
        crate::middleware::client_ip::ANONYMOUS_IP.to_string()
    } else {
        normalized
    }
}

/// Normalize the namespace part of a rate-limit key.
///
/// Runs of non-alphanumeric characters collapse to a single `-`, the result
/// is capped at [`MAX_NAMESPACE_LEN`] characters, and an empty result maps to
/// [`FALLBACK_NAMESPACE`].
pub fn normalize_namespace(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len().min(MAX_NAMESPACE_LEN));
    let mut pending_separator = false;

    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !normalized.is_empty() {
                normalized.push('-');
            }
            pending_separator = false;
            normalized.push(c);
        } else {
            pending_separator = true;
        }
    }

    normalized.truncate(MAX_NAMESPACE_LEN);
    let normalized = normalized.trim_end_matches('-');

    if normalized.is_empty() {
        FALLBACK_NAMESPACE.to_string()
    } else {
        normalized.to_string()
    }
}

/// Build the bucket key for a namespace and a resolved client IP.
pub fn rate_limit_key(namespace: &str, ip: &str) -> String {
    format!("{}:{}", normalize_namespace(namespace), ip)
}
