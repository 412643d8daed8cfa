//! Request correlation ids.
//!
//! Ids come from a random UUID when the OS entropy source works. Otherwise a
//! `base36(timestamp)-base36(counter)-hex` token is built, with the hex part
//! drawn from secure bytes when available and from a seeded PRNG as the last
//! resort. The rotating counter keeps consecutive ids distinct even when the
//! clock does not advance.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::HeaderValue;
use chrono::Utc;
use once_cell::sync::Lazy;
use rand::rngs::{OsRng, SmallRng};
use rand::{Rng, SeedableRng, TryRngCore};
use uuid::Uuid;

/// Default maximum length accepted by [`normalize_request_id`].
pub const MAX_REQUEST_ID_LEN: usize = 120;

/// The fallback counter rotates through four base36 digits.
const COUNTER_MODULUS: u32 = 36 * 36 * 36 * 36;

const FALLBACK_RANDOM_BYTES: usize = 8;

/// Source of randomness for request ids.
pub trait EntropySource: Send + Sync {
    /// A random (v4) UUID, or `None` when no strong generator is available.
    fn random_uuid(&self) -> Option<Uuid>;

    /// Fill `buf` with cryptographically secure bytes. Returns `false` when
    /// the source is unavailable.
    fn secure_bytes(&self, buf: &mut [u8]) -> bool;
}

/// Operating-system entropy via `OsRng`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn random_uuid(&self) -> Option<Uuid> {
        let mut bytes = [0u8; 16];
        OsRng.try_fill_bytes(&mut bytes).ok()?;
        Some(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    fn secure_bytes(&self, buf: &mut [u8]) -> bool {
        OsRng.try_fill_bytes(buf).is_ok()
    }
}

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

/// Generates request ids from an [`EntropySource`] and a millisecond clock.
pub struct RequestIdGenerator {
    entropy: Box<dyn EntropySource>,
    clock: Clock,
    counter: AtomicU32,
}

impl RequestIdGenerator {
    /// Generator backed by OS entropy and the wall clock.
    pub fn new() -> Self {
        Self::with_sources(OsEntropy, || Utc::now().timestamp_millis())
    }

    /// Generator with injected entropy and clock.
    pub fn with_sources<E, C>(entropy: E, clock: C) -> Self
    where
        E: EntropySource + 'static,
        C: Fn() -> i64 + Send + Sync + 'static,
    {
        Self {
            entropy: Box::new(entropy),
            clock: Box::new(clock),
            counter: AtomicU32::new(0),
        }
    }

    /// Produce a new id. Never fails.
    pub fn generate(&self) -> String {
        if let Some(uuid) = self.entropy.random_uuid() {
            return uuid.to_string();
        }

        let counter = self.counter.fetch_add(1, Ordering::Relaxed) % COUNTER_MODULUS;
        let timestamp = u64::try_from((self.clock)()).unwrap_or(0);
        let prefix = format!("{}-{}", to_base36(timestamp), to_base36(u64::from(counter)));

        let mut bytes = [0u8; FALLBACK_RANDOM_BYTES];
        if !self.entropy.secure_bytes(&mut bytes) {
            let mut rng = SmallRng::seed_from_u64(insecure_seed(counter));
            rng.fill(&mut bytes[..]);
        }

        format!("{prefix}-{}", to_hex(&bytes))
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_GENERATOR: Lazy<RequestIdGenerator> = Lazy::new(RequestIdGenerator::new);

/// Create a request id with the process-wide default generator.
pub fn create_request_id() -> String {
    DEFAULT_GENERATOR.generate()
}

/// Sanitize an untrusted request id.
///
/// Removes whitespace, control characters and angle brackets, keeps at most
/// `max_len` characters (at least one), and returns `None` when nothing is
/// left. Applying it twice gives the same result as applying it once.
pub fn normalize_request_id(raw: &str, max_len: usize) -> Option<String> {
    let max_len = max_len.max(1);
    let sanitized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control() && !matches!(c, '<' | '>'))
        .take(max_len)
        .collect();

    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Sanitize a request id taken from a header value. Non-UTF-8 values are
/// rejected.
pub fn normalize_request_id_header(value: &HeaderValue) -> Option<String> {
    value
        .to_str()
        .ok()
        .and_then(|raw| normalize_request_id(raw, MAX_REQUEST_ID_LEN))
}

fn insecure_seed(counter: u32) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    nanos ^ u64::from(counter).rotate_left(32)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
