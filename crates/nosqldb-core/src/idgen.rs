//! Identifier generation.
//!
//! Two kinds of id coexist (spec §3): a *user id*, either client-supplied or
//! synthesised here from the payload plus a timestamp, and an *internal id*
//! `_id = md5(user_id)`, the sole key used on disk.

use md5::{Digest, Md5};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Generates fresh user ids and derives internal ids.
///
/// `new_id` is a pure function of `(payload, now)`, but a bare
/// `payload ++ timestamp` digest can collide if two objects with identical
/// payloads are written within the same clock tick (the failure mode spec
/// §4.1 calls out). `IdGen` disambiguates ties with a per-instance counter
/// folded into the hashed bytes whenever the clock reading does not advance
/// between calls.
#[derive(Debug, Default)]
pub struct IdGen {
    last_tick: AtomicU64,
    tie_breaker: AtomicU64,
}

impl IdGen {
    /// Creates a fresh id generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesises a fresh user id from a payload.
    ///
    /// Concatenates `payload`, a timestamp (nanoseconds since epoch divided
    /// by 100, decimal ASCII), and — only if the clock did not advance since
    /// the previous call — a disambiguating counter, then returns the
    /// 32-char lowercase hex MD5 digest of the result.
    #[must_use]
    pub fn new_id(&self, payload: &[u8]) -> String {
        let tick = now_ticks();
        let previous = self.last_tick.swap(tick, Ordering::SeqCst);
        let tie = if previous == tick {
            self.tie_breaker.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.tie_breaker.store(0, Ordering::SeqCst);
            0
        };

        let mut hasher = Md5::new();
        hasher.update(payload);
        hasher.update(tick.to_string().as_bytes());
        if tie != 0 {
            hasher.update(b"#");
            hasher.update(tie.to_string().as_bytes());
        }
        hex_digest(hasher)
    }

    /// Derives the internal id for a user id: `md5(user_id)` as 32-char
    /// lowercase hex.
    #[must_use]
    pub fn hash(user_id: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(user_id.as_bytes());
        hex_digest(hasher)
    }
}

fn hex_digest(hasher: Md5) -> String {
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Nanoseconds since the Unix epoch, divided by 100, matching spec §4.1's
/// timestamp resolution.
fn now_ticks() -> u64 {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (since_epoch.as_nanos() / 100) as u64
}
