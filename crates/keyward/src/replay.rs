//! Replay protection: timestamp freshness and nonce bookkeeping.
//!
//! Freshness is a pure bounds check; the authoritative replay barrier is
//! the store's atomic nonce insert. The guard only decides windows, it
//! never touches storage.

use keyward_core::UnixMillis;

/// Default freshness tolerance: five minutes either way.
pub const DEFAULT_TIMESTAMP_TOLERANCE_MS: i64 = 5 * 60 * 1000;

/// Bounds the acceptable clock skew between client and agent.
#[derive(Debug, Clone, Copy)]
pub struct ReplayGuard {
    tolerance_ms: i64,
}

impl ReplayGuard {
    pub fn new(tolerance_ms: i64) -> Self {
        Self { tolerance_ms }
    }

    /// True iff `timestamp` is within the tolerance of `now`, in either
    /// direction. A future timestamp is as suspect as a stale one.
    ///
    /// Timestamps arrive attacker-controlled, so the distance computation
    /// must not overflow; anything too far away to represent is not fresh.
    pub fn is_fresh(&self, timestamp: UnixMillis, now: UnixMillis) -> bool {
        match now.checked_sub(timestamp) {
            Some(delta) => delta.unsigned_abs() <= self.tolerance_ms.unsigned_abs(),
            None => false,
        }
    }

    /// Nonces older than this horizon can never pass the freshness check
    /// again and may be pruned.
    pub fn prune_horizon(&self, now: UnixMillis) -> UnixMillis {
        now - self.tolerance_ms
    }
}

impl Default for ReplayGuard {
    fn default() -> Self {
        Self::new(DEFAULT_TIMESTAMP_TOLERANCE_MS)
    }
}
