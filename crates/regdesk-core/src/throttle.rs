//! Per-address login throttling.
//!
//! Failed admin logins are counted per source address inside a rolling
//! window. Reaching the threshold locks the address out for a fixed period.
//! State is in-memory only and is lost on restart.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Deserialize;

/// Thresholds for [`LoginThrottle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ThrottlePolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,
    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: u64,
}

fn default_max_attempts() -> u32 { 5 }
fn default_window_minutes() -> u64 { 15 }
fn default_lockout_minutes() -> u64 { 30 }

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            window_minutes: default_window_minutes(),
            lockout_minutes: default_lockout_minutes(),
        }
    }
}

impl ThrottlePolicy {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_minutes.saturating_mul(60))
    }

    pub fn lockout(&self) -> Duration {
        Duration::from_secs(self.lockout_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Clone)]
struct ThrottleEntry {
    failure_count: u32,
    window_start: Instant,
    locked_until: Option<Instant>,
}

/// Tracks failed login attempts keyed by source address.
///
/// Every method has an `_at` variant taking an explicit `now`; the plain
/// variants use [`Instant::now`].
pub struct LoginThrottle {
    entries: DashMap<String, ThrottleEntry>,
    policy: ThrottlePolicy,
}

impl LoginThrottle {
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &ThrottlePolicy {
        &self.policy
    }

    pub fn is_locked_out(&self, address: &str) -> bool {
        self.is_locked_out_at(address, Instant::now())
    }

    /// Returns `true` while `address` has an unexpired lockout.
    ///
    /// Not a pure read: an entry whose lockout has lapsed is deleted.
    pub fn is_locked_out_at(&self, address: &str, now: Instant) -> bool {
        self.lockout_remaining_at(address, now).is_some()
    }

    pub fn lockout_remaining(&self, address: &str) -> Option<Duration> {
        self.lockout_remaining_at(address, Instant::now())
    }

    /// Time left on the lockout for `address`, deleting the entry once it has lapsed.
    pub fn lockout_remaining_at(&self, address: &str, now: Instant) -> Option<Duration> {
        let lapsed = self
            .entries
            .remove_if(address, |_, entry| {
                entry.locked_until.is_some_and(|until| now >= until)
            })
            .is_some();
        if lapsed {
            tracing::debug!("Lockout lapsed for {address}");
            return None;
        }

        let entry = self.entries.get(address)?;
        entry
            .locked_until
            .map(|until| until.saturating_duration_since(now))
    }

    pub fn record_failed_attempt(&self, address: &str) -> bool {
        self.record_failed_attempt_at(address, Instant::now())
    }

    /// Counts a failure for `address` and returns `true` if it just got locked.
    ///
    /// The threshold is checked before the window reset, so a failure that
    /// reaches the threshold locks even when the window has run out.
    pub fn record_failed_attempt_at(&self, address: &str, now: Instant) -> bool {
        let mut entry = self
            .entries
            .entry(address.to_string())
            .or_insert_with(|| ThrottleEntry {
                failure_count: 0,
                window_start: now,
                locked_until: None,
            });

        entry.failure_count += 1;

        if entry.failure_count >= self.policy.max_attempts {
            entry.locked_until = Some(now + self.policy.lockout());
            tracing::warn!(
                "Address {address} locked out after {} failed attempts",
                entry.failure_count
            );
            return true;
        }

        if now.saturating_duration_since(entry.window_start) > self.policy.window() {
            entry.failure_count = 1;
            entry.window_start = now;
        }

        false
    }

    /// Attempts left before lockout for `address`.
    pub fn remaining_attempts(&self, address: &str) -> u32 {
        let used = self
            .entries
            .get(address)
            .map(|entry| entry.failure_count)
            .unwrap_or(0);
        self.policy.max_attempts.saturating_sub(used)
    }

    /// Clears all failure history for `address`. Idempotent.
    pub fn reset_login_attempts(&self, address: &str) {
        self.entries.remove(address);
    }

    /// Drops lapsed lockouts and unlocked entries whose window has run out.
    pub fn sweep_expired(&self, now: Instant) {
        let window = self.policy.window();
        self.entries.retain(|_, entry| match entry.locked_until {
            Some(until) => now < until,
            None => now.saturating_duration_since(entry.window_start) <= window,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
