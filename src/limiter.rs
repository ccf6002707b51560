// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for the public write endpoints.
//!
//! Each composite key (`"{operation}:{client}"`) owns one counter inside an
//! aligned window. The window restarts on the first check after it has fully
//! elapsed, so a client may send up to `2 * limit` requests straddling a
//! window boundary. That burst is part of the contract.
//!
//! Stale entries are evicted by [`RateLimiter::sweep`], which the server runs
//! periodically, and inline whenever the table grows past its capacity guard.
//! The inline sweep runs at most once per policy window, so a flood of fresh
//! keys costs memory rather than a full table scan per request.

use crate::config::LimiterConfig;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Static limit for one protected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum admitted requests per window
    pub limit: u32,
    /// Window length
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request was admitted (and counted)
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// Whole seconds until the current window ends
    pub reset_in: u64,
}

/// Per-key counter state.
#[derive(Debug)]
struct RateLimitEntry {
    /// Requests admitted in the current window
    count: u32,
    /// Start of the current window
    window_start: Instant,
    /// Window length of the policy that owns this key
    window: Duration,
}

impl RateLimitEntry {
    fn new(now: Instant, window: Duration) -> Self {
        Self {
            count: 0,
            window_start: now,
            window,
        }
    }

    fn is_stale(&self, now: Instant, retention_windows: u32) -> bool {
        now.saturating_duration_since(self.window_start)
            >= self.window.saturating_mul(retention_windows)
    }
}

/// In-memory rate limit table.
///
/// Owned by whoever constructs it; tests build as many independent
/// limiters as they need.
pub struct RateLimiter {
    config: LimiterConfig,
    entries: DashMap<String, RateLimitEntry>,
    /// Reference point for `last_inline_sweep`
    created: Instant,
    /// Milliseconds since `created` of the last inline sweep, `NEVER` if none
    last_inline_sweep: AtomicU64,
    inline_sweeps: AtomicU64,
    /// Inline evictions not yet collected by [`take_inline_evictions`](Self::take_inline_evictions)
    inline_evicted: AtomicUsize,
}

const NEVER: u64 = u64::MAX;

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
            created: Instant::now(),
            last_inline_sweep: AtomicU64::new(NEVER),
            inline_sweeps: AtomicU64::new(0),
            inline_evicted: AtomicUsize::new(0),
        }
    }

    /// Check and count a request for `key` against `policy`.
    pub fn check(&self, key: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        self.check_at(key, policy, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, key: &str, policy: &RateLimitPolicy, now: Instant) -> RateLimitDecision {
        // Must not sweep while holding an entry guard: retain() locks every shard.
        if !self.entries.contains_key(key)
            && self.entries.len() >= self.config.max_entries
            && self.claim_inline_sweep(now, policy.window)
        {
            let evicted = self.sweep_at(now);
            self.inline_sweeps.fetch_add(1, Ordering::Relaxed);
            self.inline_evicted.fetch_add(evicted, Ordering::Relaxed);
            warn!(
                evicted,
                remaining = self.entries.len(),
                max_entries = self.config.max_entries,
                "Rate limit table at capacity, swept inline"
            );
        }

        // The shard guard is held from lookup through increment.
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry::new(now, policy.window));

        if now.saturating_duration_since(entry.window_start) >= policy.window {
            entry.count = 0;
            entry.window_start = now;
        }
        entry.window = policy.window;

        let reset_in = seconds_until(entry.window_start + policy.window, now);

        if entry.count < policy.limit {
            entry.count += 1;
            RateLimitDecision {
                allowed: true,
                remaining: policy.limit - entry.count,
                reset_in,
            }
        } else {
            debug!(key, reset_in, "Rate limit exceeded");
            RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_in,
            }
        }
    }

    /// Evict stale entries. Returns the number removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Same as [`sweep`](Self::sweep) with an explicit clock reading.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        let retention = self.config.retention_windows;
        self.entries.retain(|_, entry| !entry.is_stale(now, retention));
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            debug!(evicted, "Evicted stale rate limit entries");
        }
        evicted
    }

    /// Reserve the inline sweep slot unless one ran less than `gap` ago.
    /// Only one of several racing callers wins.
    fn claim_inline_sweep(&self, now: Instant, gap: Duration) -> bool {
        let now_ms = u64::try_from(now.saturating_duration_since(self.created).as_millis())
            .unwrap_or(NEVER - 1);
        let last = self.last_inline_sweep.load(Ordering::Acquire);
        if last != NEVER && u128::from(now_ms.saturating_sub(last)) < gap.as_millis() {
            return false;
        }
        self.last_inline_sweep
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Number of inline sweeps run by the capacity guard so far.
    pub fn inline_sweeps(&self) -> u64 {
        self.inline_sweeps.load(Ordering::Relaxed)
    }

    /// Entries evicted by inline sweeps since the last call.
    pub fn take_inline_evictions(&self) -> usize {
        self.inline_evicted.swap(0, Ordering::AcqRel)
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whole seconds from `now` until `deadline`, rounded up, never negative.
fn seconds_until(deadline: Instant, now: Instant) -> u64 {
    let left = deadline.saturating_duration_since(now).as_millis();
    left.div_ceil(1000) as u64
}
