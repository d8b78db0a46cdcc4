//! Runtime counters and tick timing.
//!
//! Counters are lock-free `AtomicU64`s bumped on the tick path and read on
//! export. Tick durations go into a small ring behind a `parking_lot::Mutex`
//! that is only contended when a dashboard reads percentiles.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Atomic counters for tick-path events.
pub struct HivemindCounters {
    /// Entities registered.
    pub entities_added: AtomicU64,
    /// Entities deregistered.
    pub entities_removed: AtomicU64,
    /// Combat events recorded.
    pub events_recorded: AtomicU64,
    /// Combat events expired by cleanup.
    pub events_expired: AtomicU64,
    /// Combat clusters emitted.
    pub clusters_emitted: AtomicU64,
    /// Loot claims granted.
    pub claims_granted: AtomicU64,
    /// Loot claims denied.
    pub claims_denied: AtomicU64,
    /// Ticks completed.
    pub ticks_run: AtomicU64,
}

impl HivemindCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entities_added: AtomicU64::new(0),
            entities_removed: AtomicU64::new(0),
            events_recorded: AtomicU64::new(0),
            events_expired: AtomicU64::new(0),
            clusters_emitted: AtomicU64::new(0),
            claims_granted: AtomicU64::new(0),
            claims_denied: AtomicU64::new(0),
            ticks_run: AtomicU64::new(0),
        }
    }

    /// Add `n` to `counter`.
    pub fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            entities_added: self.entities_added.load(Ordering::Relaxed),
            entities_removed: self.entities_removed.load(Ordering::Relaxed),
            events_recorded: self.events_recorded.load(Ordering::Relaxed),
            events_expired: self.events_expired.load(Ordering::Relaxed),
            clusters_emitted: self.clusters_emitted.load(Ordering::Relaxed),
            claims_granted: self.claims_granted.load(Ordering::Relaxed),
            claims_denied: self.claims_denied.load(Ordering::Relaxed),
            ticks_run: self.ticks_run.load(Ordering::Relaxed),
        }
    }
}

impl Default for HivemindCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HivemindCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.snapshot().fmt(f)
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// Entities registered.
    pub entities_added: u64,
    /// Entities deregistered.
    pub entities_removed: u64,
    /// Combat events recorded.
    pub events_recorded: u64,
    /// Combat events expired.
    pub events_expired: u64,
    /// Clusters emitted.
    pub clusters_emitted: u64,
    /// Claims granted.
    pub claims_granted: u64,
    /// Claims denied.
    pub claims_denied: u64,
    /// Ticks completed.
    pub ticks_run: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows: [(&str, &str, u64); 8] = [
            ("entities_added", "Entities registered", self.entities_added),
            ("entities_removed", "Entities deregistered", self.entities_removed),
            ("events_recorded", "Combat events recorded", self.events_recorded),
            ("events_expired", "Combat events expired", self.events_expired),
            ("clusters_emitted", "Combat clusters emitted", self.clusters_emitted),
            ("claims_granted", "Loot claims granted", self.claims_granted),
            ("claims_denied", "Loot claims denied", self.claims_denied),
            ("ticks_run", "Ticks completed", self.ticks_run),
        ];
        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!(
                "# HELP hivemind_{name}_total {help}\n\
                 # TYPE hivemind_{name}_total counter\n\
                 hivemind_{name}_total {value}\n"
            ));
        }
        out
    }

    /// Serialize as JSON.
    ///
    /// # Errors
    /// Propagates `serde_json` failures (none occur for this plain struct).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Tick timing
// ---------------------------------------------------------------------------

const TICK_HISTORY: usize = 256;

/// Recent tick durations against a budget.
pub struct TickTimer {
    budget_ms: f64,
    history: Mutex<TickHistory>,
}

struct TickHistory {
    timings: Vec<f64>,
    write_idx: usize,
    count: u64,
}

impl TickTimer {
    /// A timer with the given per-tick budget in milliseconds.
    #[must_use]
    pub fn new(budget_ms: f64) -> Self {
        Self {
            budget_ms,
            history: Mutex::new(TickHistory {
                timings: vec![0.0; TICK_HISTORY],
                write_idx: 0,
                count: 0,
            }),
        }
    }

    /// Time a tick; the duration is recorded when the guard drops.
    pub fn begin(&self) -> TickGuard<'_> {
        TickGuard {
            timer: self,
            start: Instant::now(),
        }
    }

    /// Record a duration in milliseconds.
    pub fn record(&self, ms: f64) {
        let mut h = self.history.lock();
        let idx = h.write_idx;
        h.timings[idx] = ms;
        h.write_idx = (idx + 1) % TICK_HISTORY;
        h.count += 1;
    }

    /// Ticks recorded so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.history.lock().count
    }

    /// The budget in milliseconds.
    #[must_use]
    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }

    /// P50/P95/P99/max over the retained window.
    #[must_use]
    pub fn percentiles(&self) -> TickPercentiles {
        let h = self.history.lock();
        let n = usize::try_from(h.count).map_or(TICK_HISTORY, |c| c.min(TICK_HISTORY));
        if n == 0 {
            return TickPercentiles::default();
        }
        let mut sorted = h.timings[..n].to_vec();
        drop(h);
        sorted.sort_by(f64::total_cmp);

        let at = |q: f64| sorted[((n as f64 * q) as usize).min(n - 1)];
        let over = sorted.iter().filter(|&&t| t > self.budget_ms).count();
        TickPercentiles {
            p50: at(0.5),
            p95: at(0.95),
            p99: at(0.99),
            max: sorted[n - 1],
            over_budget_ratio: over as f64 / n as f64,
        }
    }
}

impl std::fmt::Debug for TickTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickTimer")
            .field("budget_ms", &self.budget_ms)
            .field("ticks", &self.tick_count())
            .finish()
    }
}

/// Records elapsed time into its [`TickTimer`] on drop.
pub struct TickGuard<'a> {
    timer: &'a TickTimer,
    start: Instant,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.start.elapsed().as_secs_f64() * 1000.0);
    }
}

/// Tick duration statistics in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickPercentiles {
    /// Median.
    pub p50: f64,
    /// 95th percentile.
    pub p95: f64,
    /// 99th percentile.
    pub p99: f64,
    /// Slowest retained tick.
    pub max: f64,
    /// Share of ticks over budget, 0.0–1.0.
    pub over_budget_ratio: f64,
}

impl TickPercentiles {
    /// One-line summary.
    #[must_use]
    pub fn summary(&self, budget_ms: f64) -> String {
        format!(
            "P50={:.3}ms  P95={:.3}ms  P99={:.3}ms  Max={:.3}ms  Budget={budget_ms:.1}ms  \
             Over-budget={:.1}%",
            self.p50,
            self.p95,
            self.p99,
            self.max,
            self.over_budget_ratio * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Span names
// ---------------------------------------------------------------------------

/// Span names for `tracing::span!`.
pub mod spans {
    /// Whole tick.
    pub const TICK: &str = "hivemind::tick";
    /// Combat event expiry.
    pub const EVENT_CLEANUP: &str = "hivemind::tick::events";
    /// Dead-entity cleanup and sensor reset.
    pub const MAINTENANCE: &str = "hivemind::tick::maintenance";
    /// Clustering and dynamic objectives.
    pub const COMBAT: &str = "hivemind::tick::combat";
    /// Squad personality and tactical positions.
    pub const SQUADS: &str = "hivemind::tick::squads";
    /// Squad loot claims.
    pub const LOOT: &str = "hivemind::tick::loot";
    /// Behavior state machines.
    pub const BEHAVIOR: &str = "hivemind::tick::behavior";
}
