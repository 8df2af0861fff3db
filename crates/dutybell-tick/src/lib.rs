//! Fixed-interval tick scheduler for Dutybell's reconciliation loop.
//!
//! The monitor reconciles its capture sessions against the live process
//! list on a fixed cadence (10 s by default). This crate owns that clock:
//! deadline scheduling, overrun detection, pause/resume, and per-pass
//! budget metrics.
//!
//! # Manual mode
//!
//! When `interval` is [`Duration::ZERO`], the scheduler enters manual mode
//! and [`TickScheduler::wait_for_tick`] pends forever. The monitor then
//! reconciles only when explicitly asked to, which is what tests and
//! one-shot tools want.
//!
//! # Overruns
//!
//! A pass that runs past the next deadline never queues catch-up passes.
//! Reconciliation is level-based, so each pass observes the current
//! process list; the scheduler skips the covered deadlines and resumes on
//! the next boundary.
//!
//! # Integration
//!
//! The scheduler sits inside the monitor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         tick_info = scheduler.wait_for_tick() => {
//!             monitor.reconcile().await;
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Full configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between reconciliation passes. [`Duration::ZERO`] = manual
    /// mode (the tick never fires).
    pub interval: Duration,
    /// Budget warning threshold (0.0–1.0). Default: 0.50 (50%).
    /// A tracing warning is emitted when pass execution exceeds this
    /// fraction of the interval.
    pub budget_warn_threshold: f64,
    /// Budget critical threshold (0.0–1.0). Default: 1.0 (100%).
    pub budget_critical_threshold: f64,
    /// Enable per-pass metrics collection. Adds minor overhead.
    pub metrics_enabled: bool,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            budget_warn_threshold: 0.50,
            budget_critical_threshold: 1.0,
            metrics_enabled: true,
        }
    }
}

impl TickConfig {
    /// Default reconciliation cadence.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

    /// Minimum supported interval. Anything shorter (except zero, which
    /// selects manual mode) is a hot loop against the process table.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

    /// Create a config for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Create a manual-mode config: the tick never fires on its own.
    pub fn manual() -> Self {
        Self::with_interval(Duration::ZERO)
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`]. Rules:
    /// - Nonzero `interval` raised to at least [`Self::MIN_INTERVAL`]
    ///   (zero is allowed for manual mode).
    /// - Thresholds clamped to `0.0..=1.0`.
    /// - `budget_warn_threshold` forced ≤ `budget_critical_threshold`.
    pub fn validated(mut self) -> Self {
        if self.interval > Duration::ZERO && self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "interval below minimum, raising"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self.budget_critical_threshold = self.budget_critical_threshold.clamp(0.0, 1.0);
        if self.budget_warn_threshold > self.budget_critical_threshold {
            self.budget_warn_threshold = self.budget_critical_threshold;
        }
        self
    }

    /// The reconciliation cadence. Returns `None` for manual mode.
    pub fn cadence(&self) -> Option<Duration> {
        if self.interval == Duration::ZERO {
            None
        } else {
            Some(self.interval)
        }
    }
}

// ---------------------------------------------------------------------------
// Tick info (returned to caller each tick)
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// `true` if this tick fired late (scheduler detected overrun).
    pub overrun: bool,
    /// How many deadlines were skipped due to overrun (0 in normal
    /// operation).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime metrics for the tick scheduler.
///
/// Updated after each pass when `metrics_enabled` is true.
/// All timing values refer to the reconcile work reported via
/// [`TickScheduler::record_tick_end`].
#[derive(Debug, Clone)]
pub struct TickMetrics {
    /// Total ticks fired.
    pub total_ticks: u64,
    /// Total overruns detected.
    pub total_overruns: u64,
    /// Total deadlines skipped after overruns.
    pub total_skipped: u64,
    /// Exponential moving average of pass execution time (α = 0.1).
    pub avg_pass_time: Duration,
    /// Maximum pass execution time observed.
    pub max_pass_time: Duration,
    /// Current budget utilization (0.0–∞). >1.0 means the pass ran
    /// longer than the interval.
    pub budget_utilization: f64,
}

impl Default for TickMetrics {
    fn default() -> Self {
        Self {
            total_ticks: 0,
            total_overruns: 0,
            total_skipped: 0,
            avg_pass_time: Duration::ZERO,
            max_pass_time: Duration::ZERO,
            budget_utilization: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-interval tick scheduler.
///
/// Drives the reconciliation loop for a single monitor. The first tick is
/// due immediately, so a monitor attaches to already-running game clients
/// at startup instead of waiting out a full interval.
pub struct TickScheduler {
    config: TickConfig,
    cadence: Option<Duration>,
    tick_count: u64,
    /// When the next tick should fire (Tokio instant for `sleep_until`).
    next_tick: Option<TokioInstant>,
    /// Wall-clock instant when the last pass started.
    /// Set by `wait_for_tick`, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
    paused: bool,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Create a new scheduler from config.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let cadence = config.cadence();

        // First deadline is now: the initial pass runs at startup.
        let next_tick = cadence.map(|_| TokioInstant::now());

        if cadence.is_none() {
            debug!("tick scheduler created in manual mode (no interval loop)");
        } else {
            debug!(
                interval_ms = config.interval.as_millis() as u64,
                "tick scheduler created"
            );
        }

        Self {
            config,
            cadence,
            tick_count: 0,
            next_tick,
            tick_start: None,
            paused: false,
            metrics: TickMetrics::default(),
        }
    }

    /// Create a scheduler for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(TickConfig::with_interval(interval))
    }

    /// Wait until the next tick is due. Returns [`TickInfo`] for the tick.
    ///
    /// In manual mode (`interval == ZERO`) or when paused, this future
    /// pends forever; `tokio::select!` will still process other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        // Manual or paused: pend forever.
        let (next, cadence) = match (self.next_tick, self.cadence) {
            (Some(next), Some(cadence)) if !self.paused => (next, cadence),
            _ => {
                // This future never completes, select! handles other branches.
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        // Detect overrun: did we wake up significantly late?
        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > cadence / 10; // >10% late = overrun
        let mut ticks_skipped = 0u64;

        if overrun {
            ticks_skipped = late_by.as_nanos() as u64 / cadence.as_nanos() as u64;
            if ticks_skipped > 0 {
                warn!(
                    tick = self.tick_count,
                    skipped = ticks_skipped,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "tick overrun, skipping ahead"
                );
            }
            self.metrics.total_overruns += 1;
        }

        // Always schedule from now, not from the missed deadline.
        self.next_tick = Some(now + cadence);

        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Record that the work for the current tick has finished.
    ///
    /// Call this after the reconcile pass returns to enable budget
    /// monitoring and metrics. If not called, budget warnings won't fire.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();

        if let Some(budget) = self.cadence {
            let utilization = elapsed.as_secs_f64() / budget.as_secs_f64();
            self.metrics.budget_utilization = utilization;

            if utilization >= self.config.budget_critical_threshold {
                warn!(
                    tick = self.tick_count,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    budget_ms = budget.as_secs_f64() * 1000.0,
                    utilization_pct = format!("{:.1}", utilization * 100.0),
                    "CRITICAL: pass exceeded its interval"
                );
            } else if utilization >= self.config.budget_warn_threshold {
                warn!(
                    tick = self.tick_count,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    budget_ms = budget.as_secs_f64() * 1000.0,
                    utilization_pct = format!("{:.1}", utilization * 100.0),
                    "pass approaching its interval budget"
                );
            }
        }

        // Update metrics.
        if self.config.metrics_enabled {
            if elapsed > self.metrics.max_pass_time {
                self.metrics.max_pass_time = elapsed;
            }
            // Exponential moving average (α = 0.1).
            let alpha = 0.1;
            let prev = self.metrics.avg_pass_time.as_secs_f64();
            let curr = elapsed.as_secs_f64();
            self.metrics.avg_pass_time =
                Duration::from_secs_f64(prev * (1.0 - alpha) + curr * alpha);
        }
    }

    /// Pause the tick loop. `wait_for_tick` will pend until
    /// [`resume`](Self::resume) is called.
    ///
    /// The monitor pauses the clock while a reconnect is tearing capture
    /// sessions down, so no pass interleaves with the teardown.
    ///
    /// Safe to call multiple times (idempotent).
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Resume the tick loop after a pause.
    ///
    /// Resets the next deadline to `now + interval` so the time spent
    /// paused never registers as an overrun.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(cadence) = self.cadence {
                self.next_tick = Some(TokioInstant::now() + cadence);
            }
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    /// Whether the scheduler is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether this scheduler is in manual mode (interval = 0).
    pub fn is_manual(&self) -> bool {
        self.cadence.is_none()
    }

    /// Current tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Snapshot of current metrics.
    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    /// The reconciliation cadence, or `None` for manual mode.
    pub fn cadence(&self) -> Option<Duration> {
        self.cadence
    }
}
