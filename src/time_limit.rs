//! Deterministic time accounting and the `TimeLimitGuard` RAII idiom.
//!
//! `RevisedSimplex` does not measure wall-clock time directly: it counts
//! floating-point operations and converts that count to a "deterministic
//! time" using a fixed factor, so that two runs on the same hardware (or
//! different hardware) make the same phase-control decisions. This mirrors
//! `DeterministicTimeForFpOperations` in `ortools/lp_data/lp_types.h` and the
//! `Cleanup update_deterministic_time_on_return` guard installed at the top
//! of `RevisedSimplex::Solve`.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Seconds of deterministic time charged per floating-point operation,
/// carried verbatim from `DeterministicTimeForFpOperations`'s
/// `kConversionFactor` rather than re-derived.
pub const DETERMINISTIC_TIME_PER_FP_OP: f64 = 2e-9;

/// Converts an operation count into deterministic time, in seconds.
#[inline]
pub fn deterministic_time_for_fp_operations(num_operations: u64) -> f64 {
    num_operations as f64 * DETERMINISTIC_TIME_PER_FP_OP
}

/// Tracks elapsed deterministic time and, optionally, a wall-clock deadline
/// derived from `timeout_ms`.
pub struct TimeLimit {
    deadline: Option<Instant>,
    deterministic_time: Cell<f64>,
    pending_ops: Cell<u64>,
}

impl TimeLimit {
    pub fn new(timeout_ms: Option<u64>) -> Self {
        TimeLimit {
            deadline: timeout_ms.map(|ms| Instant::now() + Duration::from_millis(ms)),
            deterministic_time: Cell::new(0.0),
            pending_ops: Cell::new(0),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Records floating-point operations performed since the last advance;
    /// actually charged to `deterministic_time` when the returned
    /// `TimeLimitGuard` is dropped (or via an explicit `advance`).
    pub fn record_fp_operations(&self, count: u64) {
        self.pending_ops.set(self.pending_ops.get() + count);
    }

    /// Folds any pending operation count into `deterministic_time` now.
    pub fn advance_deterministic_time(&self) {
        let pending = self.pending_ops.replace(0);
        if pending > 0 {
            let delta = deterministic_time_for_fp_operations(pending);
            self.deterministic_time.set(self.deterministic_time.get() + delta);
        }
    }

    pub fn deterministic_time(&self) -> f64 {
        self.deterministic_time.get()
    }

    pub fn is_past_deadline(&self) -> bool {
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self.deadline {
            Some(deadline) => {
                let total = deadline.saturating_duration_since(Instant::now());
                // Only meaningful relative to the original timeout; callers
                // needing "ms elapsed so far" should track a start Instant
                // separately. Kept for completeness of the guard's API.
                total.as_millis() as u64
            }
            None => 0,
        }
    }

    /// Borrows a guard whose `Drop` impl folds pending operations into
    /// `deterministic_time`, mirroring the `Cleanup
    /// update_deterministic_time_on_return` lambda installed at the top of
    /// `Solve()` in the original implementation: callers structure a solve
    /// step as `let _guard = time_limit.scoped_guard(); ...fallible work...`
    /// and the time is charged on every exit path, including `?`-propagated
    /// errors and early returns.
    pub fn scoped_guard(&self) -> TimeLimitGuard<'_> {
        TimeLimitGuard { limit: self }
    }
}

/// RAII guard that advances deterministic time when dropped, regardless of
/// how the enclosing scope is exited.
pub struct TimeLimitGuard<'a> {
    limit: &'a TimeLimit,
}

impl Drop for TimeLimitGuard<'_> {
    fn drop(&mut self) {
        self.limit.advance_deterministic_time();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_never_reports_past_deadline() {
        let tl = TimeLimit::unlimited();
        assert!(!tl.is_past_deadline());
    }

    #[test]
    fn guard_charges_pending_ops_on_drop() {
        let tl = TimeLimit::unlimited();
        {
            let _guard = tl.scoped_guard();
            tl.record_fp_operations(1_000_000);
        }
        assert!(tl.deterministic_time() > 0.0);
    }

    #[test]
    fn guard_charges_time_even_on_early_return() {
        let tl = TimeLimit::unlimited();
        fn step(tl: &TimeLimit) -> Result<(), ()> {
            let _guard = tl.scoped_guard();
            tl.record_fp_operations(500);
            Err(())
        }
        let _ = step(&tl);
        assert!(tl.deterministic_time() > 0.0);
    }

    #[test]
    fn zero_timeout_is_immediately_past_deadline() {
        let tl = TimeLimit::new(Some(0));
        std::thread::sleep(Duration::from_millis(1));
        assert!(tl.is_past_deadline());
    }
}
