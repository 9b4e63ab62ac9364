use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics_lock_poisoned_recovered");
    }
}

/// Rates over the last completed metrics interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    /// Engine update cycles that ran (paused cycles excluded).
    pub ups: f32,
    /// Frames pushed to the window.
    pub fps: f32,
    /// Mean wall time of one engine poll that did work.
    pub update_time_ms: f32,
}

/// Shared, cloneable view of the latest snapshot.
#[derive(Clone, Debug)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl Default for MetricsHandle {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(LoopMetricsSnapshot::default())),
        }
    }
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                *poisoned.into_inner() = snapshot;
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    updates: u32,
    presents: u32,
    update_time_sum: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval_start: now,
            interval,
            updates: 0,
            presents: 0,
            update_time_sum: Duration::ZERO,
        }
    }

    pub(crate) fn record_update(&mut self, cost: Duration) {
        self.updates = self.updates.saturating_add(1);
        self.update_time_sum = self.update_time_sum.saturating_add(cost);
    }

    pub(crate) fn record_present(&mut self) {
        self.presents = self.presents.saturating_add(1);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let update_time_ms = if self.updates == 0 {
            0.0
        } else {
            (self.update_time_sum.as_secs_f32() / self.updates as f32) * 1000.0
        };
        let snapshot = LoopMetricsSnapshot {
            ups: self.updates as f32 / elapsed_seconds,
            fps: self.presents as f32 / elapsed_seconds,
            update_time_ms,
        };

        self.interval_start = now;
        self.updates = 0;
        self.presents = 0;
        self.update_time_sum = Duration::ZERO;
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn poison_lock(lock: &RwLock<LoopMetricsSnapshot>) {
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = lock.write().expect("write guard");
                    panic!("poison metrics lock");
                })
                .join();
        });
    }

    #[test]
    fn snapshot_reports_rates_and_mean_update_cost() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(2), base);
        for _ in 0..20 {
            accumulator.record_update(Duration::from_millis(3));
        }
        for _ in 0..10 {
            accumulator.record_present();
        }

        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_secs(2))
            .expect("interval elapsed");

        assert!((snapshot.ups - 10.0).abs() < 0.05);
        assert!((snapshot.fps - 5.0).abs() < 0.05);
        assert!((snapshot.update_time_ms - 3.0).abs() < 0.001);
    }

    #[test]
    fn snapshot_waits_for_interval_and_then_resets() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1), base);
        accumulator.record_update(Duration::from_millis(1));

        assert!(accumulator
            .maybe_snapshot(base + Duration::from_millis(500))
            .is_none());
        assert!(accumulator
            .maybe_snapshot(base + Duration::from_secs(1))
            .is_some());

        let idle = accumulator
            .maybe_snapshot(base + Duration::from_secs(2))
            .expect("second interval");
        assert_eq!(idle, LoopMetricsSnapshot::default());
    }

    #[test]
    fn handle_recovers_after_poison_without_panic() {
        let handle = MetricsHandle::default();
        poison_lock(handle.snapshot.as_ref());

        assert_eq!(handle.snapshot(), LoopMetricsSnapshot::default());
        let expected = LoopMetricsSnapshot {
            ups: 10.0,
            fps: 10.0,
            update_time_ms: 0.5,
        };
        handle.publish(expected);
        assert_eq!(handle.snapshot(), expected);
    }
}
