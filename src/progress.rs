use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::ProgressPolicy;

/// The wall clock is only consulted once per this many lines.
const CLOCK_CHECK_MASK: u64 = 4096 - 1;

/// Items per second, or 0 when no time has elapsed.
pub fn throughput(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

/// Counts processed lines and logs throughput according to a [`ProgressPolicy`].
#[derive(Debug)]
pub struct ProgressTracker {
    policy: ProgressPolicy,
    start: Instant,
    last_report: Instant,
    lines: u64,
    reports: u64,
}

impl ProgressTracker {
    pub fn new(policy: ProgressPolicy) -> Self {
        let now = Instant::now();
        Self {
            policy,
            start: now,
            last_report: now,
            lines: 0,
            reports: 0,
        }
    }

    /// Records one successfully processed line.
    #[inline]
    pub fn record(&mut self) {
        self.lines += 1;
        let due = match self.policy {
            ProgressPolicy::EveryLines(n) => self.lines % n == 0,
            ProgressPolicy::EveryInterval(interval) => {
                self.lines & CLOCK_CHECK_MASK == 0 && self.last_report.elapsed() >= interval
            }
            ProgressPolicy::Disabled => false,
        };
        if due {
            self.report();
        }
    }

    fn report(&mut self) {
        self.last_report = Instant::now();
        self.reports += 1;
        info!(
            lines = self.lines,
            "Processed {} lines ({:.2} lines/s)",
            self.lines,
            throughput(self.lines, self.elapsed())
        );
    }

    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// How many progress lines have been emitted so far.
    pub fn reports(&self) -> u64 {
        self.reports
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Thread-safe counterpart of [`ProgressTracker`] for the parallel engine.
///
/// Workers add their line counts in batches; whichever worker crosses a
/// reporting threshold logs the progress line.
#[derive(Debug)]
pub struct SharedProgress {
    policy: ProgressPolicy,
    start: Instant,
    lines: AtomicU64,
    last_report_nanos: AtomicU64,
    reports: AtomicU64,
}

impl SharedProgress {
    pub fn new(policy: ProgressPolicy) -> Self {
        Self {
            policy,
            start: Instant::now(),
            lines: AtomicU64::new(0),
            last_report_nanos: AtomicU64::new(0),
            reports: AtomicU64::new(0),
        }
    }

    /// Records `batch` more processed lines.
    pub fn add(&self, batch: u64) {
        if batch == 0 {
            return;
        }
        let before = self.lines.fetch_add(batch, Ordering::Relaxed);
        let after = before + batch;
        let due = match self.policy {
            ProgressPolicy::EveryLines(n) => before / n != after / n,
            ProgressPolicy::EveryInterval(interval) => {
                let now = self.start.elapsed().as_nanos() as u64;
                let last = self.last_report_nanos.load(Ordering::Relaxed);
                now.saturating_sub(last) >= interval.as_nanos() as u64
                    && self
                        .last_report_nanos
                        .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
                        .is_ok()
            }
            ProgressPolicy::Disabled => false,
        };
        if due {
            self.reports.fetch_add(1, Ordering::Relaxed);
            info!(
                lines = after,
                "Processed {} lines ({:.2} lines/s)",
                after,
                throughput(after, self.start.elapsed())
            );
        }
    }

    pub fn lines(&self) -> u64 {
        self.lines.load(Ordering::Relaxed)
    }

    pub fn reports(&self) -> u64 {
        self.reports.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_handles_zero_elapsed() {
        assert_eq!(throughput(100, Duration::ZERO), 0.0);
        assert_eq!(throughput(100, Duration::from_secs(2)), 50.0);
    }

    #[test]
    fn reports_every_n_lines() {
        let mut tracker = ProgressTracker::new(ProgressPolicy::EveryLines(10));
        for _ in 0..35 {
            tracker.record();
        }
        assert_eq!(tracker.lines(), 35);
        assert_eq!(tracker.reports(), 3);
    }

    #[test]
    fn disabled_never_reports() {
        let mut tracker = ProgressTracker::new(ProgressPolicy::Disabled);
        for _ in 0..10_000 {
            tracker.record();
        }
        assert_eq!(tracker.lines(), 10_000);
        assert_eq!(tracker.reports(), 0);
    }

    #[test]
    fn interval_policy_waits_for_the_clock() {
        let mut tracker = ProgressTracker::new(ProgressPolicy::EveryInterval(Duration::from_secs(3600)));
        for _ in 0..20_000 {
            tracker.record();
        }
        assert_eq!(tracker.reports(), 0);

        let mut tracker = ProgressTracker::new(ProgressPolicy::EveryInterval(Duration::from_nanos(1)));
        std::thread::sleep(Duration::from_millis(1));
        for _ in 0..4096 {
            tracker.record();
        }
        assert_eq!(tracker.reports(), 1);
    }

    #[test]
    fn shared_reports_once_per_crossed_threshold() {
        let progress = SharedProgress::new(ProgressPolicy::EveryLines(10));
        for _ in 0..10 {
            progress.add(4);
        }
        assert_eq!(progress.lines(), 40);
        assert_eq!(progress.reports(), 4);
    }

    #[test]
    fn shared_counts_across_threads() {
        let progress = SharedProgress::new(ProgressPolicy::EveryLines(1_000));
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..250 {
                        progress.add(10);
                    }
                });
            }
        });
        assert_eq!(progress.lines(), 10_000);
        assert_eq!(progress.reports(), 10);
    }

    #[test]
    fn shared_interval_and_disabled() {
        let progress = SharedProgress::new(ProgressPolicy::EveryInterval(Duration::from_secs(3600)));
        progress.add(1_000_000);
        assert_eq!(progress.reports(), 0);

        let progress = SharedProgress::new(ProgressPolicy::EveryInterval(Duration::from_nanos(1)));
        std::thread::sleep(Duration::from_millis(1));
        progress.add(1);
        assert_eq!(progress.reports(), 1);

        let progress = SharedProgress::new(ProgressPolicy::Disabled);
        progress.add(1_000_000);
        assert_eq!(progress.reports(), 0);
        assert_eq!(progress.lines(), 1_000_000);
    }
}
