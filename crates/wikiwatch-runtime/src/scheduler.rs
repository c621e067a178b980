//! Minute-aligned tick loop driving a [`TaskScheduler`].

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use tracing::{debug, info, warn};

use crate::shutdown::StopSignal;
use crate::transport::TaskScheduler;

const MINUTE: Duration = Duration::from_secs(60);

/// Counters returned when the tick loop is stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    pub ticks: u64,
}

/// How long to sleep after a tick that started at `start` and finished at
/// `end`.
///
/// The next tick lands on the next wall-clock minute boundary after `end`. A
/// tick that took a full minute or more is followed immediately.
pub fn next_tick_delay(start: DateTime<Utc>, end: DateTime<Utc>) -> Duration {
    let elapsed = (end - start).to_std().unwrap_or_default();
    if elapsed >= MINUTE {
        return Duration::ZERO;
    }
    // A leap second reports nanoseconds past 1e9.
    let nanos = end.nanosecond().min(999_999_999);
    let into_minute = Duration::new(u64::from(end.second()), nanos);
    MINUTE.saturating_sub(into_minute)
}

/// `t` truncated to the start of its minute.
fn minute_of(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(t)
}

/// Whether a tick at `now` lands in a minute other than the last one ticked.
///
/// A wake-up slightly before the boundary (timer jitter, clock slew) would
/// otherwise schedule the same minute twice.
fn is_new_minute(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    last != Some(minute_of(now))
}

/// Call `scheduler` once per wall-clock minute until `stop` fires.
pub async fn run_scheduler(scheduler: &mut dyn TaskScheduler, mut stop: StopSignal) -> SchedulerReport {
    let mut report = SchedulerReport::default();
    let mut last_minute = None;
    info!("scheduler started");

    while !stop.is_stopped() {
        let start = Utc::now();
        if !is_new_minute(last_minute, start) {
            let delay = next_tick_delay(start, start);
            debug!(delay_ms = delay.as_millis() as u64, "minute already scheduled; waiting for the next");
            tokio::select! {
                _ = stop.stopped() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            continue;
        }
        last_minute = Some(minute_of(start));
        scheduler.schedule_due_tasks(start);
        report.ticks += 1;
        let end = Utc::now();

        let elapsed = end - start;
        let delay = next_tick_delay(start, end);
        if delay.is_zero() {
            warn!(elapsed_ms = elapsed.num_milliseconds(), "scheduler tick overran a minute");
        }
        debug!(tick = report.ticks, delay_ms = delay.as_millis() as u64, "scheduler sleeping");

        tokio::select! {
            _ = stop.stopped() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    info!(ticks = report.ticks, "scheduler stopped");
    report
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    use crate::shutdown::stop_channel;

    fn at(h: u32, m: u32, s: u32, ms: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, s).unwrap() + chrono::Duration::milliseconds(i64::from(ms))
    }

    // ── next_tick_delay ───────────────────────────────────────────────────

    #[test]
    fn test_delay_aligns_to_next_minute() {
        let delay = next_tick_delay(at(12, 0, 0, 0), at(12, 0, 2, 500));
        assert_eq!(delay, Duration::from_millis(57_500));
    }

    #[test]
    fn test_delay_for_instant_tick_is_full_minute() {
        let t = at(12, 0, 0, 0);
        assert_eq!(next_tick_delay(t, t), MINUTE);
    }

    #[test]
    fn test_delay_when_tick_crosses_a_boundary() {
        let delay = next_tick_delay(at(12, 0, 50, 0), at(12, 1, 10, 0));
        assert_eq!(delay, Duration::from_secs(50));
    }

    #[test]
    fn test_overrun_ticks_immediately() {
        assert_eq!(next_tick_delay(at(12, 0, 0, 0), at(12, 1, 0, 0)), Duration::ZERO);
        assert_eq!(next_tick_delay(at(12, 0, 0, 0), at(12, 3, 7, 0)), Duration::ZERO);
    }

    #[test]
    fn test_clock_going_backwards_still_aligns() {
        let delay = next_tick_delay(at(12, 0, 30, 0), at(12, 0, 20, 0));
        assert_eq!(delay, Duration::from_secs(40));
    }

    // ── minute de-duplication ─────────────────────────────────────────────

    #[test]
    fn test_minute_of_truncates() {
        assert_eq!(minute_of(at(12, 0, 59, 999)), at(12, 0, 0, 0));
        assert_eq!(minute_of(at(12, 1, 0, 0)), at(12, 1, 0, 0));
    }

    #[test]
    fn test_same_minute_is_not_ticked_twice() {
        let last = Some(minute_of(at(12, 0, 0, 0)));
        assert!(!is_new_minute(last, at(12, 0, 59, 999)));
        assert!(!is_new_minute(last, at(12, 0, 0, 0)));
        assert!(is_new_minute(last, at(12, 1, 0, 0)));
        assert!(is_new_minute(None, at(12, 0, 0, 0)));
    }

    #[test]
    fn test_early_wakeup_waits_for_the_boundary() {
        let t = at(12, 0, 59, 999);
        assert_eq!(next_tick_delay(t, t), Duration::from_millis(1));
    }

    // ── run_scheduler ─────────────────────────────────────────────────────

    #[derive(Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<DateTime<Utc>>>>,
    }

    impl TaskScheduler for Recorder {
        fn schedule_due_tasks(&mut self, now: DateTime<Utc>) {
            self.calls.lock().unwrap().push(now);
        }
    }

    #[tokio::test]
    async fn test_first_tick_runs_immediately_then_stops() {
        let mut recorder = Recorder::default();
        let calls = Arc::clone(&recorder.calls);
        let (handle, stop) = stop_channel();

        let task = tokio::spawn(async move { run_scheduler(&mut recorder, stop).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop();
        let report = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("stops while sleeping")
            .unwrap();

        assert!(report.ticks >= 1);
        assert_eq!(calls.lock().unwrap().len() as u64, report.ticks);
    }

    #[tokio::test]
    async fn test_stopped_scheduler_never_ticks() {
        let mut recorder = Recorder::default();
        let (handle, stop) = stop_channel();
        handle.stop();
        let report = run_scheduler(&mut recorder, stop).await;
        assert_eq!(report.ticks, 0);
        assert!(recorder.calls.lock().unwrap().is_empty());
    }
}
