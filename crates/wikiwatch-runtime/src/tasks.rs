//! Registry of periodic tasks, the default [`TaskScheduler`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use tracing::{error, info};

use crate::transport::TaskScheduler;

/// Work run by the scheduler on a blocking worker.
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, now: DateTime<Utc>) -> anyhow::Result<()>;
}

/// When a task is due. `None` fields match every value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Trigger {
    pub minute: Option<u32>,
    pub hour: Option<u32>,
    pub weekday: Option<Weekday>,
}

impl Trigger {
    pub fn every_minute() -> Self {
        Self::default()
    }

    pub fn hourly_at(minute: u32) -> Self {
        Self {
            minute: Some(minute),
            ..Self::default()
        }
    }

    pub fn daily_at(hour: u32, minute: u32) -> Self {
        Self {
            minute: Some(minute),
            hour: Some(hour),
            weekday: None,
        }
    }

    pub fn weekly_at(weekday: Weekday, hour: u32, minute: u32) -> Self {
        Self {
            minute: Some(minute),
            hour: Some(hour),
            weekday: Some(weekday),
        }
    }

    pub fn matches(&self, now: DateTime<Utc>) -> bool {
        self.minute.map_or(true, |m| m == now.minute())
            && self.hour.map_or(true, |h| h == now.hour())
            && self.weekday.map_or(true, |d| d == now.weekday())
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = |v: Option<u32>| v.map_or_else(|| "*".to_string(), |v| v.to_string());
        let weekday = self.weekday.map_or_else(|| "*".to_string(), |d| d.to_string());
        write!(f, "{} {} {}", field(self.minute), field(self.hour), weekday)
    }
}

struct Entry {
    trigger: Trigger,
    task: Arc<dyn Task>,
}

#[derive(Default)]
pub struct TaskRegistry {
    entries: Vec<Entry>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, trigger: Trigger, task: Arc<dyn Task>) {
        info!(task = task.name(), %trigger, "registered scheduled task");
        self.entries.push(Entry { trigger, task });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tasks whose trigger matches `now`, in registration order.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<Arc<dyn Task>> {
        self.entries
            .iter()
            .filter(|entry| entry.trigger.matches(now))
            .map(|entry| Arc::clone(&entry.task))
            .collect()
    }
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.task.name(), e.trigger)))
            .finish()
    }
}

impl TaskScheduler for TaskRegistry {
    /// Start every due task on its own blocking worker and return at once.
    ///
    /// Must be called from within a tokio runtime.
    fn schedule_due_tasks(&mut self, now: DateTime<Utc>) {
        for task in self.due(now) {
            info!(task = task.name(), "starting scheduled task");
            tokio::task::spawn_blocking(move || {
                if let Err(e) = task.run(now) {
                    error!(task = task.name(), error = %e, "scheduled task failed");
                }
            });
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::Duration;

    // 2024-05-06 is a Monday.
    fn monday(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, 0).unwrap()
    }

    struct Named {
        name: &'static str,
        ran: Mutex<mpsc::Sender<(&'static str, DateTime<Utc>)>>,
        fail: bool,
    }

    impl Task for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn run(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
            self.ran.lock().unwrap().send((self.name, now))?;
            if self.fail {
                anyhow::bail!("{} failed on purpose", self.name);
            }
            Ok(())
        }
    }

    fn named(
        name: &'static str,
        tx: &mpsc::Sender<(&'static str, DateTime<Utc>)>,
        fail: bool,
    ) -> Arc<dyn Task> {
        Arc::new(Named {
            name,
            ran: Mutex::new(tx.clone()),
            fail,
        })
    }

    // ── Trigger ───────────────────────────────────────────────────────────

    #[test]
    fn test_trigger_matching() {
        assert!(Trigger::every_minute().matches(monday(3, 17)));
        assert!(Trigger::hourly_at(17).matches(monday(3, 17)));
        assert!(!Trigger::hourly_at(18).matches(monday(3, 17)));
        assert!(Trigger::daily_at(3, 17).matches(monday(3, 17)));
        assert!(!Trigger::daily_at(4, 17).matches(monday(3, 17)));
        assert!(Trigger::weekly_at(Weekday::Mon, 0, 0).matches(monday(0, 0)));
        assert!(!Trigger::weekly_at(Weekday::Tue, 0, 0).matches(monday(0, 0)));
    }

    #[test]
    fn test_trigger_display() {
        assert_eq!(Trigger::every_minute().to_string(), "* * *");
        assert_eq!(Trigger::weekly_at(Weekday::Sun, 4, 30).to_string(), "30 4 Sun");
    }

    // ── TaskRegistry ──────────────────────────────────────────────────────

    #[test]
    fn test_due_in_registration_order() {
        let (tx, _rx) = mpsc::channel();
        let mut registry = TaskRegistry::new();
        assert!(registry.is_empty());
        registry.register(Trigger::hourly_at(0), named("hourly", &tx, false));
        registry.register(Trigger::daily_at(6, 0), named("daily", &tx, false));
        registry.register(Trigger::every_minute(), named("always", &tx, false));
        assert_eq!(registry.len(), 3);

        let names = |now| {
            registry
                .due(now)
                .iter()
                .map(|t| t.name().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(monday(6, 0)), vec!["hourly", "daily", "always"]);
        assert_eq!(names(monday(7, 0)), vec!["hourly", "always"]);
        assert_eq!(names(monday(7, 1)), vec!["always"]);
    }

    #[tokio::test]
    async fn test_schedule_runs_due_tasks_and_survives_failures() {
        let (tx, rx) = mpsc::channel();
        let mut registry = TaskRegistry::new();
        registry.register(Trigger::hourly_at(0), named("broken", &tx, true));
        registry.register(Trigger::hourly_at(0), named("fine", &tx, false));
        registry.register(Trigger::hourly_at(30), named("later", &tx, false));

        let now = monday(9, 0);
        registry.schedule_due_tasks(now);

        let mut ran = Vec::new();
        for _ in 0..2 {
            ran.push(rx.recv_timeout(Duration::from_secs(5)).unwrap());
        }
        ran.sort();
        assert_eq!(ran, vec![("broken", now), ("fine", now)]);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
