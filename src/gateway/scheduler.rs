//! Reminder scheduler — fixed daily triggers plus named one-shot timers.
//!
//! Triggers are delivered into the same serialized event queue the channel
//! feeds, so scheduled work and user replies never interleave.

use super::Event;
use chrono::{Datelike, FixedOffset, NaiveDateTime, NaiveTime, Utc, Weekday};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

/// A scheduled cause for the state machine to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Daily evening start-check (also fired by the retry timer).
    Evening,
    /// One-shot evening re-prompt.
    EveningRetry,
    /// Daily night completion-check.
    Night,
    /// One-shot hard-topic timeout.
    HardTopicTimeout,
    /// Weekly report delivery.
    WeeklyReport,
}

/// Fires daily triggers at fixed local wall-clock times and manages named
/// one-shot timers the state machine creates and cancels.
pub struct Scheduler {
    tx: mpsc::Sender<Event>,
    offset: FixedOffset,
    /// Pending one-shots by name. Scheduling a name replaces its predecessor;
    /// callers still cancel explicitly before rescheduling.
    oneshots: Mutex<HashMap<String, JoinHandle<()>>>,
    dailies: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(tx: mpsc::Sender<Event>, offset: FixedOffset) -> Self {
        Self {
            tx,
            offset,
            oneshots: Mutex::new(HashMap::new()),
            dailies: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Register a recurring trigger at a local time of day.
    ///
    /// An empty `days` slice means every day. The spawned loop survives
    /// across days without re-registration.
    pub fn schedule_daily(&self, trigger: Trigger, at: NaiveTime, days: &[Weekday]) {
        let tx = self.tx.clone();
        let offset = self.offset;
        let days = days.to_vec();

        let handle = tokio::spawn(async move {
            loop {
                let now = Utc::now().with_timezone(&offset).naive_local();
                let next = next_occurrence(now, at, &days);
                let wait = (next - now).num_seconds().max(1) as u64;
                debug!("daily {trigger:?} in {wait}s");
                tokio::time::sleep(Duration::from_secs(wait)).await;
                if tx.send(Event::Trigger(trigger)).await.is_err() {
                    return;
                }
            }
        });

        if let Ok(mut dailies) = self.dailies.lock() {
            dailies.push(handle);
        }
    }

    /// Arm a named one-shot timer. A pending timer of the same name is
    /// replaced.
    pub async fn schedule_once(&self, trigger: Trigger, delay: Duration, name: &str) {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Event::Trigger(trigger)).await;
        });

        let mut oneshots = self.oneshots.lock().await;
        if let Some(old) = oneshots.insert(name.to_string(), handle) {
            old.abort();
        }
    }

    /// Cancel a pending one-shot by name. Cancelling nothing is a no-op.
    ///
    /// Cancellation is cooperative: a timer that fired just before this call
    /// may still deliver its trigger, so consumers re-check their guard flag.
    pub async fn cancel(&self, name: &str) -> bool {
        let mut oneshots = self.oneshots.lock().await;
        match oneshots.remove(name) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every pending timer and daily loop.
    pub async fn shutdown(&self) {
        for (_, handle) in self.oneshots.lock().await.drain() {
            handle.abort();
        }
        if let Ok(mut dailies) = self.dailies.lock() {
            for handle in dailies.drain(..) {
                handle.abort();
            }
        }
    }
}

/// Next local wall-clock occurrence of `at` on one of `days`, strictly after
/// `now`. An empty `days` slice means every day.
pub(super) fn next_occurrence(now: NaiveDateTime, at: NaiveTime, days: &[Weekday]) -> NaiveDateTime {
    let mut date = now.date();
    if now.time() >= at {
        date = date.succ_opt().unwrap_or(date);
    }
    while !days.is_empty() && !days.contains(&date.weekday()) {
        date = date.succ_opt().unwrap_or(date);
    }
    date.and_time(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_next_occurrence_later_today() {
        let next = next_occurrence(dt(2026, 8, 3, 9, 0), t(17, 30), &[]);
        assert_eq!(next, dt(2026, 8, 3, 17, 30));
    }

    #[test]
    fn test_next_occurrence_rolls_to_tomorrow() {
        let next = next_occurrence(dt(2026, 8, 3, 18, 0), t(17, 30), &[]);
        assert_eq!(next, dt(2026, 8, 4, 17, 30));
    }

    #[test]
    fn test_next_occurrence_exact_time_rolls_over() {
        // Firing exactly at the boundary schedules the next day, not a
        // zero-delay re-fire.
        let next = next_occurrence(dt(2026, 8, 3, 17, 30), t(17, 30), &[]);
        assert_eq!(next, dt(2026, 8, 4, 17, 30));
    }

    #[test]
    fn test_next_occurrence_respects_days() {
        // 2026-08-03 is a Monday; next Sunday is 2026-08-09.
        let next = next_occurrence(dt(2026, 8, 3, 9, 0), t(21, 0), &[Weekday::Sun]);
        assert_eq!(next, dt(2026, 8, 9, 21, 0));
    }

    #[test]
    fn test_next_occurrence_sunday_evening_on_sunday() {
        // 2026-08-09 is a Sunday; before 21:00 it fires the same day.
        let next = next_occurrence(dt(2026, 8, 9, 9, 0), t(21, 0), &[Weekday::Sun]);
        assert_eq!(next, dt(2026, 8, 9, 21, 0));
        // After 21:00 it rolls a full week.
        let next = next_occurrence(dt(2026, 8, 9, 22, 0), t(21, 0), &[Weekday::Sun]);
        assert_eq!(next, dt(2026, 8, 16, 21, 0));
    }
}
