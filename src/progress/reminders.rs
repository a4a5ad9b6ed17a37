//! Streak reminders
//!
//! At most one pending streak warning exists per period. Scheduling a new
//! one replaces the pending one; delivery is driven by an outside poller
//! through [`deliver_due`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::history::truncate_oldest;
use super::streaks::StreakPeriod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    StreakWarning,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StreakWarning => "streak_warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub period: StreakPeriod,
    pub deadline: DateTime<Utc>,
    pub lead_hours: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReminder {
    pub id: String,
    pub kind: ReminderKind,
    pub scheduled_for: DateTime<Utc>,
    #[serde(default)]
    pub delivered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub payload: ReminderPayload,
}

impl NotificationReminder {
    pub fn is_pending(&self) -> bool {
        !self.delivered
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && self.scheduled_for <= now
    }

    /// The streak it warns about has already broken
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.payload.deadline <= now
    }
}

/// Replace the pending streak warning for `period`.
///
/// The reminder fires `lead_hours` before `deadline`. If that moment has
/// already passed, or cannot be represented, it fires `min_delay` after
/// `now` instead.
pub fn schedule_streak_reminder(
    reminders: &mut Vec<NotificationReminder>,
    period: StreakPeriod,
    deadline: DateTime<Utc>,
    lead_hours: i64,
    now: DateTime<Utc>,
    min_delay: Duration,
) -> NotificationReminder {
    reminders.retain(|r| {
        !(r.is_pending() && r.kind == ReminderKind::StreakWarning && r.payload.period == period)
    });

    let earliest = now.checked_add_signed(min_delay).unwrap_or(now);
    let scheduled_for = Duration::try_hours(lead_hours)
        .and_then(|lead| deadline.checked_sub_signed(lead))
        .map_or(earliest, |at| at.max(earliest));

    let reminder = NotificationReminder {
        id: format!("streak-{}-{}", period.as_str(), deadline.timestamp()),
        kind: ReminderKind::StreakWarning,
        scheduled_for,
        delivered: false,
        delivered_at: None,
        payload: ReminderPayload {
            period,
            deadline,
            lead_hours,
        },
    };
    debug!(
        id = %reminder.id,
        scheduled_for = %reminder.scheduled_for,
        "Scheduled streak reminder"
    );

    reminders.push(reminder.clone());
    reminder
}

/// Pending reminders whose time has come, oldest first
pub fn due_reminders(
    reminders: &[NotificationReminder],
    now: DateTime<Utc>,
) -> Vec<NotificationReminder> {
    let mut due: Vec<_> = reminders
        .iter()
        .filter(|r| r.is_due(now) && !r.is_stale(now))
        .cloned()
        .collect();
    due.sort_by_key(|r| r.scheduled_for);
    due
}

/// Keep only the newest pending streak warning per period.
/// Returns how many were dropped.
pub fn dedupe_pending(reminders: &mut Vec<NotificationReminder>) -> usize {
    let before = reminders.len();
    for period in StreakPeriod::all() {
        let newest = reminders
            .iter()
            .filter(|r| r.is_pending() && r.payload.period == *period)
            .max_by_key(|r| r.scheduled_for)
            .map(|r| r.id.clone());

        if let Some(keep) = newest {
            let mut kept = false;
            reminders.retain(|r| {
                if !(r.is_pending() && r.payload.period == *period) {
                    return true;
                }
                if !kept && r.id == keep {
                    kept = true;
                    return true;
                }
                false
            });
        }
    }
    before - reminders.len()
}

/// User-facing message for a reminder
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Replaces an earlier notification with the same tag
    pub tag: String,
    pub data: serde_json::Value,
}

pub fn notification_for(reminder: &NotificationReminder) -> Notification {
    let payload = &reminder.payload;
    let (title, unit) = match payload.period {
        StreakPeriod::Daily => ("Keep your daily streak alive", "today"),
        StreakPeriod::Weekly => ("Keep your weekly streak alive", "this week"),
    };

    Notification {
        title: title.to_string(),
        body: format!(
            "Finish a session {} before {} to keep it going.",
            unit,
            payload.deadline.format("%Y-%m-%d %H:%M UTC")
        ),
        tag: format!("{}-{}", reminder.kind.as_str(), payload.period.as_str()),
        data: json!({
            "reminder_id": reminder.id,
            "period": payload.period.as_str(),
            "deadline": payload.deadline,
        }),
    }
}

/// Where notifications are shown
pub trait NotificationSink {
    fn show(&mut self, notification: &Notification) -> anyhow::Result<()>;
}

/// Show every due reminder and mark it delivered.
///
/// Pending reminders whose deadline has passed are dropped. A reminder the
/// sink fails to show stays pending for the next poll. Delivered reminders
/// beyond `retained` are dropped oldest first.
pub fn deliver_due(
    reminders: &mut Vec<NotificationReminder>,
    now: DateTime<Utc>,
    sink: &mut dyn NotificationSink,
    retained: usize,
) -> Vec<NotificationReminder> {
    let before = reminders.len();
    reminders.retain(|r| !(r.is_pending() && r.is_stale(now)));
    if reminders.len() != before {
        debug!(dropped = before - reminders.len(), "Dropped stale reminders");
    }

    let mut delivered = Vec::new();
    for reminder in reminders.iter_mut().filter(|r| r.is_due(now)) {
        let notification = notification_for(reminder);
        match sink.show(&notification) {
            Ok(()) => {
                reminder.delivered = true;
                reminder.delivered_at = Some(now);
                debug!(id = %reminder.id, "Delivered reminder");
                delivered.push(reminder.clone());
            }
            Err(e) => warn!(id = %reminder.id, "Failed to show reminder: {:#}", e),
        }
    }

    cap_delivered(reminders, retained);
    delivered
}

/// Keep at most `retained` delivered reminders, dropping the oldest.
/// Pending reminders are never dropped here.
pub fn cap_delivered(reminders: &mut Vec<NotificationReminder>, retained: usize) {
    let (mut history, pending): (Vec<_>, Vec<_>) =
        reminders.drain(..).partition(|r| r.delivered);
    history.sort_by_key(|r| r.delivered_at);
    truncate_oldest(&mut history, retained);
    reminders.extend(history);
    reminders.extend(pending);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Default)]
    struct CollectSink {
        shown: Vec<Notification>,
        fail: bool,
    }

    impl NotificationSink for CollectSink {
        fn show(&mut self, notification: &Notification) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("display unavailable");
            }
            self.shown.push(notification.clone());
            Ok(())
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, h, m, 0).unwrap()
    }

    fn midnight() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 11, 0, 0, 0).unwrap()
    }

    fn five_minutes() -> Duration {
        Duration::minutes(5)
    }

    #[test]
    fn test_scheduled_lead_hours_before_deadline() {
        let mut reminders = Vec::new();
        let reminder = schedule_streak_reminder(
            &mut reminders,
            StreakPeriod::Daily,
            midnight(),
            4,
            at(9, 0),
            five_minutes(),
        );
        assert_eq!(reminder.scheduled_for, at(20, 0));
        assert_eq!(reminders.len(), 1);
    }

    #[test]
    fn test_late_session_clamps_to_min_delay() {
        let mut reminders = Vec::new();
        let reminder = schedule_streak_reminder(
            &mut reminders,
            StreakPeriod::Daily,
            midnight(),
            4,
            at(22, 0),
            five_minutes(),
        );
        assert_eq!(reminder.scheduled_for, at(22, 5));
    }

    #[test]
    fn test_extreme_lead_hours_clamp_to_min_delay() {
        for lead_hours in [i64::MAX, i64::MIN] {
            let mut reminders = Vec::new();
            let reminder = schedule_streak_reminder(
                &mut reminders,
                StreakPeriod::Daily,
                midnight(),
                lead_hours,
                at(9, 0),
                five_minutes(),
            );
            assert_eq!(reminder.scheduled_for, at(9, 5));
            assert_eq!(reminder.payload.lead_hours, lead_hours);
        }
    }

    #[test]
    fn test_negative_lead_fires_after_deadline() {
        let mut reminders = Vec::new();
        let reminder = schedule_streak_reminder(
            &mut reminders,
            StreakPeriod::Daily,
            midnight(),
            -2,
            at(9, 0),
            five_minutes(),
        );
        assert_eq!(reminder.scheduled_for, midnight() + Duration::hours(2));
    }

    #[test]
    fn test_one_pending_per_period() {
        let mut reminders = Vec::new();
        for hour in [8, 12, 16] {
            schedule_streak_reminder(
                &mut reminders,
                StreakPeriod::Daily,
                midnight(),
                4,
                at(hour, 0),
                five_minutes(),
            );
        }
        schedule_streak_reminder(
            &mut reminders,
            StreakPeriod::Weekly,
            midnight() + Duration::days(6),
            24,
            at(16, 0),
            five_minutes(),
        );

        let daily = reminders
            .iter()
            .filter(|r| r.is_pending() && r.payload.period == StreakPeriod::Daily)
            .count();
        assert_eq!(daily, 1);
        assert_eq!(reminders.len(), 2);
    }

    #[test]
    fn test_deliver_due_marks_delivered() {
        let mut reminders = Vec::new();
        schedule_streak_reminder(
            &mut reminders,
            StreakPeriod::Daily,
            midnight(),
            4,
            at(9, 0),
            five_minutes(),
        );

        let mut sink = CollectSink::default();
        assert!(deliver_due(&mut reminders, at(19, 0), &mut sink, 20).is_empty());
        assert!(due_reminders(&reminders, at(19, 0)).is_empty());

        let delivered = deliver_due(&mut reminders, at(20, 30), &mut sink, 20);
        assert_eq!(delivered.len(), 1);
        assert_eq!(sink.shown.len(), 1);
        assert_eq!(sink.shown[0].tag, "streak_warning-daily");
        assert!(reminders[0].delivered);

        // Delivered once only
        assert!(deliver_due(&mut reminders, at(21, 0), &mut sink, 20).is_empty());
        assert_eq!(sink.shown.len(), 1);
    }

    #[test]
    fn test_failed_delivery_stays_pending() {
        let mut reminders = Vec::new();
        schedule_streak_reminder(
            &mut reminders,
            StreakPeriod::Daily,
            midnight(),
            4,
            at(9, 0),
            five_minutes(),
        );

        let mut sink = CollectSink {
            fail: true,
            ..Default::default()
        };
        assert!(deliver_due(&mut reminders, at(21, 0), &mut sink, 20).is_empty());
        assert!(reminders[0].is_pending());
    }

    #[test]
    fn test_stale_reminder_dropped() {
        let mut reminders = Vec::new();
        schedule_streak_reminder(
            &mut reminders,
            StreakPeriod::Daily,
            midnight(),
            4,
            at(9, 0),
            five_minutes(),
        );

        let mut sink = CollectSink::default();
        let delivered = deliver_due(&mut reminders, midnight() + Duration::hours(1), &mut sink, 20);
        assert!(delivered.is_empty());
        assert!(reminders.is_empty());
    }

    #[test]
    fn test_dedupe_keeps_newest_pending() {
        let mut reminders = Vec::new();
        schedule_streak_reminder(
            &mut reminders,
            StreakPeriod::Daily,
            midnight(),
            4,
            at(9, 0),
            five_minutes(),
        );
        let mut older = reminders[0].clone();
        older.id = "streak-daily-older".to_string();
        older.scheduled_for = at(10, 0);
        reminders.insert(0, older);

        assert_eq!(dedupe_pending(&mut reminders), 1);
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].scheduled_for, at(20, 0));
    }
}
