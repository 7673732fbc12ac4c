//! Reminder reconciliation: keeps timed meal-reminder notifications in step
//! with the current meal entries. One loop per process, spawned at startup.

use std::sync::Arc;
use std::time::Duration;

use time::macros::time;
use time::{Duration as TimeDuration, OffsetDateTime, PrimitiveDateTime, Time};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::mealplan::week;
use crate::repo::{kinds, MealEntry, MealEntryRepo, Notification, NotificationRepo, Repos};

/// Meals without an explicit time are assumed to be at noon.
pub const DEFAULT_MEAL_TIME: Time = time!(12:00);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderLabel {
    DayBefore,
    HourBefore,
}

impl ReminderLabel {
    pub const ALL: [ReminderLabel; 2] = [ReminderLabel::DayBefore, ReminderLabel::HourBefore];

    pub fn as_str(self) -> &'static str {
        match self {
            ReminderLabel::DayBefore => "1 day before",
            ReminderLabel::HourBefore => "1 hour before",
        }
    }

    fn lead(self) -> TimeDuration {
        match self {
            ReminderLabel::DayBefore => TimeDuration::days(1),
            ReminderLabel::HourBefore => TimeDuration::hours(1),
        }
    }
}

fn parse_meal_time(raw: &str) -> Option<Time> {
    let (hour, minute) = raw.split_once(':')?;
    Time::from_hms(hour.trim().parse().ok()?, minute.trim().parse().ok()?, 0).ok()
}

/// The instant the meal happens, in UTC. A missing or malformed `meal.time`
/// falls back to noon rather than dropping the entry.
pub fn meal_datetime(entry: &MealEntry) -> OffsetDateTime {
    let meal_time = entry
        .meal
        .time
        .as_deref()
        .and_then(parse_meal_time)
        .unwrap_or(DEFAULT_MEAL_TIME);
    PrimitiveDateTime::new(entry.date, meal_time).assume_utc()
}

pub struct ReminderReconciler {
    entries: Arc<dyn MealEntryRepo>,
    notifications: Arc<dyn NotificationRepo>,
    poll_interval: Duration,
}

impl ReminderReconciler {
    pub fn new(repos: &Repos, poll_secs: u64) -> Self {
        Self {
            entries: repos.entries.clone(),
            notifications: repos.notifications.clone(),
            poll_interval: Duration::from_secs(poll_secs),
        }
    }

    /// Run the loop forever. A failed cycle is logged and the next tick tries
    /// again; nothing stops the loop short of process shutdown.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_cycle(OffsetDateTime::now_utc()).await {
                    error!(error = %e, "reminder reconciliation cycle failed");
                }
            }
        })
    }

    /// One reconciliation pass at instant `now`: ensure reminders for every
    /// upcoming entry, then reclaim reminders whose entry is gone.
    pub async fn run_cycle(&self, now: OffsetDateTime) -> anyhow::Result<()> {
        let upcoming = self.entries.list_from(now.date()).await?;
        for entry in &upcoming {
            if let Err(e) = self.reconcile_entry(entry, now).await {
                // One bad entry must not starve the rest of the scan.
                warn!(entry_id = %entry.id, error = %e, "skipping meal entry");
            }
        }
        self.collect_orphans().await?;
        Ok(())
    }

    async fn reconcile_entry(&self, entry: &MealEntry, now: OffsetDateTime) -> anyhow::Result<()> {
        let meal_at = meal_datetime(entry);
        let meal_name = entry.meal.name.as_deref().unwrap_or("Meal");

        for label in ReminderLabel::ALL {
            let send_at = meal_at - label.lead();
            if send_at <= now {
                continue;
            }
            let inserted = self
                .notifications
                .insert_reminder(&Notification {
                    id: Uuid::new_v4(),
                    user_id: Some(entry.user_id.clone()),
                    kind: kinds::MEAL_REMINDER.to_string(),
                    title: format!("Meal reminder: {meal_name}"),
                    message: format!(
                        "{} on {} ({})",
                        week::title_case(&entry.slot),
                        entry.day,
                        label.as_str()
                    ),
                    created_at: now,
                    send_at: Some(send_at),
                    meal_entry_id: Some(entry.id),
                    notif_label: Some(label.as_str().to_string()),
                    is_read: false,
                    show_action: false,
                })
                .await?;
            if inserted {
                debug!(entry_id = %entry.id, label = label.as_str(), "reminder scheduled");
            }
        }
        Ok(())
    }

    /// Reminders whose source entry no longer exists are stale: the meal was
    /// removed from its plan after the reminder was created.
    async fn collect_orphans(&self) -> anyhow::Result<()> {
        for (notification_id, entry_id) in self.notifications.list_entry_linked().await? {
            if !self.entries.exists(entry_id).await? {
                self.notifications.delete(notification_id).await?;
                debug!(%notification_id, %entry_id, "stale reminder removed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{MealSlot, Repos};
    use time::macros::{date, datetime};
    use time::Date;

    fn reconciler(repos: &Repos) -> ReminderReconciler {
        ReminderReconciler::new(repos, 300)
    }

    async fn insert_entry(repos: &Repos, date: Date, meal_time: Option<&str>) -> MealEntry {
        let entry = MealEntry {
            id: Uuid::new_v4(),
            user_id: "me".to_string(),
            week_start: week::monday_of(date),
            day: "tuesday".to_string(),
            slot: "dinner".to_string(),
            date,
            meal: MealSlot {
                name: Some("Stew".to_string()),
                time: meal_time.map(str::to_string),
                ..Default::default()
            },
            created_at: datetime!(2025-06-01 00:00 UTC),
        };
        repos.entries.insert_many(std::slice::from_ref(&entry)).await.unwrap();
        entry
    }

    fn reminders(all: &[Notification]) -> Vec<&Notification> {
        all.iter().filter(|n| n.meal_entry_id.is_some()).collect()
    }

    #[tokio::test]
    async fn cycle_schedules_both_reminders_with_exact_instants() {
        let repos = Repos::in_memory();
        let entry = insert_entry(&repos, date!(2025 - 06 - 10), Some("18:00")).await;

        reconciler(&repos)
            .run_cycle(datetime!(2025-06-08 10:00 UTC))
            .await
            .unwrap();

        let all = repos.notifications.list_desc().await.unwrap();
        let created = reminders(&all);
        assert_eq!(created.len(), 2);

        let day_before = created
            .iter()
            .find(|n| n.notif_label.as_deref() == Some("1 day before"))
            .unwrap();
        assert_eq!(day_before.send_at, Some(datetime!(2025-06-09 18:00 UTC)));
        assert_eq!(day_before.meal_entry_id, Some(entry.id));
        assert_eq!(day_before.title, "Meal reminder: Stew");
        assert_eq!(day_before.message, "Dinner on tuesday (1 day before)");

        let hour_before = created
            .iter()
            .find(|n| n.notif_label.as_deref() == Some("1 hour before"))
            .unwrap();
        assert_eq!(hour_before.send_at, Some(datetime!(2025-06-10 17:00 UTC)));
    }

    #[tokio::test]
    async fn past_instants_are_never_scheduled() {
        let repos = Repos::in_memory();
        insert_entry(&repos, date!(2025 - 06 - 10), Some("18:00")).await;

        // Both candidates (06-09 18:00 and 06-10 17:00) are already behind.
        reconciler(&repos)
            .run_cycle(datetime!(2025-06-10 17:30 UTC))
            .await
            .unwrap();

        assert!(repos.notifications.list_desc().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_cycles_never_duplicate_reminders() {
        let repos = Repos::in_memory();
        insert_entry(&repos, date!(2025 - 06 - 10), Some("18:00")).await;

        let r = reconciler(&repos);
        for _ in 0..3 {
            r.run_cycle(datetime!(2025-06-08 10:00 UTC)).await.unwrap();
        }

        let all = repos.notifications.list_desc().await.unwrap();
        assert_eq!(reminders(&all).len(), 2);
    }

    #[tokio::test]
    async fn missing_or_malformed_meal_time_defaults_to_noon() {
        let repos = Repos::in_memory();
        insert_entry(&repos, date!(2025 - 06 - 10), None).await;
        let now = datetime!(2025-06-08 10:00 UTC);

        reconciler(&repos).run_cycle(now).await.unwrap();

        let all = repos.notifications.list_desc().await.unwrap();
        let day_before = all
            .iter()
            .find(|n| n.notif_label.as_deref() == Some("1 day before"))
            .unwrap();
        assert_eq!(day_before.send_at, Some(datetime!(2025-06-09 12:00 UTC)));

        let entry = MealEntry {
            meal: MealSlot {
                time: Some("late-ish".to_string()),
                ..Default::default()
            },
            ..insert_entry(&repos, date!(2025 - 06 - 12), None).await
        };
        assert_eq!(meal_datetime(&entry), datetime!(2025-06-12 12:00 UTC));
    }

    #[tokio::test]
    async fn entries_before_today_are_not_scanned() {
        let repos = Repos::in_memory();
        insert_entry(&repos, date!(2025 - 06 - 01), Some("18:00")).await;

        reconciler(&repos)
            .run_cycle(datetime!(2025-06-08 10:00 UTC))
            .await
            .unwrap();

        assert!(repos.notifications.list_desc().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn gc_removes_reminders_for_deleted_entries() {
        let repos = Repos::in_memory();
        let entry = insert_entry(&repos, date!(2025 - 06 - 10), Some("18:00")).await;
        let r = reconciler(&repos);
        let now = datetime!(2025-06-08 10:00 UTC);

        r.run_cycle(now).await.unwrap();
        assert_eq!(reminders(&repos.notifications.list_desc().await.unwrap()).len(), 2);

        // The plan (and with it the projected entries) goes away.
        repos.entries.delete_week(&entry.user_id, entry.week_start).await.unwrap();
        r.run_cycle(now).await.unwrap();

        assert!(reminders(&repos.notifications.list_desc().await.unwrap()).is_empty());
    }

    #[tokio::test]
    async fn gc_keeps_reminders_for_live_entries() {
        let repos = Repos::in_memory();
        insert_entry(&repos, date!(2025 - 06 - 10), Some("18:00")).await;
        let r = reconciler(&repos);
        let now = datetime!(2025-06-08 10:00 UTC);

        r.run_cycle(now).await.unwrap();
        r.run_cycle(now).await.unwrap();

        assert_eq!(reminders(&repos.notifications.list_desc().await.unwrap()).len(), 2);
    }

    #[tokio::test]
    async fn gc_ignores_announcements_without_entry_references() {
        let repos = Repos::in_memory();
        repos
            .notifications
            .insert(&Notification {
                id: Uuid::new_v4(),
                user_id: Some("me".to_string()),
                kind: kinds::MEAL_REMINDER.to_string(),
                title: "Upcoming meal: Stew".to_string(),
                message: "Dinner on tuesday is planned.".to_string(),
                created_at: datetime!(2025-06-01 00:00 UTC),
                send_at: None,
                meal_entry_id: None,
                notif_label: None,
                is_read: false,
                show_action: false,
            })
            .await
            .unwrap();

        reconciler(&repos)
            .run_cycle(datetime!(2025-06-08 10:00 UTC))
            .await
            .unwrap();

        assert_eq!(repos.notifications.list_desc().await.unwrap().len(), 1);
    }
}
