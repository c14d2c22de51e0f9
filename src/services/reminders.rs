//! Lesson reminders.
//!
//! Reminders go out once a day at the starting mark (an hour in UTC). A user
//! with a frequency of N days is due when at least N starting marks have
//! passed since the slot of their last reminder.

use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, Utc};
use rand::Rng;

use crate::config::SEND_THROTTLE;
use crate::db::{self, DbPool};
use crate::domain::User;
use crate::error::{DeliveryError, Result};
use crate::messenger::Messenger;

// ============================================================================
// Slot arithmetic
// ============================================================================

fn mark_on(at: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    at.date_naive().and_time(time).and_utc()
}

/// The latest starting mark at or before `at`.
pub fn reminder_slot(at: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let mark = mark_on(at, hour);
    if mark <= at {
        mark
    } else {
        mark.checked_sub_days(Days::new(1)).unwrap_or(mark)
    }
}

/// Time left until the next starting mark strictly after `now`.
pub fn until_starting_mark(hour: u32, now: DateTime<Utc>) -> Duration {
    let mut mark = mark_on(now, hour);
    if mark <= now {
        mark = mark.checked_add_days(Days::new(1)).unwrap_or(mark);
    }
    (mark - now).to_std().unwrap_or_default()
}

/// Is a reminder due for `user` in the slot starting at `slot`?
pub fn is_reminder_due(user: &User, slot: DateTime<Utc>, hour: u32) -> bool {
    let Some(freq) = user.reminder_freq.filter(|f| *f > 0) else {
        return false;
    };
    match user.last_reminded_at {
        None => true,
        Some(last) => slot - reminder_slot(last, hour) >= chrono::Duration::days(freq),
    }
}

// ============================================================================
// Text rotation
// ============================================================================

/// Picks reminder texts so no variant repeats until all were used.
///
/// The rotation restarts whenever the set of variants changes. Lives for the
/// whole process; the scheduler owns it.
#[derive(Debug, Default)]
pub struct ReminderTextPicker {
    source: Vec<String>,
    pool: Vec<String>,
}

impl ReminderTextPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next text, or `fallback` when there are no usable variants.
    pub fn pick<R: Rng + ?Sized>(&mut self, variants: &[String], fallback: Option<&str>, rng: &mut R) -> Option<String> {
        let usable: Vec<String> = variants
            .iter()
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .collect();
        if usable.is_empty() {
            return fallback.map(str::to_string);
        }

        if usable != self.source {
            self.source = usable;
            self.pool.clear();
        }
        if self.pool.is_empty() {
            self.pool = self.source.clone();
        }
        let index = rng.random_range(0..self.pool.len());
        Some(self.pool.swap_remove(index))
    }
}

// ============================================================================
// Sending
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderReport {
    pub sent: usize,
    pub blocked: usize,
    pub failed: usize,
}

/// Send every due reminder for the slot containing `now`.
///
/// A user who blocked the bot is still marked as reminded so the job does
/// not retry them every day; other delivery failures are retried next slot.
pub async fn process_reminders<M: Messenger>(
    pool: &DbPool,
    messenger: &M,
    picker: &mut ReminderTextPicker,
    now: DateTime<Utc>,
    hour: u32,
) -> Result<ReminderReport> {
    let slot = reminder_slot(now, hour);
    let (variants, fallback, users) = db::with_conn(pool, |conn| -> Result<_> {
        let variants = db::get_reminder_variants(conn)?;
        let fallback = db::get_text(conn, db::REMINDER_TEXT)?;
        let users = db::get_users_with_reminders(conn)?;
        Ok((variants, fallback, users))
    })?;

    let mut report = ReminderReport::default();
    for user in users.iter().filter(|u| is_reminder_due(u, slot, hour)) {
        let picked = {
            let mut rng = rand::rng();
            picker.pick(&variants, Some(&fallback), &mut rng)
        };
        let Some(text) = picked else { continue };

        match messenger.send_text(user.telegram_id, &text, None).await {
            Ok(_) => {
                tracing::info!(user = user.id, "Reminder sent");
                report.sent += 1;
                db::with_conn(pool, |conn| -> Result<_> { Ok(db::mark_reminded(conn, user.id, slot)?) })?;
            }
            Err(DeliveryError::Blocked(chat)) => {
                tracing::warn!(user = user.id, "Chat {} refused the reminder", chat);
                report.blocked += 1;
                db::with_conn(pool, |conn| -> Result<_> { Ok(db::mark_reminded(conn, user.id, slot)?) })?;
            }
            Err(e) => {
                tracing::error!(user = user.id, "Failed to send reminder: {}", e);
                report.failed += 1;
            }
        }

        tokio::time::sleep(SEND_THROTTLE).await;
    }

    tracing::info!(
        sent = report.sent,
        blocked = report.blocked,
        failed = report.failed,
        "Reminders processed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    use crate::testing::{RecordingMessenger, TestEnv};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_until_starting_mark() {
        assert_eq!(until_starting_mark(14, at(13, 59, 59)).as_secs(), 1);
        assert_eq!(until_starting_mark(14, at(14, 0, 1)).as_secs(), 86399);
        assert_eq!(until_starting_mark(14, at(12, 0, 0)).as_secs(), 7200);
        assert_eq!(until_starting_mark(14, at(15, 0, 0)).as_secs(), 82800);
    }

    #[test]
    fn test_reminder_slot() {
        assert_eq!(reminder_slot(at(14, 0, 0), 14), at(14, 0, 0));
        assert_eq!(reminder_slot(at(20, 30, 0), 14), at(14, 0, 0));
        assert_eq!(
            reminder_slot(at(9, 0, 0), 14),
            Utc.with_ymd_and_hms(2023, 12, 31, 14, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_picker_cycles_without_repeats() {
        let mut picker = ReminderTextPicker::new();
        let mut rng = StdRng::seed_from_u64(7);
        let variants = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let first: HashSet<String> = (0..3)
            .filter_map(|_| picker.pick(&variants, Some("fallback"), &mut rng))
            .collect();
        assert_eq!(first.len(), 3);

        let second: HashSet<String> = (0..3)
            .filter_map(|_| picker.pick(&variants, Some("fallback"), &mut rng))
            .collect();
        assert_eq!(second, first);
    }

    #[test]
    fn test_picker_falls_back_and_ignores_blanks() {
        let mut picker = ReminderTextPicker::new();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(picker.pick(&[], Some("fallback"), &mut rng).as_deref(), Some("fallback"));
        assert_eq!(picker.pick(&[], None, &mut rng), None);

        let variants = vec![" ".to_string(), String::new(), "\n".to_string(), "a".to_string()];
        assert_eq!(picker.pick(&variants, Some("fallback"), &mut rng).as_deref(), Some("a"));
        assert_eq!(picker.pick(&variants, Some("fallback"), &mut rng).as_deref(), Some("a"));
    }

    #[test]
    fn test_picker_resets_when_variants_change() {
        let mut picker = ReminderTextPicker::new();
        let mut rng = StdRng::seed_from_u64(3);

        picker.pick(&["a".to_string(), "b".to_string()], None, &mut rng);
        let next = picker.pick(&["x".to_string()], None, &mut rng);
        assert_eq!(next.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_process_reminders() {
        let env = TestEnv::new().unwrap();
        let messenger = RecordingMessenger::new();
        let due = env.add_user(100);
        let blocked = env.add_user(200);
        let failing = env.add_user(300);
        let recent = env.add_user(400);
        let off = env.add_user(500);
        {
            let conn = env.conn();
            for user in [&due, &blocked, &failing] {
                db::set_reminder_freq(&conn, user.id, Some(1)).unwrap();
            }
            db::set_reminder_freq(&conn, recent.id, Some(3)).unwrap();
            db::mark_reminded(&conn, recent.id, at(14, 0, 0)).unwrap();
            db::set_reminder_freq(&conn, off.id, None).unwrap();
        }
        messenger.block_chat(200);
        messenger.fail_chat(300);

        let now = Utc.with_ymd_and_hms(2024, 1, 2, 14, 0, 5).unwrap();
        let mut picker = ReminderTextPicker::new();
        let report = process_reminders(&env.pool, &messenger, &mut picker, now, 14)
            .await
            .unwrap();

        assert_eq!(
            report,
            ReminderReport {
                sent: 1,
                blocked: 1,
                failed: 1
            }
        );
        let fallback = db::default_text(db::REMINDER_TEXT).unwrap();
        assert_eq!(messenger.texts_to(100), vec![fallback]);
        assert!(messenger.texts_to(400).is_empty());

        let slot = Utc.with_ymd_and_hms(2024, 1, 2, 14, 0, 0).unwrap();
        assert_eq!(env.reload_user(&due).last_reminded_at, Some(slot));
        assert_eq!(env.reload_user(&blocked).last_reminded_at, Some(slot));
        assert_eq!(env.reload_user(&failing).last_reminded_at, None);
    }

    #[tokio::test]
    async fn test_process_reminders_uses_stored_variants() {
        let env = TestEnv::new().unwrap();
        let messenger = RecordingMessenger::new();
        let user = env.add_user(100);
        {
            let conn = env.conn();
            db::set_reminder_freq(&conn, user.id, Some(1)).unwrap();
            db::add_reminder_variant(&conn, "Your lesson is waiting").unwrap();
        }

        let now = Utc.with_ymd_and_hms(2024, 1, 2, 14, 0, 5).unwrap();
        let mut picker = ReminderTextPicker::new();
        process_reminders(&env.pool, &messenger, &mut picker, now, 14).await.unwrap();

        assert_eq!(messenger.texts_to(100), vec!["Your lesson is waiting"]);
    }
}
