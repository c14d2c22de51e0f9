//! Background job loop.

use chrono::{DateTime, Utc};

use super::alerts::notify_admins;
use super::daily::run_daily_routine;
use super::reminders::{process_reminders, until_starting_mark, ReminderTextPicker};
use crate::config::BotConfig;
use crate::db::DbPool;
use crate::error::BotError;
use crate::messenger::Messenger;

/// Runs reminders and the daily routine once a day at the starting mark.
pub struct Scheduler<M> {
    pool: DbPool,
    messenger: M,
    hour: u32,
    admins: Vec<i64>,
    picker: ReminderTextPicker,
}

impl<M: Messenger> Scheduler<M> {
    pub fn new(pool: DbPool, messenger: M, config: &BotConfig) -> Self {
        Self {
            pool,
            messenger,
            hour: config.reminder_hour_utc,
            admins: config.admins.clone(),
            picker: ReminderTextPicker::new(),
        }
    }

    /// Never returns. A failed job is reported and retried at the next mark.
    pub async fn run(mut self) {
        tracing::info!("Scheduler started, jobs run daily at {:02}:00 UTC", self.hour);
        loop {
            let wait = until_starting_mark(self.hour, Utc::now());
            tracing::debug!("Next scheduled run in {}s", wait.as_secs());
            tokio::time::sleep(wait).await;
            self.tick(Utc::now()).await;
        }
    }

    pub async fn tick(&mut self, now: DateTime<Utc>) {
        if let Err(e) = process_reminders(&self.pool, &self.messenger, &mut self.picker, now, self.hour).await {
            self.report_failure("reminders", &e).await;
        }

        match run_daily_routine(&self.pool, &self.messenger, now.date_naive()).await {
            Ok(report) => tracing::info!("Daily routine done: {:?}", report),
            Err(e) => self.report_failure("daily routine", &e).await,
        }
    }

    async fn report_failure(&self, job: &str, err: &BotError) {
        tracing::error!("Scheduled job '{}' failed: {}", job, err);
        let text = format!("Scheduled job '{}' failed: {}", job, err);
        notify_admins(&self.messenger, &self.admins, &text).await;
    }
}
