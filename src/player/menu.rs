//! Lesson menu, lesson entry and reminder settings.

use super::{Player, Progress};
use crate::db::{self, LogOnError};
use crate::domain::{LessonStatus, User, REMINDER_FREQUENCIES};
use crate::error::{BotError, Result};
use crate::keyboard;
use crate::messenger::Messenger;

impl<M: Messenger> Player<M> {
    /// Active lessons, completed ones marked.
    pub async fn send_lesson_menu(&self, chat: i64, user_id: i64) -> Result<()> {
        let (text, lessons) = self.db(|c| Ok((db::get_text(c, db::START_MENU)?, db::get_active_lessons(c)?)))?;
        // Missing marks are cosmetic
        let completed = self
            .db(|c| db::get_completed_lesson_ids(c, user_id))
            .log_warn_default("Failed to load completed lessons");
        let kb = keyboard::lesson_menu(&lessons, |id| completed.contains(&id));
        self.messenger.send_text(chat, &text, Some(&kb)).await?;
        Ok(())
    }

    /// A lesson was picked from the menu: offer the ways to enter it.
    pub async fn open_lesson(&self, user: &User, lesson_id: i64) -> Result<Progress> {
        let lesson = self
            .db(|c| db::get_lesson(c, lesson_id))?
            .filter(|l| l.status != LessonStatus::Disabled)
            .ok_or(BotError::LessonNotFound(lesson_id))?;
        let chat = user.telegram_id;

        if lesson.path.is_empty() {
            self.send_prompt_text(chat, db::NO_SLIDES_YET).await?;
            return Ok(Progress::Ignored);
        }
        if !user.can_open(lesson.is_paid) {
            tracing::debug!(user = user.id, lesson = lesson_id, "Paid lesson without access");
            self.send_prompt_text(chat, db::PAYWALL_MESSAGE).await?;
            return Ok(Progress::Ignored);
        }

        let user_id = user.id;
        let (has_progress, has_exam) = self.db(|c| {
            Ok((
                db::get_active_session(c, user_id, lesson_id)?.is_some(),
                db::first_exam_slide(c, lesson.path.slides())?.is_some(),
            ))
        })?;
        let prompt = match (has_progress, has_exam) {
            (true, _) => db::STARTS_FROM_WITH_PROGRESS,
            (false, true) => db::STARTS_FROM_WITH_EXAM,
            (false, false) => db::STARTS_FROM_WITHOUT_EXAM,
        };
        let text = self.text(prompt)?;
        let kb = keyboard::start_modes(lesson_id, has_progress, has_exam);
        self.messenger.send_text(chat, &text, Some(&kb)).await?;
        Ok(Progress::Waiting)
    }

    pub async fn send_reminder_menu(&self, chat: i64) -> Result<()> {
        let text = self.text(db::REMINDER_MENU)?;
        self.messenger.send_text(chat, &text, Some(&keyboard::reminders())).await?;
        Ok(())
    }

    /// Set the reminder interval in days; 0 turns reminders off. Intervals
    /// other than the offered ones are ignored.
    pub async fn set_reminders(&self, user: &User, days: i64) -> Result<()> {
        let chat = user.telegram_id;
        let user_id = user.id;
        if days == 0 {
            self.db(|c| db::set_reminder_freq(c, user_id, None))?;
            tracing::info!(user = user_id, "Reminders off");
            return self.send_prompt_text(chat, db::UNSET_REMINDER_MESSAGE).await;
        }
        if !REMINDER_FREQUENCIES.contains(&days) {
            tracing::debug!(user = user_id, "Unsupported reminder interval {}", days);
            return Ok(());
        }

        self.db(|c| db::set_reminder_freq(c, user_id, Some(days)))?;
        tracing::info!(user = user_id, "Reminders every {} day(s)", days);
        let template = self.text(db::SET_REMINDER_MESSAGE)?;
        let text = db::fill_placeholders(&template, &[days.to_string().as_str()]);
        self.messenger.send_text(chat, &text, None).await?;
        Ok(())
    }

    pub async fn send_help(&self, chat: i64) -> Result<()> {
        self.send_prompt_text(chat, db::HELP_MESSAGE).await
    }
}
