//! Lesson session player.
//!
//! A session walks a frozen path of slide ids. At each step the player
//! renders the slide and either advances on its own or stops until the user
//! answers. Every advance persists `current_step` before the next slide is
//! rendered, so a restart resumes at the slide that was showing.

mod admin;
mod finalize;
mod menu;
mod quiz;
mod render;

pub use finalize::{compute_stats, needs_remediation, LessonStats};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;

use crate::config::BotConfig;
use crate::db::{self, DbPool};
use crate::domain::{LessonPath, LessonStartsFrom, LessonStatus, Session, SessionStartsFrom, Slide, User};
use crate::error::{BotError, Result};
use crate::messenger::Messenger;
use crate::services::alerts::ContentAlerts;

/// Something the user did while a session is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Text(String),
    Option { slide_id: i64, option: usize },
    Hint { slide_id: i64, reveal: bool },
    Further { slide_id: i64 },
    Extra { accept: bool },
}

impl UserInput {
    /// Slide a button press was meant for. Typed text is not tied to a slide.
    fn target_slide(&self) -> Option<i64> {
        match self {
            Self::Option { slide_id, .. } | Self::Hint { slide_id, .. } | Self::Further { slide_id } => {
                Some(*slide_id)
            }
            Self::Text(_) | Self::Extra { .. } => None,
        }
    }
}

/// Where a call into the player left the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Stopped at a slide or dialog until the user acts
    Waiting,
    /// Session completed
    Finished,
    /// Input did not apply to the current state (stale button, wrong input type)
    Ignored,
    /// The user has no open session
    NoSession,
}

/// Outcome of rendering or evaluating one slide.
enum Flow {
    Advance,
    Await,
    Ignore,
}

#[derive(Debug, Clone)]
pub struct PlayerSettings {
    pub images_dir: PathBuf,
    pub fallback_image: PathBuf,
    pub hint_pause: Duration,
    /// Sleep for slide delays; off in tests
    pub honor_delays: bool,
    pub admins: Vec<i64>,
}

impl PlayerSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            images_dir: config.images_dir().to_path_buf(),
            fallback_image: config.fallback_image_path(),
            // Click-through builds skip all pacing
            hint_pause: if cfg!(feature = "testing") {
                Duration::ZERO
            } else {
                config.hint_pause
            },
            honor_delays: !cfg!(feature = "testing"),
            admins: config.admins.clone(),
        }
    }
}

pub struct Player<M> {
    pool: DbPool,
    messenger: M,
    settings: PlayerSettings,
    alerts: Arc<ContentAlerts>,
}

impl<M: Messenger> Player<M> {
    pub fn new(pool: DbPool, messenger: M, settings: PlayerSettings, alerts: Arc<ContentAlerts>) -> Self {
        Self {
            pool,
            messenger,
            settings,
            alerts,
        }
    }

    /// Start or resume a lesson.
    ///
    /// `Begin` and `Exam` abort any open session of this lesson and start a
    /// new one; `Exam` plays from the first exam slide and falls back to
    /// `Begin` when there is none. `Continue` resumes the open session, or
    /// begins if there is nothing to resume.
    pub async fn start_lesson(&self, user: &User, lesson_id: i64, mode: LessonStartsFrom) -> Result<Progress> {
        let lesson = self
            .db(|c| db::get_lesson(c, lesson_id))?
            .filter(|l| l.status != LessonStatus::Disabled)
            .ok_or(BotError::LessonNotFound(lesson_id))?;
        let chat = user.telegram_id;

        if !user.can_open(lesson.is_paid) {
            self.send_prompt_text(chat, db::PAYWALL_MESSAGE).await?;
            return Ok(Progress::Ignored);
        }
        if lesson.path.is_empty() {
            self.send_prompt_text(chat, db::NO_SLIDES_YET).await?;
            return Ok(Progress::Ignored);
        }

        if mode == LessonStartsFrom::Continue {
            if let Some(session) = self.db(|c| db::get_active_session(c, user.id, lesson_id))? {
                tracing::info!(user = user.id, session = session.id, "Resuming session");
                return self.drive(chat, session, None).await;
            }
        }

        let (path, starts_from) = match mode {
            LessonStartsFrom::Exam => {
                let exam_start = self.db(|c| db::first_exam_slide(c, lesson.path.slides()))?;
                match exam_start.and_then(|id| lesson.path.tail_from(id)) {
                    Some(tail) => (tail, SessionStartsFrom::Exam),
                    None => {
                        tracing::warn!(lesson = lesson_id, "Exam requested but lesson has no exam slide");
                        (lesson.path.clone(), SessionStartsFrom::Begin)
                    }
                }
            }
            LessonStartsFrom::Begin | LessonStartsFrom::Continue => (lesson.path.clone(), SessionStartsFrom::Begin),
        };

        let session = self.db(|c| open_session(c, user.id, lesson_id, &path, &lesson.path_extra, starts_from))?;
        tracing::info!(
            user = user.id,
            lesson = lesson_id,
            session = session.id,
            "Started session from {}",
            starts_from.as_str()
        );
        self.drive(chat, session, None).await
    }

    /// Typed text goes to the user's most recent open session.
    pub async fn handle_text(&self, user: &User, text: &str) -> Result<Progress> {
        let Some(session) = self.db(|c| db::get_latest_active_session(c, user.id))? else {
            self.send_prompt_text(user.telegram_id, db::UNKNOWN_INPUT).await?;
            return Ok(Progress::NoSession);
        };
        let progress = self
            .drive(user.telegram_id, session, Some(UserInput::Text(text.to_string())))
            .await?;
        if progress == Progress::Ignored {
            self.send_prompt_text(user.telegram_id, db::UNKNOWN_INPUT).await?;
        }
        Ok(progress)
    }

    /// A button press addressed to a specific session.
    pub async fn handle_input(&self, user: &User, session_id: i64, input: UserInput) -> Result<Progress> {
        let session = self.db(|c| db::get_session(c, session_id))?;
        match session {
            Some(session) if session.user_id == user.id && session.is_in_progress() => {
                self.drive(user.telegram_id, session, Some(input)).await
            }
            _ => {
                tracing::debug!(user = user.id, session = session_id, "Ignoring input for closed session");
                Ok(Progress::Ignored)
            }
        }
    }

    async fn drive(&self, chat: i64, mut session: Session, mut input: Option<UserInput>) -> Result<Progress> {
        loop {
            let path = session.active_path()?;
            let Some(slide_id) = path.get(session.current_step) else {
                match self.finish_path(chat, &mut session, input.take()).await? {
                    Some(progress) => return Ok(progress),
                    None => continue,
                }
            };

            let flow = match self.db(|c| db::get_slide(c, slide_id))? {
                None => {
                    tracing::warn!(session = session.id, slide = slide_id, "Slide is missing, skipping it");
                    self.send_prompt_text(chat, db::MISSING_SLIDE_TEXT).await?;
                    input = None;
                    Flow::Advance
                }
                Some(slide) => match input.take() {
                    Some(given) if given.target_slide().is_some_and(|target| target != slide.id) => {
                        tracing::debug!(session = session.id, slide = slide.id, "Stale button press");
                        Flow::Ignore
                    }
                    Some(given) if slide.awaits_input() => self.resume(chat, &mut session, &slide, given).await?,
                    _ => self.render(chat, &mut session, &slide).await?,
                },
            };

            match flow {
                Flow::Advance => {
                    session.current_step += 1;
                    let (id, step) = (session.id, session.current_step);
                    self.db(|c| db::update_session_step(c, id, step))?;
                }
                Flow::Await => return Ok(Progress::Waiting),
                Flow::Ignore => return Ok(Progress::Ignored),
            }
        }
    }

    /// Input for a slide that is waiting for the user.
    async fn resume(&self, chat: i64, session: &mut Session, slide: &Slide, input: UserInput) -> Result<Flow> {
        if slide.is_quiz() {
            return self.evaluate(chat, session, slide, input).await;
        }
        match input {
            UserInput::Further { .. } => Ok(Flow::Advance),
            _ => Ok(Flow::Ignore),
        }
    }

    /// Run `f` against the database. The lock is released before returning.
    fn db<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = db::try_lock(&self.pool)?;
        Ok(f(&conn)?)
    }

    fn text(&self, prompt: &str) -> Result<String> {
        self.db(|c| db::get_text(c, prompt))
    }

    async fn send_prompt_text(&self, chat: i64, prompt: &str) -> Result<()> {
        let text = self.text(prompt)?;
        self.messenger.send_text(chat, &text, None).await?;
        Ok(())
    }

    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Abort the user's open sessions of the lesson and start a fresh one.
fn open_session(
    conn: &Connection,
    user_id: i64,
    lesson_id: i64,
    path: &LessonPath,
    path_extra: &LessonPath,
    starts_from: SessionStartsFrom,
) -> rusqlite::Result<Session> {
    let tx = conn.unchecked_transaction()?;
    let aborted = db::abort_active_sessions(&tx, user_id, lesson_id)?;
    if aborted > 0 {
        tracing::info!(user = user_id, lesson = lesson_id, "Aborted {} open session(s)", aborted);
    }
    let id = db::create_session(&tx, user_id, lesson_id, path, path_extra, starts_from)?;
    let session = db::get_session(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
    tx.commit()?;
    Ok(session)
}
