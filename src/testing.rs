//! Test utilities: a migrated database with fixture helpers and a messenger
//! that records everything instead of talking to Telegram.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tempfile::TempDir;

use crate::db::{self, DbPool};
use crate::domain::{AnswerKey, Lesson, LessonStatus, Slide, SlideContent, User};
use crate::error::DeliveryError;
use crate::keyboard::Keyboard;
use crate::messenger::{DeliveryResult, MessageId, Messenger};

// ==================== Database ====================

/// Test environment with a file-backed database built by the authoritative
/// migrations, removed when dropped.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    pub pool: DbPool,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        let pool = db::init_db(&temp.path().join("lessons.db"))?;
        Ok(Self { temp, pool })
    }

    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.pool.lock().expect("test database lock")
    }

    /// Get the temporary directory path for creating test files.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Insert an active lesson with the given regular path.
    pub fn add_lesson(&self, title: &str, path: &str) -> i64 {
        let mut lesson = Lesson::new(title);
        lesson.status = LessonStatus::Active;
        lesson.path = path.parse().expect("valid test path");
        db::insert_lesson(&self.conn(), &lesson).expect("insert lesson")
    }

    pub fn add_slide(&self, lesson_id: i64, content: SlideContent, is_exam_slide: bool) -> i64 {
        let slide = Slide {
            id: 0,
            lesson_id,
            is_exam_slide,
            content,
        };
        db::insert_slide(&self.conn(), &slide).expect("insert slide")
    }

    pub fn add_user(&self, telegram_id: i64) -> User {
        db::get_or_create_user(&self.conn(), telegram_id, "Test User", Some("tester")).expect("insert user")
    }

    pub fn reload_user(&self, user: &User) -> User {
        db::get_user(&self.conn(), user.id)
            .expect("load user")
            .expect("user exists")
    }
}

// ==================== Slide fixtures ====================

pub fn text_slide(text: &str) -> SlideContent {
    SlideContent::Text {
        text: text.to_string(),
        delay: None,
        further: false,
    }
}

pub fn further_slide(text: &str) -> SlideContent {
    SlideContent::Text {
        text: text.to_string(),
        delay: None,
        further: true,
    }
}

pub fn word_quiz(text: &str, right: &str, almost: &str, reply: Option<&str>) -> SlideContent {
    SlideContent::QuizInputWord {
        text: text.to_string(),
        answers: AnswerKey::from_columns(Some(right), Some(almost), reply.map(str::to_string)),
    }
}

pub fn phrase_quiz(text: &str, right: &str) -> SlideContent {
    SlideContent::QuizInputPhrase {
        text: text.to_string(),
        answers: AnswerKey::from_columns(Some(right), None, None),
    }
}

pub fn options_quiz(text: &str, right: &str, wrong: &[&str]) -> SlideContent {
    SlideContent::QuizOptions {
        text: text.to_string(),
        right_answers: vec![right.to_string()],
        wrong_options: wrong.iter().map(|s| s.to_string()).collect(),
    }
}

// ==================== Messenger ====================

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat_id: i64,
        message_id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        chat_id: i64,
        message_id: MessageId,
        path: PathBuf,
        keyboard: Option<Keyboard>,
    },
    Sticker {
        chat_id: i64,
        file_id: String,
    },
    Pin {
        chat_id: i64,
        message_id: MessageId,
    },
    UnpinAll {
        chat_id: i64,
    },
    Edit {
        chat_id: i64,
        message_id: MessageId,
        text: String,
    },
    ClearKeyboard {
        chat_id: i64,
        message_id: MessageId,
    },
}

impl Sent {
    pub fn chat_id(&self) -> i64 {
        match self {
            Sent::Text { chat_id, .. }
            | Sent::Photo { chat_id, .. }
            | Sent::Sticker { chat_id, .. }
            | Sent::Pin { chat_id, .. }
            | Sent::UnpinAll { chat_id }
            | Sent::Edit { chat_id, .. }
            | Sent::ClearKeyboard { chat_id, .. } => *chat_id,
        }
    }
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<Sent>,
    last_id: MessageId,
    blocked: HashSet<i64>,
    failing: HashSet<i64>,
}

/// Messenger that records every call. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingMessenger {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().expect("recorder lock")
    }

    /// Deliveries to this chat fail as if the user blocked the bot.
    pub fn block_chat(&self, chat_id: i64) {
        self.state().blocked.insert(chat_id);
    }

    /// Deliveries to this chat fail with a transient error.
    pub fn fail_chat(&self, chat_id: i64) {
        self.state().failing.insert(chat_id);
    }

    pub fn events(&self) -> Vec<Sent> {
        self.state().events.clone()
    }

    pub fn clear(&self) {
        self.state().events.clear();
    }

    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.state()
            .events
            .iter()
            .filter_map(|e| match e {
                Sent::Text { chat_id: c, text, .. } if *c == chat_id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self, chat_id: i64) -> Option<String> {
        self.texts_to(chat_id).pop()
    }

    /// Keyboard of the most recent text or photo that had one.
    pub fn last_keyboard(&self, chat_id: i64) -> Option<Keyboard> {
        self.state().events.iter().rev().find_map(|e| match e {
            Sent::Text {
                chat_id: c,
                keyboard: Some(kb),
                ..
            }
            | Sent::Photo {
                chat_id: c,
                keyboard: Some(kb),
                ..
            } if *c == chat_id => Some(kb.clone()),
            _ => None,
        })
    }

    pub fn edits_to(&self, chat_id: i64) -> Vec<String> {
        self.state()
            .events
            .iter()
            .filter_map(|e| match e {
                Sent::Edit { chat_id: c, text, .. } if *c == chat_id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn deliver(&self, chat_id: i64, make: impl FnOnce(MessageId) -> Sent) -> DeliveryResult<MessageId> {
        let mut state = self.state();
        if state.blocked.contains(&chat_id) {
            return Err(DeliveryError::Blocked(chat_id));
        }
        if state.failing.contains(&chat_id) {
            return Err(DeliveryError::Other("network is down".to_string()));
        }
        state.last_id += 1;
        let id = state.last_id;
        state.events.push(make(id));
        Ok(id)
    }
}

impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> DeliveryResult<MessageId> {
        self.deliver(chat_id, |message_id| Sent::Text {
            chat_id,
            message_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        })
    }

    async fn send_photo(&self, chat_id: i64, path: &Path, keyboard: Option<&Keyboard>) -> DeliveryResult<MessageId> {
        self.deliver(chat_id, |message_id| Sent::Photo {
            chat_id,
            message_id,
            path: path.to_path_buf(),
            keyboard: keyboard.cloned(),
        })
    }

    async fn send_sticker(&self, chat_id: i64, file_id: &str) -> DeliveryResult<MessageId> {
        self.deliver(chat_id, |_| Sent::Sticker {
            chat_id,
            file_id: file_id.to_string(),
        })
    }

    async fn pin_message(&self, chat_id: i64, message_id: MessageId) -> DeliveryResult<()> {
        self.deliver(chat_id, |_| Sent::Pin { chat_id, message_id })
            .map(|_| ())
    }

    async fn unpin_all(&self, chat_id: i64) -> DeliveryResult<()> {
        self.deliver(chat_id, |_| Sent::UnpinAll { chat_id }).map(|_| ())
    }

    async fn edit_text(&self, chat_id: i64, message_id: MessageId, text: &str) -> DeliveryResult<()> {
        self.deliver(chat_id, |_| Sent::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        })
        .map(|_| ())
    }

    async fn clear_keyboard(&self, chat_id: i64, message_id: MessageId) -> DeliveryResult<()> {
        self.deliver(chat_id, |_| Sent::ClearKeyboard { chat_id, message_id })
            .map(|_| ())
    }
}
