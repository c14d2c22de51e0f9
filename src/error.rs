//! Error types for the lesson bot.

use thiserror::Error;

use crate::db::DbLockError;
use crate::domain::path::PathError;

/// Errors that can occur while playing lessons or running background jobs.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    DbUnavailable(#[from] DbLockError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Lesson path error: {0}")]
    Path(#[from] PathError),

    #[error("Invalid content: {0}")]
    Content(#[from] ContentError),

    #[error("Lesson not found: {0}")]
    LessonNotFound(i64),

    #[error("Slide not found: {0}")]
    SlideNotFound(i64),

    #[error("No user with telegram id {0}")]
    UserNotFound(i64),

    /// Bot token or another required setting is missing.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse lesson pack: {0}")]
    Import(#[from] toml::de::Error),
}

/// Failure to deliver something to a chat.
///
/// `Blocked` covers chats that will never accept messages again (bot blocked,
/// user deactivated, chat gone). Everything else is `Other`.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("chat {0} is unreachable")]
    Blocked(i64),

    #[error("{0}")]
    Other(String),
}

/// Admin-entered content that the player could not use safely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("slide {slide}: input-word quiz text must contain '_'")]
    MissingBlank { slide: String },

    #[error("slide {slide}: quiz needs at least one right answer")]
    MissingRightAnswer { slide: String },

    #[error("slide {slide}: options quiz needs at least one wrong option")]
    MissingWrongOptions { slide: String },

    #[error("slide {slide}: almost-right answers are set but the reply is empty")]
    MissingAlmostRightReply { slide: String },

    #[error("slide {slide}: image slide has no picture")]
    MissingPicture { slide: String },

    #[error("slide {slide}: delay {delay} must be between 0 and {max} seconds")]
    InvalidDelay { slide: String, delay: String, max: String },

    #[error("slide {slide}: unknown slide type '{kind}'")]
    UnknownSlideType { slide: String, kind: String },

    #[error("text '{prompt}' must contain {expected} '{{}}' markers, found {found}")]
    PlaceholderCount {
        prompt: String,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, BotError>;
