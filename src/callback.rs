//! Inline button payloads.
//!
//! Payloads are `prefix:field:field`, short enough for Telegram's 64-byte
//! callback data limit.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::LessonStartsFrom;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackData {
    /// Open the entry dialog of a lesson
    Lesson { lesson_id: i64 },
    /// Start or resume a lesson in the chosen mode
    Start { lesson_id: i64, mode: LessonStartsFrom },
    Further { session_id: i64, slide_id: i64 },
    /// Option button of an options quiz; `option` indexes `Slide::quiz_options`
    Quiz { session_id: i64, slide_id: i64, option: usize },
    Hint { session_id: i64, slide_id: i64, reveal: bool },
    Extra { session_id: i64, accept: bool },
    /// Reminder frequency in days, 0 turns reminders off
    Reminder { days: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed callback data: {0}")]
pub struct CallbackParseError(pub String);

fn flag(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

impl fmt::Display for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lesson { lesson_id } => write!(f, "lesson:{}", lesson_id),
            Self::Start { lesson_id, mode } => write!(f, "start:{}:{}", lesson_id, mode.as_str()),
            Self::Further { session_id, slide_id } => write!(f, "further:{}:{}", session_id, slide_id),
            Self::Quiz {
                session_id,
                slide_id,
                option,
            } => write!(f, "quiz:{}:{}:{}", session_id, slide_id, option),
            Self::Hint {
                session_id,
                slide_id,
                reveal,
            } => write!(f, "hint:{}:{}:{}", session_id, slide_id, flag(*reveal)),
            Self::Extra { session_id, accept } => write!(f, "extra:{}:{}", session_id, flag(*accept)),
            Self::Reminder { days } => write!(f, "remind:{}", days),
        }
    }
}

impl FromStr for CallbackData {
    type Err = CallbackParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CallbackParseError(s.to_string());
        let parts: Vec<&str> = s.split(':').collect();

        fn num<T: FromStr>(raw: &str) -> Option<T> {
            raw.parse().ok()
        }
        fn boolean(raw: &str) -> Option<bool> {
            match raw {
                "1" => Some(true),
                "0" => Some(false),
                _ => None,
            }
        }

        let parsed = match parts.as_slice() {
            ["lesson", lesson_id] => num(lesson_id).map(|lesson_id| Self::Lesson { lesson_id }),
            ["start", lesson_id, mode] => num(lesson_id)
                .zip(LessonStartsFrom::from_str(mode))
                .map(|(lesson_id, mode)| Self::Start { lesson_id, mode }),
            ["further", session_id, slide_id] => num(session_id)
                .zip(num(slide_id))
                .map(|(session_id, slide_id)| Self::Further { session_id, slide_id }),
            ["quiz", session_id, slide_id, option] => match (num(session_id), num(slide_id), num(option)) {
                (Some(session_id), Some(slide_id), Some(option)) => Some(Self::Quiz {
                    session_id,
                    slide_id,
                    option,
                }),
                _ => None,
            },
            ["hint", session_id, slide_id, reveal] => match (num(session_id), num(slide_id), boolean(reveal)) {
                (Some(session_id), Some(slide_id), Some(reveal)) => Some(Self::Hint {
                    session_id,
                    slide_id,
                    reveal,
                }),
                _ => None,
            },
            ["extra", session_id, accept] => num(session_id)
                .zip(boolean(accept))
                .map(|(session_id, accept)| Self::Extra { session_id, accept }),
            ["remind", days] => num(days).map(|days| Self::Reminder { days }),
            _ => None,
        };
        parsed.ok_or_else(err)
    }
}
