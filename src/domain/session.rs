use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::path::{LessonPath, PathError};

/// How a user asked to enter a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStartsFrom {
  Begin,
  Exam,
  Continue,
}

impl LessonStartsFrom {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "begin" => Some(Self::Begin),
      "exam" => Some(Self::Exam),
      "continue" => Some(Self::Continue),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Begin => "begin",
      Self::Exam => "exam",
      Self::Continue => "continue",
    }
  }
}

/// Entry mode recorded on a session. `Continue` never reaches storage: it
/// resumes a session that was started one of these two ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStartsFrom {
  Begin,
  Exam,
}

impl SessionStartsFrom {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "begin" => Some(Self::Begin),
      "exam" => Some(Self::Exam),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Begin => "begin",
      Self::Exam => "exam",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
  InProgress,
  Completed,
  Aborted,
}

impl SessionStatus {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "in_progress" => Some(Self::InProgress),
      "completed" => Some(Self::Completed),
      "aborted" => Some(Self::Aborted),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::InProgress => "in_progress",
      Self::Completed => "completed",
      Self::Aborted => "aborted",
    }
  }
}

/// One user's run through one lesson.
///
/// `path` and `path_extra` are copies frozen when the session starts; later
/// edits to the lesson never reach a running session.
#[derive(Debug, Clone)]
pub struct Session {
  pub id: i64,
  pub user_id: i64,
  pub lesson_id: i64,
  pub path: String,
  pub path_extra: Option<String>,
  /// 0-based index into the active path
  pub current_step: usize,
  pub starts_from: SessionStartsFrom,
  pub status: SessionStatus,
  pub in_extra: bool,
  /// Last quiz prompt sent, so a right answer can be revealed in place
  pub prompt_message_id: Option<i32>,
  pub hints_shown: i64,
  pub created_at: DateTime<Utc>,
}

impl Session {
  /// The path currently being played: the extra path once remediation was accepted.
  pub fn active_path(&self) -> Result<LessonPath, PathError> {
    if self.in_extra {
      LessonPath::from_stored(self.path_extra.as_deref())
    } else {
      self.path.parse()
    }
  }

  pub fn regular_path(&self) -> Result<LessonPath, PathError> {
    self.path.parse()
  }

  pub fn has_extra(&self) -> bool {
    LessonPath::from_stored(self.path_extra.as_deref())
      .map(|p| !p.is_empty())
      .unwrap_or(false)
  }

  pub fn is_in_progress(&self) -> bool {
    self.status == SessionStatus::InProgress
  }
}

/// A single quiz attempt.
#[derive(Debug, Clone)]
pub struct QuizAnswerLog {
  pub id: i64,
  pub session_id: i64,
  pub slide_id: i64,
  pub slide_type: String,
  pub is_correct: bool,
  pub created_at: DateTime<Utc>,
}
