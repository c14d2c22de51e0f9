use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::path::LessonPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
  /// Visible to users
  Active,
  /// Being authored; hidden but its slides are kept
  Editing,
  /// Removed on the next garbage collection
  Disabled,
}

impl LessonStatus {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "active" => Some(Self::Active),
      "editing" => Some(Self::Editing),
      "disabled" => Some(Self::Disabled),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Editing => "editing",
      Self::Disabled => "disabled",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonLevel {
  Beginner,
  Intermediate,
  Advanced,
}

impl LessonLevel {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "beginner" => Some(Self::Beginner),
      "intermediate" => Some(Self::Intermediate),
      "advanced" => Some(Self::Advanced),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Beginner => "beginner",
      Self::Intermediate => "intermediate",
      Self::Advanced => "advanced",
    }
  }
}

/// Which of a lesson's two paths an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
  Regular,
  Extra,
}

#[derive(Debug, Clone)]
pub struct Lesson {
  pub id: i64,
  /// Position in the lesson menu
  pub index: Option<i64>,
  pub title: String,
  pub level: Option<LessonLevel>,
  pub path: LessonPath,
  pub path_extra: LessonPath,
  pub first_slide_id: Option<i64>,
  pub is_paid: bool,
  /// Minimum exam score (percent) below which extra slides are offered
  pub errors_threshold: Option<i64>,
  pub status: LessonStatus,
  pub created_at: DateTime<Utc>,
}

impl Lesson {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      id: 0,
      index: None,
      title: title.into(),
      level: None,
      path: LessonPath::default(),
      path_extra: LessonPath::default(),
      first_slide_id: None,
      is_paid: false,
      errors_threshold: None,
      status: LessonStatus::Editing,
      created_at: Utc::now(),
    }
  }

  pub fn path_of(&self, kind: PathKind) -> &LessonPath {
    match kind {
      PathKind::Regular => &self.path,
      PathKind::Extra => &self.path_extra,
    }
  }
}
