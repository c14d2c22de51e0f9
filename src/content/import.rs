//! Lesson packs: lessons with their slides, in TOML.
//!
//! ```toml
//! [[lesson]]
//! title = "Greetings"
//! index = 1
//! errors_threshold = 70
//!
//! [[lesson.slide]]
//! type = "text"
//! text = "Hello!"
//! further = true
//!
//! [[lesson.slide]]
//! type = "quiz_input_word"
//! text = "A _ says meow"
//! right_answers = "cat"
//! almost_right_answers = "kat|cet"
//! almost_right_answer_reply = "Almost, check the vowel."
//! exam = true
//! ```
//!
//! Slides are placed on the regular path in file order; slides with
//! `extra = true` go to the extra path instead.

use std::path::Path;

use rusqlite::Connection;
use serde::Deserialize;

use super::validate::validate_content;
use crate::db;
use crate::domain::{
  AnswerKey, Lesson, LessonLevel, LessonPath, LessonStatus, PathKind, Slide, SlideContent, SlideKind, StickerSize,
};
use crate::error::{BotError, ContentError, Result};
use crate::validation::split_variants;

#[derive(Debug, Deserialize)]
pub struct LessonPack {
  #[serde(default, rename = "lesson")]
  pub lessons: Vec<LessonEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LessonEntry {
  pub title: String,
  pub index: Option<i64>,
  pub level: Option<LessonLevel>,
  #[serde(default)]
  pub is_paid: bool,
  pub errors_threshold: Option<i64>,
  /// Defaults to active so imported lessons show up in the menu
  pub status: Option<LessonStatus>,
  #[serde(default, rename = "slide")]
  pub slides: Vec<SlideEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SlideEntry {
  #[serde(rename = "type")]
  pub kind: String,
  pub text: Option<String>,
  pub picture: Option<String>,
  pub delay: Option<f64>,
  #[serde(default)]
  pub further: bool,
  pub right_answers: Option<String>,
  pub almost_right_answers: Option<String>,
  pub almost_right_answer_reply: Option<String>,
  /// Pipe-delimited wrong options of an options quiz
  pub wrong_options: Option<String>,
  #[serde(default)]
  pub exam: bool,
  #[serde(default)]
  pub extra: bool,
}

impl SlideEntry {
  fn into_content(self, label: &str) -> std::result::Result<SlideContent, ContentError> {
    let kind = SlideKind::from_str(&self.kind).ok_or_else(|| ContentError::UnknownSlideType {
      slide: label.to_string(),
      kind: self.kind.clone(),
    })?;
    let text = self.text.unwrap_or_default();

    let content = match kind {
      SlideKind::Text => SlideContent::Text {
        text,
        delay: self.delay,
        further: self.further,
      },
      SlideKind::Image => SlideContent::Image {
        picture: self.picture.unwrap_or_default(),
        delay: self.delay,
        further: self.further,
      },
      SlideKind::PinDict => SlideContent::PinDict { text },
      SlideKind::SmallSticker => SlideContent::Sticker {
        size: StickerSize::Small,
      },
      SlideKind::BigSticker => SlideContent::Sticker { size: StickerSize::Big },
      SlideKind::QuizOptions => SlideContent::QuizOptions {
        text,
        right_answers: self.right_answers.as_deref().map(split_variants).unwrap_or_default(),
        wrong_options: self.wrong_options.as_deref().map(split_variants).unwrap_or_default(),
      },
      SlideKind::QuizInputWord | SlideKind::QuizInputPhrase => {
        let answers = AnswerKey::from_columns(
          self.right_answers.as_deref(),
          self.almost_right_answers.as_deref(),
          self.almost_right_answer_reply,
        );
        if kind == SlideKind::QuizInputWord {
          SlideContent::QuizInputWord { text, answers }
        } else {
          SlideContent::QuizInputPhrase { text, answers }
        }
      }
    };
    validate_content(label, &content)?;
    Ok(content)
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
  pub lessons: usize,
  pub slides: usize,
}

pub fn parse_pack(raw: &str) -> Result<LessonPack> {
  Ok(toml::from_str(raw)?)
}

/// Import every lesson of the pack. Nothing is written if any slide is invalid.
pub fn import_pack(conn: &Connection, pack: LessonPack) -> Result<ImportReport> {
  let tx = conn.unchecked_transaction()?;
  let mut report = ImportReport::default();

  for entry in pack.lessons {
    let mut lesson = Lesson::new(entry.title.clone());
    lesson.index = entry.index;
    lesson.level = entry.level;
    lesson.is_paid = entry.is_paid;
    lesson.errors_threshold = entry.errors_threshold;
    lesson.status = entry.status.unwrap_or(LessonStatus::Active);
    let lesson_id = db::insert_lesson(&tx, &lesson)?;

    let (mut path, mut path_extra) = (Vec::new(), Vec::new());
    for (n, slide) in entry.slides.into_iter().enumerate() {
      let label = format!("'{}' #{}", entry.title, n + 1);
      let (is_exam_slide, extra) = (slide.exam, slide.extra);
      let content = slide.into_content(&label)?;
      let id = db::insert_slide(
        &tx,
        &Slide {
          id: 0,
          lesson_id,
          is_exam_slide,
          content,
        },
      )?;
      if extra { path_extra.push(id) } else { path.push(id) }
      report.slides += 1;
    }

    db::update_lesson_path(&tx, lesson_id, PathKind::Regular, &LessonPath::new(path))?;
    db::update_lesson_path(&tx, lesson_id, PathKind::Extra, &LessonPath::new(path_extra))?;
    tracing::info!(lesson = lesson_id, "Imported lesson '{}'", entry.title);
    report.lessons += 1;
  }

  tx.commit()?;
  Ok(report)
}

pub fn import_file(conn: &Connection, file: &Path) -> Result<ImportReport> {
  let raw = std::fs::read_to_string(file).map_err(|e| {
    tracing::error!("Cannot read lesson pack {}: {}", file.display(), e);
    BotError::Io(e)
  })?;
  import_pack(conn, parse_pack(&raw)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::TestEnv;

  const PACK: &str = r#"
[[lesson]]
title = "Greetings"
index = 1
errors_threshold = 70

[[lesson.slide]]
type = "text"
text = "Hello!"
further = true

[[lesson.slide]]
type = "quiz_options"
text = "Pick _"
right_answers = "cat"
wrong_options = "dog|cow"
exam = true

[[lesson.slide]]
type = "quiz_input_word"
text = "A _ says meow"
right_answers = "cat"
almost_right_answers = "kat"
almost_right_answer_reply = "Close!"
exam = true

[[lesson.slide]]
type = "text"
text = "Let's practice more"
extra = true

[[lesson]]
title = "Draft"
status = "editing"
level = "beginner"
"#;

  #[test]
  fn test_import_builds_paths() {
    let env = TestEnv::new().unwrap();
    let conn = env.conn();

    let report = import_pack(&conn, parse_pack(PACK).unwrap()).unwrap();
    assert_eq!(report, ImportReport { lessons: 2, slides: 4 });

    let lessons = db::get_live_lessons(&conn).unwrap();
    let greetings = lessons.iter().find(|l| l.title == "Greetings").unwrap();
    assert_eq!(greetings.status, LessonStatus::Active);
    assert_eq!(greetings.errors_threshold, Some(70));
    assert_eq!(greetings.path.len(), 3);
    assert_eq!(greetings.path_extra.len(), 1);
    assert_eq!(greetings.first_slide_id, greetings.path.first());

    let slides = db::get_slides(&conn, greetings.path.slides()).unwrap();
    let quiz = &slides[&greetings.path.get(2).unwrap()];
    assert!(quiz.is_exam_slide);
    assert_eq!(quiz.kind(), SlideKind::QuizInputWord);
    assert_eq!(db::first_exam_slide(&conn, greetings.path.slides()).unwrap(), greetings.path.get(1));

    let draft = lessons.iter().find(|l| l.title == "Draft").unwrap();
    assert_eq!(draft.status, LessonStatus::Editing);
    assert_eq!(draft.level, Some(LessonLevel::Beginner));
    assert!(draft.path.is_empty());
  }

  #[test]
  fn test_invalid_slide_rolls_back() {
    let env = TestEnv::new().unwrap();
    let conn = env.conn();
    let pack = r#"
[[lesson]]
title = "Broken"

[[lesson.slide]]
type = "quiz_input_word"
text = "no blank"
right_answers = "x"
"#;

    let result = import_pack(&conn, parse_pack(pack).unwrap());
    assert!(matches!(result, Err(BotError::Content(ContentError::MissingBlank { .. }))));
    assert!(db::get_live_lessons(&conn).unwrap().is_empty());
  }

  #[test]
  fn test_unknown_slide_type() {
    let entry = SlideEntry {
      kind: "video".into(),
      ..Default::default()
    };
    assert!(matches!(
      entry.into_content("x"),
      Err(ContentError::UnknownSlideType { .. })
    ));
  }

  #[test]
  fn test_import_file_reports_parse_errors() {
    let env = TestEnv::new().unwrap();
    let file = env.path().join("pack.toml");
    std::fs::write(&file, "[[lesson]]\nindex = \"one\"\n").unwrap();

    let result = import_file(&env.conn(), &file);
    assert!(matches!(result, Err(BotError::Import(_))));
  }
}
