use serde::{Deserialize, Serialize};

use crate::validation::split_variants;

/// Slide type as stored in the `slides.slide_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
  Text,
  Image,
  PinDict,
  SmallSticker,
  BigSticker,
  QuizOptions,
  QuizInputWord,
  QuizInputPhrase,
}

impl SlideKind {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "text" => Some(Self::Text),
      "image" => Some(Self::Image),
      "pin_dict" => Some(Self::PinDict),
      "small_sticker" => Some(Self::SmallSticker),
      "big_sticker" => Some(Self::BigSticker),
      "quiz_options" => Some(Self::QuizOptions),
      "quiz_input_word" => Some(Self::QuizInputWord),
      "quiz_input_phrase" => Some(Self::QuizInputPhrase),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Text => "text",
      Self::Image => "image",
      Self::PinDict => "pin_dict",
      Self::SmallSticker => "small_sticker",
      Self::BigSticker => "big_sticker",
      Self::QuizOptions => "quiz_options",
      Self::QuizInputWord => "quiz_input_word",
      Self::QuizInputPhrase => "quiz_input_phrase",
    }
  }

  pub fn is_quiz(&self) -> bool {
    matches!(self, Self::QuizOptions | Self::QuizInputWord | Self::QuizInputPhrase)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickerSize {
  Small,
  Big,
}

impl StickerSize {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "small" => Some(Self::Small),
      "big" => Some(Self::Big),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Small => "small",
      Self::Big => "big",
    }
  }
}

/// Accepted answers for a typed quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerKey {
  pub right: Vec<String>,
  pub almost_right: Vec<String>,
  pub almost_right_reply: Option<String>,
}

impl AnswerKey {
  /// Build from the pipe-delimited columns.
  pub fn from_columns(right: Option<&str>, almost_right: Option<&str>, reply: Option<String>) -> Self {
    Self {
      right: right.map(split_variants).unwrap_or_default(),
      almost_right: almost_right.map(split_variants).unwrap_or_default(),
      almost_right_reply: reply.filter(|r| !r.trim().is_empty()),
    }
  }

  /// The variant shown when the answer is revealed.
  pub fn canonical(&self) -> Option<&str> {
    self.right.first().map(String::as_str)
  }
}

/// Type-specific slide payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideContent {
  Text {
    text: String,
    delay: Option<f64>,
    further: bool,
  },
  Image {
    picture: String,
    delay: Option<f64>,
    further: bool,
  },
  PinDict {
    text: String,
  },
  Sticker {
    size: StickerSize,
  },
  QuizOptions {
    text: String,
    right_answers: Vec<String>,
    wrong_options: Vec<String>,
  },
  QuizInputWord {
    text: String,
    answers: AnswerKey,
  },
  QuizInputPhrase {
    text: String,
    answers: AnswerKey,
  },
}

impl SlideContent {
  pub fn kind(&self) -> SlideKind {
    match self {
      Self::Text { .. } => SlideKind::Text,
      Self::Image { .. } => SlideKind::Image,
      Self::PinDict { .. } => SlideKind::PinDict,
      Self::Sticker { size: StickerSize::Small } => SlideKind::SmallSticker,
      Self::Sticker { size: StickerSize::Big } => SlideKind::BigSticker,
      Self::QuizOptions { .. } => SlideKind::QuizOptions,
      Self::QuizInputWord { .. } => SlideKind::QuizInputWord,
      Self::QuizInputPhrase { .. } => SlideKind::QuizInputPhrase,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
  pub id: i64,
  pub lesson_id: i64,
  pub is_exam_slide: bool,
  pub content: SlideContent,
}

impl Slide {
  pub fn kind(&self) -> SlideKind {
    self.content.kind()
  }

  pub fn is_quiz(&self) -> bool {
    self.kind().is_quiz()
  }

  /// True if the player stops at this slide until the user does something.
  pub fn awaits_input(&self) -> bool {
    match &self.content {
      SlideContent::Text { further, .. } | SlideContent::Image { further, .. } => *further,
      SlideContent::PinDict { .. } | SlideContent::Sticker { .. } => false,
      SlideContent::QuizOptions { .. }
      | SlideContent::QuizInputWord { .. }
      | SlideContent::QuizInputPhrase { .. } => true,
    }
  }

  /// Buttons for an options quiz, in stored order: the canonical right
  /// answer first, then the wrong options. Callback payloads index into this.
  pub fn quiz_options(&self) -> Vec<String> {
    match &self.content {
      SlideContent::QuizOptions {
        right_answers,
        wrong_options,
        ..
      } => right_answers
        .first()
        .into_iter()
        .chain(wrong_options.iter())
        .cloned()
        .collect(),
      _ => Vec::new(),
    }
  }
}
