//! Checks on admin-entered content before it is stored.

use crate::config::MAX_SLIDE_DELAY_SECS;
use crate::db;
use crate::domain::{Slide, SlideContent};
use crate::error::ContentError;

/// Validate a slide payload. `label` names the slide in the error.
pub fn validate_content(label: &str, content: &SlideContent) -> Result<(), ContentError> {
  let slide = || label.to_string();
  match content {
    SlideContent::Text { delay: Some(delay), .. } | SlideContent::Image { delay: Some(delay), .. }
      if !(0.0..=MAX_SLIDE_DELAY_SECS).contains(delay) =>
    {
      Err(ContentError::InvalidDelay {
        slide: slide(),
        delay: delay.to_string(),
        max: MAX_SLIDE_DELAY_SECS.to_string(),
      })
    }
    SlideContent::Image { picture, .. } if picture.trim().is_empty() => {
      Err(ContentError::MissingPicture { slide: slide() })
    }
    SlideContent::QuizOptions {
      right_answers,
      wrong_options,
      ..
    } => {
      if right_answers.is_empty() {
        return Err(ContentError::MissingRightAnswer { slide: slide() });
      }
      if wrong_options.iter().all(|o| o.trim().is_empty()) {
        return Err(ContentError::MissingWrongOptions { slide: slide() });
      }
      Ok(())
    }
    SlideContent::QuizInputWord { text, answers } | SlideContent::QuizInputPhrase { text, answers } => {
      if matches!(content, SlideContent::QuizInputWord { .. }) && !text.contains('_') {
        return Err(ContentError::MissingBlank { slide: slide() });
      }
      if answers.right.is_empty() {
        return Err(ContentError::MissingRightAnswer { slide: slide() });
      }
      if !answers.almost_right.is_empty() && answers.almost_right_reply.is_none() {
        return Err(ContentError::MissingAlmostRightReply { slide: slide() });
      }
      Ok(())
    }
    _ => Ok(()),
  }
}

pub fn validate_slide(slide: &Slide) -> Result<(), ContentError> {
  validate_content(&slide.id.to_string(), &slide.content)
}

/// A canned text must keep the `{}` markers its default has. Texts without a
/// default are not checked.
pub fn validate_text_template(prompt: &str, text: &str) -> Result<(), ContentError> {
  let Some(default) = db::default_text(prompt) else {
    return Ok(());
  };
  let expected = db::count_placeholders(default);
  let found = db::count_placeholders(text);
  if expected != found {
    return Err(ContentError::PlaceholderCount {
      prompt: prompt.to_string(),
      expected,
      found,
    });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::AnswerKey;
  use crate::testing::{options_quiz, word_quiz};

  #[test]
  fn test_word_quiz_needs_blank() {
    let content = word_quiz("no blank here", "x", "", None);
    assert_eq!(
      validate_content("7", &content),
      Err(ContentError::MissingBlank { slide: "7".into() })
    );
    assert!(validate_content("7", &word_quiz("a_b", "x", "", None)).is_ok());
  }

  #[test]
  fn test_almost_right_needs_reply() {
    let word = word_quiz("a_b", "x", "foo|bar", None);
    assert!(matches!(
      validate_content("1", &word),
      Err(ContentError::MissingAlmostRightReply { .. })
    ));

    let phrase = SlideContent::QuizInputPhrase {
      text: "translate me".into(),
      answers: AnswerKey::from_columns(Some("x|y"), Some("foo|bar"), None),
    };
    assert!(matches!(
      validate_content("1", &phrase),
      Err(ContentError::MissingAlmostRightReply { .. })
    ));
  }

  #[test]
  fn test_blank_almost_right_variants_need_no_reply() {
    let word = word_quiz("a_b", "x", " |  | ", None);
    assert!(validate_content("1", &word).is_ok());
  }

  #[test]
  fn test_quiz_needs_answers() {
    let no_right = word_quiz("a_b", " | ", "", None);
    assert!(matches!(
      validate_content("1", &no_right),
      Err(ContentError::MissingRightAnswer { .. })
    ));
    assert!(matches!(
      validate_content("1", &options_quiz("Pick", "a", &[])),
      Err(ContentError::MissingWrongOptions { .. })
    ));
  }

  #[test]
  fn test_image_needs_picture() {
    let image = SlideContent::Image {
      picture: " ".into(),
      delay: None,
      further: false,
    };
    assert!(matches!(
      validate_content("1", &image),
      Err(ContentError::MissingPicture { .. })
    ));
  }

  #[test]
  fn test_delay_must_be_in_range() {
    let text = |delay| SlideContent::Text {
      text: "Hi".into(),
      delay: Some(delay),
      further: false,
    };
    assert!(validate_content("1", &text(2.5)).is_ok());
    assert!(validate_content("1", &text(MAX_SLIDE_DELAY_SECS)).is_ok());
    for bad in [1e30, -1.0, f64::NAN, f64::INFINITY] {
      assert!(matches!(
        validate_content("1", &text(bad)),
        Err(ContentError::InvalidDelay { .. })
      ));
    }

    let image = SlideContent::Image {
      picture: "a.png".into(),
      delay: Some(1e30),
      further: false,
    };
    assert!(matches!(
      validate_content("1", &image),
      Err(ContentError::InvalidDelay { .. })
    ));
  }

  #[test]
  fn test_text_template_markers() {
    assert!(validate_text_template(db::RIGHT_ANSWER, "Answer: {}").is_ok());
    assert_eq!(
      validate_text_template(db::RIGHT_ANSWER, "Answer!"),
      Err(ContentError::PlaceholderCount {
        prompt: db::RIGHT_ANSWER.into(),
        expected: 1,
        found: 0,
      })
    );
    assert!(validate_text_template("custom_prompt", "anything {}").is_ok());
  }
}
