//! Answer matching for typed and option quizzes.
//!
//! Answer keys are pipe-delimited variant lists (`"cat|kitty"`). Matching is
//! an exact, case-insensitive comparison after normalization:
//! - Unicode NFC, trimmed, lowercased, inner whitespace collapsed
//! - single-word answers additionally drop leading/trailing punctuation

use unicode_normalization::UnicodeNormalization;

use crate::domain::AnswerKey;

// ============================================================================
// Result types
// ============================================================================

/// Outcome of comparing user input against an answer key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
  /// Matches a right variant
  Correct,
  /// Matches an almost-right variant; accepted with a gentle correction
  AlmostCorrect,
  Incorrect,
}

impl Verdict {
  /// Almost-right answers count as correct in the answer log
  pub fn is_correct(&self) -> bool {
    !matches!(self, Self::Incorrect)
  }
}

/// How strictly the input is trimmed before comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
  /// A single word: surrounding punctuation is ignored ("Cat!" == "cat")
  Word,
  /// A phrase: punctuation is significant
  Phrase,
}

// ============================================================================
// Normalization
// ============================================================================

/// Split a pipe-delimited answer list, dropping blank variants.
pub fn split_variants(raw: &str) -> Vec<String> {
  raw
    .split('|')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

/// True if a pipe-delimited list has at least one non-blank variant.
pub fn has_variants(raw: Option<&str>) -> bool {
  raw.map(|r| !split_variants(r).is_empty()).unwrap_or(false)
}

/// Normalize for comparison:
/// - NFC so composed and decomposed forms compare equal
/// - lowercase, trimmed
/// - inner whitespace collapsed to single spaces
pub fn normalize_answer(input: &str) -> String {
  input
    .nfc()
    .collect::<String>()
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Strip leading and trailing characters that are not letters or digits.
pub fn trim_non_alpha(input: &str) -> &str {
  input.trim_matches(|c: char| !c.is_alphanumeric())
}

fn normalize_for(mode: MatchMode, input: &str) -> String {
  let normalized = normalize_answer(input);
  match mode {
    MatchMode::Word => trim_non_alpha(&normalized).to_string(),
    MatchMode::Phrase => normalized,
  }
}

// ============================================================================
// Matching
// ============================================================================

/// Does `input` equal any of `variants` under `mode`?
pub fn matches_any<S: AsRef<str>>(mode: MatchMode, input: &str, variants: &[S]) -> bool {
  let needle = normalize_for(mode, input);
  if needle.is_empty() {
    return false;
  }
  variants
    .iter()
    .any(|v| normalize_for(mode, v.as_ref()) == needle)
}

/// Judge a typed answer. Right variants win over almost-right ones.
pub fn judge(mode: MatchMode, input: &str, key: &AnswerKey) -> Verdict {
  if matches_any(mode, input, &key.right) {
    Verdict::Correct
  } else if matches_any(mode, input, &key.almost_right) {
    Verdict::AlmostCorrect
  } else {
    Verdict::Incorrect
  }
}

/// Judge a pressed option button against the right answers.
pub fn judge_option(chosen: &str, right_answers: &[String]) -> Verdict {
  if matches_any(MatchMode::Phrase, chosen, right_answers) {
    Verdict::Correct
  } else {
    Verdict::Incorrect
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(right: &str, almost: &str) -> AnswerKey {
    AnswerKey::from_columns(Some(right), Some(almost), Some("close!".into()))
  }

  #[test]
  fn test_split_variants() {
    assert_eq!(split_variants("cat| kitty |"), vec!["cat", "kitty"]);
    assert!(split_variants(" |  | ").is_empty());
    assert!(has_variants(Some("a|")));
    assert!(!has_variants(Some(" | ")));
    assert!(!has_variants(None));
  }

  #[test]
  fn test_case_insensitive_variants() {
    let k = key("Cat|Kitty", "");
    assert_eq!(judge(MatchMode::Word, "cat", &k), Verdict::Correct);
    assert_eq!(judge(MatchMode::Word, "KITTY", &k), Verdict::Correct);
    assert_eq!(judge(MatchMode::Word, "dog", &k), Verdict::Incorrect);
  }

  #[test]
  fn test_word_ignores_surrounding_punctuation() {
    let k = key("cat", "");
    assert_eq!(judge(MatchMode::Word, "  Cat!  ", &k), Verdict::Correct);
    assert_eq!(judge(MatchMode::Word, "«cat»", &k), Verdict::Correct);
  }

  #[test]
  fn test_phrase_keeps_punctuation_but_collapses_spaces() {
    let k = key("how are you", "");
    assert_eq!(judge(MatchMode::Phrase, "How  are   you", &k), Verdict::Correct);
    assert_eq!(judge(MatchMode::Phrase, "how are you?", &k), Verdict::Incorrect);
  }

  #[test]
  fn test_almost_right() {
    let k = key("cat", "kat|catt");
    assert_eq!(judge(MatchMode::Word, "Kat", &k), Verdict::AlmostCorrect);
    assert!(Verdict::AlmostCorrect.is_correct());
  }

  #[test]
  fn test_empty_input_never_matches() {
    let k = key("cat", "");
    assert_eq!(judge(MatchMode::Word, "!!!", &k), Verdict::Incorrect);
    assert_eq!(judge(MatchMode::Phrase, "   ", &k), Verdict::Incorrect);
  }

  #[test]
  fn test_nfc_normalization() {
    // "é" composed vs "e" + combining acute
    let k = key("caf\u{e9}", "");
    assert_eq!(judge(MatchMode::Word, "cafe\u{301}", &k), Verdict::Correct);
  }

  #[test]
  fn test_cyrillic() {
    let k = key("Привет", "");
    assert_eq!(judge(MatchMode::Word, "привет", &k), Verdict::Correct);
  }

  #[test]
  fn test_judge_option() {
    let right = vec!["went".to_string()];
    assert_eq!(judge_option("went", &right), Verdict::Correct);
    assert_eq!(judge_option("goed", &right), Verdict::Incorrect);
  }
}
