//! Ordered slide sequences.
//!
//! A lesson (and every session started from it) walks slides in the order
//! given by a `LessonPath`. Paths are stored as dot-joined ids, e.g. `"5.6.7"`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
  #[error("slide {0} is already in the path")]
  DuplicateSlide(i64),
  #[error("position {position} is out of range for a path of {len} slides")]
  PositionOutOfRange { position: usize, len: usize },
  #[error("'{0}' is not a slide id")]
  InvalidToken(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
  Up,
  Down,
}

impl MoveDirection {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "up" => Some(Self::Up),
      "down" => Some(Self::Down),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Up => "up",
      Self::Down => "down",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonPath {
  slides: Vec<i64>,
}

impl LessonPath {
  pub fn new(slides: Vec<i64>) -> Self {
    Self { slides }
  }

  /// Parse a stored column value. NULL, `""` and `"None"` are all empty paths.
  pub fn from_stored(raw: Option<&str>) -> Result<Self, PathError> {
    match raw {
      Some(s) => s.parse(),
      None => Ok(Self::default()),
    }
  }

  pub fn slides(&self) -> &[i64] {
    &self.slides
  }

  pub fn len(&self) -> usize {
    self.slides.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slides.is_empty()
  }

  pub fn get(&self, position: usize) -> Option<i64> {
    self.slides.get(position).copied()
  }

  pub fn first(&self) -> Option<i64> {
    self.slides.first().copied()
  }

  pub fn contains(&self, slide_id: i64) -> bool {
    self.slides.contains(&slide_id)
  }

  pub fn position_of(&self, slide_id: i64) -> Option<usize> {
    self.slides.iter().position(|&id| id == slide_id)
  }

  /// Insert `slide_id` so that it ends up at `position` (0-based).
  pub fn insert(&mut self, position: usize, slide_id: i64) -> Result<(), PathError> {
    if self.contains(slide_id) {
      return Err(PathError::DuplicateSlide(slide_id));
    }
    if position > self.slides.len() {
      return Err(self.out_of_range(position));
    }
    self.slides.insert(position, slide_id);
    Ok(())
  }

  /// Replace the id at `position`, returning the id that was there.
  pub fn replace(&mut self, position: usize, slide_id: i64) -> Result<i64, PathError> {
    let current = self.get(position).ok_or_else(|| self.out_of_range(position))?;
    if current != slide_id && self.contains(slide_id) {
      return Err(PathError::DuplicateSlide(slide_id));
    }
    self.slides[position] = slide_id;
    Ok(current)
  }

  /// Swap the slide at `position` with its neighbour. Moving the first slide
  /// up or the last slide down leaves the path as it is.
  pub fn move_slide(&mut self, position: usize, direction: MoveDirection) -> Result<(), PathError> {
    if position >= self.slides.len() {
      return Err(self.out_of_range(position));
    }
    match direction {
      MoveDirection::Up if position > 0 => self.slides.swap(position, position - 1),
      MoveDirection::Down if position + 1 < self.slides.len() => self.slides.swap(position, position + 1),
      _ => {}
    }
    Ok(())
  }

  pub fn remove(&mut self, position: usize) -> Result<i64, PathError> {
    if position >= self.slides.len() {
      return Err(self.out_of_range(position));
    }
    Ok(self.slides.remove(position))
  }

  /// Drop every occurrence of `slide_id`. Returns whether anything was removed.
  pub fn remove_id(&mut self, slide_id: i64) -> bool {
    let before = self.slides.len();
    self.slides.retain(|&id| id != slide_id);
    self.slides.len() != before
  }

  /// The part of the path starting at `slide_id`, or `None` if it is absent.
  pub fn tail_from(&self, slide_id: i64) -> Option<LessonPath> {
    self
      .position_of(slide_id)
      .map(|pos| LessonPath::new(self.slides[pos..].to_vec()))
  }

  pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
    self.slides.iter().copied()
  }

  fn out_of_range(&self, position: usize) -> PathError {
    PathError::PositionOutOfRange {
      position,
      len: self.slides.len(),
    }
  }
}

impl FromStr for LessonPath {
  type Err = PathError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() || s == "None" {
      return Ok(Self::default());
    }
    let slides = s
      .split('.')
      .map(|token| {
        token
          .trim()
          .parse::<i64>()
          .map_err(|_| PathError::InvalidToken(token.to_string()))
      })
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self { slides })
  }
}

impl fmt::Display for LessonPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let joined = self
      .slides
      .iter()
      .map(|id| id.to_string())
      .collect::<Vec<_>>()
      .join(".");
    f.write_str(&joined)
  }
}

impl From<Vec<i64>> for LessonPath {
  fn from(slides: Vec<i64>) -> Self {
    Self::new(slides)
  }
}
