//! End of a path: statistics, the remediation offer and completion.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use super::{Player, Progress, UserInput};
use crate::db::{self, LogOnError};
use crate::domain::{Session, SessionStartsFrom, SessionStatus, Slide};
use crate::error::{BotError, Result};
use crate::keyboard;
use crate::messenger::Messenger;

/// Quiz results of one traversed path, split at the first exam slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessonStats {
    pub regular_exercises: i64,
    pub regular_correct: i64,
    pub exam_exercises: i64,
    pub exam_correct: i64,
    /// The path has an exam section, with or without quizzes in it
    pub has_exam: bool,
}

impl LessonStats {
    /// Exam correctness in percent, None without exam exercises.
    pub fn exam_score(&self) -> Option<f64> {
        (self.exam_exercises > 0).then(|| self.exam_correct as f64 * 100.0 / self.exam_exercises as f64)
    }
}

/// Count exercises and correct answers over `path`.
///
/// A quiz slide counts as correct when the session logged no wrong answer
/// for it. Slides missing from `slides` are not counted.
pub fn compute_stats(path: &[i64], slides: &HashMap<i64, Slide>, errors: &HashSet<i64>) -> LessonStats {
    let mut stats = LessonStats::default();
    for id in path {
        let Some(slide) = slides.get(id) else { continue };
        if slide.is_exam_slide {
            stats.has_exam = true;
        }
        if !slide.is_quiz() {
            continue;
        }
        let correct = i64::from(!errors.contains(id));
        if stats.has_exam {
            stats.exam_exercises += 1;
            stats.exam_correct += correct;
        } else {
            stats.regular_exercises += 1;
            stats.regular_correct += correct;
        }
    }
    stats
}

/// Remediation is offered when the exam score falls below the lesson's
/// threshold and there is an extra path to play.
pub fn needs_remediation(stats: &LessonStats, threshold: Option<i64>, has_extra: bool) -> bool {
    match (threshold, stats.exam_score()) {
        (Some(threshold), Some(score)) => has_extra && score < threshold as f64,
        _ => false,
    }
}

impl<M: Messenger> Player<M> {
    /// Called when the step runs past the end of the active path.
    ///
    /// Returns `None` when the session switched to its extra path and the
    /// caller should keep playing.
    pub(super) async fn finish_path(
        &self,
        chat: i64,
        session: &mut Session,
        input: Option<UserInput>,
    ) -> Result<Option<Progress>> {
        if session.in_extra {
            return self.complete(chat, session).await.map(Some);
        }

        match input {
            Some(UserInput::Extra { accept: true }) if session.has_extra() => {
                let id = session.id;
                self.db(|c| db::enter_extra(c, id))?;
                session.in_extra = true;
                session.current_step = 0;
                tracing::info!(session = id, "Playing extra slides");
                Ok(None)
            }
            Some(UserInput::Extra { .. }) => self.complete(chat, session).await.map(Some),
            Some(_) => Ok(Some(Progress::Ignored)),
            None => self.report(chat, session).await.map(Some),
        }
    }

    async fn report(&self, chat: i64, session: &mut Session) -> Result<Progress> {
        self.messenger
            .unpin_all(chat)
            .await
            .log_warn("Failed to unpin messages");

        let lesson_id = session.lesson_id;
        let lesson = self
            .db(|c| db::get_lesson(c, lesson_id))?
            .ok_or(BotError::LessonNotFound(lesson_id))?;
        let path = session.regular_path()?;
        let session_id = session.id;
        let (slides, errors) = self.db(|c| {
            Ok((
                db::get_slides(c, path.slides())?,
                db::get_slides_with_errors(c, session_id)?,
            ))
        })?;
        let stats = compute_stats(path.slides(), &slides, &errors);
        tracing::info!(session = session_id, "Path finished: {:?}", stats);

        let (prompt, args) = match session.starts_from {
            SessionStartsFrom::Begin if !stats.has_exam => (db::FINAL_REPORT_WITHOUT_QUESTIONS, vec![lesson.title.clone()]),
            SessionStartsFrom::Begin => (
                db::FINAL_REPORT_FROM_BEGIN,
                vec![
                    lesson.title.clone(),
                    stats.regular_correct.to_string(),
                    stats.regular_exercises.to_string(),
                    stats.exam_correct.to_string(),
                    stats.exam_exercises.to_string(),
                    session.hints_shown.to_string(),
                ],
            ),
            SessionStartsFrom::Exam => (
                db::FINAL_REPORT_FROM_EXAM,
                vec![
                    lesson.title.clone(),
                    stats.exam_correct.to_string(),
                    stats.exam_exercises.to_string(),
                    session.hints_shown.to_string(),
                ],
            ),
        };
        let template = self.text(prompt)?;
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let text = db::fill_placeholders(&template, &args);
        self.messenger.send_text(chat, &text, None).await?;

        if needs_remediation(&stats, lesson.errors_threshold, session.has_extra()) {
            let dialog = self.text(db::EXTRA_SLIDES_DIALOG)?;
            let kb = keyboard::extra_slides(session_id);
            self.messenger.send_text(chat, &dialog, Some(&kb)).await?;
            return Ok(Progress::Waiting);
        }
        self.complete(chat, session).await
    }

    async fn complete(&self, chat: i64, session: &mut Session) -> Result<Progress> {
        let (id, user_id, lesson_id) = (session.id, session.user_id, session.lesson_id);
        self.db(|c| {
            let tx = c.unchecked_transaction()?;
            db::set_session_status(&tx, id, SessionStatus::Completed)?;
            db::record_completed_lesson(&tx, user_id, lesson_id, id, Utc::now())?;
            tx.commit()
        })?;
        session.status = SessionStatus::Completed;
        tracing::info!(session = id, lesson = lesson_id, "Session completed");

        self.send_lesson_menu(chat, user_id).await?;
        Ok(Progress::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{further_slide, options_quiz, text_slide, word_quiz};

    fn slide(id: i64, content: crate::domain::SlideContent, is_exam_slide: bool) -> Slide {
        Slide {
            id,
            lesson_id: 1,
            is_exam_slide,
            content,
        }
    }

    fn sample() -> HashMap<i64, Slide> {
        [
            slide(1, text_slide("intro"), false),
            slide(2, word_quiz("I _", "am", "", None), false),
            slide(3, further_slide("exam time"), true),
            slide(4, options_quiz("Pick", "a", &["b"]), true),
            slide(5, word_quiz("You _", "are", "", None), true),
        ]
        .into_iter()
        .map(|s| (s.id, s))
        .collect()
    }

    #[test]
    fn test_stats_split_at_first_exam_slide() {
        let errors: HashSet<i64> = [5].into();
        let stats = compute_stats(&[1, 2, 3, 4, 5], &sample(), &errors);
        assert_eq!(
            stats,
            LessonStats {
                regular_exercises: 1,
                regular_correct: 1,
                exam_exercises: 2,
                exam_correct: 1,
                has_exam: true,
            }
        );
        assert_eq!(stats.exam_score(), Some(50.0));
    }

    #[test]
    fn test_stats_skip_missing_slides() {
        let stats = compute_stats(&[1, 2, 99], &sample(), &HashSet::new());
        assert_eq!(stats.regular_exercises, 1);
        assert!(!stats.has_exam);
        assert_eq!(stats.exam_score(), None);
    }

    #[test]
    fn test_remediation_rules() {
        let stats = LessonStats {
            exam_exercises: 4,
            exam_correct: 2,
            has_exam: true,
            ..Default::default()
        };
        assert!(needs_remediation(&stats, Some(60), true));
        assert!(!needs_remediation(&stats, Some(50), true));
        assert!(!needs_remediation(&stats, Some(60), false));
        assert!(!needs_remediation(&stats, None, true));
    }

    #[test]
    fn test_no_remediation_without_exam_exercises() {
        let stats = LessonStats {
            has_exam: true,
            ..Default::default()
        };
        assert!(!needs_remediation(&stats, Some(100), true));
    }
}
