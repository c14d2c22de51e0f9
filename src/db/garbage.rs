//! Removal of disabled lessons and unreferenced slides

use std::collections::HashMap;

use rusqlite::{Connection, Result};

use crate::domain::LessonPath;

use super::lessons::{delete_disabled_lessons, get_disabled_lesson_ids, get_live_lessons};
use super::sessions::{delete_lesson_sessions, get_in_progress_paths};
use super::slides::{delete_slide_row, get_all_slide_ids, get_lesson_slides, reassign_slide};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GarbageReport {
    pub lessons_deleted: usize,
    pub slides_deleted: usize,
}

/// Delete disabled lessons with their sessions, then every slide that is not
/// on a path of an active or editing lesson, or of an in-progress session.
///
/// A slide owned by a disabled lesson but still used elsewhere is handed over
/// to the first lesson that uses it.
pub fn collect_garbage(conn: &Connection) -> Result<GarbageReport> {
    let tx = conn.unchecked_transaction()?;

    let disabled = get_disabled_lesson_ids(&tx)?;
    for &lesson_id in &disabled {
        delete_lesson_sessions(&tx, lesson_id)?;
    }

    // slide id -> a live lesson that still uses it
    let mut referenced: HashMap<i64, i64> = HashMap::new();
    for lesson in get_live_lessons(&tx)? {
        for id in lesson.path.iter().chain(lesson.path_extra.iter()) {
            referenced.entry(id).or_insert(lesson.id);
        }
    }
    for (lesson_id, path, path_extra) in get_in_progress_paths(&tx)? {
        for raw in std::iter::once(Some(path)).chain(std::iter::once(path_extra)) {
            match LessonPath::from_stored(raw.as_deref()) {
                Ok(p) => {
                    for id in p.iter() {
                        referenced.entry(id).or_insert(lesson_id);
                    }
                }
                Err(e) => {
                    // An unreadable session path could hide live slides
                    tracing::error!("Skipping garbage collection, bad session path: {}", e);
                    return Ok(GarbageReport::default());
                }
            }
        }
    }

    for &lesson_id in &disabled {
        for slide in get_lesson_slides(&tx, lesson_id)? {
            if let Some(&owner) = referenced.get(&slide.id) {
                reassign_slide(&tx, slide.id, owner)?;
            }
        }
    }

    let mut slides_deleted = 0;
    for id in get_all_slide_ids(&tx)? {
        if !referenced.contains_key(&id) && delete_slide_row(&tx, id)? {
            slides_deleted += 1;
        }
    }

    let lessons_deleted = delete_disabled_lessons(&tx)?;

    tx.commit()?;

    tracing::info!(
        "Garbage collected: {} lessons, {} slides",
        lessons_deleted,
        slides_deleted
    );
    Ok(GarbageReport {
        lessons_deleted,
        slides_deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        create_session, get_lesson, get_quiz_logs, get_session, get_slide, log_quiz_answer, set_lesson_status,
        update_lesson_path,
    };
    use crate::domain::{LessonStatus, PathKind, SessionStartsFrom, SlideKind};
    use crate::testing::{text_slide, word_quiz, TestEnv};

    fn path(ids: &[i64]) -> LessonPath {
        LessonPath::new(ids.to_vec())
    }

    #[test]
    fn test_keeps_referenced_slides() {
        let env = TestEnv::new().unwrap();
        let user = env.add_user(1);
        let active = env.add_lesson("Active", "");
        let editing = env.add_lesson("Editing", "");
        let disabled = env.add_lesson("Disabled", "");

        let on_active = env.add_slide(active, text_slide("a"), false);
        let on_extra = env.add_slide(active, text_slide("b"), false);
        let orphan = env.add_slide(active, text_slide("c"), false);
        let on_editing = env.add_slide(editing, text_slide("d"), false);
        let session_only = env.add_slide(editing, text_slide("e"), false);
        let disabled_only = env.add_slide(disabled, text_slide("f"), false);

        let conn = env.conn();
        update_lesson_path(&conn, active, PathKind::Regular, &path(&[on_active])).unwrap();
        update_lesson_path(&conn, active, PathKind::Extra, &path(&[on_extra])).unwrap();
        update_lesson_path(&conn, editing, PathKind::Regular, &path(&[on_editing])).unwrap();
        update_lesson_path(&conn, disabled, PathKind::Regular, &path(&[disabled_only])).unwrap();
        set_lesson_status(&conn, editing, LessonStatus::Editing).unwrap();
        set_lesson_status(&conn, disabled, LessonStatus::Disabled).unwrap();
        create_session(
            &conn,
            user.id,
            editing,
            &path(&[session_only]),
            &LessonPath::default(),
            SessionStartsFrom::Begin,
        )
        .unwrap();

        let report = collect_garbage(&conn).unwrap();
        assert_eq!(
            report,
            GarbageReport {
                lessons_deleted: 1,
                slides_deleted: 2,
            }
        );

        for id in [on_active, on_extra, on_editing, session_only] {
            assert!(get_slide(&conn, id).unwrap().is_some(), "slide {} was removed", id);
        }
        assert!(get_slide(&conn, disabled_only).unwrap().is_none());
        assert!(get_slide(&conn, orphan).unwrap().is_none());
    }

    #[test]
    fn test_removes_played_disabled_lesson() {
        let env = TestEnv::new().unwrap();
        let user = env.add_user(1);
        let lesson = env.add_lesson("Retired", "");
        let intro = env.add_slide(lesson, text_slide("Hello"), false);
        let quiz = env.add_slide(lesson, word_quiz("Say {}", "hi", "", None), true);

        let conn = env.conn();
        update_lesson_path(&conn, lesson, PathKind::Regular, &path(&[intro, quiz])).unwrap();
        let played = path(&[intro, quiz]);
        let finished =
            create_session(&conn, user.id, lesson, &played, &LessonPath::default(), SessionStartsFrom::Begin).unwrap();
        log_quiz_answer(&conn, finished, quiz, SlideKind::QuizInputWord, false).unwrap();
        let open =
            create_session(&conn, user.id, lesson, &played, &LessonPath::default(), SessionStartsFrom::Exam).unwrap();
        set_lesson_status(&conn, lesson, LessonStatus::Disabled).unwrap();

        let report = collect_garbage(&conn).unwrap();
        assert_eq!(
            report,
            GarbageReport {
                lessons_deleted: 1,
                slides_deleted: 2,
            }
        );
        assert!(get_lesson(&conn, lesson).unwrap().is_none());
        assert!(get_session(&conn, finished).unwrap().is_none());
        assert!(get_session(&conn, open).unwrap().is_none());
        assert!(get_quiz_logs(&conn, finished).unwrap().is_empty());
        assert!(get_slide(&conn, intro).unwrap().is_none());
    }

    #[test]
    fn test_shared_slide_moves_to_live_lesson() {
        let env = TestEnv::new().unwrap();
        let old = env.add_lesson("Old", "");
        let new = env.add_lesson("New", "");
        let shared = env.add_slide(old, text_slide("Shared"), false);

        let conn = env.conn();
        update_lesson_path(&conn, old, PathKind::Regular, &path(&[shared])).unwrap();
        update_lesson_path(&conn, new, PathKind::Extra, &path(&[shared])).unwrap();
        set_lesson_status(&conn, old, LessonStatus::Disabled).unwrap();

        let report = collect_garbage(&conn).unwrap();
        assert_eq!(report.lessons_deleted, 1);
        assert_eq!(report.slides_deleted, 0);
        assert_eq!(get_slide(&conn, shared).unwrap().unwrap().lesson_id, new);
    }

    #[test]
    fn test_empty_database() {
        let env = TestEnv::new().unwrap();
        assert_eq!(collect_garbage(&env.conn()).unwrap(), GarbageReport::default());
    }
}
