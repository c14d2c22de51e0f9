//! Lesson editing: slides, paths and canned texts.
//!
//! Every operation validates first and writes in one transaction, so a
//! rejected edit leaves the database untouched.

use rusqlite::Connection;

use super::validate::{validate_slide, validate_text_template};
use crate::db;
use crate::domain::{LessonPath, MoveDirection, PathKind, Slide, SlideContent};
use crate::error::{BotError, Result};

/// One edit of a lesson path. Positions are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathEdit {
    Insert { position: usize, slide_id: i64 },
    Replace { position: usize, slide_id: i64 },
    Move { position: usize, direction: MoveDirection },
    Remove { position: usize },
}

/// Apply `edit` to one of the lesson's paths and store the result.
pub fn edit_path(conn: &Connection, lesson_id: i64, kind: PathKind, edit: PathEdit) -> Result<LessonPath> {
    let lesson = db::get_lesson(conn, lesson_id)?.ok_or(BotError::LessonNotFound(lesson_id))?;
    let mut path = lesson.path_of(kind).clone();

    match edit {
        PathEdit::Insert { position, slide_id } => {
            ensure_slide_exists(conn, slide_id)?;
            path.insert(position, slide_id)?;
        }
        PathEdit::Replace { position, slide_id } => {
            ensure_slide_exists(conn, slide_id)?;
            path.replace(position, slide_id)?;
        }
        PathEdit::Move { position, direction } => path.move_slide(position, direction)?,
        PathEdit::Remove { position } => {
            path.remove(position)?;
        }
    }

    db::update_lesson_path(conn, lesson_id, kind, &path)?;
    tracing::info!(lesson = lesson_id, "Path {:?} is now '{}'", kind, path);
    Ok(path)
}

fn ensure_slide_exists(conn: &Connection, slide_id: i64) -> Result<()> {
    match db::get_slide(conn, slide_id)? {
        Some(_) => Ok(()),
        None => Err(BotError::SlideNotFound(slide_id)),
    }
}

/// Create a slide and place it on a lesson path at `position`.
pub fn add_slide(
    conn: &Connection,
    lesson_id: i64,
    kind: PathKind,
    position: usize,
    content: SlideContent,
    is_exam_slide: bool,
) -> Result<i64> {
    let mut slide = Slide {
        id: 0,
        lesson_id,
        is_exam_slide,
        content,
    };
    validate_slide(&slide)?;

    let tx = conn.unchecked_transaction()?;
    slide.id = db::insert_slide(&tx, &slide)?;
    edit_path(
        &tx,
        lesson_id,
        kind,
        PathEdit::Insert {
            position,
            slide_id: slide.id,
        },
    )?;
    tx.commit()?;
    Ok(slide.id)
}

/// Store new content for an existing slide.
pub fn save_slide(conn: &Connection, slide: &Slide) -> Result<()> {
    validate_slide(slide)?;
    ensure_slide_exists(conn, slide.id)?;
    db::update_slide(conn, slide)?;
    Ok(())
}

/// Delete a slide and every reference to it.
///
/// The id is removed from the regular and extra paths of every lesson; a
/// lesson that started with the slide now starts with its successor.
/// Running sessions keep their frozen paths and will skip the slide.
/// Returns the number of lessons whose paths changed.
pub fn delete_slide(conn: &Connection, slide_id: i64) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;

    let lessons = db::get_lessons_referencing(&tx, slide_id)?;
    for lesson in &lessons {
        for kind in [PathKind::Regular, PathKind::Extra] {
            let mut path = lesson.path_of(kind).clone();
            if path.remove_id(slide_id) {
                db::update_lesson_path(&tx, lesson.id, kind, &path)?;
            }
        }
    }
    if !db::delete_slide_row(&tx, slide_id)? {
        return Err(BotError::SlideNotFound(slide_id));
    }

    tx.commit()?;
    tracing::info!(slide = slide_id, "Slide deleted, {} lesson(s) updated", lessons.len());
    Ok(lessons.len())
}

/// Replace a canned text after checking its `{}` markers.
pub fn update_text(conn: &Connection, prompt: &str, text: &str) -> Result<()> {
    validate_text_template(prompt, text)?;
    db::set_text(conn, prompt, text)?;
    Ok(())
}
