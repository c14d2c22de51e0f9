//! Slide CRUD
//!
//! Slides are stored in one wide table; `row_to_slide` folds the nullable
//! columns into the matching `SlideContent` variant.

use std::collections::HashMap;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::{AnswerKey, Slide, SlideContent, SlideKind, StickerSize};
use crate::error::ContentError;
use crate::validation::split_variants;

const SLIDE_COLUMNS: &str = "id, lesson_id, slide_type, text, picture, delay, keyboard_type, keyboard, \
                             right_answers, almost_right_answers, almost_right_answer_reply, is_exam_slide";

/// `keyboard_type` value for slides that wait for a "further" press
const FURTHER_KEYBOARD: &str = "further";
/// `keyboard_type` value for options quizzes; `keyboard` holds the wrong options
const QUIZ_KEYBOARD: &str = "quiz";

/// Column values for one slide, as written to the table.
#[derive(Debug, Default)]
struct SlideColumns {
    text: Option<String>,
    picture: Option<String>,
    delay: Option<f64>,
    keyboard_type: Option<&'static str>,
    keyboard: Option<String>,
    right_answers: Option<String>,
    almost_right_answers: Option<String>,
    almost_right_answer_reply: Option<String>,
}

fn further_keyboard(further: bool) -> Option<&'static str> {
    further.then_some(FURTHER_KEYBOARD)
}

fn slide_columns(content: &SlideContent) -> SlideColumns {
    match content {
        SlideContent::Text { text, delay, further } => SlideColumns {
            text: Some(text.clone()),
            delay: *delay,
            keyboard_type: further_keyboard(*further),
            ..Default::default()
        },
        SlideContent::Image { picture, delay, further } => SlideColumns {
            picture: Some(picture.clone()),
            delay: *delay,
            keyboard_type: further_keyboard(*further),
            ..Default::default()
        },
        SlideContent::PinDict { text } => SlideColumns {
            text: Some(text.clone()),
            ..Default::default()
        },
        SlideContent::Sticker { .. } => SlideColumns::default(),
        SlideContent::QuizOptions {
            text,
            right_answers,
            wrong_options,
        } => SlideColumns {
            text: Some(text.clone()),
            keyboard_type: Some(QUIZ_KEYBOARD),
            keyboard: Some(wrong_options.join("|")),
            right_answers: Some(right_answers.join("|")),
            ..Default::default()
        },
        SlideContent::QuizInputWord { text, answers } | SlideContent::QuizInputPhrase { text, answers } => {
            SlideColumns {
                text: Some(text.clone()),
                right_answers: Some(answers.right.join("|")),
                almost_right_answers: Some(answers.almost_right.join("|")),
                almost_right_answer_reply: answers.almost_right_reply.clone(),
                ..Default::default()
            }
        }
    }
}

pub fn insert_slide(conn: &Connection, slide: &Slide) -> Result<i64> {
    let cols = slide_columns(&slide.content);
    conn.execute(
        r#"
    INSERT INTO slides (lesson_id, slide_type, text, picture, delay, keyboard_type, keyboard,
                        right_answers, almost_right_answers, almost_right_answer_reply, is_exam_slide)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    "#,
        params![
            slide.lesson_id,
            slide.kind().as_str(),
            cols.text,
            cols.picture,
            cols.delay,
            cols.keyboard_type,
            cols.keyboard,
            cols.right_answers,
            cols.almost_right_answers,
            cols.almost_right_answer_reply,
            slide.is_exam_slide,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_slide(conn: &Connection, slide: &Slide) -> Result<()> {
    let cols = slide_columns(&slide.content);
    conn.execute(
        r#"
    UPDATE slides SET lesson_id = ?1, slide_type = ?2, text = ?3, picture = ?4, delay = ?5,
                      keyboard_type = ?6, keyboard = ?7, right_answers = ?8, almost_right_answers = ?9,
                      almost_right_answer_reply = ?10, is_exam_slide = ?11
    WHERE id = ?12
    "#,
        params![
            slide.lesson_id,
            slide.kind().as_str(),
            cols.text,
            cols.picture,
            cols.delay,
            cols.keyboard_type,
            cols.keyboard,
            cols.right_answers,
            cols.almost_right_answers,
            cols.almost_right_answer_reply,
            slide.is_exam_slide,
            slide.id,
        ],
    )?;
    Ok(())
}

pub fn get_slide(conn: &Connection, id: i64) -> Result<Option<Slide>> {
    conn.query_row(
        &format!("SELECT {} FROM slides WHERE id = ?1", SLIDE_COLUMNS),
        params![id],
        row_to_slide,
    )
    .optional()
}

/// Load the given slides keyed by id. Ids without a row are simply absent.
pub fn get_slides(conn: &Connection, ids: &[i64]) -> Result<HashMap<i64, Slide>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM slides WHERE id = ?1", SLIDE_COLUMNS))?;
    let mut slides = HashMap::with_capacity(ids.len());
    for &id in ids {
        if let Some(slide) = stmt.query_row(params![id], row_to_slide).optional()? {
            slides.insert(id, slide);
        }
    }
    Ok(slides)
}

pub fn get_lesson_slides(conn: &Connection, lesson_id: i64) -> Result<Vec<Slide>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM slides WHERE lesson_id = ?1 ORDER BY id",
        SLIDE_COLUMNS
    ))?;
    let slides = stmt
        .query_map(params![lesson_id], row_to_slide)?
        .collect::<Result<Vec<_>>>()?;
    Ok(slides)
}

pub fn get_all_slide_ids(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM slides ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>>>()?;
    Ok(ids)
}

/// Hand a slide over to another lesson.
pub fn reassign_slide(conn: &Connection, id: i64, lesson_id: i64) -> Result<()> {
    conn.execute("UPDATE slides SET lesson_id = ?1 WHERE id = ?2", params![lesson_id, id])?;
    Ok(())
}

pub fn delete_slide_row(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn.execute("DELETE FROM slides WHERE id = ?1", params![id])? > 0)
}

/// First exam slide of `path`, in path order.
pub fn first_exam_slide(conn: &Connection, path: &[i64]) -> Result<Option<i64>> {
    let slides = get_slides(conn, path)?;
    Ok(path
        .iter()
        .copied()
        .find(|id| slides.get(id).is_some_and(|s| s.is_exam_slide)))
}

pub(crate) fn row_to_slide(row: &rusqlite::Row) -> Result<Slide> {
    let id: i64 = row.get(0)?;
    let kind_str: String = row.get(2)?;
    let text: Option<String> = row.get(3)?;
    let picture: Option<String> = row.get(4)?;
    let delay: Option<f64> = row.get(5)?;
    let keyboard_type: Option<String> = row.get(6)?;
    let keyboard: Option<String> = row.get(7)?;
    let right_answers: Option<String> = row.get(8)?;
    let almost_right_answers: Option<String> = row.get(9)?;
    let almost_right_answer_reply: Option<String> = row.get(10)?;

    let kind = SlideKind::from_str(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            Box::new(ContentError::UnknownSlideType {
                slide: id.to_string(),
                kind: kind_str.clone(),
            }),
        )
    })?;

    let further = keyboard_type.as_deref() == Some(FURTHER_KEYBOARD);
    let text = text.unwrap_or_default();

    let content = match kind {
        SlideKind::Text => SlideContent::Text { text, delay, further },
        SlideKind::Image => SlideContent::Image {
            picture: picture.unwrap_or_default(),
            delay,
            further,
        },
        SlideKind::PinDict => SlideContent::PinDict { text },
        SlideKind::SmallSticker => SlideContent::Sticker {
            size: StickerSize::Small,
        },
        SlideKind::BigSticker => SlideContent::Sticker { size: StickerSize::Big },
        SlideKind::QuizOptions => SlideContent::QuizOptions {
            text,
            right_answers: right_answers.as_deref().map(split_variants).unwrap_or_default(),
            wrong_options: keyboard.as_deref().map(split_variants).unwrap_or_default(),
        },
        SlideKind::QuizInputWord => SlideContent::QuizInputWord {
            text,
            answers: AnswerKey::from_columns(
                right_answers.as_deref(),
                almost_right_answers.as_deref(),
                almost_right_answer_reply,
            ),
        },
        SlideKind::QuizInputPhrase => SlideContent::QuizInputPhrase {
            text,
            answers: AnswerKey::from_columns(
                right_answers.as_deref(),
                almost_right_answers.as_deref(),
                almost_right_answer_reply,
            ),
        },
    };

    Ok(Slide {
        id,
        lesson_id: row.get(1)?,
        is_exam_slide: row.get(11)?,
        content,
    })
}
