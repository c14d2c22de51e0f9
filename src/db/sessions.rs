//! Sessions and the quiz answer log

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::{LessonPath, QuizAnswerLog, Session, SessionStartsFrom, SessionStatus, SlideKind};

const SESSION_COLUMNS: &str = "id, user_id, lesson_id, path, path_extra, current_step, starts_from, status, \
                               in_extra, prompt_message_id, hints_shown, created_at";

// ==================== Sessions ====================

/// Start a new in-progress session on frozen copies of the paths.
pub fn create_session(
    conn: &Connection,
    user_id: i64,
    lesson_id: i64,
    path: &LessonPath,
    path_extra: &LessonPath,
    starts_from: SessionStartsFrom,
) -> Result<i64> {
    let now = Utc::now().to_rfc3339();
    let extra = (!path_extra.is_empty()).then(|| path_extra.to_string());
    conn.execute(
        r#"
    INSERT INTO sessions (user_id, lesson_id, path, path_extra, current_step, starts_from, status,
                          created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, 0, ?5, 'in_progress', ?6, ?6)
    "#,
        params![user_id, lesson_id, path.to_string(), extra, starts_from.as_str(), now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_session(conn: &Connection, id: i64) -> Result<Option<Session>> {
    conn.query_row(
        &format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS),
        params![id],
        row_to_session,
    )
    .optional()
}

/// The user's open session for a lesson, newest first if several exist.
pub fn get_active_session(conn: &Connection, user_id: i64, lesson_id: i64) -> Result<Option<Session>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM sessions
             WHERE user_id = ?1 AND lesson_id = ?2 AND status = 'in_progress'
             ORDER BY id DESC LIMIT 1",
            SESSION_COLUMNS
        ),
        params![user_id, lesson_id],
        row_to_session,
    )
    .optional()
}

/// The user's most recently started open session in any lesson.
pub fn get_latest_active_session(conn: &Connection, user_id: i64) -> Result<Option<Session>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM sessions
             WHERE user_id = ?1 AND status = 'in_progress'
             ORDER BY id DESC LIMIT 1",
            SESSION_COLUMNS
        ),
        params![user_id],
        row_to_session,
    )
    .optional()
}

/// Abort every open session of the user in this lesson. Returns how many.
pub fn abort_active_sessions(conn: &Connection, user_id: i64, lesson_id: i64) -> Result<usize> {
    conn.execute(
        "UPDATE sessions SET status = 'aborted', updated_at = ?1
         WHERE user_id = ?2 AND lesson_id = ?3 AND status = 'in_progress'",
        params![Utc::now().to_rfc3339(), user_id, lesson_id],
    )
}

pub fn update_session_step(conn: &Connection, session_id: i64, step: usize) -> Result<()> {
    conn.execute(
        "UPDATE sessions SET current_step = ?1, updated_at = ?2 WHERE id = ?3",
        params![step as i64, Utc::now().to_rfc3339(), session_id],
    )?;
    Ok(())
}

pub fn set_prompt_message(conn: &Connection, session_id: i64, message_id: Option<i32>) -> Result<()> {
    conn.execute(
        "UPDATE sessions SET prompt_message_id = ?1 WHERE id = ?2",
        params![message_id, session_id],
    )?;
    Ok(())
}

/// Switch to the extra path and rewind to its first slide.
pub fn enter_extra(conn: &Connection, session_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE sessions SET in_extra = 1, current_step = 0, updated_at = ?1 WHERE id = ?2",
        params![Utc::now().to_rfc3339(), session_id],
    )?;
    Ok(())
}

pub fn increment_hints_shown(conn: &Connection, session_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE sessions SET hints_shown = hints_shown + 1 WHERE id = ?1",
        params![session_id],
    )?;
    Ok(())
}

pub fn set_session_status(conn: &Connection, session_id: i64, status: SessionStatus) -> Result<()> {
    conn.execute(
        "UPDATE sessions SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), Utc::now().to_rfc3339(), session_id],
    )?;
    Ok(())
}

/// Lesson id and raw paths of every open session, for garbage collection.
pub fn get_in_progress_paths(conn: &Connection) -> Result<Vec<(i64, String, Option<String>)>> {
    let mut stmt = conn.prepare("SELECT lesson_id, path, path_extra FROM sessions WHERE status = 'in_progress'")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<Vec<_>>>()?;
    Ok(rows)
}

/// Delete every session of a lesson together with its answer log.
pub fn delete_lesson_sessions(conn: &Connection, lesson_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM quiz_answer_logs WHERE session_id IN (SELECT id FROM sessions WHERE lesson_id = ?1)",
        params![lesson_id],
    )?;
    conn.execute("DELETE FROM sessions WHERE lesson_id = ?1", params![lesson_id])
}

fn row_to_session(row: &rusqlite::Row) -> Result<Session> {
    let step: i64 = row.get(5)?;
    let starts_from_str: String = row.get(6)?;
    let status_str: String = row.get(7)?;
    let created_at_str: String = row.get(11)?;

    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        lesson_id: row.get(2)?,
        path: row.get(3)?,
        path_extra: row.get(4)?,
        current_step: step.max(0) as usize,
        starts_from: SessionStartsFrom::from_str(&starts_from_str).unwrap_or(SessionStartsFrom::Begin),
        status: SessionStatus::from_str(&status_str).unwrap_or(SessionStatus::Aborted),
        in_extra: row.get(8)?,
        prompt_message_id: row.get(9)?,
        hints_shown: row.get(10)?,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

// ==================== Quiz answer log ====================

pub fn log_quiz_answer(
    conn: &Connection,
    session_id: i64,
    slide_id: i64,
    kind: SlideKind,
    is_correct: bool,
) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO quiz_answer_logs (session_id, slide_id, slide_type, is_correct, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
        params![session_id, slide_id, kind.as_str(), is_correct, Utc::now().to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Wrong answers recorded for one slide within one session.
pub fn count_wrong_answers(conn: &Connection, session_id: i64, slide_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM quiz_answer_logs WHERE session_id = ?1 AND slide_id = ?2 AND is_correct = 0",
        params![session_id, slide_id],
        |row| row.get(0),
    )
}

/// Distinct slides with at least one wrong answer in the session.
pub fn get_slides_with_errors(conn: &Connection, session_id: i64) -> Result<HashSet<i64>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT slide_id FROM quiz_answer_logs WHERE session_id = ?1 AND is_correct = 0",
    )?;
    let ids = stmt
        .query_map(params![session_id], |row| row.get(0))?
        .collect::<Result<HashSet<i64>>>()?;
    Ok(ids)
}

pub fn get_quiz_logs(conn: &Connection, session_id: i64) -> Result<Vec<QuizAnswerLog>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, session_id, slide_id, slide_type, is_correct, created_at
    FROM quiz_answer_logs WHERE session_id = ?1 ORDER BY id
    "#,
    )?;
    let logs = stmt
        .query_map(params![session_id], |row| {
            let created_at_str: String = row.get(5)?;
            Ok(QuizAnswerLog {
                id: row.get(0)?,
                session_id: row.get(1)?,
                slide_id: row.get(2)?,
                slide_type: row.get(3)?,
                is_correct: row.get(4)?,
                created_at: DateTime::parse_from_rfc3339(&created_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(logs)
}
