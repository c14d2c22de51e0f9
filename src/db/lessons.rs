//! Lesson CRUD and path updates

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::{Lesson, LessonLevel, LessonPath, LessonStatus, PathKind};

const LESSON_COLUMNS: &str = "id, idx, title, level, path, path_extra, first_slide_id, is_paid, \
                              errors_threshold, status, created_at";

pub fn insert_lesson(conn: &Connection, lesson: &Lesson) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO lessons (idx, title, level, path, path_extra, first_slide_id, is_paid,
                         errors_threshold, status, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    "#,
        params![
            lesson.index,
            lesson.title,
            lesson.level.map(|l| l.as_str()),
            lesson.path.to_string(),
            lesson.path_extra.to_string(),
            lesson.path.first(),
            lesson.is_paid,
            lesson.errors_threshold,
            lesson.status.as_str(),
            lesson.created_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_lesson(conn: &Connection, id: i64) -> Result<Option<Lesson>> {
    conn.query_row(
        &format!("SELECT {} FROM lessons WHERE id = ?1", LESSON_COLUMNS),
        params![id],
        row_to_lesson,
    )
    .optional()
}

/// Lessons shown in the menu, in menu order.
pub fn get_active_lessons(conn: &Connection) -> Result<Vec<Lesson>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM lessons WHERE status = 'active' ORDER BY idx IS NULL, idx, id",
        LESSON_COLUMNS
    ))?;
    let lessons = stmt
        .query_map([], row_to_lesson)?
        .collect::<Result<Vec<_>>>()?;
    Ok(lessons)
}

/// Lessons whose slides must survive garbage collection.
pub fn get_live_lessons(conn: &Connection) -> Result<Vec<Lesson>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM lessons WHERE status IN ('active', 'editing')",
        LESSON_COLUMNS
    ))?;
    let lessons = stmt
        .query_map([], row_to_lesson)?
        .collect::<Result<Vec<_>>>()?;
    Ok(lessons)
}

/// Every lesson whose regular or extra path mentions `slide_id`.
pub fn get_lessons_referencing(conn: &Connection, slide_id: i64) -> Result<Vec<Lesson>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM lessons", LESSON_COLUMNS))?;
    let lessons = stmt
        .query_map([], row_to_lesson)?
        .collect::<Result<Vec<_>>>()?;
    Ok(lessons
        .into_iter()
        .filter(|l| l.path.contains(slide_id) || l.path_extra.contains(slide_id))
        .collect())
}

/// Store one of a lesson's paths. `first_slide_id` follows the regular path.
pub fn update_lesson_path(conn: &Connection, lesson_id: i64, kind: PathKind, path: &LessonPath) -> Result<()> {
    match kind {
        PathKind::Regular => conn.execute(
            "UPDATE lessons SET path = ?1, first_slide_id = ?2 WHERE id = ?3",
            params![path.to_string(), path.first(), lesson_id],
        )?,
        PathKind::Extra => conn.execute(
            "UPDATE lessons SET path_extra = ?1 WHERE id = ?2",
            params![path.to_string(), lesson_id],
        )?,
    };
    Ok(())
}

pub fn set_lesson_status(conn: &Connection, lesson_id: i64, status: LessonStatus) -> Result<()> {
    conn.execute(
        "UPDATE lessons SET status = ?1 WHERE id = ?2",
        params![status.as_str(), lesson_id],
    )?;
    Ok(())
}

pub fn get_disabled_lesson_ids(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM lessons WHERE status = 'disabled' ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>>>()?;
    Ok(ids)
}

pub fn delete_disabled_lessons(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM lessons WHERE status = 'disabled'", [])
}

pub(crate) fn row_to_lesson(row: &rusqlite::Row) -> Result<Lesson> {
    let level_str: Option<String> = row.get(3)?;
    let path_str: Option<String> = row.get(4)?;
    let path_extra_str: Option<String> = row.get(5)?;
    let status_str: String = row.get(9)?;
    let created_at_str: String = row.get(10)?;

    let path = LessonPath::from_stored(path_str.as_deref())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    let path_extra = LessonPath::from_stored(path_extra_str.as_deref())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(Lesson {
        id: row.get(0)?,
        index: row.get(1)?,
        title: row.get(2)?,
        level: level_str.as_deref().and_then(LessonLevel::from_str),
        path,
        path_extra,
        first_slide_id: row.get(6)?,
        is_paid: row.get(7)?,
        errors_threshold: row.get(8)?,
        status: LessonStatus::from_str(&status_str).unwrap_or(LessonStatus::Editing),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn lesson(title: &str, status: LessonStatus, index: Option<i64>, path: &str) -> Lesson {
        let mut l = Lesson::new(title);
        l.status = status;
        l.index = index;
        l.path = path.parse().unwrap();
        l
    }

    #[test]
    fn test_insert_and_get() {
        let conn = setup();
        let mut l = lesson("Past Simple", LessonStatus::Active, Some(1), "3.4");
        l.level = Some(LessonLevel::Beginner);
        l.errors_threshold = Some(70);
        l.is_paid = true;
        let id = insert_lesson(&conn, &l).unwrap();

        let loaded = get_lesson(&conn, id).unwrap().unwrap();
        assert_eq!(loaded.title, "Past Simple");
        assert_eq!(loaded.path.slides(), &[3, 4]);
        assert_eq!(loaded.first_slide_id, Some(3));
        assert!(loaded.path_extra.is_empty());
        assert_eq!(loaded.level, Some(LessonLevel::Beginner));
        assert_eq!(loaded.errors_threshold, Some(70));
        assert!(loaded.is_paid);
        assert!(get_lesson(&conn, id + 100).unwrap().is_none());
    }

    #[test]
    fn test_active_lessons_in_menu_order() {
        let conn = setup();
        insert_lesson(&conn, &lesson("B", LessonStatus::Active, Some(2), "")).unwrap();
        insert_lesson(&conn, &lesson("Hidden", LessonStatus::Editing, Some(0), "")).unwrap();
        insert_lesson(&conn, &lesson("A", LessonStatus::Active, Some(1), "")).unwrap();
        insert_lesson(&conn, &lesson("Unindexed", LessonStatus::Active, None, "")).unwrap();

        let titles: Vec<String> = get_active_lessons(&conn)
            .unwrap()
            .into_iter()
            .map(|l| l.title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "Unindexed"]);
    }

    #[test]
    fn test_update_regular_path_syncs_first_slide() {
        let conn = setup();
        let id = insert_lesson(&conn, &lesson("L", LessonStatus::Active, None, "1.2")).unwrap();

        update_lesson_path(&conn, id, PathKind::Regular, &"2".parse().unwrap()).unwrap();
        update_lesson_path(&conn, id, PathKind::Extra, &"8.9".parse().unwrap()).unwrap();

        let loaded = get_lesson(&conn, id).unwrap().unwrap();
        assert_eq!(loaded.first_slide_id, Some(2));
        assert_eq!(loaded.path_extra.slides(), &[8, 9]);

        update_lesson_path(&conn, id, PathKind::Regular, &LessonPath::default()).unwrap();
        assert_eq!(get_lesson(&conn, id).unwrap().unwrap().first_slide_id, None);
    }

    #[test]
    fn test_lessons_referencing() {
        let conn = setup();
        let a = insert_lesson(&conn, &lesson("A", LessonStatus::Active, None, "1.2")).unwrap();
        let b = insert_lesson(&conn, &lesson("B", LessonStatus::Active, None, "3")).unwrap();
        update_lesson_path(&conn, b, PathKind::Extra, &"2".parse().unwrap()).unwrap();

        let ids: Vec<i64> = get_lessons_referencing(&conn, 2)
            .unwrap()
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_delete_disabled() {
        let conn = setup();
        let gone = insert_lesson(&conn, &lesson("A", LessonStatus::Disabled, None, "")).unwrap();
        let kept = insert_lesson(&conn, &lesson("B", LessonStatus::Editing, None, "")).unwrap();
        assert_eq!(get_disabled_lesson_ids(&conn).unwrap(), vec![gone]);
        assert_eq!(delete_disabled_lessons(&conn).unwrap(), 1);
        assert!(get_lesson(&conn, kept).unwrap().is_some());
    }
}
