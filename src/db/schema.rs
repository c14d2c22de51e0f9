use rusqlite::{Connection, Result};

use super::texts::seed_default_texts;

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Create tables with COMPLETE schema for new databases
  // Migrations below handle upgrades for existing databases
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS users (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      telegram_id INTEGER NOT NULL UNIQUE,
      fullname TEXT NOT NULL DEFAULT '',
      username TEXT,
      reminder_freq INTEGER,
      last_reminded_at TEXT,
      last_lesson_completed_at TEXT,
      subscription_status TEXT NOT NULL DEFAULT 'no_access',
      subscription_expired_at TEXT,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS lessons (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      idx INTEGER UNIQUE,
      title TEXT NOT NULL,
      level TEXT,
      path TEXT,
      path_extra TEXT,
      first_slide_id INTEGER,
      is_paid INTEGER NOT NULL DEFAULT 0,
      errors_threshold INTEGER,
      status TEXT NOT NULL DEFAULT 'editing',
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS slides (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      lesson_id INTEGER NOT NULL,
      slide_type TEXT NOT NULL,
      text TEXT,
      picture TEXT,
      delay REAL,
      keyboard_type TEXT,
      keyboard TEXT,
      right_answers TEXT,
      almost_right_answers TEXT,
      almost_right_answer_reply TEXT,
      is_exam_slide INTEGER NOT NULL DEFAULT 0,
      FOREIGN KEY (lesson_id) REFERENCES lessons(id)
    );

    CREATE TABLE IF NOT EXISTS sessions (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      lesson_id INTEGER NOT NULL,
      path TEXT NOT NULL,
      path_extra TEXT,
      current_step INTEGER NOT NULL DEFAULT 0,
      starts_from TEXT NOT NULL DEFAULT 'begin',
      status TEXT NOT NULL DEFAULT 'in_progress',
      in_extra INTEGER NOT NULL DEFAULT 0,
      prompt_message_id INTEGER,
      hints_shown INTEGER NOT NULL DEFAULT 0,
      created_at TEXT NOT NULL,
      updated_at TEXT NOT NULL,
      FOREIGN KEY (user_id) REFERENCES users(id),
      FOREIGN KEY (lesson_id) REFERENCES lessons(id)
    );

    CREATE TABLE IF NOT EXISTS quiz_answer_logs (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      session_id INTEGER NOT NULL,
      slide_id INTEGER NOT NULL,
      slide_type TEXT NOT NULL,
      is_correct INTEGER NOT NULL,
      created_at TEXT NOT NULL,
      FOREIGN KEY (session_id) REFERENCES sessions(id)
    );

    CREATE TABLE IF NOT EXISTS completed_lessons (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      lesson_id INTEGER NOT NULL,
      session_id INTEGER NOT NULL,
      completed_at TEXT NOT NULL,
      FOREIGN KEY (user_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS texts (
      prompt TEXT PRIMARY KEY,
      text TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS reactions (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      reaction_type TEXT NOT NULL,
      text TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS stickers (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      sticker_type TEXT NOT NULL,
      file_id TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS reminder_text_variants (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      text TEXT NOT NULL
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_slides_lesson ON slides(lesson_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_user_status ON sessions(user_id, status);
    CREATE INDEX IF NOT EXISTS idx_sessions_lesson ON sessions(lesson_id);
    CREATE INDEX IF NOT EXISTS idx_quiz_logs_session_slide ON quiz_answer_logs(session_id, slide_id);
    CREATE INDEX IF NOT EXISTS idx_completed_lessons_user ON completed_lessons(user_id);
    CREATE INDEX IF NOT EXISTS idx_reactions_type ON reactions(reaction_type);
    CREATE INDEX IF NOT EXISTS idx_stickers_type ON stickers(sticker_type);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // These are no-ops for new databases (columns already exist)
  // ============================================================

  // Migration: remediation branch
  add_column_if_missing(conn, "lessons", "path_extra", "TEXT")?;
  add_column_if_missing(conn, "lessons", "errors_threshold", "INTEGER")?;
  add_column_if_missing(conn, "sessions", "path_extra", "TEXT")?;
  add_column_if_missing(conn, "sessions", "in_extra", "INTEGER NOT NULL DEFAULT 0")?;

  // Migration: in-place answer reveal and hint accounting
  add_column_if_missing(conn, "sessions", "prompt_message_id", "INTEGER")?;
  add_column_if_missing(conn, "sessions", "hints_shown", "INTEGER NOT NULL DEFAULT 0")?;

  // Migration: subscriptions
  add_column_if_missing(conn, "users", "subscription_status", "TEXT NOT NULL DEFAULT 'no_access'")?;
  add_column_if_missing(conn, "users", "subscription_expired_at", "TEXT")?;

  seed_default_texts(conn)?;

  Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();
    assert!(column_exists(&conn, "sessions", "hints_shown"));
  }

  #[test]
  fn test_adds_missing_columns_to_old_tables() {
    let conn = Connection::open_in_memory().unwrap();
    conn
      .execute_batch(
        r#"
        CREATE TABLE sessions (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          user_id INTEGER NOT NULL,
          lesson_id INTEGER NOT NULL,
          path TEXT NOT NULL,
          current_step INTEGER NOT NULL DEFAULT 0,
          starts_from TEXT NOT NULL DEFAULT 'begin',
          status TEXT NOT NULL DEFAULT 'in_progress',
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );
        "#,
      )
      .unwrap();
    assert!(!column_exists(&conn, "sessions", "in_extra"));

    run_migrations(&conn).unwrap();
    assert!(column_exists(&conn, "sessions", "in_extra"));
    assert!(column_exists(&conn, "sessions", "path_extra"));
    assert!(column_exists(&conn, "sessions", "prompt_message_id"));
  }

  #[test]
  fn test_default_texts_seeded() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    let count: i64 = conn
      .query_row("SELECT COUNT(*) FROM texts WHERE prompt = 'right_answer'", [], |row| row.get(0))
      .unwrap();
    assert_eq!(count, 1);
  }
}
