//! Users, reminder preferences, subscriptions and completed lessons

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::{AccessGrant, SubscriptionStatus, User};

const USER_COLUMNS: &str = "id, telegram_id, fullname, username, reminder_freq, last_reminded_at, \
                            last_lesson_completed_at, subscription_status, subscription_expired_at";

/// Find the user by Telegram id, creating them on first contact. Name fields
/// are refreshed because Telegram users can rename themselves.
pub fn get_or_create_user(
    conn: &Connection,
    telegram_id: i64,
    fullname: &str,
    username: Option<&str>,
) -> Result<User> {
    conn.execute(
        r#"
    INSERT INTO users (telegram_id, fullname, username, created_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(telegram_id) DO UPDATE SET fullname = excluded.fullname, username = excluded.username
    "#,
        params![telegram_id, fullname, username, Utc::now().to_rfc3339()],
    )?;
    conn.query_row(
        &format!("SELECT {} FROM users WHERE telegram_id = ?1", USER_COLUMNS),
        params![telegram_id],
        row_to_user,
    )
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        row_to_user,
    )
    .optional()
}

pub fn get_user_by_telegram_id(conn: &Connection, telegram_id: i64) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE telegram_id = ?1", USER_COLUMNS),
        params![telegram_id],
        row_to_user,
    )
    .optional()
}

pub fn set_reminder_freq(conn: &Connection, user_id: i64, freq_days: Option<i64>) -> Result<()> {
    conn.execute(
        "UPDATE users SET reminder_freq = ?1 WHERE id = ?2",
        params![freq_days, user_id],
    )?;
    Ok(())
}

pub fn mark_reminded(conn: &Connection, user_id: i64, at: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "UPDATE users SET last_reminded_at = ?1 WHERE id = ?2",
        params![at.to_rfc3339(), user_id],
    )?;
    Ok(())
}

pub fn get_users_with_reminders(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users WHERE reminder_freq IS NOT NULL AND reminder_freq > 0 ORDER BY id",
        USER_COLUMNS
    ))?;
    let users = stmt
        .query_map([], row_to_user)?
        .collect::<Result<Vec<_>>>()?;
    Ok(users)
}

pub fn set_subscription(
    conn: &Connection,
    user_id: i64,
    status: SubscriptionStatus,
    expires_on: Option<NaiveDate>,
) -> Result<()> {
    conn.execute(
        "UPDATE users SET subscription_status = ?1, subscription_expired_at = ?2 WHERE id = ?3",
        params![status.as_str(), expires_on.map(|d| d.to_string()), user_id],
    )?;
    Ok(())
}

/// Apply an admin grant to the user with this Telegram id. Returns the
/// updated user, or `None` when nobody with that id has used the bot yet.
pub fn grant_access(conn: &Connection, telegram_id: i64, grant: AccessGrant, today: NaiveDate) -> Result<Option<User>> {
    let Some(user) = get_user_by_telegram_id(conn, telegram_id)? else {
        return Ok(None);
    };
    let (status, expires_on) = grant.subscription_on(today);
    set_subscription(conn, user.id, status, expires_on)?;
    get_user(conn, user.id)
}

/// Users on a time-limited subscription with a known end date.
pub fn get_limited_subscribers(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users
         WHERE subscription_status = 'limited_access' AND subscription_expired_at IS NOT NULL
         ORDER BY id",
        USER_COLUMNS
    ))?;
    let users = stmt
        .query_map([], row_to_user)?
        .collect::<Result<Vec<_>>>()?;
    Ok(users)
}

// ==================== Completed lessons ====================

pub fn record_completed_lesson(
    conn: &Connection,
    user_id: i64,
    lesson_id: i64,
    session_id: i64,
    at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO completed_lessons (user_id, lesson_id, session_id, completed_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, lesson_id, session_id, at.to_rfc3339()],
    )?;
    conn.execute(
        "UPDATE users SET last_lesson_completed_at = ?1 WHERE id = ?2",
        params![at.to_rfc3339(), user_id],
    )?;
    Ok(())
}

pub fn get_completed_lesson_ids(conn: &Connection, user_id: i64) -> Result<HashSet<i64>> {
    let mut stmt = conn.prepare("SELECT DISTINCT lesson_id FROM completed_lessons WHERE user_id = ?1")?;
    let ids = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<Result<HashSet<i64>>>()?;
    Ok(ids)
}

fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_to_user(row: &rusqlite::Row) -> Result<User> {
    let status_str: String = row.get(7)?;
    let expires_str: Option<String> = row.get(8)?;

    Ok(User {
        id: row.get(0)?,
        telegram_id: row.get(1)?,
        fullname: row.get(2)?,
        username: row.get(3)?,
        reminder_freq: row.get(4)?,
        last_reminded_at: parse_timestamp(row.get(5)?),
        last_lesson_completed_at: parse_timestamp(row.get(6)?),
        subscription_status: SubscriptionStatus::from_str(&status_str).unwrap_or_default(),
        subscription_expired_at: expires_str.and_then(|s| s.parse::<NaiveDate>().ok()),
    })
}
