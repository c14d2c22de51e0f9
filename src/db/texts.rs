//! Canned texts, feedback reactions, stickers and reminder variants.
//!
//! Texts are keyed by prompt name and may contain `{}` markers that are
//! filled positionally with [`fill_placeholders`].

use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::StickerSize;

// ==================== Prompt names ====================

pub const START_MENU: &str = "start_menu";
pub const HELP_MESSAGE: &str = "help_message";
pub const NO_SLIDES_YET: &str = "no_slides_yet";
pub const PAYWALL_MESSAGE: &str = "paywall_message";
pub const STARTS_FROM_WITH_PROGRESS: &str = "starts_from_with_progress";
pub const STARTS_FROM_WITH_EXAM: &str = "starts_from_with_exam";
pub const STARTS_FROM_WITHOUT_EXAM: &str = "starts_from_without_exam";
pub const THREE_WRONG_ANSWERS: &str = "3_wrong_answers";
pub const RIGHT_ANSWER: &str = "right_answer";
pub const MISSING_ALMOST_RIGHT_REPLY: &str = "missing_almost_right_answer_reply";
pub const MISSING_SLIDE_TEXT: &str = "missing_slide_text";
pub const IMAGE_NOT_AVAILABLE: &str = "image_not_available";
pub const FINAL_REPORT_WITHOUT_QUESTIONS: &str = "final_report_without_questions";
pub const FINAL_REPORT_FROM_BEGIN: &str = "final_report_from_begin";
pub const FINAL_REPORT_FROM_EXAM: &str = "final_report_from_exam";
pub const EXTRA_SLIDES_DIALOG: &str = "extra_slides_dialog";
pub const REMINDER_TEXT: &str = "reminder_text";
pub const REMINDER_MENU: &str = "reminder_menu";
pub const SET_REMINDER_MESSAGE: &str = "set_reminder_message";
pub const UNSET_REMINDER_MESSAGE: &str = "unset_reminder_message";
pub const SUBSCRIPTION_ALMOST_OVER: &str = "subscription_almost_over";
pub const SUBSCRIPTION_OVER: &str = "subscription_over";
pub const UNKNOWN_INPUT: &str = "unknown_input";

/// Seeded on every migration with INSERT OR IGNORE, so admin edits survive.
pub const DEFAULT_TEXTS: &[(&str, &str)] = &[
    (START_MENU, "Choose a lesson:"),
    (
        HELP_MESSAGE,
        "/start or /lessons opens the lesson menu, /reminders sets up reminders.",
    ),
    (NO_SLIDES_YET, "This lesson has no slides yet. Please come back later."),
    (
        PAYWALL_MESSAGE,
        "This lesson is available with a subscription.",
    ),
    (
        STARTS_FROM_WITH_PROGRESS,
        "You have already started this lesson. Continue where you stopped?",
    ),
    (
        STARTS_FROM_WITH_EXAM,
        "Start from the beginning or go straight to the exam?",
    ),
    (STARTS_FROM_WITHOUT_EXAM, "Ready to start?"),
    (
        THREE_WRONG_ANSWERS,
        "That is three misses on this one. Show the answer?",
    ),
    (RIGHT_ANSWER, "The right answer is: {}"),
    (MISSING_ALMOST_RIGHT_REPLY, "Almost! Mind the spelling."),
    (
        MISSING_SLIDE_TEXT,
        "System message. Please add slide text in admin panel.",
    ),
    (IMAGE_NOT_AVAILABLE, "The picture for this slide is not available."),
    (FINAL_REPORT_WITHOUT_QUESTIONS, "Lesson «{}» is complete!"),
    (
        FINAL_REPORT_FROM_BEGIN,
        "Lesson «{}» is complete!\nPractice: {} of {} correct.\nExam: {} of {} correct.\nHints used: {}",
    ),
    (
        FINAL_REPORT_FROM_EXAM,
        "Exam of «{}» is complete!\n{} of {} correct.\nHints used: {}",
    ),
    (
        EXTRA_SLIDES_DIALOG,
        "Some answers did not work out. Want a few extra exercises on this topic?",
    ),
    (REMINDER_TEXT, "Time for a lesson! Your next one is waiting."),
    (REMINDER_MENU, "How often should I remind you about lessons?"),
    (SET_REMINDER_MESSAGE, "Done! I will remind you every {} day(s)."),
    (UNSET_REMINDER_MESSAGE, "Reminders are off."),
    (
        SUBSCRIPTION_ALMOST_OVER,
        "Your subscription ends tomorrow.",
    ),
    (SUBSCRIPTION_OVER, "Your subscription has ended."),
    (UNKNOWN_INPUT, "Please use the buttons, or send /start to open the lessons."),
];

pub fn seed_default_texts(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("INSERT OR IGNORE INTO texts (prompt, text) VALUES (?1, ?2)")?;
    for (prompt, text) in DEFAULT_TEXTS {
        stmt.execute(params![prompt, text])?;
    }
    Ok(())
}

/// Built-in text for a prompt, if it has one.
pub fn default_text(prompt: &str) -> Option<&'static str> {
    DEFAULT_TEXTS
        .iter()
        .find(|(p, _)| *p == prompt)
        .map(|(_, text)| *text)
}

/// Stored text for `prompt`, falling back to the built-in default.
pub fn get_text(conn: &Connection, prompt: &str) -> Result<String> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT text FROM texts WHERE prompt = ?1",
            params![prompt],
            |row| row.get(0),
        )
        .optional()?;

    Ok(match stored {
        Some(text) => text,
        None => {
            tracing::warn!("No text configured for prompt '{}'", prompt);
            default_text(prompt).unwrap_or(prompt).to_string()
        }
    })
}

pub fn set_text(conn: &Connection, prompt: &str, text: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO texts (prompt, text) VALUES (?1, ?2)
         ON CONFLICT(prompt) DO UPDATE SET text = excluded.text",
        params![prompt, text],
    )?;
    Ok(())
}

/// Replace each `{}` in order with the next argument. Markers without a
/// matching argument are left as they are.
pub fn fill_placeholders(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(arg),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

pub fn count_placeholders(template: &str) -> usize {
    template.matches("{}").count()
}

// ==================== Reactions ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionType {
    Right,
    Wrong,
}

impl ReactionType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "right" => Some(Self::Right),
            "wrong" => Some(Self::Wrong),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Wrong => "wrong",
        }
    }

    fn fallback(&self) -> &'static str {
        match self {
            Self::Right => "Right!",
            Self::Wrong => "Not quite.",
        }
    }
}

pub fn add_reaction(conn: &Connection, reaction_type: ReactionType, text: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO reactions (reaction_type, text) VALUES (?1, ?2)",
        params![reaction_type.as_str(), text],
    )?;
    Ok(conn.last_insert_rowid())
}

/// A random feedback phrase of the given type.
pub fn random_reaction(conn: &Connection, reaction_type: ReactionType) -> Result<String> {
    let text: Option<String> = conn
        .query_row(
            "SELECT text FROM reactions WHERE reaction_type = ?1 ORDER BY RANDOM() LIMIT 1",
            params![reaction_type.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(text.unwrap_or_else(|| reaction_type.fallback().to_string()))
}

// ==================== Stickers ====================

pub fn add_sticker(conn: &Connection, size: StickerSize, file_id: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO stickers (sticker_type, file_id) VALUES (?1, ?2)",
        params![size.as_str(), file_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn random_sticker(conn: &Connection, size: StickerSize) -> Result<Option<String>> {
    conn.query_row(
        "SELECT file_id FROM stickers WHERE sticker_type = ?1 ORDER BY RANDOM() LIMIT 1",
        params![size.as_str()],
        |row| row.get(0),
    )
    .optional()
}

// ==================== Reminder variants ====================

pub fn add_reminder_variant(conn: &Connection, text: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO reminder_text_variants (text) VALUES (?1)",
        params![text],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_reminder_variants(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT text FROM reminder_text_variants ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect()
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

    #[test]
    fn test_fill_placeholders() {
        assert_eq!(fill_placeholders("a {} b {}", &["1", "2"]), "a 1 b 2");
        assert_eq!(fill_placeholders("a {} b {}", &["1"]), "a 1 b {}");
        assert_eq!(fill_placeholders("none", &["1"]), "none");
    }

    #[test]
    fn test_get_text_prefers_stored() {
        let conn = setup();
        set_text(&conn, RIGHT_ANSWER, "Answer: {}").unwrap();
        assert_eq!(get_text(&conn, RIGHT_ANSWER).unwrap(), "Answer: {}");
    }

    #[test]
    fn test_get_text_falls_back_to_default() {
        let conn = setup();
        conn.execute("DELETE FROM texts WHERE prompt = ?1", [RIGHT_ANSWER])
            .unwrap();
        assert_eq!(
            get_text(&conn, RIGHT_ANSWER).unwrap(),
            default_text(RIGHT_ANSWER).unwrap()
        );
        assert_eq!(get_text(&conn, "nope").unwrap(), "nope");
    }

    #[test]
    fn test_seeding_keeps_admin_edits() {
        let conn = setup();
        set_text(&conn, START_MENU, "Pick one").unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_text(&conn, START_MENU).unwrap(), "Pick one");
    }

    #[test]
    fn test_random_reaction() {
        let conn = setup();
        assert_eq!(random_reaction(&conn, ReactionType::Right).unwrap(), "Right!");
        add_reaction(&conn, ReactionType::Wrong, "Nope").unwrap();
        assert_eq!(random_reaction(&conn, ReactionType::Wrong).unwrap(), "Nope");
    }

    #[test]
    fn test_random_sticker() {
        let conn = setup();
        assert_eq!(random_sticker(&conn, StickerSize::Big).unwrap(), None);
        add_sticker(&conn, StickerSize::Big, "CAAD").unwrap();
        assert_eq!(
            random_sticker(&conn, StickerSize::Big).unwrap().as_deref(),
            Some("CAAD")
        );
        assert_eq!(random_sticker(&conn, StickerSize::Small).unwrap(), None);
    }
}
