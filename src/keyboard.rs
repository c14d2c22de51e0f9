//! Transport-neutral inline keyboards.
//!
//! The player describes buttons with [`CallbackData`]; the Telegram adapter
//! turns a [`Keyboard`] into an inline markup.

use crate::callback::CallbackData;
use crate::domain::{Lesson, LessonStartsFrom, REMINDER_FREQUENCIES};

pub const FURTHER_CAPTION: &str = "Further ➡️";
pub const SHOW_ANSWER_CAPTION: &str = "Show the answer";
pub const TRY_AGAIN_CAPTION: &str = "Try again";
pub const EXTRA_YES_CAPTION: &str = "Yes, let's practice";
pub const EXTRA_NO_CAPTION: &str = "No, finish the lesson";
pub const BEGIN_CAPTION: &str = "From the beginning";
pub const EXAM_CAPTION: &str = "Straight to the exam";
pub const CONTINUE_CAPTION: &str = "Continue";
pub const REMINDERS_OFF_CAPTION: &str = "Turn off reminders";
pub const COMPLETED_MARK: &str = "✅";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: CallbackData,
}

impl Button {
    pub fn new(label: impl Into<String>, data: CallbackData) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// One button per row.
    pub fn column(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Button carrying `data`, if any.
    pub fn find(&self, data: &CallbackData) -> Option<&Button> {
        self.buttons().find(|b| &b.data == data)
    }
}

pub fn further(session_id: i64, slide_id: i64) -> Keyboard {
    Keyboard::column([Button::new(
        FURTHER_CAPTION,
        CallbackData::Further { session_id, slide_id },
    )])
}

/// `labels` are shown in the given order; each button carries its index
/// into `original_order`.
pub fn quiz_options(session_id: i64, slide_id: i64, original_order: &[String], shown: &[usize]) -> Keyboard {
    Keyboard::column(shown.iter().filter_map(|&option| {
        original_order.get(option).map(|label| {
            Button::new(
                label.clone(),
                CallbackData::Quiz {
                    session_id,
                    slide_id,
                    option,
                },
            )
        })
    }))
}

pub fn hint(session_id: i64, slide_id: i64) -> Keyboard {
    Keyboard {
        rows: vec![vec![
            Button::new(
                SHOW_ANSWER_CAPTION,
                CallbackData::Hint {
                    session_id,
                    slide_id,
                    reveal: true,
                },
            ),
            Button::new(
                TRY_AGAIN_CAPTION,
                CallbackData::Hint {
                    session_id,
                    slide_id,
                    reveal: false,
                },
            ),
        ]],
    }
}

pub fn extra_slides(session_id: i64) -> Keyboard {
    Keyboard::column([
        Button::new(
            EXTRA_YES_CAPTION,
            CallbackData::Extra {
                session_id,
                accept: true,
            },
        ),
        Button::new(
            EXTRA_NO_CAPTION,
            CallbackData::Extra {
                session_id,
                accept: false,
            },
        ),
    ])
}

/// Entry modes offered for a lesson.
pub fn start_modes(lesson_id: i64, has_progress: bool, has_exam: bool) -> Keyboard {
    let mut modes = Vec::new();
    if has_progress {
        modes.push((CONTINUE_CAPTION, LessonStartsFrom::Continue));
    }
    modes.push((BEGIN_CAPTION, LessonStartsFrom::Begin));
    if has_exam {
        modes.push((EXAM_CAPTION, LessonStartsFrom::Exam));
    }
    Keyboard::column(
        modes
            .into_iter()
            .map(|(label, mode)| Button::new(label, CallbackData::Start { lesson_id, mode })),
    )
}

/// Lesson menu; completed lessons get a check mark.
pub fn lesson_menu(lessons: &[Lesson], is_completed: impl Fn(i64) -> bool) -> Keyboard {
    Keyboard::column(lessons.iter().map(|lesson| {
        let label = if is_completed(lesson.id) {
            format!("{} {}", COMPLETED_MARK, lesson.title)
        } else {
            lesson.title.clone()
        };
        Button::new(label, CallbackData::Lesson { lesson_id: lesson.id })
    }))
}

pub fn reminders() -> Keyboard {
    let mut rows = vec![REMINDER_FREQUENCIES
        .iter()
        .map(|&days| Button::new(format!("Every {} d", days), CallbackData::Reminder { days }))
        .collect::<Vec<_>>()];
    rows.push(vec![Button::new(
        REMINDERS_OFF_CAPTION,
        CallbackData::Reminder { days: 0 },
    )]);
    Keyboard { rows }
}
