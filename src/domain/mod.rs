pub mod lesson;
pub mod path;
pub mod session;
pub mod slide;
pub mod user;

pub use lesson::{Lesson, LessonLevel, LessonStatus, PathKind};
pub use path::{LessonPath, MoveDirection, PathError};
pub use session::{LessonStartsFrom, QuizAnswerLog, Session, SessionStartsFrom, SessionStatus};
pub use slide::{AnswerKey, Slide, SlideContent, SlideKind, StickerSize};
pub use user::{AccessGrant, SubscriptionStatus, User, REMINDER_FREQUENCIES};
