//! Per-type slide rendering.

use std::path::PathBuf;
use std::time::Duration;

use rand::seq::SliceRandom;

use super::{Flow, Player};
use crate::config::MAX_SLIDE_DELAY_SECS;
use crate::db::{self, LogOnError};
use crate::domain::{Session, Slide, SlideContent};
use crate::error::Result;
use crate::keyboard;
use crate::messenger::Messenger;

/// Prompts show the blank as an ellipsis until the answer is revealed.
pub(super) fn prompt_text(text: &str) -> String {
    text.replace('_', "…")
}

/// Pause requested by a slide delay, capped at [`MAX_SLIDE_DELAY_SECS`].
fn slide_pause(delay: Option<f64>) -> Option<Duration> {
    let secs = delay.filter(|d| d.is_finite() && *d > 0.0)?;
    Duration::try_from_secs_f64(secs.min(MAX_SLIDE_DELAY_SECS)).ok()
}

impl<M: Messenger> Player<M> {
    pub(super) async fn render(&self, chat: i64, session: &mut Session, slide: &Slide) -> Result<Flow> {
        tracing::debug!(session = session.id, slide = slide.id, "Rendering {}", slide.kind().as_str());

        match &slide.content {
            SlideContent::Text { text, delay, further } => {
                let body = self.slide_text(text)?;
                let kb = further.then(|| keyboard::further(session.id, slide.id));
                self.messenger.send_text(chat, &body, kb.as_ref()).await?;
                Ok(self.after_plain_slide(*further, *delay).await)
            }
            SlideContent::Image { picture, delay, further } => {
                let kb = further.then(|| keyboard::further(session.id, slide.id));
                match self.resolve_image(slide.lesson_id, picture) {
                    Some(path) => {
                        self.messenger.send_photo(chat, &path, kb.as_ref()).await?;
                    }
                    None => {
                        tracing::warn!(slide = slide.id, "No picture on disk for '{}'", picture);
                        let body = self.text(db::IMAGE_NOT_AVAILABLE)?;
                        self.messenger.send_text(chat, &body, kb.as_ref()).await?;
                    }
                }
                Ok(self.after_plain_slide(*further, *delay).await)
            }
            SlideContent::PinDict { text } => {
                let body = self.slide_text(text)?;
                let message_id = self.messenger.send_text(chat, &body, None).await?;
                self.messenger
                    .pin_message(chat, message_id)
                    .await
                    .log_warn("Failed to pin dictionary");
                Ok(Flow::Advance)
            }
            SlideContent::Sticker { size } => {
                match self.db(|c| db::random_sticker(c, *size))? {
                    Some(file_id) => {
                        self.messenger
                            .send_sticker(chat, &file_id)
                            .await
                            .log_warn("Failed to send sticker");
                    }
                    None => tracing::warn!("No {} stickers configured, skipping slide {}", size.as_str(), slide.id),
                }
                Ok(Flow::Advance)
            }
            SlideContent::QuizOptions { .. }
            | SlideContent::QuizInputWord { .. }
            | SlideContent::QuizInputPhrase { .. } => {
                self.send_quiz_prompt(chat, session, slide).await?;
                Ok(Flow::Await)
            }
        }
    }

    /// Send (or re-send) a quiz question and remember its message id.
    pub(super) async fn send_quiz_prompt(&self, chat: i64, session: &mut Session, slide: &Slide) -> Result<()> {
        let (text, kb) = match &slide.content {
            SlideContent::QuizOptions { text, .. } => {
                let options = slide.quiz_options();
                let shown = {
                    let mut order: Vec<usize> = (0..options.len()).collect();
                    order.shuffle(&mut rand::rng());
                    order
                };
                (text, Some(keyboard::quiz_options(session.id, slide.id, &options, &shown)))
            }
            SlideContent::QuizInputWord { text, .. } | SlideContent::QuizInputPhrase { text, .. } => (text, None),
            _ => return Ok(()),
        };

        let body = prompt_text(&self.slide_text(text)?);
        let message_id = self.messenger.send_text(chat, &body, kb.as_ref()).await?;
        session.prompt_message_id = Some(message_id);
        let id = session.id;
        self.db(|c| db::set_prompt_message(c, id, Some(message_id)))?;
        Ok(())
    }

    async fn after_plain_slide(&self, further: bool, delay: Option<f64>) -> Flow {
        if further {
            return Flow::Await;
        }
        if self.settings.honor_delays {
            if let Some(pause) = slide_pause(delay) {
                self.pause(pause).await;
            }
        }
        Flow::Advance
    }

    /// Slide text, or the admin placeholder when it was left empty.
    pub(super) fn slide_text(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            self.text(db::MISSING_SLIDE_TEXT)
        } else {
            Ok(text.to_string())
        }
    }

    fn resolve_image(&self, lesson_id: i64, picture: &str) -> Option<PathBuf> {
        let path = self.settings.images_dir.join(lesson_id.to_string()).join(picture);
        if !picture.is_empty() && path.is_file() {
            return Some(path);
        }
        let fallback = &self.settings.fallback_image;
        fallback.is_file().then(|| fallback.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_pause_is_capped() {
        assert_eq!(slide_pause(Some(1.5)), Some(Duration::from_millis(1500)));
        assert_eq!(slide_pause(Some(1e30)), Some(Duration::from_secs_f64(MAX_SLIDE_DELAY_SECS)));
        assert_eq!(slide_pause(Some(f64::INFINITY)), None);
        assert_eq!(slide_pause(Some(-3.0)), None);
        assert_eq!(slide_pause(None), None);
    }
}
