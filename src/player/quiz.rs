//! Quiz evaluation: options, single word and phrase answers.
//!
//! All three quiz types share one flow. A right or almost-right answer is
//! logged as correct and advances. A wrong one is logged, answered with a
//! negative reaction, and after `WRONG_ANSWERS_BEFORE_HINT` misses on the
//! slide the hint dialog replaces the repeated question.

use super::{Flow, Player, UserInput};
use crate::config::WRONG_ANSWERS_BEFORE_HINT;
use crate::db::{self, LogOnError, ReactionType};
use crate::domain::{AnswerKey, Session, Slide, SlideContent};
use crate::error::Result;
use crate::keyboard;
use crate::messenger::Messenger;
use crate::services::alerts::notify_admins;
use crate::validation::{judge, judge_option, MatchMode, Verdict};

/// Prompt text with the blank filled by the underlined answer.
pub(super) fn reveal_in_prompt(text: &str, answer: &str) -> String {
    let underlined = format!("<u>{}</u>", html_escape::encode_text(answer));
    text.replace('_', &underlined)
}

impl<M: Messenger> Player<M> {
    pub(super) async fn evaluate(
        &self,
        chat: i64,
        session: &mut Session,
        slide: &Slide,
        input: UserInput,
    ) -> Result<Flow> {
        let (verdict, reveal) = match (&slide.content, input) {
            (_, UserInput::Hint { reveal: true, .. }) => return self.reveal_answer(chat, session, slide).await,
            (_, UserInput::Hint { reveal: false, .. }) => {
                self.send_quiz_prompt(chat, session, slide).await?;
                return Ok(Flow::Await);
            }
            (SlideContent::QuizOptions { right_answers, .. }, UserInput::Option { option, .. }) => {
                let options = slide.quiz_options();
                let Some(chosen) = options.get(option) else {
                    tracing::debug!(slide = slide.id, "Option {} does not exist", option);
                    return Ok(Flow::Ignore);
                };
                (judge_option(chosen, right_answers), Some(chosen.clone()))
            }
            (SlideContent::QuizInputWord { answers, .. }, UserInput::Text(text)) => {
                (judge(MatchMode::Word, &text, answers), answers.canonical().map(str::to_string))
            }
            // Phrases are not revealed in place; the prompt has no single blank
            (SlideContent::QuizInputPhrase { answers, .. }, UserInput::Text(text)) => {
                (judge(MatchMode::Phrase, &text, answers), None)
            }
            _ => return Ok(Flow::Ignore),
        };

        let (session_id, kind) = (session.id, slide.kind());
        self.db(|c| db::log_quiz_answer(c, session_id, slide.id, kind, verdict.is_correct()))?;
        tracing::debug!(session = session_id, slide = slide.id, "Quiz answer: {:?}", verdict);

        match verdict {
            Verdict::Correct => {
                self.reveal_in_place(chat, session, slide, reveal.as_deref()).await;
                let reaction = self.db(|c| db::random_reaction(c, ReactionType::Right))?;
                self.messenger.send_text(chat, &reaction, None).await?;
                Ok(Flow::Advance)
            }
            Verdict::AlmostCorrect => {
                self.reveal_in_place(chat, session, slide, reveal.as_deref()).await;
                let reply = self.almost_right_reply(slide).await?;
                self.messenger.send_text(chat, &reply, None).await?;
                Ok(Flow::Advance)
            }
            Verdict::Incorrect => {
                let reaction = self.db(|c| db::random_reaction(c, ReactionType::Wrong))?;
                self.messenger.send_text(chat, &reaction, None).await?;

                let wrong = self.db(|c| db::count_wrong_answers(c, session_id, slide.id))?;
                if wrong >= WRONG_ANSWERS_BEFORE_HINT {
                    let text = self.text(db::THREE_WRONG_ANSWERS)?;
                    let kb = keyboard::hint(session_id, slide.id);
                    self.messenger.send_text(chat, &text, Some(&kb)).await?;
                } else {
                    self.send_quiz_prompt(chat, session, slide).await?;
                }
                Ok(Flow::Await)
            }
        }
    }

    /// Hint accepted: show the right answer, then move on. The slide keeps
    /// counting as a mistake because its wrong answers are already logged.
    async fn reveal_answer(&self, chat: i64, session: &mut Session, slide: &Slide) -> Result<Flow> {
        let answer = match &slide.content {
            SlideContent::QuizOptions { right_answers, .. } => right_answers.first().cloned(),
            SlideContent::QuizInputWord { answers, .. } | SlideContent::QuizInputPhrase { answers, .. } => {
                answers.canonical().map(str::to_string)
            }
            _ => None,
        }
        .unwrap_or_default();

        let template = self.text(db::RIGHT_ANSWER)?;
        let escaped = html_escape::encode_text(&answer);
        let text = db::fill_placeholders(&template, &[escaped.as_ref()]);
        self.messenger.send_text(chat, &text, None).await?;

        session.hints_shown += 1;
        let id = session.id;
        self.db(|c| db::increment_hints_shown(c, id))?;

        self.pause(self.settings.hint_pause).await;
        Ok(Flow::Advance)
    }

    /// Edit the last prompt so the blank shows the answer. Cosmetic, so
    /// failures are only logged.
    async fn reveal_in_place(&self, chat: i64, session: &Session, slide: &Slide, answer: Option<&str>) {
        let (Some(answer), Some(message_id)) = (answer, session.prompt_message_id) else {
            return;
        };
        let text = match &slide.content {
            SlideContent::QuizOptions { text, .. } | SlideContent::QuizInputWord { text, .. } => text,
            _ => return,
        };
        if !text.contains('_') {
            return;
        }
        self.messenger
            .edit_text(chat, message_id, &reveal_in_prompt(text, answer))
            .await
            .log_warn("Failed to reveal answer in prompt");
    }

    /// The slide's almost-right reply, or a generic one. A missing reply is
    /// reported to admins once per slide.
    async fn almost_right_reply(&self, slide: &Slide) -> Result<String> {
        let key: Option<&AnswerKey> = match &slide.content {
            SlideContent::QuizInputWord { answers, .. } | SlideContent::QuizInputPhrase { answers, .. } => Some(answers),
            _ => None,
        };
        if let Some(reply) = key.and_then(|k| k.almost_right_reply.clone()) {
            return Ok(reply);
        }

        tracing::warn!(slide = slide.id, "Almost-right answer given but the slide has no reply");
        if self.alerts.first_report(slide.id) {
            let alert = format!(
                "Slide {} (lesson {}) accepts almost-right answers but has no reply text.",
                slide.id, slide.lesson_id
            );
            notify_admins(&self.messenger, &self.settings.admins, &alert).await;
        }
        self.text(db::MISSING_ALMOST_RIGHT_REPLY)
    }
}
