//! [`Messenger`] over the Telegram Bot API.

use std::path::Path;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId as TgMessageId, ParseMode};
use teloxide::{ApiError, RequestError};

use crate::error::DeliveryError;
use crate::keyboard::Keyboard;
use crate::messenger::{DeliveryResult, MessageId, Messenger};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

pub fn inline_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.data.to_string()))
            .collect::<Vec<_>>()
    }))
}

/// Chats that will never accept a message again are `Blocked`.
fn delivery_error(chat_id: i64, err: RequestError) -> DeliveryError {
    match err {
        RequestError::Api(
            ApiError::BotBlocked | ApiError::BotKicked | ApiError::UserDeactivated | ApiError::ChatNotFound,
        ) => DeliveryError::Blocked(chat_id),
        other => DeliveryError::Other(other.to_string()),
    }
}

impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> DeliveryResult<MessageId> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(inline_markup(keyboard));
        }
        let sent = request.await.map_err(|e| delivery_error(chat_id, e))?;
        Ok(sent.id.0)
    }

    async fn send_photo(&self, chat_id: i64, path: &Path, keyboard: Option<&Keyboard>) -> DeliveryResult<MessageId> {
        let mut request = self.bot.send_photo(ChatId(chat_id), InputFile::file(path));
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(inline_markup(keyboard));
        }
        let sent = request.await.map_err(|e| delivery_error(chat_id, e))?;
        Ok(sent.id.0)
    }

    async fn send_sticker(&self, chat_id: i64, file_id: &str) -> DeliveryResult<MessageId> {
        let sent = self
            .bot
            .send_sticker(ChatId(chat_id), InputFile::file_id(file_id.to_string()))
            .await
            .map_err(|e| delivery_error(chat_id, e))?;
        Ok(sent.id.0)
    }

    async fn pin_message(&self, chat_id: i64, message_id: MessageId) -> DeliveryResult<()> {
        self.bot
            .pin_chat_message(ChatId(chat_id), TgMessageId(message_id))
            .disable_notification(true)
            .await
            .map_err(|e| delivery_error(chat_id, e))?;
        Ok(())
    }

    async fn unpin_all(&self, chat_id: i64) -> DeliveryResult<()> {
        self.bot
            .unpin_all_chat_messages(ChatId(chat_id))
            .await
            .map_err(|e| delivery_error(chat_id, e))?;
        Ok(())
    }

    async fn edit_text(&self, chat_id: i64, message_id: MessageId, text: &str) -> DeliveryResult<()> {
        self.bot
            .edit_message_text(ChatId(chat_id), TgMessageId(message_id), text)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| delivery_error(chat_id, e))?;
        Ok(())
    }

    async fn clear_keyboard(&self, chat_id: i64, message_id: MessageId) -> DeliveryResult<()> {
        self.bot
            .edit_message_reply_markup(ChatId(chat_id), TgMessageId(message_id))
            .await
            .map_err(|e| delivery_error(chat_id, e))?;
        Ok(())
    }
}
