//! Outbound messaging seam.
//!
//! The player and background jobs only talk to chats through [`Messenger`].
//! `bot::TelegramMessenger` implements it over teloxide; tests use
//! `testing::RecordingMessenger`.

use std::future::Future;
use std::path::Path;

use crate::error::DeliveryError;
use crate::keyboard::Keyboard;

pub type MessageId = i32;

pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Texts are sent with HTML formatting enabled.
pub trait Messenger: Send + Sync {
    fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> impl Future<Output = DeliveryResult<MessageId>> + Send;

    fn send_photo(
        &self,
        chat_id: i64,
        path: &Path,
        keyboard: Option<&Keyboard>,
    ) -> impl Future<Output = DeliveryResult<MessageId>> + Send;

    fn send_sticker(&self, chat_id: i64, file_id: &str) -> impl Future<Output = DeliveryResult<MessageId>> + Send;

    /// Pin without notifying the chat.
    fn pin_message(&self, chat_id: i64, message_id: MessageId) -> impl Future<Output = DeliveryResult<()>> + Send;

    fn unpin_all(&self, chat_id: i64) -> impl Future<Output = DeliveryResult<()>> + Send;

    fn edit_text(
        &self,
        chat_id: i64,
        message_id: MessageId,
        text: &str,
    ) -> impl Future<Output = DeliveryResult<()>> + Send;

    /// Remove the inline keyboard from a sent message.
    fn clear_keyboard(&self, chat_id: i64, message_id: MessageId) -> impl Future<Output = DeliveryResult<()>> + Send;
}
