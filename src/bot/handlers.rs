//! Update handlers. Each one resolves the learner, hands the update to the
//! player and logs failures; nothing here decides lesson flow.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::User as TgUser;

use super::{App, HandlerResult};
use crate::bot::commands::{AdminCommand, Command};
use crate::callback::CallbackData;
use crate::db::{self, LogOnError};
use crate::domain::User;
use crate::error::{BotError, Result};
use crate::messenger::Messenger;
use crate::player::{Player, UserInput};

// ==================== Routing ====================

/// Send a callback payload to the player operation it names.
pub async fn route_callback<M: Messenger>(player: &Player<M>, user: &User, data: CallbackData) -> Result<()> {
    match data {
        CallbackData::Lesson { lesson_id } => {
            player.open_lesson(user, lesson_id).await?;
        }
        CallbackData::Start { lesson_id, mode } => {
            player.start_lesson(user, lesson_id, mode).await?;
        }
        CallbackData::Further { session_id, slide_id } => {
            player.handle_input(user, session_id, UserInput::Further { slide_id }).await?;
        }
        CallbackData::Quiz {
            session_id,
            slide_id,
            option,
        } => {
            player
                .handle_input(user, session_id, UserInput::Option { slide_id, option })
                .await?;
        }
        CallbackData::Hint {
            session_id,
            slide_id,
            reveal,
        } => {
            player
                .handle_input(user, session_id, UserInput::Hint { slide_id, reveal })
                .await?;
        }
        CallbackData::Extra { session_id, accept } => {
            player.handle_input(user, session_id, UserInput::Extra { accept }).await?;
        }
        CallbackData::Reminder { days } => player.set_reminders(user, days).await?,
    }
    Ok(())
}

/// The lesson menu stays usable after a pick; every other keyboard is
/// single-use.
fn keeps_keyboard(data: &CallbackData) -> bool {
    matches!(data, CallbackData::Lesson { .. })
}

fn register(app: &App, from: &TgUser) -> Result<User> {
    let telegram_id = from.id.0 as i64;
    db::with_conn(&app.pool, |conn| {
        db::get_or_create_user(conn, telegram_id, &from.full_name(), from.username.as_deref()).map_err(BotError::from)
    })
}

fn log_failure(user: &User, what: &str, result: Result<()>) {
    if let Err(e) = result {
        tracing::error!(user = user.id, "Failed to handle {}: {}", what, e);
    }
}

// ==================== Endpoints ====================

pub async fn on_command(msg: Message, cmd: Command, app: Arc<App>) -> HandlerResult {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = register(&app, from)?;
    tracing::debug!(user = user.id, "Command {:?}", cmd);

    let result = match cmd {
        Command::Start | Command::Lessons => app.player.send_lesson_menu(user.telegram_id, user.id).await,
        Command::Reminders => app.player.send_reminder_menu(user.telegram_id).await,
        Command::Help => app.player.send_help(user.telegram_id).await,
    };
    log_failure(&user, "command", result);
    Ok(())
}

pub async fn on_admin_command(msg: Message, cmd: AdminCommand, app: Arc<App>) -> HandlerResult {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = register(&app, from)?;
    if !app.player.is_admin(user.telegram_id) {
        tracing::debug!(user = user.id, "Ignoring admin command from a learner");
        return Ok(());
    }
    tracing::info!(user = user.id, "Admin command {:?}", cmd);

    let result = match cmd {
        AdminCommand::Paywall => app.player.toggle_paywall(&user).await,
        AdminCommand::Position(args) => app.player.jump_to_slide(&user, &args).await.map(|_| ()),
        AdminCommand::Grant(args) => app.player.grant_access(&user, &args).await,
    };
    log_failure(&user, "admin command", result);
    Ok(())
}

pub async fn on_text(msg: Message, app: Arc<App>) -> HandlerResult {
    let (Some(from), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        return Ok(());
    };
    let user = register(&app, from)?;

    let result = app.player.handle_text(&user, text).await.map(|_| ());
    log_failure(&user, "text message", result);
    Ok(())
}

pub async fn on_callback(bot: Bot, q: CallbackQuery, app: Arc<App>) -> HandlerResult {
    bot.answer_callback_query(q.id.clone())
        .await
        .log_warn("Failed to answer callback query");

    let user = register(&app, &q.from)?;
    let Some(raw) = q.data.as_deref() else {
        return Ok(());
    };
    let data = match raw.parse::<CallbackData>() {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(user = user.id, "{}", e);
            return Ok(());
        }
    };

    if !keeps_keyboard(&data) {
        if let Some(message) = &q.message {
            app.messenger
                .clear_keyboard(message.chat().id.0, message.id().0)
                .await
                .log_warn("Failed to clear keyboard");
        }
    }

    let result = route_callback(&app.player, &user, data).await;
    log_failure(&user, "button press", result);
    Ok(())
}
