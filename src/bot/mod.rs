//! Telegram front end: dispatcher setup and update handlers.

pub mod commands;
pub mod handlers;
pub mod messenger;

pub use commands::{AdminCommand, Command};
pub use messenger::TelegramMessenger;

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, BotCommandScope, Recipient};
use teloxide::utils::command::BotCommands;

use crate::config::BotConfig;
use crate::db::{DbPool, LogOnError};
use crate::error::Result;
use crate::player::{Player, PlayerSettings};
use crate::services::{ContentAlerts, Scheduler};

pub type HandlerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Shared state injected into every handler.
pub struct App {
    pub pool: DbPool,
    pub messenger: TelegramMessenger,
    pub player: Player<TelegramMessenger>,
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let message_handler = Update::filter_message()
        .filter(|msg: Message| msg.chat.is_private())
        .branch(teloxide::filter_command::<Command, _>().endpoint(handlers::on_command))
        .branch(teloxide::filter_command::<AdminCommand, _>().endpoint(handlers::on_admin_command))
        .branch(dptree::endpoint(handlers::on_text));

    let callback_handler = Update::filter_callback_query().endpoint(handlers::on_callback);

    dptree::entry().branch(message_handler).branch(callback_handler)
}

/// Start the scheduler and serve updates until Ctrl-C.
pub async fn run(config: BotConfig, pool: DbPool) -> Result<()> {
    let bot = Bot::new(config.require_token()?);
    let messenger = TelegramMessenger::new(bot.clone());

    bot.set_my_commands(Command::bot_commands())
        .await
        .log_warn("Failed to register bot commands");
    let admin_commands: Vec<BotCommand> = Command::bot_commands()
        .into_iter()
        .chain(AdminCommand::bot_commands())
        .collect();
    for &admin in &config.admins {
        bot.set_my_commands(admin_commands.clone())
            .scope(BotCommandScope::Chat {
                chat_id: Recipient::Id(ChatId(admin)),
            })
            .await
            .log_warn("Failed to register admin commands");
    }

    tokio::spawn(Scheduler::new(pool.clone(), messenger.clone(), &config).run());

    let player = Player::new(
        pool.clone(),
        messenger.clone(),
        PlayerSettings::from_config(&config),
        Arc::new(ContentAlerts::new()),
    );
    let app = Arc::new(App {
        pool,
        messenger,
        player,
    });

    tracing::info!("Bot started, {} admin(s) configured", config.admins.len());
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![app])
        .default_handler(|upd| async move {
            tracing::debug!("Unhandled update: {:?}", upd.id);
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("Bot stopped");
    Ok(())
}
