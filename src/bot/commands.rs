use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Show the lesson menu")]
    Start,
    #[command(description = "Show the lesson menu")]
    Lessons,
    #[command(description = "Choose how often to be reminded")]
    Reminders,
    #[command(description = "Show help")]
    Help,
}

/// Commands only admins see in their command list. Arguments are parsed by
/// the player so a malformed one gets a usage reply.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Admin commands:")]
pub enum AdminCommand {
    #[command(description = "Toggle your own paid access")]
    Paywall,
    #[command(description = "Jump your open lesson to a slide id")]
    Position(String),
    #[command(description = "Give paid access: <telegram id> [days]")]
    Grant(String),
}
