use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lesson_bot::config::BotConfig;
use lesson_bot::domain::AccessGrant;
use lesson_bot::error::{BotError, Result};
use lesson_bot::{bot, content, db};

/// Telegram bot that plays slide-based language lessons
#[derive(Parser, Debug)]
#[command(name = "lesson_bot", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve Telegram updates and run the daily jobs (default)
    Run,
    /// Import lessons from a TOML lesson pack
    Import {
        /// Path to the lesson pack
        file: PathBuf,
    },
    /// Delete disabled lessons and slides nothing refers to
    CollectGarbage,
    /// Give a user paid access
    Grant {
        /// Telegram id of a user who has started the bot
        telegram_id: i64,
        /// Limit access to this many days from today; 0 revokes it
        #[arg(long)]
        days: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lesson_bot=debug,teloxide=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run(cli.command.unwrap_or(Commands::Run)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    let config = BotConfig::load()?;
    let pool = db::init_db(&config.database_path)?;

    match command {
        Commands::Run => bot::run(config, pool).await,
        Commands::Import { file } => {
            let report = db::with_conn(&pool, |conn| content::import_file(conn, &file))?;
            tracing::info!(
                "Imported {} lesson(s) with {} slide(s) from {}",
                report.lessons,
                report.slides,
                file.display()
            );
            Ok(())
        }
        Commands::CollectGarbage => {
            let report = db::with_conn(&pool, |conn| db::collect_garbage(conn).map_err(BotError::from))?;
            tracing::info!("Garbage collected: {:?}", report);
            Ok(())
        }
        Commands::Grant { telegram_id, days } => {
            let grant = AccessGrant::from_days(days);
            let today = Utc::now().date_naive();
            let user = db::with_conn(&pool, |conn| {
                db::grant_access(conn, telegram_id, grant, today).map_err(BotError::from)
            })?
            .ok_or(BotError::UserNotFound(telegram_id))?;
            tracing::info!(
                "User {} now has {} (until {:?})",
                telegram_id,
                user.subscription_status.as_str(),
                user.subscription_expired_at
            );
            Ok(())
        }
    }
}
