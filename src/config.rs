//! Application configuration.
//!
//! Values are resolved with priority: `config.toml` > environment (`.env` is
//! loaded first) > defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BotError, Result};

// ==================== Quiz Configuration ====================

/// Wrong answers on one quiz slide before the hint dialog is shown
pub const WRONG_ANSWERS_BEFORE_HINT: i64 = 3;

/// Pause after revealing a hint before the next slide
pub const DEFAULT_HINT_PAUSE_SECS: u64 = 2;

/// Longest pause a slide delay may ask for, in seconds
pub const MAX_SLIDE_DELAY_SECS: f64 = 60.0;

// ==================== Scheduler Configuration ====================

/// UTC hour at which the daily jobs run and reminder slots start
pub const DEFAULT_REMINDER_HOUR_UTC: u32 = 14;

/// Pause between consecutive broadcast messages
pub const SEND_THROTTLE: Duration = Duration::from_millis(50);

// ==================== Paths ====================

pub const DEFAULT_DATABASE_PATH: &str = "data/lessons.db";
pub const DEFAULT_IMAGES_DIR: &str = "static/lessons_images";

/// Shown when a slide's picture is missing on disk
pub const IMAGE_NOT_AVAILABLE: &str = "image_not_available.png";

pub const CONFIG_FILE: &str = "config.toml";

// ==================== Loading ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bot: Option<BotSection>,
}

#[derive(Debug, Default, Deserialize)]
struct BotSection {
    token: Option<String>,
    admins: Option<Vec<i64>>,
    database_path: Option<String>,
    images_dir: Option<String>,
    reminder_hour_utc: Option<u32>,
    hint_pause_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: Option<String>,
    /// Telegram ids that receive content and failure alerts
    pub admins: Vec<i64>,
    pub database_path: PathBuf,
    pub images_dir: PathBuf,
    pub reminder_hour_utc: u32,
    pub hint_pause: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            admins: Vec::new(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            reminder_hour_utc: DEFAULT_REMINDER_HOUR_UTC,
            hint_pause: Duration::from_secs(DEFAULT_HINT_PAUSE_SECS),
        }
    }
}

impl BotConfig {
    /// Load from `config.toml` in the working directory, the environment and defaults.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let file = match std::fs::read_to_string(CONFIG_FILE) {
            Ok(contents) => {
                tracing::info!("Using settings from {}", CONFIG_FILE);
                toml::from_str::<FileConfig>(&contents)
                    .map_err(|e| BotError::Config(format!("{}: {}", CONFIG_FILE, e)))?
            }
            Err(_) => FileConfig::default(),
        };

        Self::resolve(file.bot.unwrap_or_default(), |key| std::env::var(key).ok())
    }

    /// Merge file values over environment values over defaults.
    fn resolve(file: BotSection, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let admins = match file.admins {
            Some(admins) => admins,
            None => match env("ADMINS") {
                Some(raw) => parse_admins(&raw)?,
                None => defaults.admins,
            },
        };

        let reminder_hour_utc = match file.reminder_hour_utc {
            Some(hour) => hour,
            None => match env("REMINDER_HOUR_UTC") {
                Some(raw) => parse_number(&raw, "REMINDER_HOUR_UTC")?,
                None => defaults.reminder_hour_utc,
            },
        };
        if reminder_hour_utc > 23 {
            return Err(BotError::Config(format!(
                "reminder hour must be 0-23, got {}",
                reminder_hour_utc
            )));
        }

        let hint_pause = match file.hint_pause_secs {
            Some(secs) => Duration::from_secs(secs),
            None => match env("HINT_PAUSE_SECS") {
                Some(raw) => Duration::from_secs(parse_number(&raw, "HINT_PAUSE_SECS")?),
                None => defaults.hint_pause,
            },
        };

        let database_path = file
            .database_path
            .or_else(|| env("DATABASE_PATH"))
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);
        tracing::info!("Using database: {}", database_path.display());

        Ok(Self {
            token: file.token.or_else(|| env("BOT_TOKEN")),
            admins,
            database_path,
            images_dir: file
                .images_dir
                .or_else(|| env("IMAGES_DIR"))
                .map(PathBuf::from)
                .unwrap_or(defaults.images_dir),
            reminder_hour_utc,
            hint_pause,
        })
    }

    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| BotError::Config("BOT_TOKEN is not set".to_string()))
    }

    pub fn is_admin(&self, telegram_id: i64) -> bool {
        self.admins.contains(&telegram_id)
    }

    pub fn fallback_image_path(&self) -> PathBuf {
        self.images_dir.join(IMAGE_NOT_AVAILABLE)
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }
}

/// Parse a comma separated list of Telegram ids.
fn parse_admins(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_number(s, "ADMINS"))
        .collect()
}

fn parse_number<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| BotError::Config(format!("{} has an invalid value: {}", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::resolve(BotSection::default(), env_of(&[])).unwrap();
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.reminder_hour_utc, 14);
        assert_eq!(config.hint_pause, Duration::from_secs(2));
        assert!(config.admins.is_empty());
        assert!(config.require_token().is_err());
    }

    #[test]
    fn test_env_values() {
        let env = env_of(&[
            ("BOT_TOKEN", "123:abc"),
            ("ADMINS", "1, 2,3"),
            ("DATABASE_PATH", "/tmp/x.db"),
            ("REMINDER_HOUR_UTC", "9"),
        ]);
        let config = BotConfig::resolve(BotSection::default(), env).unwrap();
        assert_eq!(config.require_token().unwrap(), "123:abc");
        assert_eq!(config.admins, vec![1, 2, 3]);
        assert!(config.is_admin(2));
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.reminder_hour_utc, 9);
    }

    #[test]
    fn test_file_overrides_env() {
        let file: FileConfig = toml::from_str(
            r#"
            [bot]
            admins = [42]
            database_path = "from_file.db"
            hint_pause_secs = 0
            "#,
        )
        .unwrap();
        let env = env_of(&[("ADMINS", "1"), ("DATABASE_PATH", "from_env.db")]);
        let config = BotConfig::resolve(file.bot.unwrap(), env).unwrap();
        assert_eq!(config.admins, vec![42]);
        assert_eq!(config.database_path, PathBuf::from("from_file.db"));
        assert_eq!(config.hint_pause, Duration::ZERO);
    }

    #[test]
    fn test_invalid_values() {
        assert!(BotConfig::resolve(BotSection::default(), env_of(&[("ADMINS", "1,x")])).is_err());
        assert!(
            BotConfig::resolve(BotSection::default(), env_of(&[("REMINDER_HOUR_UTC", "24")])).is_err()
        );
    }

    #[test]
    fn test_image_paths() {
        let config = BotConfig::default();
        assert_eq!(config.images_dir(), Path::new(DEFAULT_IMAGES_DIR));
        assert!(config.fallback_image_path().ends_with(IMAGE_NOT_AVAILABLE));
    }
}
