//! Admin-only operations: paid access and jumping around a running session.
//!
//! Non-admins get no reply, so the commands stay invisible to learners.

use chrono::Utc;

use super::{Player, Progress};
use crate::db;
use crate::domain::{AccessGrant, SubscriptionStatus, User};
use crate::error::Result;
use crate::messenger::Messenger;

pub const POSITION_USAGE: &str = "Usage: /position <slide id>";
pub const POSITION_NO_SESSION: &str = "Please start a lesson first";
pub const GRANT_USAGE: &str = "Usage: /grant <telegram id> [days]; no days means unlimited, 0 revokes";

impl<M: Messenger> Player<M> {
    pub fn is_admin(&self, telegram_id: i64) -> bool {
        self.settings.admins.contains(&telegram_id)
    }

    /// Switch the admin's own paid access on or off.
    pub async fn toggle_paywall(&self, user: &User) -> Result<()> {
        if !self.is_admin(user.telegram_id) {
            return Ok(());
        }
        let user_id = user.id;
        let current = self.db(|c| db::get_user(c, user_id))?;
        let enabled = !current.is_some_and(|u| u.subscription_status.has_paid_access());
        let status = if enabled {
            SubscriptionStatus::UnlimitedAccess
        } else {
            SubscriptionStatus::NoAccess
        };
        self.db(|c| db::set_subscription(c, user_id, status, None))?;
        tracing::info!(user = user_id, "Admin paywall access {}", status.as_str());

        let text = format!(
            "Your current paywall access status: {}",
            if enabled { "enabled" } else { "disabled" }
        );
        self.messenger.send_text(user.telegram_id, &text, None).await?;
        Ok(())
    }

    /// Give, limit or revoke paid access for another user.
    ///
    /// `args` is `<telegram id> [days]`.
    pub async fn grant_access(&self, admin: &User, args: &str) -> Result<()> {
        if !self.is_admin(admin.telegram_id) {
            return Ok(());
        }
        let chat = admin.telegram_id;
        let Some((telegram_id, grant)) = parse_grant(args) else {
            self.messenger.send_text(chat, GRANT_USAGE, None).await?;
            return Ok(());
        };

        let today = Utc::now().date_naive();
        let text = match self.db(|c| db::grant_access(c, telegram_id, grant, today))? {
            Some(user) => {
                tracing::info!(admin = admin.id, user = user.id, "Access set to {:?}", grant);
                match user.subscription_expired_at {
                    Some(until) => format!("{}: {} until {}", telegram_id, user.subscription_status.as_str(), until),
                    None => format!("{}: {}", telegram_id, user.subscription_status.as_str()),
                }
            }
            None => format!("No user with telegram id {} has started the bot", telegram_id),
        };
        self.messenger.send_text(chat, &text, None).await?;
        Ok(())
    }

    /// Move the admin's open session to a slide on its active path and
    /// render from there.
    pub async fn jump_to_slide(&self, user: &User, args: &str) -> Result<Progress> {
        if !self.is_admin(user.telegram_id) {
            return Ok(Progress::Ignored);
        }
        let chat = user.telegram_id;
        let Ok(slide_id) = args.trim().parse::<i64>() else {
            self.messenger.send_text(chat, POSITION_USAGE, None).await?;
            return Ok(Progress::Ignored);
        };
        let Some(mut session) = self.db(|c| db::get_latest_active_session(c, user.id))? else {
            self.messenger.send_text(chat, POSITION_NO_SESSION, None).await?;
            return Ok(Progress::NoSession);
        };

        let Some(step) = session.active_path()?.slides().iter().position(|&id| id == slide_id) else {
            let text = format!("Slide {} is not on the current lesson path", slide_id);
            self.messenger.send_text(chat, &text, None).await?;
            return Ok(Progress::Ignored);
        };

        let session_id = session.id;
        self.db(|c| {
            db::update_session_step(c, session_id, step)?;
            db::set_prompt_message(c, session_id, None)
        })?;
        session.current_step = step;
        session.prompt_message_id = None;
        tracing::info!(user = user.id, session = session_id, "Admin jumped to slide {}", slide_id);
        self.drive(chat, session, None).await
    }
}

fn parse_grant(args: &str) -> Option<(i64, AccessGrant)> {
    let mut parts = args.split_whitespace();
    let telegram_id = parts.next()?.parse().ok()?;
    let days = match parts.next() {
        Some(raw) => Some(raw.parse().ok()?),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((telegram_id, AccessGrant::from_days(days)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grant() {
        assert_eq!(parse_grant("42"), Some((42, AccessGrant::Unlimited)));
        assert_eq!(parse_grant(" 42  14 "), Some((42, AccessGrant::Days(14))));
        assert_eq!(parse_grant("42 0"), Some((42, AccessGrant::Revoke)));
        assert_eq!(parse_grant(""), None);
        assert_eq!(parse_grant("bob"), None);
        assert_eq!(parse_grant("42 -1"), None);
        assert_eq!(parse_grant("42 1 2"), None);
    }
}
