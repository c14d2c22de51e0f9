//! Daily routine: garbage collection and the subscription expiry sweep.

use chrono::NaiveDate;

use crate::config::SEND_THROTTLE;
use crate::db::{self, DbPool, GarbageReport};
use crate::domain::SubscriptionStatus;
use crate::error::{DeliveryError, Result};
use crate::messenger::Messenger;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyReport {
    pub garbage: GarbageReport,
    /// Users told their subscription ends tomorrow
    pub warned: usize,
    /// Users whose subscription was switched to expired
    pub expired: usize,
}

/// Run the daily routine for `today` (UTC).
///
/// A subscription ending tomorrow gets a warning. One that ends today or
/// earlier is marked expired, so a missed day still expires it.
pub async fn run_daily_routine<M: Messenger>(pool: &DbPool, messenger: &M, today: NaiveDate) -> Result<DailyReport> {
    let (garbage, almost_over, over, users) = db::with_conn(pool, |conn| -> Result<_> {
        Ok((
            db::collect_garbage(conn)?,
            db::get_text(conn, db::SUBSCRIPTION_ALMOST_OVER)?,
            db::get_text(conn, db::SUBSCRIPTION_OVER)?,
            db::get_limited_subscribers(conn)?,
        ))
    })?;

    let mut report = DailyReport {
        garbage,
        ..Default::default()
    };
    for user in users {
        let Some(expires_on) = user.subscription_expired_at else {
            continue;
        };
        let days_left = (expires_on - today).num_days();

        let text = if days_left == 1 {
            report.warned += 1;
            &almost_over
        } else if days_left <= 0 {
            db::with_conn(pool, |conn| -> Result<_> {
                Ok(db::set_subscription(
                    conn,
                    user.id,
                    SubscriptionStatus::AccessExpired,
                    Some(expires_on),
                )?)
            })?;
            tracing::info!(user = user.id, "Subscription expired on {}", expires_on);
            report.expired += 1;
            &over
        } else {
            continue;
        };

        match messenger.send_text(user.telegram_id, text, None).await {
            Ok(_) => tracing::info!(user = user.id, "Subscription notice sent"),
            Err(DeliveryError::Blocked(chat)) => {
                tracing::warn!(user = user.id, "Chat {} refused the subscription notice", chat)
            }
            Err(e) => tracing::error!(user = user.id, "Failed to send subscription notice: {}", e),
        }
        tokio::time::sleep(SEND_THROTTLE).await;
    }

    Ok(report)
}
