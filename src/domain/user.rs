use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
  #[default]
  NoAccess,
  UnlimitedAccess,
  LimitedAccess,
  AccessExpired,
  AccessInfoRequested,
}

impl SubscriptionStatus {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "no_access" => Some(Self::NoAccess),
      "unlimited_access" => Some(Self::UnlimitedAccess),
      "limited_access" => Some(Self::LimitedAccess),
      "access_expired" => Some(Self::AccessExpired),
      "access_info_requested" => Some(Self::AccessInfoRequested),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NoAccess => "no_access",
      Self::UnlimitedAccess => "unlimited_access",
      Self::LimitedAccess => "limited_access",
      Self::AccessExpired => "access_expired",
      Self::AccessInfoRequested => "access_info_requested",
    }
  }

  pub fn has_paid_access(&self) -> bool {
    matches!(self, Self::UnlimitedAccess | Self::LimitedAccess)
  }
}

/// Reminder frequencies offered to users, in days.
pub const REMINDER_FREQUENCIES: [i64; 3] = [1, 3, 7];

#[derive(Debug, Clone)]
pub struct User {
  pub id: i64,
  pub telegram_id: i64,
  pub fullname: String,
  pub username: Option<String>,
  /// Days between reminders; `None` disables them
  pub reminder_freq: Option<i64>,
  pub last_reminded_at: Option<DateTime<Utc>>,
  pub last_lesson_completed_at: Option<DateTime<Utc>>,
  pub subscription_status: SubscriptionStatus,
  pub subscription_expired_at: Option<NaiveDate>,
}

impl User {
  pub fn can_open(&self, is_paid_lesson: bool) -> bool {
    !is_paid_lesson || self.subscription_status.has_paid_access()
  }
}

/// Paid access handed out by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessGrant {
  Unlimited,
  /// Limited access ending this many days from the grant date
  Days(u32),
  Revoke,
}

impl AccessGrant {
  /// No day count means unlimited access; zero days revokes it.
  pub fn from_days(days: Option<u32>) -> Self {
    match days {
      None => Self::Unlimited,
      Some(0) => Self::Revoke,
      Some(n) => Self::Days(n),
    }
  }

  /// Subscription status and end date the grant sets when given on `today`.
  pub fn subscription_on(&self, today: NaiveDate) -> (SubscriptionStatus, Option<NaiveDate>) {
    match self {
      Self::Unlimited => (SubscriptionStatus::UnlimitedAccess, None),
      Self::Days(n) => (
        SubscriptionStatus::LimitedAccess,
        Some(today + chrono::Days::new(u64::from(*n))),
      ),
      Self::Revoke => (SubscriptionStatus::NoAccess, None),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_access_grant_from_days() {
    let today = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
    assert_eq!(
      AccessGrant::from_days(None).subscription_on(today),
      (SubscriptionStatus::UnlimitedAccess, None)
    );
    assert_eq!(
      AccessGrant::from_days(Some(3)).subscription_on(today),
      (SubscriptionStatus::LimitedAccess, NaiveDate::from_ymd_opt(2024, 3, 1))
    );
    assert_eq!(AccessGrant::from_days(Some(0)), AccessGrant::Revoke);
    assert!(!AccessGrant::Revoke.subscription_on(today).0.has_paid_access());
  }
}
