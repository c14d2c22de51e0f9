//! Background services.
//!
//! Jobs that run outside of user conversations: daily reminders, the
//! subscription sweep with garbage collection, and admin alerts.

pub mod alerts;
pub mod daily;
pub mod reminders;
pub mod scheduler;

pub use alerts::{notify_admins, ContentAlerts};
pub use scheduler::Scheduler;
