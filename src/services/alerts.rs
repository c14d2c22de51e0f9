//! Admin notifications.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::messenger::Messenger;

/// Remembers which slides already triggered a content warning so admins get
/// one message per slide per process, not one per learner.
#[derive(Debug, Default)]
pub struct ContentAlerts {
    reported: Mutex<HashSet<i64>>,
}

impl ContentAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time a slide is reported.
    pub fn first_report(&self, slide_id: i64) -> bool {
        match self.reported.lock() {
            Ok(mut reported) => reported.insert(slide_id),
            // A poisoned set only risks a duplicate alert
            Err(poisoned) => poisoned.into_inner().insert(slide_id),
        }
    }
}

/// Best-effort message to every admin. Failures are logged and skipped.
pub async fn notify_admins<M: Messenger>(messenger: &M, admins: &[i64], text: &str) {
    if admins.is_empty() {
        tracing::warn!("No admins configured, dropping alert: {}", text);
        return;
    }
    for &admin in admins {
        if let Err(e) = messenger.send_text(admin, text, None).await {
            tracing::error!("Failed to notify admin {}: {}", admin, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingMessenger;

    #[test]
    fn test_first_report_only_once() {
        let alerts = ContentAlerts::new();
        assert!(alerts.first_report(6));
        assert!(!alerts.first_report(6));
        assert!(alerts.first_report(7));
    }

    #[tokio::test]
    async fn test_notify_admins_reaches_everyone() {
        let messenger = RecordingMessenger::new();
        notify_admins(&messenger, &[1, 2], "slide 6 is broken").await;
        assert_eq!(messenger.texts_to(1), vec!["slide 6 is broken"]);
        assert_eq!(messenger.texts_to(2), vec!["slide 6 is broken"]);
    }

    #[tokio::test]
    async fn test_notify_admins_skips_failures() {
        let messenger = RecordingMessenger::new();
        messenger.block_chat(1);
        notify_admins(&messenger, &[1, 2], "alert").await;
        assert!(messenger.texts_to(1).is_empty());
        assert_eq!(messenger.texts_to(2), vec!["alert"]);
    }
}
