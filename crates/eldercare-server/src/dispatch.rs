//! Best-effort delivery of workflow notifications.

use std::sync::Arc;

use async_trait::async_trait;
use eldercare_core::Notification;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery to {to} failed: {reason}")]
    Delivery { to: String, reason: String },
}

/// Sends one notification. Implementations may be slow or fail.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of mailing them.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            to = %notification.to,
            kind = ?notification.kind,
            subject = %notification.subject,
            "notification"
        );
        Ok(())
    }
}

/// Hands notifications to a [`Notifier`] off the request path.
///
/// Each notification is sent on its own task. Failures are logged and
/// dropped; nothing is retried.
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn dispatch(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            let notifier = Arc::clone(&self.notifier);
            tokio::spawn(async move {
                if let Err(e) = notifier.send(&notification).await {
                    warn!(kind = ?notification.kind, error = %e, "notification dropped");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eldercare_core::NotificationKind;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            if notification.to.ends_with("@bounce.test") {
                return Err(NotifyError::Delivery {
                    to: notification.to.clone(),
                    reason: "mailbox full".into(),
                });
            }
            self.sent.lock().unwrap().push(notification.to.clone());
            Ok(())
        }
    }

    fn note(to: &str) -> Notification {
        Notification::new(NotificationKind::DonationThanks, to, "Thanks", "Thank you")
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_other_sends() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(recorder.clone());

        dispatcher.dispatch(vec![note("a@x.org"), note("b@bounce.test"), note("c@x.org")]);

        tokio::time::timeout(Duration::from_secs(2), async {
            while recorder.sent.lock().unwrap().len() < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let mut sent = recorder.sent.lock().unwrap().clone();
        sent.sort();
        assert_eq!(sent, vec!["a@x.org", "c@x.org"]);
    }
}
