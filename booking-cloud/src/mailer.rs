//! Guest notifications
//!
//! Renders the message and hands it to the log. Delivery through a mail
//! provider plugs in behind the same [`Notifier`] trait.

use async_trait::async_trait;
use booking_engine::notify::{self, NotificationKind, NotificationParams, Notifier, NotifyError};

pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Notifier for LogMailer {
    async fn send(
        &self,
        recipient: &str,
        kind: NotificationKind,
        params: &NotificationParams,
    ) -> Result<(), NotifyError> {
        if !recipient.contains('@') {
            return Err(NotifyError::Rejected(format!(
                "invalid recipient: {recipient}"
            )));
        }
        let message = notify::render(kind, params);
        tracing::info!(
            from = %self.from,
            to = %recipient,
            kind = kind.as_str(),
            subject = %message.subject,
            "Guest email queued"
        );
        tracing::debug!(body = %message.body, "Guest email body");
        Ok(())
    }
}
