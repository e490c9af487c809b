use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

/// Outgoing mail seam, delivery itself is left to the deployment
pub trait Mailer: Send + Sync {
    fn send(&self, message: Message) -> BoxFuture<'_, Result<(), MailError>>;
}

/// Writes mails to the log instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: Message) -> BoxFuture<'_, Result<(), MailError>> {
        info!(
            "Mail from {} to {}: {}",
            message.from, message.to, message.subject
        );
        debug!("Mail body:\n{}", message.body);
        Box::pin(future::ready(Ok(())))
    }
}

/// Keeps sent mails in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<Message>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Last mail sent to `to`
    pub fn last_to(&self, to: &str) -> Option<Message> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, message: Message) -> BoxFuture<'_, Result<(), MailError>> {
        let res = self
            .sent
            .lock()
            .map(|mut sent| sent.push(message))
            .map_err(|e| MailError::Delivery(e.to_string()));
        Box::pin(future::ready(res))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_log_mailer() {
        LogMailer
            .send(Message {
                from: "noreply@example.com".into(),
                to: "diver@example.com".into(),
                subject: "Welcome".into(),
                body: "Blub".into(),
            })
            .await
            .unwrap();
        assert!(logs_contain("Mail from noreply@example.com to diver@example.com"));
    }

    #[tokio::test]
    async fn test_recording_mailer() {
        let mailer = RecordingMailer::new();
        let shared: Arc<dyn Mailer> = Arc::new(mailer.clone());
        for to in ["a@example.com", "b@example.com", "a@example.com"] {
            shared
                .send(Message {
                    from: "noreply@example.com".into(),
                    to: to.into(),
                    subject: format!("Hello {to}"),
                    body: String::new(),
                })
                .await
                .unwrap();
        }
        assert_eq!(mailer.sent().len(), 3);
        assert_eq!(
            mailer.last_to("b@example.com").unwrap().subject,
            "Hello b@example.com"
        );
        assert!(mailer.last_to("c@example.com").is_none());
    }
}
