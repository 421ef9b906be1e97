//! Outgoing mail.
//!
//! The server only ever sends one kind of message: the password reset link.

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

/// A password reset message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetEmail {
    pub to: String,
    pub link: String,
}

impl ResetEmail {
    pub fn subject(&self) -> &'static str {
        "Reset your password"
    }

    pub fn body(&self) -> String {
        format!(
            "A password reset was requested for {}.\n\n\
             Open the link below within one hour to choose a new password:\n{}\n\n\
             If you did not ask for this, you can ignore this email.",
            self.to, self.link
        )
    }
}

/// Delivery backend for reset emails.
pub trait Mailer: Send + Sync {
    fn send(&self, email: &ResetEmail) -> Result<()>;
}

/// Default mailer: writes the message to the log.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &ResetEmail) -> Result<()> {
        tracing::info!(
            to = %email.to,
            subject = email.subject(),
            "password reset email:\n{}",
            email.body()
        );
        Ok(())
    }
}

/// In-memory mailer that keeps everything it was asked to send.
#[derive(Clone, Default)]
pub struct Outbox {
    sent: Arc<Mutex<Vec<ResetEmail>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ResetEmail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// Most recent message addressed to `to`.
    pub fn last_to(&self, to: &str) -> Option<ResetEmail> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

impl Mailer for Outbox {
    fn send(&self, email: &ResetEmail) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow!("outbox mutex poisoned"))?
            .push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbox_records_in_order() {
        let outbox = Outbox::new();
        let first = ResetEmail {
            to: "a@test.com".into(),
            link: "http://x/reset-password?token=1".into(),
        };
        let second = ResetEmail {
            to: "a@test.com".into(),
            link: "http://x/reset-password?token=2".into(),
        };
        outbox.send(&first).unwrap();
        outbox.send(&second).unwrap();

        assert_eq!(outbox.sent().len(), 2);
        assert_eq!(outbox.last_to("a@test.com"), Some(second));
        assert_eq!(outbox.last_to("b@test.com"), None);
    }

    #[test]
    fn body_carries_link() {
        let email = ResetEmail {
            to: "a@test.com".into(),
            link: "http://x/reset-password?token=abc".into(),
        };
        assert!(email.body().contains("token=abc"));
        assert!(LogMailer.send(&email).is_ok());
    }
}
