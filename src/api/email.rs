//! Outbound email dispatch.
//!
//! Delivery is fire-and-forget: messages are handed to a background task
//! after the triggering database write has committed, so a mail failure can
//! only ever be logged; it cannot roll back or block registration. The
//! `EmailSender` trait is the seam for real transports (SMTP, provider
//! API); the default sender just logs the payload.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error to have it logged.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.body,
            "email send stub"
        );
        Ok(())
    }
}

/// Build the verification email for an account.
pub(crate) fn verification_email(
    frontend_url: &str,
    first_name: &str,
    last_name: &str,
    to_email: &str,
    token: &str,
) -> EmailMessage {
    let base = frontend_url.trim_end_matches('/');
    let verify_url = format!("{base}/verify-email#token={token}");
    let body = format!(
        "Hello {first_name} {last_name},\n\n\
         Please confirm your email address by opening the link below:\n\n\
         {verify_url}\n\n\
         The link is valid for 12 hours. If you did not create an account,\n\
         you can ignore this message.\n"
    );
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Verification Email".to_string(),
        body,
    }
}

/// Hand a message to a background task. Failures are logged and dropped.
pub(crate) fn spawn_send(sender: Arc<dyn EmailSender>, message: EmailMessage) {
    tokio::spawn(async move {
        if let Err(err) = sender.send(&message) {
            error!(to_email = %message.to_email, "failed to send email: {err}");
        }
    });
}
