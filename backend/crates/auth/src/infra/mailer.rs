//! Mail Gateway
//!
//! Logging mailer used until a real SMTP relay is wired in. Logs the
//! recipient and subject only; bodies may carry activation codes or
//! generated passwords and never reach the log.

use crate::domain::repository::EmailSender;
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Mailer that records the send in the log and drops the body
#[derive(Debug, Clone, Default)]
pub struct TracingMailer;

impl EmailSender for TracingMailer {
    async fn send(&self, to: &Email, subject: &str, _body: &str) -> AuthResult<()> {
        tracing::info!(to = %to, subject, "Outbound mail");
        Ok(())
    }
}
