use async_trait::async_trait;
use common::{EmailJob, EmailKind};
use tracing::info;

use crate::config::MailConfig;
use crate::error::WorkerError;

/// A fully rendered outbound email.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMail {
    pub from: String,
    pub reply_to: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Mail transport seam. SMTP (or any other delivery mechanism) lives behind
/// this trait; the worker itself only renders and hands off.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutboundMail) -> Result<(), WorkerError>;
}

/// Default transport: logs the mail instead of sending it. Used when no real
/// transport is configured, and in tests.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutboundMail) -> Result<(), WorkerError> {
        info!(to = %mail.to, subject = %mail.subject, "Mail rendered (log transport, not sent)");
        Ok(())
    }
}

/// Render an email job into an outbound mail using the configured sender
/// identity.
pub fn render(job: &EmailJob, config: &MailConfig) -> OutboundMail {
    let (subject, html) = match &job.kind {
        EmailKind::Registration {
            name,
            role,
            login_url,
        } => (
            "User Registration".to_string(),
            format!(
                "<p>Hi {name},</p>\
                 <p>Account created successfully on {} as a {role}.</p>\
                 <p>Log in to interact with us. Click the link below.</p>\
                 <a style=\"font-size: 14px;\" href=\"{login_url}\">{login_url}</a>",
                job.enqueued_at.format("%a %b %e %Y"),
            ),
        ),
        EmailKind::PasswordReset { reset_url } => (
            "Password Reset".to_string(),
            format!(
                "<p>Click the link to reset your password. The link expires in one hour.</p>\
                 <a href=\"{reset_url}\">{reset_url}</a>"
            ),
        ),
    };

    OutboundMail {
        from: config.from.clone(),
        reply_to: config.reply_to.clone(),
        to: job.to.clone(),
        subject,
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MailConfig {
        MailConfig::default()
    }

    #[test]
    fn registration_mail_carries_name_role_and_login_link() {
        let job = EmailJob::new(
            "ama@example.com",
            EmailKind::Registration {
                name: "Ama".into(),
                role: "user".into(),
                login_url: "https://app.example.com/login".into(),
            },
        );
        let mail = render(&job, &config());
        assert_eq!(mail.subject, "User Registration");
        assert_eq!(mail.to, "ama@example.com");
        assert!(mail.html.contains("Hi Ama"));
        assert!(mail.html.contains("as a user"));
        assert!(mail.html.contains("https://app.example.com/login"));
    }

    #[test]
    fn reset_mail_embeds_reset_url() {
        let job = EmailJob::new(
            "kofi@example.com",
            EmailKind::PasswordReset {
                reset_url: "https://app.example.com/reset-password/tok123".into(),
            },
        );
        let mail = render(&job, &config());
        assert_eq!(mail.subject, "Password Reset");
        assert!(mail.html.contains("reset-password/tok123"));
    }
}
