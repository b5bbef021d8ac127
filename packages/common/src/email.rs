use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of email to send, with the template data it needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmailKind {
    /// Account-created confirmation, sent after registration.
    Registration {
        /// Display name of the new account.
        name: String,
        /// Role the account was created with ("user" or "admin").
        role: String,
        /// Login page URL for the client application.
        login_url: String,
    },
    /// Password-reset link, sent from the forgot-password flow.
    PasswordReset {
        /// Full reset URL including the one-hour token.
        reset_url: String,
    },
}

/// An email job message published to the email queue.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailJob {
    /// Job identifier (UUID), used for log correlation.
    pub job_id: String,
    /// Recipient address.
    pub to: String,
    pub kind: EmailKind,
    /// When the job was enqueued.
    pub enqueued_at: DateTime<Utc>,
}

impl EmailJob {
    pub fn new(to: impl Into<String>, kind: EmailKind) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            to: to.into(),
            kind,
            enqueued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_job_round_trips_through_json() {
        let job = EmailJob::new(
            "ama@example.com",
            EmailKind::PasswordReset {
                reset_url: "https://app.example.com/reset-password/tok".into(),
            },
        );
        let json = serde_json::to_string(&job).unwrap();
        let back: EmailJob = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to, "ama@example.com");
        assert!(matches!(back.kind, EmailKind::PasswordReset { .. }));
    }
}
