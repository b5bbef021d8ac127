use common::EmailJob;
use mq::models::BroccoliError;
use tracing::{error, info};

use crate::config::MailConfig;
use crate::mailer::{Mailer, render};

/// Process one email job: render the template and hand the result to the
/// transport. A failed send is logged and acknowledged; mail delivery is
/// best-effort and a broken transport must not poison the queue.
pub async fn handle_email_job(
    job: EmailJob,
    mailer: &dyn Mailer,
    config: &MailConfig,
) -> Result<(), BroccoliError> {
    let job_id = job.job_id.clone();
    let mail = render(&job, config);

    match mailer.send(&mail).await {
        Ok(()) => {
            info!(job_id = %job_id, to = %mail.to, "Email sent");
        }
        Err(e) => {
            error!(job_id = %job_id, to = %mail.to, error = %e, "Failed to send email");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use common::EmailKind;

    use super::*;
    use crate::error::WorkerError;
    use crate::mailer::OutboundMail;

    struct RecordingMailer {
        sent: Mutex<Vec<OutboundMail>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: &OutboundMail) -> Result<(), WorkerError> {
            if self.fail {
                return Err(WorkerError::Mail("transport down".into()));
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    fn job() -> EmailJob {
        EmailJob::new(
            "ama@example.com",
            EmailKind::Registration {
                name: "Ama".into(),
                role: "user".into(),
                login_url: "https://app.example.com/login".into(),
            },
        )
    }

    #[tokio::test]
    async fn delivers_rendered_mail_to_transport() {
        let mailer = RecordingMailer {
            sent: Mutex::new(Vec::new()),
            fail: false,
        };
        handle_email_job(job(), &mailer, &MailConfig::default())
            .await
            .unwrap();
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ama@example.com");
    }

    #[tokio::test]
    async fn transport_failure_still_acks_the_job() {
        let mailer = RecordingMailer {
            sent: Mutex::new(Vec::new()),
            fail: true,
        };
        // Ok(()) means the message is acknowledged, not retried.
        assert!(
            handle_email_job(job(), &mailer, &MailConfig::default())
                .await
                .is_ok()
        );
    }
}
