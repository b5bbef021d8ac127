mod config;
mod error;
mod handlers;
mod mailer;

use std::sync::Arc;

use anyhow::Context;
use common::EmailJob;
use mq::{BrokerMessage, MqConfig, init_mq};
use tracing::{error, info};

use crate::handlers::email::handle_email_job;
use crate::mailer::{LogMailer, Mailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = config::WorkerAppConfig::load().context("Failed to load config")?;
    info!("Email worker starting: {}", config.worker.id);

    let notifier = init_mq(MqConfig {
        url: config.mq.url.clone(),
        pool_size: config.mq.pool_size,
        email_queue_name: config.mq.email_queue_name.clone(),
    })
    .await
    .context("Failed to initialize MQ")?;

    info!(
        queue_name = %config.mq.email_queue_name,
        batch_size = config.worker.batch_size,
        "MQ connected"
    );

    // SMTP is an external collaborator; the default transport only logs.
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);
    let mail_config = Arc::new(config.mail.clone());

    let result = notifier
        .queue()
        .process_messages(
            &config.mq.email_queue_name,
            Some(config.worker.batch_size),
            None,
            move |message: BrokerMessage<EmailJob>| {
                let mailer = Arc::clone(&mailer);
                let mail_config = Arc::clone(&mail_config);
                async move { handle_email_job(message.payload, mailer.as_ref(), &mail_config).await }
            },
        )
        .await;

    if let Err(e) = result {
        error!(error = %e, "Worker stopped unexpectedly");
    }

    Ok(())
}
