use broccoli_queue::queue::BroccoliQueue;
pub use broccoli_queue::{brokers::broker::BrokerMessage, error::BroccoliError};
use common::EmailJob;

use crate::error::MqError;

pub struct MqConfig {
    pub url: String,
    pub pool_size: u8,
    pub email_queue_name: String,
}

/// Handle for publishing notification jobs.
///
/// Constructed once at process start and injected through application state.
/// The broker connection is deliberately not exposed: request handlers only
/// get `publish`, so there is no ambient shared channel to reach around.
pub struct Notifier {
    queue: BroccoliQueue,
    email_queue_name: String,
}

impl Notifier {
    /// Publish an email job. Fire-and-forget from the caller's perspective;
    /// the error is returned so the call site can log it, but nothing blocks
    /// on delivery.
    pub async fn publish(&self, job: &EmailJob) -> Result<(), MqError> {
        self.queue
            .publish(&self.email_queue_name, None, job, None)
            .await?;
        Ok(())
    }

    /// The underlying queue, for consumers (the worker). Publishing code
    /// should go through [`Notifier::publish`].
    pub fn queue(&self) -> &BroccoliQueue {
        &self.queue
    }

    pub fn email_queue_name(&self) -> &str {
        &self.email_queue_name
    }
}

pub async fn init_mq(config: MqConfig) -> Result<Notifier, MqError> {
    let queue = BroccoliQueue::builder(&config.url)
        .pool_connections(config.pool_size)
        .build()
        .await
        .map_err(MqError::from)?;
    Ok(Notifier {
        queue,
        email_queue_name: config.email_queue_name,
    })
}
