use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::MqAppConfig;

/// Worker-specific configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    /// Unique identifier for this worker instance. Default: "email-worker-1".
    #[serde(default = "default_worker_id")]
    pub id: String,
    /// Number of jobs to process concurrently. Default: 10.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_worker_id() -> String {
    "email-worker-1".into()
}
fn default_batch_size() -> usize {
    10
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: default_worker_id(),
            batch_size: default_batch_size(),
        }
    }
}

/// Sender identity stamped onto outbound mail.
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_reply_to")]
    pub reply_to: String,
}

fn default_from() -> String {
    "Castor Care Ghana <no-reply@castorcareghana.com>".into()
}
fn default_reply_to() -> String {
    "info@castorcareghana.com".into()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: default_from(),
            reply_to: default_reply_to(),
        }
    }
}

/// Worker application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerAppConfig {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

impl WorkerAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("AGRITRACE_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("worker.id", "email-worker-1")?
            .set_default("worker.batch_size", 10_i64)?
            .set_default("mq.enabled", true)?
            .set_default("mq.url", "redis://localhost:6379")?
            .set_default("mq.pool_size", 5_i64)?
            .set_default("mq.email_queue_name", "email_jobs")?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("AGRITRACE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
