pub mod error;
pub mod models;

pub use error::MqError;
pub use models::{BrokerMessage, MqConfig, Notifier, init_mq};
