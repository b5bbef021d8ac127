use std::sync::Arc;

use mq::Notifier;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    /// None when MQ is disabled; email jobs are then dropped with a log line.
    pub notifier: Option<Arc<Notifier>>,
}
