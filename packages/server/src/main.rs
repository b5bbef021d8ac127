use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{Level, info, warn};

use server::config::AppConfig;
use server::state::AppState;
use server::{build_router, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database).await?;
    info!("Database connected and schema synced");

    // MQ is optional: with no broker the API still serves requests and email
    // jobs are dropped with a log line.
    let notifier = if config.mq.enabled {
        let mq_config = mq::MqConfig {
            url: config.mq.url.clone(),
            pool_size: config.mq.pool_size,
            email_queue_name: config.mq.email_queue_name.clone(),
        };
        match mq::init_mq(mq_config).await {
            Ok(notifier) => {
                info!(queue = %config.mq.email_queue_name, "MQ connected");
                Some(Arc::new(notifier))
            }
            Err(e) => {
                warn!(error = %e, "MQ unavailable, email notifications disabled");
                None
            }
        }
    } else {
        info!("MQ disabled by configuration");
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState {
        db,
        config: Arc::new(config),
        notifier,
    };

    let app = build_router(state);

    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
