use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use logsink::config::Config;
use logsink::database::Store;
use logsink::maintenance::Scheduler;
use logsink::web::start_web_server;

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("logsink=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("starting logsink");

    let config = Config::from_env()?;
    info!(
        host = %config.host,
        port = config.port,
        retention_days = config.default_retention_days,
        "configuration loaded"
    );

    let store = Store::connect(&config.database_url).await?;
    info!("store ready");

    let scheduler = Arc::new(Scheduler::new());

    start_web_server(config, store, scheduler).await?;

    Ok(())
}
