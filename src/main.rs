use dotenv::dotenv;
use relay_server::Settings;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> relay_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers as usize)
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let addr = config.server.bind_addr();
        let listener = TcpListener::bind(&addr).await?;
        info!("Listening on {}", addr);

        relay_server::serve(config, listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    })
}
