use spacebuild_client::adapters::inbound::WebSocketTransport;
use spacebuild_client::adapters::outbound::{
    init_file_logger, init_tracing_logger, BlockWorld, LoggingConsumer, MultiConsumer,
};
use spacebuild_client::application::ConnectionController;
use spacebuild_client::{Config, DynConsumer, DynLogger};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    // Load configuration
    let config = Config::load(Some(config_path.as_path()))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.filter.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting SpaceBuild client");
    info!("Server: {}", config.server.url);

    let logger: DynLogger = match &config.logging.file {
        Some(path) => match init_file_logger(path) {
            Ok(logger) => logger,
            Err(e) => {
                error!("{}; falling back to tracing", e);
                init_tracing_logger("spacebuild")
            }
        },
        None => init_tracing_logger("spacebuild"),
    };

    let world = Arc::new(BlockWorld::new(config.world.scale));
    let consumer: DynConsumer = Arc::new(MultiConsumer::new(
        world.clone(),
        Some(Arc::new(LoggingConsumer::new(logger.clone())) as DynConsumer),
    ));

    let transport = WebSocketTransport::new(config.server.connect_timeout());
    let mut controller = ConnectionController::from_config(&config, transport, consumer, logger);

    let handle = controller.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down SpaceBuild client");
            handle.shutdown();
        }
    });

    controller.start().await?;
    if let Err(e) = controller.run().await {
        error!("Connection ended with error: {}", e);
    }
    controller.shutdown().await?;

    info!(
        "Session ended in state {} with {} blocks placed ({} messages rejected)",
        controller.state(),
        world.len(),
        world.decode_errors()
    );

    Ok(())
}
