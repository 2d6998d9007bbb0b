use anyhow::Result;
use clap::{Parser, Subcommand};
use station_client::{ClientConfig, StationClient, StationDevice};
use station_config::{ConfigLoader, StationConfig};
use station_logging::init_logging;
use station_server::{PollOrchestrator, PollSettings, StationAdapter};
use station_shutdown::SignalHandler;
use station_state::MemoryStateStore;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "station.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Poll the station until SIGINT/SIGTERM (default)
    Run,
    /// Print the device information document
    About,
    /// Ask the station to reboot
    Restart,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new(&args.config).load_validated()?;
    init_logging(&config.logging.level, config.logging.format)?;
    info!("Starting VF Station bridge with config: {}", args.config);

    let client = Arc::new(StationClient::new(&ClientConfig {
        base_url: config.device.base_url(),
        timeout: config.device.timeout(),
    })?);

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(config, client).await,
        Command::About => about(&config, client.as_ref()).await,
        Command::Restart => restart(&config, client.as_ref()).await,
    }
}

async fn run(config: StationConfig, client: Arc<StationClient>) -> Result<()> {
    let store = Arc::new(match &config.store.checkpoint_path {
        Some(path) => MemoryStateStore::with_checkpoint(path),
        None => MemoryStateStore::new(),
    });
    if store.load_checkpoint().await? {
        info!(objects = store.len().await, "Restored objects from checkpoint");
    }

    let orchestrator = Arc::new(PollOrchestrator::new(
        client,
        store,
        PollSettings::from(&config),
    ));
    let mut adapter = StationAdapter::new(
        orchestrator,
        config.poll.interval(),
        config.poll.poll_on_start,
    );
    adapter.start();

    let (signals, _shutdown_rx) = SignalHandler::new();
    let signal = signals.wait().await?;
    info!(signal = ?signal, "Shutdown requested");

    adapter.unload(|| info!("Station bridge stopped")).await;
    Ok(())
}

async fn about(config: &StationConfig, client: &StationClient) -> Result<()> {
    client
        .login(&config.device.base_url(), &config.device.password)
        .await?;
    let document = client.get_about().await?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    logout_quietly(client).await;
    Ok(())
}

async fn restart(config: &StationConfig, client: &StationClient) -> Result<()> {
    client
        .login(&config.device.base_url(), &config.device.password)
        .await?;
    // 设备随即重启，会话随之失效，无需登出
    let response = client.restart().await?;
    info!(response = %response, "Restart requested");
    Ok(())
}

async fn logout_quietly(client: &StationClient) {
    if let Err(e) = client.logout().await {
        warn!(error = %e, "Logout failed");
    }
}
