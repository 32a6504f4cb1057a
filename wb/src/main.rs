use clap::Parser;
use eyre::{Context, Result, eyre};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use walkbridge::cli::{Cli, Command};
use walkbridge::config::Config;
use walkbridge::consumer::{JsonLinesConsumer, spawn_consumer};
use walkbridge::dispatch::DispatchQueue;
use walkbridge::domain::WalkEvent;
use walkbridge::transport::socket::{cleanup_socket, create_listener_at, serve};
use walkbridge::transport::{SocketClient, WalkReceiver, WalkSender};

/// Frames buffered between the socket listener and the receiver
const RECEIVE_CHANNEL_SIZE: usize = 64;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("walkbridge")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("walkbridge.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Listen { socket } => cmd_listen(&config, socket).await,
        Command::Start { intensity, at, peer } => {
            let start_epoch_ms = match at {
                Some(at) => at,
                None => now_epoch_ms()?,
            };
            cmd_send(&config, WalkEvent::try_started(start_epoch_ms, intensity)?, peer).await
        }
        Command::End {
            intensity,
            duration,
            at,
            peer,
        } => {
            let end_epoch_ms = match at {
                Some(at) => at,
                None => now_epoch_ms()?,
            };
            cmd_send(&config, WalkEvent::try_ended(end_epoch_ms, duration, intensity)?, peer).await
        }
        Command::Decode { topic, payload } => cmd_decode(&topic, &payload),
    }
}

fn now_epoch_ms() -> Result<u64> {
    u64::try_from(chrono::Utc::now().timestamp_millis()).context("System clock is before the Unix epoch")
}

/// Run the handheld side: socket -> receiver -> dispatch queue -> stdout
async fn cmd_listen(config: &Config, socket: Option<PathBuf>) -> Result<()> {
    let socket_path = socket.unwrap_or_else(|| config.transport.socket_path.clone());
    let (listener, socket_path) = create_listener_at(&socket_path)?;

    let (dispatch, queue_task) = DispatchQueue::spawn(config.dispatch.clone());
    let (consumer, consumer_task) = spawn_consumer(JsonLinesConsumer::new(std::io::stdout()));
    dispatch.bind(consumer);

    let (tx, rx) = mpsc::channel(RECEIVE_CHANNEL_SIZE);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let receiver = WalkReceiver::new(dispatch.clone());
    let receiver_task = tokio::spawn(receiver.clone().run_until(rx, async {
        let _ = stop_rx.await;
    }));

    eprintln!("Listening on {}", socket_path.display());
    info!(socket = %socket_path.display(), "Listening for walk events");

    // Dropping `serve` stops accepting connections
    let outcome = tokio::select! {
        result = serve(listener, tx, config.transport.max_frame_bytes) => result,
        signal = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
            signal.context("Failed to listen for interrupt")
        }
    };

    // Acknowledged frames still in the channel are handled before the queue stops
    let _ = stop_tx.send(());
    match receiver_task.await {
        Ok(stats) => info!(?stats, "Receiver drained"),
        Err(e) => warn!(error = %e, "Receiver task failed"),
    }

    let metrics = dispatch.metrics().await?;
    info!(?metrics, "Dispatch queue final state");

    dispatch.shutdown();
    if let Err(e) = queue_task.await {
        warn!(error = %e, "Dispatch queue task failed");
    }
    drop(dispatch);
    drop(receiver);
    if let Err(e) = consumer_task.await {
        warn!(error = %e, "Consumer task failed");
    }

    cleanup_socket(&socket_path);
    outcome
}

/// Run the wearable side: send one event to every reachable peer
async fn cmd_send(config: &Config, event: WalkEvent, peers: Vec<PathBuf>) -> Result<()> {
    let peers = if peers.is_empty() {
        config.transport.peers.clone()
    } else {
        peers
    };

    let client = SocketClient::new(peers).with_timeout(config.transport.send_timeout());
    let sender = WalkSender::new(Arc::new(client));
    let report = sender.send(&event).await.context("Failed to send walk event")?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.failed.is_empty() && !report.reached_any() {
        return Err(eyre!("No node received {}", report.topic));
    }
    Ok(())
}

/// Decode a payload and print the resulting event
fn cmd_decode(topic: &str, payload: &str) -> Result<()> {
    let event = walkbridge::decode(topic, payload.as_bytes())?;
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}
