//! touchfree CLI
//!
//! Talks to a running TouchFree service: query and change its state, watch
//! the event stream, and manage configuration files for the client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use serde::Serialize;
use tokio_stream::StreamExt;
use touchfree_client::protocol::{Lens, QuickSetupPosition};
use touchfree_client::{ClientEvent, TouchFreeClient};
use touchfree_config::Config;
use tracing_subscriber::EnvFilter;

/// How long to wait for the handshake before giving up
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "touchfree")]
#[command(about = "Client for the TouchFree tracking service")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/touchfree/client.kdl")]
    config: String,

    /// Service address (overrides config setting)
    #[arg(long)]
    address: Option<String>,

    /// Service port (overrides config setting)
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration file
    Validate,

    /// Write a documented default configuration file
    Init {
        /// Output path (defaults to the --config path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print client events as JSON lines
    Watch {
        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Also request the binary hand data stream
        #[arg(long)]
        hand_data: bool,
    },

    /// Show service status
    Status,

    /// Show the service configuration
    Config {
        /// Show the configuration file instead of the live state
        #[arg(long)]
        file: bool,
    },

    /// Show tracking settings
    Tracking,

    /// Run quick setup with the hand at the given screen edge
    QuickSetup {
        #[arg(value_enum)]
        position: Position,
    },

    /// Inspect or change the license
    License {
        #[command(subcommand)]
        action: LicenseCommand,
    },

    /// Record input action counts in an analytics session
    Analytics {
        /// Application name for the session ID
        #[arg(long)]
        app: Option<String>,

        /// Session length in seconds
        #[arg(short, long, default_value_t = 60)]
        duration: u64,
    },
}

#[derive(Subcommand, Debug)]
enum LicenseCommand {
    /// Show the license state
    State,
    /// Add a license key
    Add { key: String },
    /// Remove a license key
    Remove { key: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Position {
    Top,
    Bottom,
}

impl From<Position> for QuickSetupPosition {
    fn from(position: Position) -> Self {
        match position {
            Position::Top => QuickSetupPosition::Top,
            Position::Bottom => QuickSetupPosition::Bottom,
        }
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();

    match cli.command {
        Commands::Validate => {
            init_tracing("warn");
            cmd_validate(&config_path)
        }
        Commands::Init { output, force } => {
            init_tracing("warn");
            cmd_init(output.as_deref().unwrap_or(&config_path), force)
        }
        command => {
            let mut config = touchfree_config::load_config(&config_path)?;
            if let Some(address) = cli.address {
                config.service.address = address;
            }
            if let Some(port) = cli.port {
                config.service.port = port;
            }
            init_tracing(config.global.log_level.as_filter());

            run(command, config)
                .await
                .map_err(|e| miette::miette!("{:#}", e))
        }
    }
}

/// RUST_LOG wins over the configured level.
fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn cmd_validate(config_path: &Path) -> miette::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = touchfree_config::parse_config(config_path)?;
    println!("Configuration is valid!");
    println!("  Service: {}", config.service.url());
    println!("  Tick rate: {} Hz", config.timing.tick_rate);
    println!(
        "  Callback timeout: {} ms (license changes {} s)",
        config.timing.callback_timeout.as_millis(),
        config.timing.license_change_timeout.as_secs()
    );
    println!(
        "  Analytics application: {}",
        config.analytics.application_name
    );
    Ok(())
}

fn cmd_init(output: &Path, force: bool) -> miette::Result<()> {
    if output.exists() && !force {
        return Err(miette::miette!(
            "{} already exists (use --force to overwrite)",
            output.display()
        ));
    }

    let content = touchfree_config::generate_default_config(&Config::default());

    // Ensure parent directory exists
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).into_diagnostic()?;
    }
    std::fs::write(output, content).into_diagnostic()?;

    println!("Wrote default configuration: {}", output.display());
    Ok(())
}

async fn run(command: Commands, config: Config) -> anyhow::Result<()> {
    let application_name = config.analytics.application_name.clone();
    let client = connect(config).await?;

    let result = execute(&client, command, application_name).await;
    client.shutdown().await?;
    result
}

async fn execute(
    client: &TouchFreeClient,
    command: Commands,
    application_name: String,
) -> anyhow::Result<()> {
    match command {
        Commands::Watch {
            duration,
            hand_data,
        } => cmd_watch(client, duration.map(Duration::from_secs), hand_data).await,
        Commands::Status => print_json(&client.request_service_status().await?),
        Commands::Config { file: false } => print_json(&client.request_config_state().await?),
        Commands::Config { file: true } => {
            print_json(&client.request_config_file_state().await?)
        }
        Commands::Tracking => print_json(&client.request_tracking_state().await?),
        Commands::QuickSetup { position } => {
            let (response, config) = client.quick_setup(position.into()).await?;
            print_json(&response)?;
            print_json(&config)
        }
        Commands::License { action } => cmd_license(client, action).await,
        Commands::Analytics { app, duration } => {
            let app = app.unwrap_or(application_name);
            cmd_analytics(client, &app, Duration::from_secs(duration)).await
        }
        Commands::Validate | Commands::Init { .. } => Ok(()),
    }
}

async fn connect(config: Config) -> anyhow::Result<TouchFreeClient> {
    let url = config.service.url();
    let client = TouchFreeClient::spawn(config)?;
    client.connect()?;
    client
        .wait_until_connected(CONNECT_TIMEOUT)
        .await
        .with_context(|| format!("Could not reach the TouchFree service at {}", url))?;
    tracing::info!("Connected to {}", url);
    Ok(client)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_watch(
    client: &TouchFreeClient,
    duration: Option<Duration>,
    hand_data: bool,
) -> anyhow::Result<()> {
    let mut events = client.events();
    if hand_data {
        client
            .set_hand_data_stream(true, Lens::Left)
            .await
            .context("Failed to enable the hand data stream")?;
    }

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => println!("{}", serde_json::to_string(&event)?),
                Some(Err(e)) => tracing::warn!("Event stream lagged: {}", e),
                None => break,
            },
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if hand_data {
        client.set_hand_data_stream(false, Lens::Left).await?;
    }
    Ok(())
}

async fn cmd_license(client: &TouchFreeClient, action: LicenseCommand) -> anyhow::Result<()> {
    let response = match action {
        LicenseCommand::State => return print_json(&client.request_license_state().await?),
        LicenseCommand::Add { key } => client.add_license_key(&key).await?,
        LicenseCommand::Remove { key } => client.remove_license_key(&key).await?,
    };

    print_json(&response)?;
    if !response.succeeded {
        anyhow::bail!("License change failed: {}", response.change_details);
    }
    Ok(())
}

async fn cmd_analytics(
    client: &TouchFreeClient,
    application_name: &str,
    duration: Duration,
) -> anyhow::Result<()> {
    let mut events = client.events();
    let session_id = client
        .start_analytics_session(application_name, false)
        .await
        .context("Failed to start analytics session")?;
    println!("Analytics session {} started", session_id);

    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(ClientEvent::InputAction(action))) => {
                    let name = serde_json::to_value(action.input_type)?;
                    if let Some(name) = name.as_str() {
                        client.record_analytics_event(name)?;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => tracing::warn!("Event stream lagged: {}", e),
                None => break,
            },
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client
        .stop_analytics_session()
        .await
        .context("Failed to stop analytics session")?;
    println!("Analytics session {} stopped", session_id);
    Ok(())
}
