//! thermoctl - command line client for thermod

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use thermo_api::{
    Command, EventPayload, HealthStatus, ObjectView, Response, ResponsePayload, ResponseResult,
};
use thermo_ipc::IpcClient;
use thermo_util::default_socket_path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "thermoctl")]
#[command(about = "Query and control the thermod thermal supervisor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Daemon socket (or set THERMOD_SOCKET env var)
    #[arg(short, long, env = "THERMOD_SOCKET", default_value_os_t = default_socket_path(), global = true)]
    socket: PathBuf,

    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the aggregate thermal state
    State,
    /// List thermal objects and their status
    Objects,
    /// Print thermal events as they happen
    Watch,
    /// Turn tuning file reloading on or off (admin only)
    Tuning {
        #[arg(value_enum)]
        mode: Toggle,
    },
    /// Show daemon health
    Health,
    /// Check that the daemon answers
    Ping,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    debug!(socket = %cli.socket.display(), command = ?cli.command, "Connecting");

    let mut client = IpcClient::connect(&cli.socket)
        .await
        .with_context(|| format!("Failed to connect to thermod at {:?}", cli.socket))?;

    let command = match cli.command {
        Commands::State => Command::GetThermalState,
        Commands::Objects => Command::ListObjects,
        Commands::Tuning { mode } => Command::SetTuningMode {
            enabled: mode == Toggle::On,
        },
        Commands::Health => Command::GetHealth,
        Commands::Ping => Command::Ping,
        Commands::Watch => return watch(client, cli.json).await,
    };

    let response = client.send(command).await.context("Request failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", render_response(response)?);
    Ok(())
}

async fn watch(client: IpcClient, json: bool) -> Result<()> {
    let mut events = client.subscribe().await.context("Subscribe failed")?;

    loop {
        let event = events.next().await.context("Event stream ended")?;

        if json {
            println!("{}", serde_json::to_string(&event)?);
            continue;
        }

        let text = match &event.payload {
            EventPayload::StateChangeInd { state } => format!("thermal status: {}", state),
            EventPayload::ThermalOverheat { overheated: true } => "device overheated".into(),
            EventPayload::ThermalOverheat { overheated: false } => {
                "device no longer overheated".into()
            }
            EventPayload::Shutdown => {
                println!("{} thermod shutting down", event.timestamp.format("%H:%M:%S"));
                return Ok(());
            }
        };

        println!("{} {}", event.timestamp.format("%H:%M:%S"), text);
    }
}

fn render_response(response: Response) -> Result<String> {
    let payload = match response.result {
        ResponseResult::Ok(payload) => payload,
        ResponseResult::Err(e) => bail!("thermod: {} ({:?})", e.message, e.code),
    };

    Ok(match payload {
        ResponsePayload::ThermalState { state } => state.to_string(),
        ResponsePayload::Objects { objects } => render_objects(&objects),
        ResponsePayload::TuningMode { enabled } => {
            format!("tuning {}", if enabled { "on" } else { "off" })
        }
        ResponsePayload::Health(health) => render_health(&health),
        ResponsePayload::Pong => "pong".into(),
        ResponsePayload::Subscribed { client_id } => format!("subscribed as {}", client_id),
        ResponsePayload::Unsubscribed => "unsubscribed".into(),
    })
}

fn render_objects(objects: &[ObjectView]) -> String {
    if objects.is_empty() {
        return "no thermal objects".into();
    }

    let width = objects.iter().map(|o| o.name.len()).max().unwrap_or(0).max(4);
    let mut out = format!("{:<width$}  {:<7}  {}", "NAME", "STATUS", "PENDING");

    for object in objects {
        out.push('\n');
        out.push_str(&format!(
            "{:<width$}  {:<7}  {}",
            object.name,
            object.status.name(),
            if object.request_pending { "yes" } else { "no" }
        ));
    }

    out
}

fn render_health(health: &HealthStatus) -> String {
    format!(
        "live: {}\nobjects: {}\npending requests: {}\ntuning: {}\nreaper running: {}",
        health.live,
        health.object_count,
        health.pending_requests,
        if health.tuning_enabled { "on" } else { "off" },
        health.reaper_running
    )
}
