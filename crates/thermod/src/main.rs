//! thermod - thermal supervision service
//!
//! This is the main entry point for the thermod service.
//! It wires together all the components:
//! - Configuration loading
//! - Thermal manager (classification, aggregation, notification)
//! - Sysfs sensors and heartbeat wake timers
//! - Temp reaper and disk space monitor
//! - IPC server

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use thermo_api::{
    Command, ErrorCode, ErrorInfo, Event, EventPayload, HealthStatus, Response, ResponsePayload,
};
use thermo_config::{ObjectDefinition, SensorSpec, Settings, load_config};
use thermo_core::{CoreEvent, ManagerSettings, ThermalManager};
use thermo_host_api::{
    HostEvent, SensorEvent, SensorEventReceiver, TemperatureSensor, WakeScheduler,
};
use thermo_host_linux::{DiskMonitor, HeartbeatScheduler, SysfsSensor, TempReaper};
use thermo_ipc::{IpcServer, ServerMessage};
use thermo_store::FileTemperatureLog;
use thermo_util::{ClientId, MonotonicInstant, default_config_path};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// thermod - thermal state supervision
#[derive(Parser, Debug)]
#[command(name = "thermod")]
#[command(about = "Thermal state supervision daemon", long_about = None)]
struct Args {
    /// Configuration file path (default: /etc/thermod/thermod.toml)
    #[arg(short, long, env = "THERMOD_CONFIG", default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set THERMOD_SOCKET env var)
    #[arg(short, long, env = "THERMOD_SOCKET")]
    socket: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    config_path: PathBuf,
    settings: Settings,
    manager: ThermalManager,
    scheduler: Arc<HeartbeatScheduler>,
    reaper: Option<TempReaper>,
    ipc: Arc<IpcServer>,
    sensor_rx: SensorEventReceiver,
    host_tx: mpsc::UnboundedSender<HostEvent>,
    host_rx: mpsc::UnboundedReceiver<HostEvent>,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let settings = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            object_count = settings.objects.len(),
            "Configuration loaded"
        );

        let socket_path = args
            .socket
            .clone()
            .unwrap_or_else(|| settings.daemon.socket_path.clone());

        let (sensor_tx, sensor_rx) = mpsc::unbounded_channel();
        let (host_tx, host_rx) = mpsc::unbounded_channel();

        let mut manager = ThermalManager::new(ManagerSettings::from(&settings.daemon), sensor_tx);
        if let Some(path) = &settings.daemon.temperature_log {
            info!(path = %path.display(), "Temperature logging enabled");
            manager = manager.with_temperature_log(Arc::new(FileTemperatureLog::new(path)));
        }

        let scheduler = Arc::new(HeartbeatScheduler::new(
            settings.daemon.heartbeat_period,
            host_tx.clone(),
        ));

        let reaper = settings
            .reaper
            .enabled
            .then(|| TempReaper::new(settings.reaper.clone(), host_tx.clone()));

        let mut ipc = IpcServer::new(&socket_path);
        ipc.start()
            .await
            .with_context(|| format!("Failed to start IPC server on {:?}", socket_path))?;

        Ok(Self {
            config_path: args.config.clone(),
            settings,
            manager,
            scheduler,
            reaper,
            ipc: Arc::new(ipc),
            sensor_rx,
            host_tx,
            host_rx,
        })
    }

    async fn run(mut self) -> Result<()> {
        let definitions = self.settings.objects.clone();
        self.register_all(&definitions);

        let _disk_monitor: Option<JoinHandle<()>> = self
            .reaper
            .is_some()
            .then(|| DiskMonitor::new(&self.settings.reaper, self.host_tx.clone()).start());

        let mut ipc_messages = self
            .ipc
            .take_message_receiver()
            .await
            .context("IPC message receiver already taken")?;

        let ipc_accept = self.ipc.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                warn!(error = %e, "IPC server error");
            }
        });

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                // SIGHUP: re-read configuration
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading configuration");
                    self.reload();
                }

                Some(SensorEvent::Temperature { object, request_seq, reading }) = self.sensor_rx.recv() => {
                    let events = self.manager.receive_temperature(object, request_seq, reading);
                    self.dispatch(events);
                }

                Some(host_event) = self.host_rx.recv() => {
                    self.handle_host_event(host_event);
                }

                Some(msg) = ipc_messages.recv() => {
                    self.handle_ipc_message(msg).await;
                }
            }
        }

        info!("Shutting down thermod");

        self.scheduler.cancel_all();
        if let Some(reaper) = &mut self.reaper {
            reaper.kill();
        }
        self.ipc.broadcast_event(Event::new(EventPayload::Shutdown));
        self.ipc.shutdown();

        info!("Shutdown complete");
        Ok(())
    }

    fn register_all(&mut self, definitions: &[ObjectDefinition]) {
        for definition in definitions {
            let sensor = build_sensor(&definition.sensor);
            let (_, events) = self.manager.register(&definition.config, sensor);
            self.dispatch(events);
        }
    }

    /// Swap in a freshly loaded configuration. A bad file keeps the
    /// running one; objects that keep their name keep their status.
    fn reload(&mut self) {
        let settings = match load_config(&self.config_path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Configuration reload failed; keeping current configuration");
                return;
            }
        };

        self.manager
            .update_settings(ManagerSettings::from(&settings.daemon));

        let objects = settings
            .objects
            .iter()
            .map(|definition| (&definition.config, build_sensor(&definition.sensor)));
        let events = self.manager.replace_all(objects);
        self.dispatch(events);

        info!(object_count = settings.objects.len(), "Configuration reloaded");
        self.settings = settings;
    }

    /// Carry out what the thermal manager asked for
    fn dispatch(&self, events: Vec<CoreEvent>) {
        for event in events {
            match event {
                CoreEvent::StateChanged { status } => {
                    self.ipc
                        .broadcast_event(Event::new(EventPayload::StateChangeInd { state: status }));
                }
                CoreEvent::OverheatChanged { overheated } => {
                    self.ipc
                        .broadcast_event(Event::new(EventPayload::ThermalOverheat { overheated }));
                }
                CoreEvent::WaitRequested(request) => {
                    self.scheduler.wait(request);
                }
                CoreEvent::WaitCancelled { target } => {
                    self.scheduler.cancel(target);
                }
            }
        }
    }

    fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Wakeup { target } => {
                let events = self.manager.poll(target, MonotonicInstant::now());
                self.dispatch(events);
            }
            HostEvent::DiskSpaceLow { mount_path } => match &mut self.reaper {
                Some(reaper) => {
                    reaper.on_disk_space(&mount_path);
                }
                None => debug!(mount = %mount_path.display(), "Temp reaper disabled"),
            },
            HostEvent::ReaperExited { pid, status } => {
                if let Some(reaper) = &mut self.reaper {
                    reaper.on_exit(pid, &status);
                }
            }
        }
    }

    async fn handle_ipc_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                let response = self
                    .handle_command(&client_id, request.request_id, request.command)
                    .await;
                if let Err(e) = self.ipc.send_response(&client_id, response).await {
                    debug!(client_id = %client_id, error = %e, "Failed to send response");
                }
            }
            ServerMessage::ClientConnected { client_id, info } => {
                info!(
                    client_id = %client_id,
                    role = ?info.role,
                    uid = ?info.uid,
                    "Client connected"
                );
            }
            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");
            }
        }
    }

    async fn handle_command(
        &mut self,
        client_id: &ClientId,
        request_id: u64,
        command: Command,
    ) -> Response {
        match command {
            Command::GetThermalState => Response::success(
                request_id,
                ResponsePayload::ThermalState {
                    state: self.manager.thermal_state(),
                },
            ),

            Command::ListObjects => Response::success(
                request_id,
                ResponsePayload::Objects {
                    objects: self.manager.objects(),
                },
            ),

            Command::SetTuningMode { enabled } => {
                let allowed = self
                    .ipc
                    .get_client_info(client_id)
                    .await
                    .is_some_and(|info| info.role.can_set_tuning());

                if !allowed {
                    return Response::error(
                        request_id,
                        ErrorInfo::new(ErrorCode::PermissionDenied, "Admin role required"),
                    );
                }

                self.manager.set_tuning_enabled(enabled);
                Response::success(request_id, ResponsePayload::TuningMode { enabled })
            }

            Command::SubscribeEvents => Response::success(
                request_id,
                ResponsePayload::Subscribed {
                    client_id: client_id.clone(),
                },
            ),

            Command::UnsubscribeEvents => {
                Response::success(request_id, ResponsePayload::Unsubscribed)
            }

            Command::GetHealth => {
                let health = HealthStatus {
                    live: true,
                    object_count: self.manager.object_count(),
                    pending_requests: self.manager.pending_requests(),
                    tuning_enabled: self.manager.tuning_enabled(),
                    reaper_running: self.reaper.as_ref().is_some_and(TempReaper::is_running),
                };
                Response::success(request_id, ResponsePayload::Health(health))
            }

            Command::Ping => Response::success(request_id, ResponsePayload::Pong),
        }
    }
}

fn build_sensor(spec: &SensorSpec) -> Arc<dyn TemperatureSensor> {
    match spec {
        SensorSpec::Sysfs { path } => Arc::new(SysfsSensor::new(path)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "thermod starting");

    let service = Service::new(&args).await?;
    service.run().await
}
