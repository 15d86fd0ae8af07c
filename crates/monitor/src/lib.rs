//! Drowsiness Monitor Host
//!
//! Wires a monitoring session to its collaborators and drives it from a
//! periodic timer until the recording ends or the process is interrupted.

pub mod cli;
pub mod replay;
pub mod settings;

pub use cli::Cli;
pub use replay::ReplayProvider;
pub use settings::{EventLogConfig, LoggingConfig, MonitorConfig, ReplayConfig};

use alerting::{AlertError, EventForwarder, EventLog, JsonLinesEventLog, TracingEventLog};
use camera_capture::{CameraConfig, SyntheticSource};
use dms::{DmsError, DriverStatus, LogSink, MonitoringSession};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Host error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Dms(#[from] DmsError),

    #[error(transparent)]
    Alert(#[from] AlertError),

    #[error("Replay error: {0}")]
    Replay(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Status at the moment the session stopped
    pub final_status: DriverStatus,
    /// Ticks that reached the classifier
    pub classified_ticks: u64,
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) {
    let parsed = config.max_level();
    let level = parsed.unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    if result.is_err() {
        warn!("Tracing subscriber already set, keeping the existing one");
    }
    if parsed.is_none() {
        warn!("Unknown log level {:?}, using info", config.level);
    }
}

/// Build the configured event log
pub fn open_event_log(config: &EventLogConfig) -> Result<Box<dyn EventLog>, MonitorError> {
    let log: Box<dyn EventLog> = match &config.path {
        Some(path) => Box::new(JsonLinesEventLog::create(path)?),
        None => Box::new(TracingEventLog),
    };
    Ok(log)
}

/// Run a replay session from configuration
pub async fn run(config: &MonitorConfig) -> Result<RunSummary, MonitorError> {
    let path = config
        .replay
        .path
        .as_ref()
        .ok_or_else(|| MonitorError::Replay("replay.path is not configured".into()))?;
    let provider = ReplayProvider::open(path)?;
    let log = open_event_log(&config.event_log)?;
    run_session(config, provider, log).await
}

/// Drive a session over `provider` until it is exhausted or ctrl-c arrives
pub async fn run_session<L: EventLog>(
    config: &MonitorConfig,
    provider: ReplayProvider,
    log: L,
) -> Result<RunSummary, MonitorError> {
    run_session_until(config, provider, log, tokio::signal::ctrl_c()).await
}

/// Drive a session until `provider` is exhausted or `shutdown` resolves.
///
/// A `shutdown` that resolves with an error is logged and then ignored.
pub async fn run_session_until<L, F>(
    config: &MonitorConfig,
    provider: ReplayProvider,
    log: L,
    shutdown: F,
) -> Result<RunSummary, MonitorError>
where
    L: EventLog,
    F: Future<Output = std::io::Result<()>>,
{
    let camera = CameraConfig::cabin();
    let mut session =
        MonitoringSession::start(&config.dms, || SyntheticSource::open(&camera), provider)?;

    let (forwarder, delivery) = EventForwarder::spawn(&config.event_log.forwarder, log);
    session.add_sink(LogSink::default());
    session.add_sink(forwarder);

    let period = Duration::from_millis(config.replay.frame_interval_ms.max(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::pin!(shutdown);

    let mut signal_failed = false;
    let mut classified_ticks = 0u64;
    loop {
        tokio::select! {
            signal = &mut shutdown, if !signal_failed => {
                match signal {
                    Ok(()) => {
                        info!("Interrupted, stopping monitoring");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to listen for ctrl-c, continuing without it: {}", e);
                        signal_failed = true;
                    }
                }
            }
            now = interval.tick() => {
                if session.tick(now.into_std()).is_some() {
                    classified_ticks += 1;
                }
                if session.provider_mut().is_exhausted() {
                    info!("Replay finished after {} classified ticks", classified_ticks);
                    break;
                }
            }
        }
    }

    let snapshot = session.stop();
    if let Err(e) = delivery.await {
        warn!("Event delivery task ended abnormally: {}", e);
    }

    Ok(RunSummary {
        final_status: snapshot.status,
        classified_ticks,
    })
}
