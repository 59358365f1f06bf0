use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{error, info, warn};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;

use super::transmitter::Transmitter;
use crate::config::Config;
use crate::experiment::{Experiment, ExperimentError, ExperimentPhase};
use crate::fault::{FaultSender, FaultSource};
use crate::gpio::{DryRunPin, OutputPin, SysfsPin};
use crate::sensors::{spawn_feed, FeedSource};
use crate::telemetry::{SharedSample, TelemetrySample};
use crate::transport::{
    send_tuning_command, ConsoleTransport, SerialTransport, TelemetryLog, Transport,
    TransportError,
};

// Pause after a failed send so a dead port does not flood the log.
const SEND_RETRY_PAUSE: Duration = Duration::from_secs(1);
const DRY_RUN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum FlightError {
    #[error("experiment: {0}")]
    Experiment(#[from] ExperimentError),
    #[error("radio: {0}")]
    Transport(#[from] TransportError),
    #[error("frequency: {0}")]
    Frequency(#[from] crate::radio::FrequencyError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct FlightOptions {
    /// JSON-lines sensor feed; `-` reads stdin.
    pub sensors: Option<PathBuf>,
    /// Print sentences and log relay changes instead of touching hardware.
    pub dry_run: bool,
}

/// Runs until Ctrl-C: telemetry transmission, experiment ticks and the
/// sensor feed, each on its own worker.
pub async fn run(config: Config, options: FlightOptions) -> Result<(), FlightError> {
    let started = Instant::now();
    info!(
        "Payload {} starting at {}",
        config.payload,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    if let Some(command) = config.tuning_command()? {
        if options.dry_run {
            info!("[dry-run] would tune {} with {}", config.radio.variant, command);
        } else {
            send_tuning_command(&config.radio.device, config.radio.variant, &command)?;
        }
    }

    let experiment_config = &config.experiment;
    let pin: Box<dyn OutputPin> = if options.dry_run {
        Box::new(DryRunPin::new(experiment_config.relay_pin))
    } else {
        Box::new(SysfsPin::new(
            experiment_config.gpio_root.clone(),
            experiment_config.relay_pin,
        ))
    };
    let experiment = Arc::new(Experiment::new(
        config.trigger_settings(),
        started,
        pin,
        experiment_config.polarity,
    )?);

    let sample = Arc::new(SharedSample::new(TelemetrySample {
        payload_id: config.payload.clone(),
        ..Default::default()
    }));
    let (faults, mut fault_rx) = FaultSender::channel();

    if let Some(path) = &options.sensors {
        spawn_feed(
            FeedSource::from_path(path),
            sample.clone(),
            experiment.clone(),
            faults.clone(),
        )?;
    }

    let (tick_stop_tx, tick_stop_rx) = oneshot::channel();
    let ticker = tokio::spawn(tick_loop(
        experiment.clone(),
        experiment_config.tick,
        faults.clone(),
        tick_stop_rx,
    ));

    let transport: Box<dyn Transport> = if options.dry_run {
        Box::new(ConsoleTransport)
    } else {
        Box::new(SerialTransport::open(
            &config.radio.device,
            config.radio.baud,
        )?)
    };
    let log = config
        .telemetry
        .log_file
        .as_deref()
        .map(TelemetryLog::open)
        .transpose()?;
    let transmitter = Transmitter::new(transport, log, config.encoder_options());

    let stop = Arc::new(AtomicBool::new(false));
    let transmit = {
        let sample = sample.clone();
        let stop = stop.clone();
        let faults = faults.clone();
        let interval = config
            .telemetry
            .interval
            .or(options.dry_run.then_some(DRY_RUN_INTERVAL));
        tokio::task::spawn_blocking(move || {
            transmit_loop(transmitter, &sample, &stop, interval, &faults)
        })
    };

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Signal handler failed: {}", e);
                }
                info!("Shutting down");
                break;
            }
            fault = fault_rx.recv() => match fault {
                Some(fault) => error!("{} fault: {}", fault.source, fault.reason),
                None => break,
            },
        }
    }

    stop.store(true, Ordering::Relaxed);
    let _ = tick_stop_tx.send(());
    let _ = ticker.await;
    info!("Waiting for the sentence in flight");
    let _ = transmit.await;

    let status = experiment.status();
    match status.phase {
        ExperimentPhase::Armed => info!(
            "Experiment still armed (max altitude {}m)",
            status.max_altitude_seen
        ),
        ExperimentPhase::Triggered { .. } => {
            warn!("Experiment relay still energized at shutdown")
        }
        ExperimentPhase::Released { cause, .. } => info!(
            "Experiment complete ({}): fired at {:?}, released at {:?}",
            cause, status.energized_utc, status.released_utc
        ),
    }

    Ok(())
}

async fn tick_loop(
    experiment: Arc<Experiment>,
    period: Duration,
    faults: FaultSender,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let should_stop = tokio::select! {
            _ = interval.tick() => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            return;
        }

        if let Err(e) = experiment.tick(Instant::now()) {
            faults.report(FaultSource::Relay, e);
        }
    }
}

fn transmit_loop(
    mut transmitter: Transmitter,
    sample: &SharedSample,
    stop: &AtomicBool,
    interval: Option<Duration>,
    faults: &FaultSender,
) {
    while !stop.load(Ordering::Relaxed) {
        let snapshot = sample.snapshot();
        match transmitter.transmit(&snapshot) {
            Ok(_) => {
                if let Some(interval) = interval {
                    std::thread::sleep(interval);
                }
            }
            Err(e) => {
                faults.report(FaultSource::Transport, format!("sentence not sent: {}", e));
                std::thread::sleep(SEND_RETRY_PAUSE);
            }
        }
    }
}
