mod config;
mod experiment;
mod fault;
mod flight;
mod gpio;
mod radio;
mod sensors;
mod telemetry;
mod transport;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::Config;
use crate::flight::FlightOptions;
use crate::radio::{encode_tuning_command, FrequencySpec, RadioVariant};

#[derive(Parser)]
#[command(name = "stratoschem")]
#[command(about = "High-altitude balloon telemetry and experiment control")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate { config: PathBuf },
    /// Transmit telemetry and run the experiment
    Run {
        config: PathBuf,
        /// JSON-lines sensor feed, `-` for stdin
        #[arg(long)]
        sensors: Option<PathBuf>,
        /// Print sentences and log relay changes without touching hardware
        #[arg(long)]
        dry_run: bool,
    },
    /// Send the configured tuning command to the transmitter
    Tune { config: PathBuf },
    /// Print the tuning command for a frequency or channel
    Frequency {
        spec: String,
        #[arg(long, value_enum, default_value_t = RadioVariant::Mtx2)]
        variant: RadioVariant,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Run {
            config,
            sensors,
            dry_run,
        } => run(&config, FlightOptions { sensors, dry_run }),
        Commands::Tune { config } => tune(&config),
        Commands::Frequency { spec, variant } => frequency(&spec, variant),
    }
}

fn load(path: &Path) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading {}: {}", path.display(), e);
            None
        }
    }
}

fn validate(path: &Path) -> ExitCode {
    let Some(config) = load(path) else {
        return ExitCode::FAILURE;
    };

    println!("Configuration is valid");
    println!("  payload: {}", config.payload);
    println!(
        "  radio: {} on {} at {} baud",
        config.radio.variant,
        config.radio.device.display(),
        config.radio.baud
    );
    match config.tuning_command() {
        Ok(Some(command)) => println!("  frequency: {:.4}MHz ({})", command.mhz(), command),
        Ok(None) => println!("  frequency: transmitter default"),
        Err(e) => println!("  frequency: {}", e),
    }

    let options = config.encoder_options();
    println!(
        "  telemetry: board current {}, environmental {}",
        on_off(options.include_board_current),
        on_off(options.include_environmental)
    );

    let settings = config.trigger_settings();
    println!(
        "  relay: gpio {} {}, target {}m, free-fall margin {}m, hold {}",
        config.experiment.relay_pin,
        config.experiment.polarity,
        settings.target_altitude,
        settings.free_fall_margin,
        humantime::format_duration(settings.hold)
    );
    if let Some(delay) = settings.test_delay {
        println!(
            "  TEST MODE: relay fires {} after start",
            humantime::format_duration(delay)
        );
    }
    ExitCode::SUCCESS
}

fn run(path: &Path, options: FlightOptions) -> ExitCode {
    let Some(config) = load(path) else {
        return ExitCode::FAILURE;
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(flight::run(config, options)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Flight aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn tune(path: &Path) -> ExitCode {
    let Some(config) = load(path) else {
        return ExitCode::FAILURE;
    };

    let command = match config.tuning_command() {
        Ok(Some(command)) => command,
        Ok(None) => {
            eprintln!("No frequency configured");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Invalid frequency: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match transport::send_tuning_command(&config.radio.device, config.radio.variant, &command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Tuning failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn frequency(spec: &str, variant: RadioVariant) -> ExitCode {
    let command = FrequencySpec::parse(spec).and_then(|s| encode_tuning_command(&s, variant));
    match command {
        Ok(command) => {
            println!("{} {:.4}MHz: {}", variant, command.mhz(), command);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Invalid frequency: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
