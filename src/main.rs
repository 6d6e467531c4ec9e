// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

use shipment_tracker::config::DEFAULT_CONFIG_PATH;
use shipment_tracker::{load_config, logging, TrackerConfig, TrackerView, TrackingProcessor, TrackingSimulator};

#[derive(Debug, Parser)]
#[command(name = "shipment-tracker", version, about = "Shipment update processing engine")]
struct Cli {
    /// Path to the tracker config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a file of update records and report the outcome
    Simulate {
        file: PathBuf,

        /// Pause between updates (overrides the config file)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Print the tracked view of these shipments after the replay
        #[arg(long = "show", value_name = "ID")]
        show: Vec<String>,
    },

    /// Apply update records given on the command line
    Process {
        #[arg(required = true)]
        records: Vec<String>,
    },

    /// Track shipments interactively while a file is replayed
    Ui { file: PathBuf },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Command::Simulate {
            file,
            interval_ms,
            show,
        } => {
            logging::init(&config.log_filter);
            run_simulate(&config, &file, interval_ms, &show)
        }
        Command::Process { records } => {
            logging::init(&config.log_filter);
            run_process(&config, &records);
            Ok(())
        }
        Command::Ui { file } => run_ui_mode(&config, file),
    }
}

fn run_simulate(config: &TrackerConfig, file: &Path, interval_ms: Option<u64>, show: &[String]) -> Result<()> {
    let interval = Duration::from_millis(interval_ms.unwrap_or(config.simulation.update_interval_ms));
    let mut processor = TrackingProcessor::new(config.rule_validator());

    let report = TrackingSimulator::new(interval).run(&mut processor, file)?;
    println!("{}", report.summary());

    let zone = config.calendar_zone();
    for id in show {
        match processor.find_shipment(id) {
            Some(shipment) => {
                let view = TrackerView::project(shipment, zone);
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
            None => eprintln!("Shipment with ID '{}' not found.", id),
        }
    }

    Ok(())
}

fn run_process(config: &TrackerConfig, records: &[String]) {
    let mut processor = TrackingProcessor::new(config.rule_validator());
    for record in records {
        println!("{}", processor.process(record));
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &TrackerConfig, file: PathBuf) -> Result<()> {
    use std::thread;

    if !file.exists() {
        anyhow::bail!("simulation file not found: {}", file.display());
    }

    // Log lines would tear the alternate screen
    logging::init_to_file(&config.log_filter, Path::new("shipment-tracker.log"))?;

    let processor = TrackingProcessor::new(config.rule_validator()).into_shared();
    let simulator = TrackingSimulator::new(Duration::from_millis(config.simulation.update_interval_ms));

    let replay_target = processor.clone();
    let replay = thread::spawn(move || simulator.run_shared(&replay_target, &file));

    let mut app = ui::App::new(processor);
    ui::run_ui(&mut app)?;

    // The replay keeps running on its own schedule; only surface an early failure
    if replay.is_finished() {
        match replay.join() {
            Ok(Ok(report)) => println!("Simulation: {}", report.summary()),
            Ok(Err(err)) => return Err(err),
            Err(_) => anyhow::bail!("simulation thread panicked"),
        }
    }

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &TrackerConfig, _file: PathBuf) -> Result<()> {
    anyhow::bail!("TUI mode not available, rebuild with `--features tui` or run the tracking server");
}
