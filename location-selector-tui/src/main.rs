mod app;
mod error;
mod paths;
mod terminal;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use location_selector::SelectorConfig;
use log::{debug, error, info, warn};
use relay_list::{BridgeState, RelayList, Settings};
use simplelog::{Config, LevelFilter, WriteLogger};

use crate::app::App;
use crate::error::AppError;
use crate::terminal::Terminal;

const SAMPLE_RELAYS: &str = include_str!("../data/sample-relays.json");

#[derive(Debug, Parser)]
#[command(name = "location-selector", version, about = "Pick exit and entry relay locations")]
struct Args {
    /// Relay list JSON. Falls back to a saved list, then to the bundled sample.
    #[arg(long)]
    relays: Option<PathBuf>,

    /// Initial bridge state. Entry locations can only be picked when `on`.
    #[arg(long, value_enum, default_value_t = BridgeMode::Auto)]
    bridge_mode: BridgeMode,

    #[arg(long, default_value_t = LevelFilter::Debug)]
    log_level: LevelFilter,

    /// Rows in the list. Defaults to what fits in the terminal.
    #[arg(long)]
    viewport_height: Option<u16>,

    /// Skip expand/collapse and scroll animations.
    #[arg(long)]
    reduced_motion: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BridgeMode {
    Auto,
    On,
    Off,
}

impl From<BridgeMode> for BridgeState {
    fn from(mode: BridgeMode) -> Self {
        match mode {
            BridgeMode::Auto => BridgeState::Auto,
            BridgeMode::On => BridgeState::On,
            BridgeMode::Off => BridgeState::Off,
        }
    }
}

fn init_logging(level: LevelFilter) -> Result<(), AppError> {
    paths::rotate_logs();
    let path = paths::log_file().unwrap_or_else(|| PathBuf::from("location-selector.log"));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = File::create(&path)?;
    WriteLogger::init(level, Config::default(), log_file)?;
    Ok(())
}

fn load_relays(path: Option<&Path>) -> Result<(RelayList, String), AppError> {
    if let Some(path) = path {
        let list = RelayList::from_reader(File::open(path)?)?;
        if let Some(saved) = paths::relays_file() {
            match save_relays(&list, &saved) {
                Ok(()) => debug!("Saved relay list to {}", saved.display()),
                Err(e) => warn!("Could not save relay list to {}: {}", saved.display(), e),
            }
        }
        return Ok((list, path.display().to_string()));
    }
    match paths::relays_file().filter(|path| path.exists()) {
        Some(saved) => {
            let list = RelayList::from_reader(File::open(&saved)?)?;
            Ok((list, saved.display().to_string()))
        }
        None => Ok((RelayList::from_json(SAMPLE_RELAYS)?, "bundled sample".into())),
    }
}

/// Keep an explicitly loaded list for later sessions started without
/// `--relays`.
fn save_relays(list: &RelayList, path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    list.to_writer(File::create(path)?)?;
    Ok(())
}

fn run(args: Args) -> Result<(), AppError> {
    let (relays, source) = load_relays(args.relays.as_deref())?;
    if relays.exit_locations().is_empty() {
        return Err(AppError::NoLocations(source));
    }
    info!("Using relay list from {}", source);

    let settings = Settings {
        bridge_state: args.bridge_mode.into(),
        ..Settings::default()
    };
    let config = SelectorConfig::new().reduced_motion(args.reduced_motion);
    let mut app = App::new(&relays, settings, config, args.viewport_height)?;

    let mut terminal = Terminal::new()?;
    app.run(&mut terminal)
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.log_level) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
