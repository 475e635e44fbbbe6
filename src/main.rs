use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, prelude::*};

mod controller;
mod domain;
mod filter;
mod inputter;
mod model;
mod profile;
mod table;
mod ui;

use controller::Controller;
use domain::{DEFAULT_DATASET, LVConfig, LVError};
use model::{Model, Status};
use table::Table;
use ui::LobbyUI;

/// Browse lobbyist registrations: filter by name and client, inspect profiles.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Dataset to browse (csv, parquet or arrow)
    #[arg(default_value = DEFAULT_DATASET)]
    path: String,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<String>,

    /// Milliseconds to wait for input between redraws
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(path: &str) -> Result<(), LVError> {
    let file = File::create(expand(path)?)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lobbyview=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn expand(path: &str) -> Result<PathBuf, LVError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| LVError::LoadingFailed(e.to_string()))
}

fn run(args: Args) -> Result<(), LVError> {
    if let Some(log_file) = &args.log_file {
        init_logging(log_file)?;
    }

    // A dataset that can not be loaded ends the program before the ui starts.
    let table = Arc::new(Table::load(expand(&args.path)?)?);
    if table.is_empty() {
        warn!("{} contains no records", table.name());
    }
    let cfg = LVConfig::default().event_poll_time(args.poll_ms);
    info!("Starting lobbyview with {:?}", cfg);

    let mut model = Model::new(table, &cfg);
    let mut ui = LobbyUI::new(&cfg);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &mut ui, &controller);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    ui: &mut LobbyUI,
    controller: &Controller,
) -> Result<(), LVError> {
    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(model)? {
            model.update(Some(message))?;
        };
    }
    Ok(())
}
