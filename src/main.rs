mod app;
mod cli;
mod database;
mod input;
mod models;
mod selection;
mod ui;
mod view;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, LOG_ENV};
use std::fs::File;
use std::path::Path;

/// Logs go to a file beside the database since the terminal belongs to the UI.
fn init_logging(db_path: &Path) {
    let log_path = db_path.with_file_name("taskpad.log");
    let Ok(file) = File::create(&log_path) else {
        return;
    };
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(LOG_ENV, "warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let db_path = cli.db_path();
    init_logging(&db_path);

    ui::run_tui(&db_path).inspect_err(|err| log::error!("{err:#}"))
}
