use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::database;

pub const DB_ENV: &str = "TASKPAD_DB";
pub const LOG_ENV: &str = "TASKPAD_LOG";

/// Takes no options beyond `--help` and `--version`; the store location comes
/// from `TASKPAD_DB` when set.
#[derive(Parser)]
#[command(author, version, about = "Terminal task list with priorities and deadlines", long_about = None)]
pub struct Cli {}

impl Cli {
    pub fn db_path(&self) -> PathBuf {
        resolve_db_path(std::env::var_os(DB_ENV))
    }
}

fn resolve_db_path(env: Option<OsString>) -> PathBuf {
    env.filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(database::default_path)
}
