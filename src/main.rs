use std::process::ExitCode;

use crate::cli::run;

pub mod audio;
pub mod catalog;
pub mod cli;
mod config;
pub mod domain;
pub mod pipeline;
pub mod playlist;
pub mod resolve;
mod sanitize;
pub mod search;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
