#![deny(clippy::all)]
#![forbid(unsafe_code)]

mod klaus;
mod report;
mod single_step;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::error;

/// Conformance runner for the braeburn 6502 core.
///
/// A `.json` fixture runs through the per-opcode single-step suite; any
/// other file is treated as a raw 64 KiB image for the Klaus Dormann
/// functional suite. The exit code is the number of failing tests.
#[derive(Parser, Debug)]
#[command(name = "runner", version, about)]
pub struct Args {
    /// Single-step fixture (.json) or raw 64 KiB binary image
    pub testfile: PathBuf,

    /// Print per-case detail while running
    #[arg(long)]
    pub verbose: bool,

    /// Write a machine-readable report of the run to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Trap PC that marks success for binary images
    #[arg(long, value_parser = clap_num::maybe_hex::<u16>, default_value = "0x3469")]
    pub success_trap: u16,

    /// Give up on a binary image after this many cycles
    #[arg(long, default_value_t = 500_000_000)]
    pub max_cycles: u64,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(failures) => ExitCode::from(failures.min(255) as u8),
        Err(error) => {
            error!("{:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<usize> {
    let is_json = args
        .testfile
        .extension()
        .is_some_and(|extension| extension == "json");

    if is_json {
        single_step::run(args)
    } else {
        klaus::run(args)
    }
}
