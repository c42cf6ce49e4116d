//! JPEG 2000 raster conversion CLI
//!
//! Decodes images and packs them into interleaved buffers ready for a host
//! graphics API, either one file at a time or a whole directory.

use clap::Parser;
use jp2raster::cli::{run, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
