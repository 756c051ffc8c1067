//! Entry point for the ustrip tool.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Initialize logging with `tracing-subscriber`.
//! 3. Read and validate the ELF headers of the target file.
//! 4. Plan the stripped layout: regions, displacements, patched headers.
//! 5. Write the stripped image to a temporary file and rename it into place.
//!
//! Errors are carried as `anyhow` errors with context and mapped to exit
//! statuses at the top.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use ustrip::config::Config;
use ustrip::error::{ExitStatus, StripError};
use ustrip::finalize;
use ustrip::stripper::Stripper;

fn main() -> ExitCode {
    let config = match Config::try_parse() {
        Ok(config) => config,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitStatus::Usage.into()
            } else {
                ExitStatus::Success.into()
            };
        }
    };

    init_tracing(&config.log_level);

    match run(&config) {
        Ok(()) => ExitStatus::Success.into(),
        Err(err) => {
            eprintln!("ustrip: fatal: {:#}", err);
            exit_status(&err).into()
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Anything that is not one of our own errors came from the filesystem.
fn exit_status(err: &anyhow::Error) -> ExitStatus {
    err.downcast_ref::<StripError>()
        .map(StripError::exit_status)
        .unwrap_or(ExitStatus::Io)
}

fn run(config: &Config) -> Result<()> {
    let path = &config.file;
    let span = tracing::info_span!("strip", file = %path.display());
    let _enter = span.enter();

    let mut input = File::open(path)
        .map_err(StripError::from)
        .with_context(|| format!("unable to open {} for reading", path.display()))?;
    let input_size = input
        .metadata()
        .map_err(StripError::from)
        .with_context(|| format!("unable to stat {}", path.display()))?
        .len();

    let mut stripper = Stripper::from_reader(&mut input, config.page_size)
        .with_context(|| format!("{}", path.display()))?;
    stripper.compute_regions();
    stripper.compute_displacements();
    stripper.patch_headers()?;

    if config.dry_run {
        print_plan(&stripper, input_size);
        return Ok(());
    }

    let mut copied = 0;
    finalize::replace_atomically(path, |output| {
        copied = stripper.write(&mut input, output)?;
        Ok(())
    })
    .with_context(|| format!("unable to strip {}", path.display()))?;

    tracing::info!(
        "kept {} of {} bytes, output is {} bytes",
        copied,
        input_size,
        stripper.output_size()
    );
    Ok(())
}

fn print_plan(stripper: &Stripper, input_size: u64) {
    println!("page size {:#x}", stripper.page_size());
    for region in stripper.regions().regions() {
        println!(
            "offset={:#x}, size={:#x}, displace by -{:#x} to {:#x}",
            region.offset, region.size, region.displacement, region.output_offset
        );
    }
    println!("{} bytes -> {} bytes", input_size, stripper.output_size());
}
