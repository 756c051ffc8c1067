//! Configuration module.
//!
//! This module defines the command-line interface (CLI) for the stripper using `clap`.

use clap::Parser;
use std::path::PathBuf;

/// Strip a 32-bit ELF executable down to the bytes that are mapped at load time.
///
/// Symbol tables, section headers, debug information and anything else no
/// loadable segment refers to is discarded. The file is replaced atomically.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// ELF executable to strip in place
    pub file: PathBuf,

    /// Page size used to align segment displacements (defaults per machine)
    #[arg(long, value_parser = parse_page_size)]
    pub page_size: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", help = "Set the logging level")]
    pub log_level: String,

    /// Compute and print the layout without touching the file
    #[arg(long)]
    pub dry_run: bool,
}

/// Accepts decimal or `0x`-prefixed hexadecimal powers of two.
fn parse_page_size(arg: &str) -> Result<u64, String> {
    let value = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => arg.parse(),
    }
    .map_err(|e| format!("invalid page size {:?}: {}", arg, e))?;

    if !value.is_power_of_two() {
        return Err(format!("page size {} is not a power of two", value));
    }
    Ok(value)
}
