//! ELF "super strip" library.
//!
//! This library provides the core components for the `ustrip` tool, which
//! reduces a 32-bit ELF executable to the bytes that are mapped at load time.
//! It is organized into several modules:
//! - `config`: CLI configuration.
//! - `arch`: Per-machine page sizes.
//! - `header`: ELF header and program header table reading.
//! - `layout`: Kept regions, merging and output placement.
//! - `stripper`: The stripping pipeline.
//! - `writer`: Streaming copy with header splicing.
//! - `finalize`: Atomic replacement of the original file.
//! - `error`: Error types and exit statuses.

pub mod arch;
pub mod config;
pub mod error;
pub mod finalize;
pub mod header;
pub mod layout;
pub mod stripper;
pub mod utils;
pub mod writer;
