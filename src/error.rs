//! Error types for the stripper.
//!
//! Every stage returns `Result<_, StripError>`. The binary maps each error
//! kind onto a distinct process exit status.

use thiserror::Error;

/// Process exit statuses, one per error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    Usage = 64,
    Format = 100,
    Internal = 101,
    Io = 111,
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status as u8)
    }
}

#[derive(Debug, Error)]
pub enum StripError {
    #[error("not an ELF file")]
    NotElf,

    #[error("ELF class {0} not supported")]
    UnsupportedFormat(u8),

    #[error("data encoding {} not supported on this {}-endian machine", .0, host_endian_name())]
    UnsupportedEndianness(u8),

    #[error("ELF version {0} not supported")]
    UnsupportedVersion(u32),

    #[error("no program header table")]
    MissingSegmentTable,

    #[error("unexpected program header entry size: {0}")]
    UnexpectedDescriptorSize(u16),

    #[error("program header table has no entries")]
    EmptySegmentTable,

    /// A retained range has no covering region. Never caused by input data.
    #[error("internal error: unable to find region for {0}")]
    RegionNotFound(RangeOwner),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What a retained byte range belongs to, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOwner {
    SegmentTable,
    Segment(usize),
}

impl std::fmt::Display for RangeOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeOwner::SegmentTable => write!(f, "program header table"),
            RangeOwner::Segment(index) => write!(f, "segment {}", index),
        }
    }
}

impl StripError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            StripError::Io(_) => ExitStatus::Io,
            StripError::RegionNotFound(_) => ExitStatus::Internal,
            _ => ExitStatus::Format,
        }
    }
}

fn host_endian_name() -> &'static str {
    if cfg!(target_endian = "little") {
        "little"
    } else {
        "big"
    }
}

pub type Result<T> = std::result::Result<T, StripError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classes_map_to_distinct_statuses() {
        assert_eq!(StripError::NotElf.exit_status(), ExitStatus::Format);
        assert_eq!(StripError::EmptySegmentTable.exit_status(), ExitStatus::Format);
        assert_eq!(
            StripError::RegionNotFound(RangeOwner::Segment(3)).exit_status(),
            ExitStatus::Internal
        );
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        assert_eq!(StripError::from(io).exit_status(), ExitStatus::Io);
    }

    #[test]
    fn messages_carry_decoded_values() {
        assert_eq!(
            StripError::UnexpectedDescriptorSize(56).to_string(),
            "unexpected program header entry size: 56"
        );
        assert_eq!(
            StripError::RegionNotFound(RangeOwner::Segment(2)).to_string(),
            "internal error: unable to find region for segment 2"
        );
        assert!(StripError::UnsupportedEndianness(2).to_string().contains("-endian machine"));
    }
}
