//! Stripped file writer.
//!
//! Copies every kept region from the input to its planned output offset in a
//! single forward pass. The ELF header and the program header table live
//! inside the copied regions, so their patched contents are spliced over the
//! original bytes block by block as the data streams through.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::Result;
use crate::layout::Region;

/// Size of the copy buffer.
pub const BLOCK_SIZE: usize = 8192;

/// Replacement bytes for an input range.
#[derive(Debug, Clone, Copy)]
pub struct Splice<'a> {
    /// Input offset of the first replaced byte.
    pub offset: u64,
    pub bytes: &'a [u8],
}

impl<'a> Splice<'a> {
    pub fn new(offset: u64, bytes: &'a [u8]) -> Self {
        Self { offset, bytes }
    }

    fn end(&self) -> u64 {
        self.offset + self.bytes.len() as u64
    }

    /// Overwrites the part of `block` that overlaps this splice.
    ///
    /// `block` holds the input bytes starting at `block_start`. The splice may
    /// begin before the block, end after it, or both.
    pub fn apply(&self, block_start: u64, block: &mut [u8]) {
        let block_end = block_start + block.len() as u64;
        let start = self.offset.max(block_start);
        let end = self.end().min(block_end);
        if start >= end {
            return;
        }

        let dst = (start - block_start) as usize..(end - block_start) as usize;
        let src = (start - self.offset) as usize..(end - self.offset) as usize;
        tracing::trace!(
            "splice {:#x}..{:#x} into block at {:#x}",
            start,
            end,
            block_start
        );
        block[dst].copy_from_slice(&self.bytes[src]);
    }
}

/// Writes every region of `input` to its output offset in `output`, applying
/// `splices` to the bytes on the way through.
///
/// Returns the number of bytes copied.
pub fn copy_regions<R, W>(
    input: &mut R,
    output: &mut W,
    regions: &[Region],
    splices: &[Splice<'_>],
) -> Result<u64>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let mut buf = vec![0u8; BLOCK_SIZE];
    let mut copied = 0u64;

    for region in regions {
        input.seek(SeekFrom::Start(region.offset))?;
        output.seek(SeekFrom::Start(region.output_offset))?;

        let mut position = region.offset;
        let mut remaining = region.size;
        while remaining > 0 {
            let len = remaining.min(BLOCK_SIZE as u64) as usize;
            let block = &mut buf[..len];
            input.read_exact(block)?;
            for splice in splices {
                splice.apply(position, block);
            }
            output.write_all(block)?;

            position += len as u64;
            remaining -= len as u64;
        }
        copied += region.size;
    }

    output.flush()?;
    Ok(copied)
}
