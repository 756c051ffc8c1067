//! Core stripping logic.
//!
//! This module contains the `Stripper` struct which owns all state of one
//! stripping run and drives it through its stages:
//! 1. Header reading: parses and validates the ELF and program headers.
//! 2. Region computation: collects every byte range that must be kept.
//! 3. Displacement: assigns each region a page-aligned output offset.
//! 4. Header patching: rewrites the in-memory headers for the new layout.
//! 5. Output: streams the regions into the output with patched headers.

use object::pod;
use std::io::{Read, Seek, Write};

use crate::arch;
use crate::error::{RangeOwner, Result, StripError};
use crate::header::{
    self, host_endianness, ElfHeaders, FileHeader, ProgramHeader, FILE_HEADER_SIZE,
};
use crate::layout::RegionMap;
use crate::writer::{self, Splice};

/// One stripping run over a single executable.
#[derive(Debug)]
pub struct Stripper {
    header: FileHeader,
    segments: Vec<ProgramHeader>,
    /// Program header table location in the input file.
    table_offset: u64,
    table_size: u64,
    page_size: u64,
    regions: RegionMap,
}

impl Stripper {
    pub fn new(headers: ElfHeaders, page_size: u64) -> Self {
        let table_offset = headers.table_offset();
        let table_size = headers.table_size();
        Self {
            header: headers.header,
            segments: headers.segments,
            table_offset,
            table_size,
            page_size,
            regions: RegionMap::new(),
        }
    }

    /// Reads the headers from `input` and picks the page size for its
    /// machine unless `page_size` overrides it.
    pub fn from_reader<R: Read + Seek>(input: &mut R, page_size: Option<u64>) -> Result<Self> {
        let headers = header::read_headers(input)?;
        let page_size = page_size.unwrap_or_else(|| arch::default_page_size(headers.machine()));
        tracing::debug!("using page size {:#x}", page_size);
        Ok(Self::new(headers, page_size))
    }

    /// Collects the ELF header, the program header table and every loadable
    /// segment into the region map.
    pub fn compute_regions(&mut self) {
        let endian = host_endianness();
        self.regions.insert(0, FILE_HEADER_SIZE);
        self.regions.insert(self.table_offset, self.table_size);

        for (index, phdr) in self.segments.iter().enumerate() {
            if phdr.p_type.get(endian) == object::elf::PT_NULL {
                continue;
            }
            let align = phdr.p_align.get(endian) as u64;
            if align != 0 && self.page_size % align != 0 {
                tracing::warn!(
                    segment = index,
                    align,
                    page_size = self.page_size,
                    "alignment not compatible with page size"
                );
            }
            self.regions.insert(
                phdr.p_offset.get(endian) as u64,
                phdr.p_filesz.get(endian) as u64,
            );
        }
    }

    pub fn compute_displacements(&mut self) {
        self.regions.plan(self.page_size);
    }

    /// Drops the section header table and moves every file offset in the
    /// headers to its output position.
    pub fn patch_headers(&mut self) -> Result<()> {
        let endian = host_endianness();
        let header = &mut self.header;
        header.e_shoff.set(endian, 0);
        header.e_shentsize.set(endian, 0);
        header.e_shnum.set(endian, 0);
        header.e_shstrndx.set(endian, 0);

        let table = self
            .regions
            .covering(self.table_offset, self.table_size)
            .ok_or(StripError::RegionNotFound(RangeOwner::SegmentTable))?;
        header
            .e_phoff
            .set(endian, (self.table_offset - table.displacement) as u32);

        for (index, phdr) in self.segments.iter_mut().enumerate() {
            let offset = phdr.p_offset.get(endian) as u64;
            let filesz = phdr.p_filesz.get(endian) as u64;
            if phdr.p_type.get(endian) == object::elf::PT_NULL || filesz == 0 {
                continue;
            }
            let region = self
                .regions
                .covering(offset, filesz)
                .ok_or(StripError::RegionNotFound(RangeOwner::Segment(index)))?;
            phdr.p_offset.set(endian, (offset - region.displacement) as u32);
        }

        for (index, phdr) in self.segments.iter().enumerate() {
            tracing::debug!(
                "patched segment {}: offset={:#x}",
                index,
                phdr.p_offset.get(endian)
            );
        }
        Ok(())
    }

    /// Runs every planning stage: regions, displacements and header patching.
    pub fn plan(&mut self) -> Result<()> {
        self.compute_regions();
        self.compute_displacements();
        self.patch_headers()
    }

    /// The patched headers, keyed by where the originals sit in the input.
    pub fn splices(&self) -> [Splice<'_>; 2] {
        [
            Splice::new(0, pod::bytes_of(&self.header)),
            Splice::new(self.table_offset, pod::bytes_of_slice(&self.segments)),
        ]
    }

    /// Streams the stripped image from `input` into `output`.
    pub fn write<R, W>(&self, input: &mut R, output: &mut W) -> Result<u64>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        writer::copy_regions(input, output, self.regions.regions(), &self.splices())
    }

    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn segments(&self) -> &[ProgramHeader] {
        &self.segments
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Size of the stripped file.
    pub fn output_size(&self) -> u64 {
        self.regions.output_size()
    }
}

/// Strips the executable in `input`, writing the result to `output`.
///
/// Returns the stripper so callers can inspect the computed layout.
pub fn strip<R, W>(input: &mut R, output: &mut W, page_size: Option<u64>) -> Result<Stripper>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let mut stripper = Stripper::from_reader(input, page_size)?;
    stripper.plan()?;
    stripper.write(input, output)?;
    Ok(stripper)
}
