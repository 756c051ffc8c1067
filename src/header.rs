//! ELF header reader.
//!
//! Parses the ELF32 file header and the program header table from a seekable
//! stream, and validates everything the rest of the pipeline relies on.
//! Only files in the host's own byte order are accepted, so every field is
//! read with [`host_endianness`].

use object::elf::{self, FileHeader32, ProgramHeader32};
use object::pod::{self, Pod};
use object::Endianness;
use std::io::{self, Read, Seek, SeekFrom};
use std::mem;

use crate::error::{Result, StripError};

pub type FileHeader = FileHeader32<Endianness>;
pub type ProgramHeader = ProgramHeader32<Endianness>;

/// Size of the ELF32 file header in bytes.
pub const FILE_HEADER_SIZE: u64 = mem::size_of::<FileHeader>() as u64;
/// Size of one ELF32 program header entry in bytes.
pub const PROGRAM_HEADER_SIZE: u16 = mem::size_of::<ProgramHeader>() as u16;

/// The byte order of the machine we are running on.
pub fn host_endianness() -> Endianness {
    if cfg!(target_endian = "little") {
        Endianness::Little
    } else {
        Endianness::Big
    }
}

fn host_encoding() -> u8 {
    match host_endianness() {
        Endianness::Little => elf::ELFDATA2LSB,
        Endianness::Big => elf::ELFDATA2MSB,
    }
}

/// The two header structures of an executable, as read from disk.
#[derive(Debug, Clone)]
pub struct ElfHeaders {
    pub header: FileHeader,
    pub segments: Vec<ProgramHeader>,
}

impl ElfHeaders {
    /// File offset of the program header table.
    pub fn table_offset(&self) -> u64 {
        self.header.e_phoff.get(host_endianness()) as u64
    }

    /// Size in bytes of the program header table.
    pub fn table_size(&self) -> u64 {
        self.segments.len() as u64 * PROGRAM_HEADER_SIZE as u64
    }

    pub fn machine(&self) -> u16 {
        self.header.e_machine.get(host_endianness())
    }
}

/// Reads `count` consecutive plain-old-data records from the current position.
fn read_records<T: Pod, R: Read>(reader: &mut R, count: usize) -> Result<Vec<T>> {
    let mut buf = vec![0u8; count * mem::size_of::<T>()];
    reader.read_exact(&mut buf)?;
    let (records, _) = pod::slice_from_bytes::<T>(&buf, count)
        .map_err(|()| io::Error::new(io::ErrorKind::InvalidData, "unaligned header buffer"))?;
    Ok(records.to_vec())
}

/// Reads and validates the file header and program header table.
///
/// The stream is expected to be positioned at offset 0. Any error returned
/// here happens before an output file has been created.
pub fn read_headers<R: Read + Seek>(reader: &mut R) -> Result<ElfHeaders> {
    let endian = host_endianness();
    let header = read_records::<FileHeader, _>(reader, 1)?
        .pop()
        .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "empty ELF header"))?;
    validate(&header)?;

    let phoff = header.e_phoff.get(endian) as u64;
    let phnum = header.e_phnum.get(endian) as usize;
    reader.seek(SeekFrom::Start(phoff))?;
    let segments = read_records::<ProgramHeader, _>(reader, phnum)?;

    for (index, phdr) in segments.iter().enumerate() {
        tracing::debug!(
            "segment {} (type {}): offset={:#x}, filesz={:#x}, align={:#x}",
            index,
            phdr.p_type.get(endian),
            phdr.p_offset.get(endian),
            phdr.p_filesz.get(endian),
            phdr.p_align.get(endian),
        );
    }

    Ok(ElfHeaders { header, segments })
}

fn validate(header: &FileHeader) -> Result<()> {
    let endian = host_endianness();
    let ident = &header.e_ident;

    if ident.magic != elf::ELFMAG {
        return Err(StripError::NotElf);
    }
    if ident.class != elf::ELFCLASS32 {
        return Err(StripError::UnsupportedFormat(ident.class));
    }
    if ident.data != host_encoding() {
        return Err(StripError::UnsupportedEndianness(ident.data));
    }
    if ident.version != elf::EV_CURRENT {
        return Err(StripError::UnsupportedVersion(ident.version as u32));
    }

    let e_type = header.e_type.get(endian);
    if e_type != elf::ET_EXEC {
        tracing::warn!(e_type, "not an executable");
    }

    let version = header.e_version.get(endian);
    if version != elf::EV_CURRENT as u32 {
        return Err(StripError::UnsupportedVersion(version));
    }
    if header.e_phoff.get(endian) == 0 {
        return Err(StripError::MissingSegmentTable);
    }
    let phentsize = header.e_phentsize.get(endian);
    if phentsize != PROGRAM_HEADER_SIZE {
        return Err(StripError::UnexpectedDescriptorSize(phentsize));
    }
    if header.e_phnum.get(endian) == 0 {
        return Err(StripError::EmptySegmentTable);
    }
    Ok(())
}
