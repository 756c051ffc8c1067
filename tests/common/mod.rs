//! Synthetic ELF32 images for integration tests.

#![allow(dead_code)]

use object::elf::{self, FileHeader32, ProgramHeader32};
use object::endian::{U16, U32};
use object::pod;
use object::Endianness;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use ustrip::header::{host_endianness, read_headers, ElfHeaders};

fn u16(v: u16) -> U16<Endianness> {
    U16::new(host_endianness(), v)
}
fn u32(v: u32) -> U32<Endianness> {
    U32::new(host_endianness(), v)
}

#[derive(Debug, Clone, Copy)]
pub struct Seg {
    pub p_type: u32,
    pub offset: u32,
    pub filesz: u32,
    pub align: u32,
}

pub fn load(offset: u32, filesz: u32) -> Seg {
    Seg {
        p_type: elf::PT_LOAD,
        offset,
        filesz,
        align: 0x1000,
    }
}

/// Builds a `len`-byte image filled with a recognisable pattern, with the
/// ELF header at 0 and the program header table at `phoff`.
pub fn build(phoff: u32, segments: &[Seg], len: usize) -> Vec<u8> {
    let endian = host_endianness();
    let mut data: Vec<u8> = (0..len).map(|i| (i * 7 + 13) as u8).collect();

    let header = FileHeader32::<Endianness> {
        e_ident: elf::Ident {
            magic: elf::ELFMAG,
            class: elf::ELFCLASS32,
            data: match endian {
                Endianness::Little => elf::ELFDATA2LSB,
                Endianness::Big => elf::ELFDATA2MSB,
            },
            version: elf::EV_CURRENT,
            os_abi: elf::ELFOSABI_SYSV,
            abi_version: 0,
            padding: [0; 7],
        },
        e_type: u16(elf::ET_EXEC),
        e_machine: u16(elf::EM_386),
        e_version: u32(elf::EV_CURRENT as u32),
        e_entry: u32(0x0804_8000),
        e_phoff: u32(phoff),
        e_shoff: u32((len as u32).saturating_sub(0x100)),
        e_flags: u32(0),
        e_ehsize: u16(52),
        e_phentsize: u16(32),
        e_phnum: u16(segments.len() as u16),
        e_shentsize: u16(40),
        e_shnum: u16(4),
        e_shstrndx: u16(3),
    };
    let table: Vec<ProgramHeader32<Endianness>> = segments
        .iter()
        .map(|seg| ProgramHeader32 {
            p_type: u32(seg.p_type),
            p_offset: u32(seg.offset),
            p_vaddr: u32(0x0804_8000 + seg.offset),
            p_paddr: u32(0x0804_8000 + seg.offset),
            p_filesz: u32(seg.filesz),
            p_memsz: u32(seg.filesz),
            p_flags: u32(elf::PF_R),
            p_align: u32(seg.align),
        })
        .collect();

    data[..52].copy_from_slice(pod::bytes_of(&header));
    let table_bytes = pod::bytes_of_slice(&table);
    let phoff = phoff as usize;
    data[phoff..phoff + table_bytes.len()].copy_from_slice(table_bytes);
    data
}

pub fn parse(image: &[u8]) -> ElfHeaders {
    read_headers(&mut Cursor::new(image)).unwrap()
}

pub fn p_offset(headers: &ElfHeaders, index: usize) -> u64 {
    headers.segments[index].p_offset.get(host_endianness()) as u64
}

/// Strips `image` in memory.
pub fn strip(image: &[u8], page_size: Option<u64>) -> (Vec<u8>, ustrip::stripper::Stripper) {
    let mut output = Cursor::new(Vec::new());
    let stripper = ustrip::stripper::strip(&mut Cursor::new(image), &mut output, page_size).unwrap();
    (output.into_inner(), stripper)
}

/// A `tracing` writer that collects everything into a shared buffer.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
