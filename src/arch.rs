//! Target machine knowledge.
//!
//! The only architecture-specific input to stripping is the page size the
//! loader maps segments with. It is derived from `e_machine` unless the user
//! overrides it on the command line.

use object::elf;

/// Page size assumed for machines without a more specific entry.
pub const DEFAULT_PAGE_SIZE: u64 = 0x1000;

/// Returns the loader page size for an ELF `e_machine` value.
pub fn default_page_size(machine: u16) -> u64 {
    match machine {
        // SPARC maps executables with 8 KiB pages.
        elf::EM_SPARC | elf::EM_SPARC32PLUS | elf::EM_SPARCV9 => 0x2000,
        _ => DEFAULT_PAGE_SIZE,
    }
}
