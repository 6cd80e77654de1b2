//! Minimal static ELF64 executable: one header, one read+execute `PT_LOAD`
//! segment mapping the whole file at [`BASE_ADDR`], code right after the headers.

pub const BASE_ADDR: u64 = 0x40_0000;
const EHDR_SIZE: u16 = 64;
const PHDR_SIZE: u16 = 56;
const PAGE_ALIGN: u64 = 0x1000;

const ET_EXEC: u16 = 2;
const EM_X86_64: u16 = 0x3E;
const PT_LOAD: u32 = 1;
const PF_X: u32 = 1;
const PF_R: u32 = 4;

/// File offset of the first code byte.
pub const CODE_OFFSET: u64 = EHDR_SIZE as u64 + PHDR_SIZE as u64;

/// Virtual address execution starts at: the first code byte.
pub fn entry_point() -> u64 {
    BASE_ADDR + CODE_OFFSET
}

pub fn write_elf(code: &[u8]) -> Vec<u8> {
    let total = CODE_OFFSET + code.len() as u64;
    let mut out = Vec::with_capacity(total as usize);

    // e_ident: magic, 64-bit, little endian, version 1, System V ABI
    out.extend_from_slice(&[0x7F, b'E', b'L', b'F', 2, 1, 1, 0]);
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&ET_EXEC.to_le_bytes());
    out.extend_from_slice(&EM_X86_64.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes()); // e_version
    out.extend_from_slice(&entry_point().to_le_bytes());
    out.extend_from_slice(&(EHDR_SIZE as u64).to_le_bytes()); // e_phoff
    out.extend_from_slice(&0u64.to_le_bytes()); // e_shoff
    out.extend_from_slice(&0u32.to_le_bytes()); // e_flags
    out.extend_from_slice(&EHDR_SIZE.to_le_bytes());
    out.extend_from_slice(&PHDR_SIZE.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // e_phnum
    out.extend_from_slice(&0u16.to_le_bytes()); // e_shentsize
    out.extend_from_slice(&0u16.to_le_bytes()); // e_shnum
    out.extend_from_slice(&0u16.to_le_bytes()); // e_shstrndx

    out.extend_from_slice(&PT_LOAD.to_le_bytes());
    out.extend_from_slice(&(PF_R | PF_X).to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes()); // p_offset
    out.extend_from_slice(&BASE_ADDR.to_le_bytes()); // p_vaddr
    out.extend_from_slice(&BASE_ADDR.to_le_bytes()); // p_paddr
    out.extend_from_slice(&total.to_le_bytes()); // p_filesz
    out.extend_from_slice(&total.to_le_bytes()); // p_memsz
    out.extend_from_slice(&PAGE_ALIGN.to_le_bytes());

    out.extend_from_slice(code);
    out
}
