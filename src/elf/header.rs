//! The ELF identification block and file header, in both widths

use std::io::{Read, Seek, SeekFrom};

use scroll::ctx::{self, SizeWith};
use scroll::{Endian, Pread};

use crate::container::{Ctx, Width};
use crate::error;

/// The ELF magic number.
pub const ELFMAG: &[u8; 4] = b"\x7FELF";
/// Length of the ELF magic number.
pub const SELFMAG: usize = 4;

/// File class byte index.
pub const EI_CLASS: usize = 4;
/// Invalid class.
pub const ELFCLASSNONE: u8 = 0;
/// 32-bit objects.
pub const ELFCLASS32: u8 = 1;
/// 64-bit objects.
pub const ELFCLASS64: u8 = 2;

/// Data encoding byte index.
pub const EI_DATA: usize = 5;
/// Invalid data encoding.
pub const ELFDATANONE: u8 = 0;
/// 2's complement, little endian.
pub const ELFDATA2LSB: u8 = 1;
/// 2's complement, big endian.
pub const ELFDATA2MSB: u8 = 2;

/// Number of bytes in an identifier.
pub const SIZEOF_IDENT: usize = 16;

/// No file type.
pub const ET_NONE: u16 = 0;
/// Relocatable file.
pub const ET_REL: u16 = 1;
/// Executable file.
pub const ET_EXEC: u16 = 2;
/// Shared object file.
pub const ET_DYN: u16 = 3;
/// Core file.
pub const ET_CORE: u16 = 4;

/// Convert a ELF class byte to the associated string.
#[inline]
pub fn class_to_str(class: u8) -> &'static str {
    match class {
        ELFCLASSNONE => "NONE",
        ELFCLASS32 => "ELF32",
        ELFCLASS64 => "ELF64",
        _ => "UNKNOWN_CLASS",
    }
}

/// Convert an ET value to their associated string.
#[inline]
pub fn et_to_str(et: u16) -> &'static str {
    match et {
        ET_NONE => "NONE",
        ET_REL => "REL",
        ET_EXEC => "EXEC",
        ET_DYN => "DYN",
        ET_CORE => "CORE",
        _ => "UNKNOWN_ET",
    }
}

/// The identification block at the start of every ELF file.
///
/// Every field is a single byte, so it is identical in both widths and
/// both byte orders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ident {
    pub magic: [u8; SELFMAG],
    pub class: u8,
    pub data: u8,
    pub version: u8,
    pub osabi: u8,
    pub abiversion: u8,
    pub pad: [u8; 7],
}

// SAFETY: `Ident` is `repr(C)` and made only of `u8`s, so any byte pattern is valid
// and there is no padding.
unsafe impl plain::Plain for Ident {}

/// Detect the width and byte order of an ELF file from its leading bytes.
///
/// A prefix that disagrees with the magic is rejected as not ELF before
/// anything else is looked at, so a two byte text file is reported as such
/// and not as truncated.
pub fn peek_bytes(bytes: &[u8]) -> error::Result<Ctx> {
    let n = bytes.len().min(SELFMAG);
    if bytes[..n] != ELFMAG[..n] {
        let mut magic = [0u8; SELFMAG];
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(error::Error::NotAnExpectedBinary(magic));
    }
    let ident: &Ident = plain::from_bytes(bytes).map_err(|_| error::Error::TruncatedRead {
        what: "ELF identification",
        offset: 0,
        wanted: SIZEOF_IDENT as u64,
        available: bytes.len() as u64,
    })?;
    let width = match ident.class {
        ELFCLASS32 => Width::ThirtyTwo,
        ELFCLASS64 => Width::SixtyFour,
        class => return Err(error::Error::UnsupportedWordWidth(class)),
    };
    let le = match ident.data {
        ELFDATA2LSB => Endian::Little,
        ELFDATA2MSB => Endian::Big,
        data => return Err(error::Error::UnsupportedEncoding(data)),
    };
    Ok(Ctx::new(width, le))
}

/// Peek at the identification block of an ELF byte stream and return its decoding context.
/// Resets the seek to the value the reader was originally at.
pub fn peek<R: Read + Seek>(fd: &mut R) -> error::Result<Ctx> {
    let current = fd.stream_position()?;
    let mut ident = Vec::with_capacity(SIZEOF_IDENT);
    fd.by_ref().take(SIZEOF_IDENT as u64).read_to_end(&mut ident)?;
    fd.seek(SeekFrom::Start(current))?;
    peek_bytes(&ident)
}

macro_rules! elf_header {
    ($size:ident) => {
        #[repr(C)]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Pread, Pwrite, SizeWith)]
        pub struct Header {
            /// Magic number and other info
            pub e_ident: [u8; 16],
            /// Object file type
            pub e_type: u16,
            /// Architecture
            pub e_machine: u16,
            /// Object file version
            pub e_version: u32,
            /// Entry point virtual address
            pub e_entry: $size,
            /// Program header table file offset
            pub e_phoff: $size,
            /// Section header table file offset
            pub e_shoff: $size,
            /// Processor-specific flags
            pub e_flags: u32,
            /// ELF header size in bytes
            pub e_ehsize: u16,
            /// Program header table entry size
            pub e_phentsize: u16,
            /// Program header table entry count
            pub e_phnum: u16,
            /// Section header table entry size
            pub e_shentsize: u16,
            /// Section header table entry count
            pub e_shnum: u16,
            /// Section header string table index
            pub e_shstrndx: u16,
        }

        impl From<Header> for super::Header {
            fn from(header: Header) -> Self {
                super::Header {
                    e_ident: header.e_ident,
                    e_type: header.e_type,
                    e_machine: header.e_machine,
                    e_version: header.e_version,
                    e_entry: u64::from(header.e_entry),
                    e_phoff: u64::from(header.e_phoff),
                    e_shoff: u64::from(header.e_shoff),
                    e_flags: header.e_flags,
                    e_ehsize: header.e_ehsize,
                    e_phentsize: header.e_phentsize,
                    e_phnum: header.e_phnum,
                    e_shentsize: header.e_shentsize,
                    e_shnum: header.e_shnum,
                    e_shstrndx: header.e_shstrndx,
                }
            }
        }
    };
}

pub mod header32 {
    use scroll::{Pread, Pwrite, SizeWith};

    elf_header!(u32);

    pub const SIZEOF_EHDR: usize = 52;
}

pub mod header64 {
    use scroll::{Pread, Pwrite, SizeWith};

    elf_header!(u64);

    pub const SIZEOF_EHDR: usize = 64;
}

/// An ELF header with every address-sized field widened to `u64`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Header {
    pub e_ident: [u8; SIZEOF_IDENT],
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl Header {
    /// Read the file header from offset 0 of `fd` using the layout in `ctx`.
    ///
    /// `file_len` is the total length of the source; a file shorter than the
    /// header fails with [`TruncatedRead`](error::Error::TruncatedRead).
    pub fn from_fd<R: Read + Seek>(fd: &mut R, ctx: Ctx, file_len: u64) -> error::Result<Header> {
        let size = Header::size_with(&ctx);
        let mut bytes = [0u8; header64::SIZEOF_EHDR];
        super::read_exact_at(fd, 0, &mut bytes[..size], file_len, "ELF header")?;
        let header: Header = bytes[..size].pread_with(0, ctx)?;
        debug!(
            "{} {} header: shoff {:#x} shnum {} shentsize {} shstrndx {}",
            class_to_str(header.e_ident[EI_CLASS]),
            et_to_str(header.e_type),
            header.e_shoff,
            header.e_shnum,
            header.e_shentsize,
            header.e_shstrndx
        );
        Ok(header)
    }
}

impl ctx::SizeWith<Ctx> for Header {
    fn size_with(ctx: &Ctx) -> usize {
        match ctx.width {
            Width::ThirtyTwo => header32::SIZEOF_EHDR,
            Width::SixtyFour => header64::SIZEOF_EHDR,
        }
    }
}

impl<'a> ctx::TryFromCtx<'a, Ctx> for Header {
    type Error = error::Error;
    fn try_from_ctx(bytes: &'a [u8], ctx: Ctx) -> error::Result<(Self, usize)> {
        let header = match ctx.width {
            Width::ThirtyTwo => Header::from(bytes.pread_with::<header32::Header>(0, ctx.le)?),
            Width::SixtyFour => Header::from(bytes.pread_with::<header64::Header>(0, ctx.le)?),
        };
        Ok((header, Header::size_with(&ctx)))
    }
}
