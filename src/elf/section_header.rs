//! Section header table entries.
//!
//! Each width has its own on-disk layout in [`section_header32`] and
//! [`section_header64`]; both widen into the canonical [`SectionHeader`],
//! decoded with a [`Ctx`] via `pread_with`.

use scroll::ctx::{self, SizeWith};
use scroll::Pread;

use crate::container::{Ctx, Width};
use crate::error;

/// Index is in extra table.
pub const SHN_XINDEX: u32 = 0xffff;

// === Legal values for sh_type (section type). ===
/// Section header table entry unused.
pub const SHT_NULL: u32 = 0;
/// Program data.
pub const SHT_PROGBITS: u32 = 1;
/// Symbol table.
pub const SHT_SYMTAB: u32 = 2;
/// String table.
pub const SHT_STRTAB: u32 = 3;
/// Relocation entries with addends.
pub const SHT_RELA: u32 = 4;
/// Symbol hash table.
pub const SHT_HASH: u32 = 5;
/// Dynamic linking information.
pub const SHT_DYNAMIC: u32 = 6;
/// Notes.
pub const SHT_NOTE: u32 = 7;
/// Program space with no data (bss).
pub const SHT_NOBITS: u32 = 8;
/// Relocation entries, no addends.
pub const SHT_REL: u32 = 9;
/// Dynamic linker symbol table.
pub const SHT_DYNSYM: u32 = 11;
/// Array of constructors.
pub const SHT_INIT_ARRAY: u32 = 14;
/// Array of destructors.
pub const SHT_FINI_ARRAY: u32 = 15;
/// Section group.
pub const SHT_GROUP: u32 = 17;

/// Convert a section type to its associated string.
pub fn sht_to_str(sht: u32) -> &'static str {
    match sht {
        SHT_NULL => "SHT_NULL",
        SHT_PROGBITS => "SHT_PROGBITS",
        SHT_SYMTAB => "SHT_SYMTAB",
        SHT_STRTAB => "SHT_STRTAB",
        SHT_RELA => "SHT_RELA",
        SHT_HASH => "SHT_HASH",
        SHT_DYNAMIC => "SHT_DYNAMIC",
        SHT_NOTE => "SHT_NOTE",
        SHT_NOBITS => "SHT_NOBITS",
        SHT_REL => "SHT_REL",
        SHT_DYNSYM => "SHT_DYNSYM",
        SHT_INIT_ARRAY => "SHT_INIT_ARRAY",
        SHT_FINI_ARRAY => "SHT_FINI_ARRAY",
        SHT_GROUP => "SHT_GROUP",
        _ => "UNKNOWN_SHT",
    }
}

macro_rules! elf_section_header {
    ($size:ident) => {
        #[repr(C)]
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Pread, Pwrite, SizeWith)]
        pub struct SectionHeader {
            /// Section name (string tbl index)
            pub sh_name: u32,
            /// Section type
            pub sh_type: u32,
            /// Section flags
            pub sh_flags: $size,
            /// Section virtual addr at execution
            pub sh_addr: $size,
            /// Section file offset
            pub sh_offset: $size,
            /// Section size in bytes
            pub sh_size: $size,
            /// Link to another section
            pub sh_link: u32,
            /// Additional section information
            pub sh_info: u32,
            /// Section alignment
            pub sh_addralign: $size,
            /// Entry size if section holds table
            pub sh_entsize: $size,
        }

        impl From<SectionHeader> for super::SectionHeader {
            fn from(sh: SectionHeader) -> Self {
                super::SectionHeader {
                    sh_name: sh.sh_name as usize,
                    sh_type: sh.sh_type,
                    sh_flags: u64::from(sh.sh_flags),
                    sh_addr: u64::from(sh.sh_addr),
                    sh_offset: u64::from(sh.sh_offset),
                    sh_size: u64::from(sh.sh_size),
                    sh_link: sh.sh_link,
                    sh_info: sh.sh_info,
                    sh_addralign: u64::from(sh.sh_addralign),
                    sh_entsize: u64::from(sh.sh_entsize),
                }
            }
        }
    };
}

pub mod section_header32 {
    use scroll::{Pread, Pwrite, SizeWith};

    elf_section_header!(u32);

    pub const SIZEOF_SHDR: usize = 40;
}

pub mod section_header64 {
    use scroll::{Pread, Pwrite, SizeWith};

    elf_section_header!(u64);

    pub const SIZEOF_SHDR: usize = 64;
}

/// A section header table entry with every address-sized field widened to `u64`
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct SectionHeader {
    /// Section name (string tbl index)
    pub sh_name: usize,
    /// Section type
    pub sh_type: u32,
    /// Section flags
    pub sh_flags: u64,
    /// Section virtual addr at execution
    pub sh_addr: u64,
    /// Section file offset
    pub sh_offset: u64,
    /// Section size in bytes
    pub sh_size: u64,
    /// Link to another section
    pub sh_link: u32,
    /// Additional section information
    pub sh_info: u32,
    /// Section alignment
    pub sh_addralign: u64,
    /// Entry size if section holds table
    pub sh_entsize: u64,
}

impl SectionHeader {
    /// The on-disk size of one entry in the layout selected by `ctx`
    pub fn size(ctx: Ctx) -> usize {
        SectionHeader::size_with(&ctx)
    }

    /// Whether the section occupies no bytes in the file, regardless of `sh_size`
    pub fn is_nobits(&self) -> bool {
        self.sh_type == SHT_NOBITS || self.sh_type == SHT_NULL
    }

    /// The end of the section's contents in the file, if it does not overflow
    pub fn file_end(&self) -> Option<u64> {
        self.sh_offset.checked_add(self.sh_size)
    }
}

impl ctx::SizeWith<Ctx> for SectionHeader {
    fn size_with(ctx: &Ctx) -> usize {
        match ctx.width {
            Width::ThirtyTwo => section_header32::SIZEOF_SHDR,
            Width::SixtyFour => section_header64::SIZEOF_SHDR,
        }
    }
}

impl<'a> ctx::TryFromCtx<'a, Ctx> for SectionHeader {
    type Error = error::Error;
    fn try_from_ctx(bytes: &'a [u8], ctx: Ctx) -> error::Result<(Self, usize)> {
        let shdr: SectionHeader = match ctx.width {
            Width::ThirtyTwo => bytes
                .pread_with::<section_header32::SectionHeader>(0, ctx.le)?
                .into(),
            Width::SixtyFour => bytes
                .pread_with::<section_header64::SectionHeader>(0, ctx.le)?
                .into(),
        };
        Ok((shdr, SectionHeader::size_with(&ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scroll::{BE, LE, Pwrite};

    #[test]
    fn layout_sizes() {
        assert_eq!(section_header32::SectionHeader::size_with(&LE), 40);
        assert_eq!(section_header64::SectionHeader::size_with(&LE), 64);
        assert_eq!(SectionHeader::size(Ctx::new(Width::ThirtyTwo, LE)), 40);
        assert_eq!(SectionHeader::size(Ctx::new(Width::SixtyFour, BE)), 64);
    }

    #[test]
    fn same_entry_either_width() {
        let narrow = section_header32::SectionHeader {
            sh_name: 1,
            sh_type: SHT_PROGBITS,
            sh_offset: 0x1000,
            sh_size: 0x200,
            ..Default::default()
        };
        let wide = section_header64::SectionHeader {
            sh_name: 1,
            sh_type: SHT_PROGBITS,
            sh_offset: 0x1000,
            sh_size: 0x200,
            ..Default::default()
        };
        let mut bytes32 = [0u8; 40];
        bytes32.pwrite_with(narrow, 0, BE).unwrap();
        let mut bytes64 = [0u8; 64];
        bytes64.pwrite_with(wide, 0, LE).unwrap();

        let a: SectionHeader = bytes32.pread_with(0, Ctx::new(Width::ThirtyTwo, BE)).unwrap();
        let b: SectionHeader = bytes64.pread_with(0, Ctx::new(Width::SixtyFour, LE)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.sh_offset, 0x1000);
        assert_eq!(a.sh_size, 0x200);
        assert_eq!(a.file_end(), Some(0x1200));
    }

    #[test]
    fn short_entry_is_an_error() {
        let bytes = [0u8; 39];
        let res: error::Result<SectionHeader> =
            bytes.pread_with(0, Ctx::new(Width::ThirtyTwo, LE));
        assert!(matches!(res, Err(error::Error::Scroll(_))));
    }

    #[test]
    fn nobits() {
        let bss = SectionHeader {
            sh_type: SHT_NOBITS,
            sh_offset: u64::MAX,
            sh_size: 1,
            ..Default::default()
        };
        assert!(bss.is_nobits());
        assert_eq!(bss.file_end(), None);
        assert_eq!(sht_to_str(bss.sh_type), "SHT_NOBITS");
    }
}
