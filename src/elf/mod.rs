//! The section layout of an ELF file.
//!
//! Parsing happens in three steps, each depending on the last:
//!
//! 1. [`header::peek`] reads the identification block and picks the width
//!    and byte order every later read is decoded with.
//! 2. [`Header::from_fd`] reads the file header and [`SectionTable::parse`]
//!    derives (and checks) where the section header table is and how it is
//!    laid out.
//! 3. [`Sections::from_fd`] loads the section name string table, reads every
//!    entry in on-disk order and resolves each name.
//!
//! Every count, size and offset taken from the file is checked against the
//! file's length before it is used to size an allocation or a read.
//!
//! # Example
//!
//! ```rust,no_run
//! use sectview::elf::Sections;
//! use sectview::options::ParseOptions;
//!
//! let bytes = std::fs::read("/bin/ls")?;
//! let sections = Sections::parse_with_opts(&bytes, &ParseOptions::default())?;
//! for section in sections.iter().skip(1) {
//!     println!("{:#x} {} {}", section.offset, section.size, section.name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod header;
pub mod section_header;
pub mod strtab;

use std::borrow::Cow;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

use scroll::Pread;

use crate::container::Ctx;
use crate::error;
use crate::options::{ParseOptions, Permissive};

pub use self::header::Header;
pub use self::section_header::SectionHeader;
pub use self::strtab::Strtab;

/// Fail unless `wanted` bytes are available at `offset` of a `file_len` byte source.
pub(crate) fn check_available(
    what: &'static str,
    offset: u64,
    wanted: u64,
    file_len: u64,
) -> error::Result<()> {
    let available = file_len.saturating_sub(offset);
    if wanted > available {
        return Err(error::Error::TruncatedRead {
            what,
            offset,
            wanted,
            available,
        });
    }
    Ok(())
}

/// Fill `buf` from the current position of `fd`, which is `offset` bytes into the source.
fn fill<R: Read>(fd: &mut R, buf: &mut [u8], offset: u64, what: &'static str) -> error::Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match fd.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(error::Error::TruncatedRead {
                    what,
                    offset,
                    wanted: buf.len() as u64,
                    available: filled as u64,
                });
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Seek to `offset` and read exactly `buf.len()` bytes.
pub(crate) fn read_exact_at<R: Read + Seek>(
    fd: &mut R,
    offset: u64,
    buf: &mut [u8],
    file_len: u64,
    what: &'static str,
) -> error::Result<()> {
    check_available(what, offset, buf.len() as u64, file_len)?;
    fd.seek(SeekFrom::Start(offset))?;
    fill(fd, buf, offset, what)
}

/// Where the section header table lives, and how it is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionTable {
    /// File offset of the first entry
    pub offset: u64,
    /// Number of entries
    pub count: usize,
    /// Distance in bytes between consecutive entries
    pub entsize: usize,
    /// Index of the entry describing the section name string table
    pub strndx: usize,
}

impl SectionTable {
    /// Derive the table layout from `header`.
    ///
    /// Applies extended section numbering: when `e_shnum` is zero the real
    /// count lives in the `sh_size` of entry 0, and when `e_shstrndx` is
    /// `SHN_XINDEX` the real index lives in its `sh_link`.
    ///
    /// A nonzero `e_shnum` with a zero `e_shoff` is
    /// [`MissingSectionTable`](error::Error::MissingSectionTable), or an empty
    /// table in permissive mode.
    pub fn parse<R: Read + Seek>(
        fd: &mut R,
        header: &Header,
        ctx: Ctx,
        file_len: u64,
        opts: &ParseOptions,
    ) -> error::Result<SectionTable> {
        let expected = SectionHeader::size(ctx);
        let empty = SectionTable {
            offset: header.e_shoff,
            count: 0,
            entsize: expected,
            strndx: 0,
        };
        if header.e_shoff == 0 {
            if header.e_shnum != 0 {
                Err::<(), _>(error::Error::MissingSectionTable {
                    count: header.e_shnum,
                })
                .or_warn(opts.is_permissive(), "section header table", ())?;
            }
            return Ok(empty);
        }

        let mut count = usize::from(header.e_shnum);
        let mut strndx = usize::from(header.e_shstrndx);
        let xindex = u32::from(header.e_shstrndx) == section_header::SHN_XINDEX;

        if count == 0 {
            // no room for an entry 0 means there is no table at all
            let consult = usize::from(header.e_shentsize) == expected
                && check_available("section header", header.e_shoff, expected as u64, file_len)
                    .is_ok();
            if !consult {
                debug!("empty section header table");
                return Ok(empty);
            }
        }

        let entsize = Self::entry_size(header.e_shentsize, ctx, opts)?;

        if count == 0 || xindex {
            let mut scratch = vec![0u8; entsize];
            read_exact_at(fd, header.e_shoff, &mut scratch, file_len, "section header")?;
            let first: SectionHeader = scratch.pread_with(0, ctx)?;
            if count == 0 {
                count = usize::try_from(first.sh_size).map_err(|_| {
                    error::Error::AllocationFailure(first.sh_size, "section headers")
                })?;
                debug!("extended section numbering: {} sections", count);
            }
            if xindex {
                strndx = first.sh_link as usize;
                debug!("extended section numbering: string table at {}", strndx);
            }
            if count == 0 {
                return Ok(SectionTable { entsize, ..empty });
            }
        }

        if strndx >= count {
            return Err(error::Error::InvalidStringTableIndex {
                index: strndx,
                count,
            });
        }

        let table_size = (count as u64)
            .checked_mul(entsize as u64)
            .unwrap_or(u64::MAX);
        check_available("section header table", header.e_shoff, table_size, file_len)?;

        let table = SectionTable {
            offset: header.e_shoff,
            count,
            entsize,
            strndx,
        };
        debug!("{:?}", table);
        Ok(table)
    }

    /// Check `e_shentsize` against the layout selected by `ctx`.
    ///
    /// An entry smaller than the layout cannot be decoded and is always an
    /// error; a larger one is tolerated in permissive mode and used as the stride.
    fn entry_size(declared: u16, ctx: Ctx, opts: &ParseOptions) -> error::Result<usize> {
        let expected = SectionHeader::size(ctx);
        let size = usize::from(declared);
        if size == expected {
            return Ok(size);
        }
        let err = error::Error::InconsistentEntrySize { declared, expected };
        if size < expected {
            return Err(err);
        }
        Err(err).or_warn(opts.is_permissive(), "section header entry size", size)
    }

    /// File offset of entry `index`
    pub fn entry_offset(&self, index: usize) -> u64 {
        self.offset + index as u64 * self.entsize as u64
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// One section of the file, as displayed: where it is, how big it is, and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDescriptor<'a> {
    /// Position in the section header table
    pub index: usize,
    /// The section name. Borrowed from the string table of the [`Sections`] it
    /// came from, unless it is not UTF-8 and had its bad bytes replaced.
    pub name: Cow<'a, str>,
    /// Section type
    pub sh_type: u32,
    /// Size of the contents in bytes
    pub size: u64,
    /// File offset of the contents
    pub offset: u64,
}

/// The section layout of an ELF file.
///
/// Owns the section name string table; the [`SectionDescriptor`]s handed out
/// by [`iter`](Sections::iter) borrow their names from it.
#[derive(Debug)]
pub struct Sections {
    /// The ELF header, widened
    pub header: Header,
    /// The width and byte order the file was decoded with
    pub ctx: Ctx,
    /// Layout of the section header table
    pub table: SectionTable,
    /// Every section header, in on-disk order
    pub section_headers: Vec<SectionHeader>,
    /// The section name string table
    pub shdr_strtab: Strtab,
    /// Length of the file in bytes
    pub file_len: u64,
}

impl Sections {
    /// Parse the section layout of the ELF image in `bytes`, strictly.
    pub fn parse(bytes: &[u8]) -> error::Result<Sections> {
        Sections::parse_with_opts(bytes, &ParseOptions::default())
    }

    /// Parse the section layout of the ELF image in `bytes`.
    pub fn parse_with_opts(bytes: &[u8], opts: &ParseOptions) -> error::Result<Sections> {
        Sections::from_fd(&mut Cursor::new(bytes), opts)
    }

    /// Parse the section layout of the ELF file behind `fd`. The position of `fd` is not preserved.
    pub fn from_fd<R: Read + Seek>(fd: &mut R, opts: &ParseOptions) -> error::Result<Sections> {
        let file_len = fd.seek(SeekFrom::End(0))?;
        fd.seek(SeekFrom::Start(0))?;

        let ctx = header::peek(fd)?;
        let header = Header::from_fd(fd, ctx, file_len)?;
        let table = SectionTable::parse(fd, &header, ctx, file_len, opts)?;

        let mut sections = Sections {
            header,
            ctx,
            table,
            section_headers: Vec::new(),
            shdr_strtab: Strtab::default(),
            file_len,
        };
        if table.is_empty() {
            return Ok(sections);
        }

        let mut scratch = vec![0u8; table.entsize];

        let offset = table.entry_offset(table.strndx);
        read_exact_at(fd, offset, &mut scratch, file_len, "section header")?;
        let strtab_shdr: SectionHeader = scratch.pread_with(0, ctx)?;
        debug!(
            "section name string table: {} bytes at {:#x}",
            strtab_shdr.sh_size, strtab_shdr.sh_offset
        );
        sections.shdr_strtab =
            Strtab::from_fd(fd, strtab_shdr.sh_offset, strtab_shdr.sh_size, file_len)?;

        sections
            .section_headers
            .try_reserve_exact(table.count)
            .map_err(error::Error::allocation(
                table
                    .count
                    .saturating_mul(core::mem::size_of::<SectionHeader>()) as u64,
                "section headers",
            ))?;
        fd.seek(SeekFrom::Start(table.offset))?;
        for index in 0..table.count {
            fill(fd, &mut scratch, table.entry_offset(index), "section header")?;
            let shdr: SectionHeader = scratch.pread_with(0, ctx)?;
            sections.section_headers.push(shdr);
        }

        let permissive = opts.is_permissive();
        for (index, shdr) in sections.section_headers.iter().enumerate() {
            debug!(
                "section {}: {} {:#x} + {:#x}",
                index,
                section_header::sht_to_str(shdr.sh_type),
                shdr.sh_offset,
                shdr.sh_size
            );
            sections
                .shdr_strtab
                .get(shdr.sh_name)
                .map(drop)
                .or_warn(permissive, "section name", ())?;
            check_contents(index, shdr, file_len).or_warn(permissive, "section contents", ())?;
        }

        Ok(sections)
    }

    /// Number of sections, including the null section at index 0
    pub fn len(&self) -> usize {
        self.section_headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.section_headers.is_empty()
    }

    /// The section at `index` of the table
    pub fn get(&self, index: usize) -> Option<SectionDescriptor<'_>> {
        self.section_headers
            .get(index)
            .map(|shdr| self.descriptor(index, shdr))
    }

    /// Every section in on-disk order, including the null section at index 0
    pub fn iter(&self) -> impl ExactSizeIterator<Item = SectionDescriptor<'_>> + '_ {
        self.section_headers
            .iter()
            .enumerate()
            .map(move |(index, shdr)| self.descriptor(index, shdr))
    }

    fn descriptor<'a>(&'a self, index: usize, shdr: &SectionHeader) -> SectionDescriptor<'a> {
        // names were checked during parsing; permissive parses read failures as ""
        let name = self.shdr_strtab.get(shdr.sh_name).unwrap_or_default();
        SectionDescriptor {
            index,
            name: String::from_utf8_lossy(name),
            sh_type: shdr.sh_type,
            size: shdr.sh_size,
            offset: shdr.sh_offset,
        }
    }
}

/// Fail if the contents of section `index` extend past the end of the file.
fn check_contents(index: usize, shdr: &SectionHeader, file_len: u64) -> error::Result<()> {
    if shdr.is_nobits() {
        return Ok(());
    }
    match shdr.file_end() {
        Some(end) if end <= file_len => Ok(()),
        _ => Err(error::Error::SectionOutOfRange {
            index,
            offset: shdr.sh_offset,
            size: shdr.sh_size,
            file_len,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Width;
    use scroll::{LE, Pwrite};

    use crate::elf::header::{ELFCLASS32, ELFDATA2LSB, ELFMAG, header32};
    use crate::elf::section_header::{SHT_NOBITS, SHT_PROGBITS, SHT_STRTAB, section_header32};

    const STRTAB: &[u8] = b"\0.shstrtab\0.text\0";

    /// A 32-bit little endian image: header, string table, then the section table.
    fn image(shdrs: &[section_header32::SectionHeader], shentsize: u16, shstrndx: u16) -> Vec<u8> {
        let strtab_offset = header32::SIZEOF_EHDR;
        let shoff = strtab_offset + STRTAB.len();
        let stride = usize::from(shentsize).max(section_header32::SIZEOF_SHDR);
        let mut bytes = vec![0u8; shoff + shdrs.len() * stride];

        let mut e_ident = [0u8; 16];
        e_ident[..4].copy_from_slice(ELFMAG);
        e_ident[4] = ELFCLASS32;
        e_ident[5] = ELFDATA2LSB;
        let header = header32::Header {
            e_ident,
            e_shoff: shoff as u32,
            e_shentsize: shentsize,
            e_shnum: shdrs.len() as u16,
            e_shstrndx: shstrndx,
            ..Default::default()
        };
        bytes.pwrite_with(header, 0, LE).unwrap();
        bytes[strtab_offset..shoff].copy_from_slice(STRTAB);
        for (i, shdr) in shdrs.iter().enumerate() {
            bytes.pwrite_with(*shdr, shoff + i * stride, LE).unwrap();
        }
        bytes
    }

    fn shdrs(text_size: u32) -> Vec<section_header32::SectionHeader> {
        vec![
            section_header32::SectionHeader::default(),
            section_header32::SectionHeader {
                sh_name: 1,
                sh_type: SHT_STRTAB,
                sh_offset: header32::SIZEOF_EHDR as u32,
                sh_size: STRTAB.len() as u32,
                ..Default::default()
            },
            section_header32::SectionHeader {
                sh_name: 11,
                sh_type: SHT_PROGBITS,
                sh_offset: 0,
                sh_size: text_size,
                ..Default::default()
            },
        ]
    }

    #[test]
    fn parses_names_in_order() {
        let bytes = image(&shdrs(0x10), 40, 1);
        let sections = Sections::parse(&bytes).unwrap();
        assert_eq!(sections.ctx, Ctx::new(Width::ThirtyTwo, LE));
        let names: Vec<_> = sections.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["", ".shstrtab", ".text"]);
        assert_eq!(sections.get(2).unwrap().size, 0x10);
        assert!(sections.get(3).is_none());
    }

    #[test]
    fn strict_rejects_padded_entries() {
        let bytes = image(&shdrs(0x10), 48, 1);
        match Sections::parse(&bytes) {
            Err(error::Error::InconsistentEntrySize {
                declared: 48,
                expected: 40,
            }) => (),
            other => panic!("unexpected {:?}", other),
        }
        let sections = Sections::parse_with_opts(&bytes, &ParseOptions::permissive()).unwrap();
        assert_eq!(sections.table.entsize, 48);
        assert_eq!(sections.get(2).unwrap().name, ".text");
    }

    #[test]
    fn short_entries_are_always_rejected() {
        let bytes = image(&shdrs(0x10), 32, 1);
        assert!(matches!(
            Sections::parse_with_opts(&bytes, &ParseOptions::permissive()),
            Err(error::Error::InconsistentEntrySize { declared: 32, .. })
        ));
    }

    #[test]
    fn contents_past_the_end() {
        let bytes = image(&shdrs(0x1000), 40, 1);
        match Sections::parse(&bytes) {
            Err(error::Error::SectionOutOfRange { index: 2, size, .. }) => assert_eq!(size, 0x1000),
            other => panic!("unexpected {:?}", other),
        }
        let sections = Sections::parse_with_opts(&bytes, &ParseOptions::permissive()).unwrap();
        assert_eq!(sections.len(), 3);
    }

    #[test]
    fn nobits_may_extend_past_the_end() {
        let mut shdrs = shdrs(0x1000);
        shdrs[2].sh_type = SHT_NOBITS;
        let bytes = image(&shdrs, 40, 1);
        assert_eq!(Sections::parse(&bytes).unwrap().len(), 3);
    }

    #[test]
    fn check_available_does_not_overflow() {
        assert!(check_available("x", u64::MAX, u64::MAX, 10).is_err());
        assert!(check_available("x", 4, 6, 10).is_ok());
        assert!(check_available("x", 4, 7, 10).is_err());
    }
}
