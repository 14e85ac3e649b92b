//! The sectview error type
//!
//! Every variant is terminal for the parse that produced it; nothing in the
//! parser retries or returns a partial table.

use core::fmt;
use core::result;
use std::collections::TryReserveError;
use std::{error, io};

#[non_exhaustive]
#[derive(Debug)]
/// Everything that can go wrong while reading a section layout
pub enum Error {
    /// The leading bytes are not the ELF magic
    NotAnExpectedBinary([u8; 4]),
    /// The class byte is neither `ELFCLASS32` nor `ELFCLASS64`
    UnsupportedWordWidth(u8),
    /// The data byte is neither `ELFDATA2LSB` nor `ELFDATA2MSB`
    UnsupportedEncoding(u8),
    /// A structure extends past the end of the input
    TruncatedRead {
        /// What was being read
        what: &'static str,
        /// File offset the read started at
        offset: u64,
        /// Bytes the structure declares
        wanted: u64,
        /// Bytes actually available from `offset`
        available: u64,
    },
    /// `e_shnum` declares sections but `e_shoff` places no table in the file
    MissingSectionTable { count: u16 },
    /// `e_shstrndx` does not name an entry of the section header table
    InvalidStringTableIndex { index: usize, count: usize },
    /// `e_shentsize` disagrees with the layout selected by the class byte
    InconsistentEntrySize { declared: u16, expected: usize },
    /// A section's `sh_name` points at or past the end of the string table
    NameOffsetOutOfRange { offset: usize, len: usize },
    /// A section's contents claim to extend past the end of the file
    SectionOutOfRange {
        index: usize,
        offset: u64,
        size: u64,
        file_len: u64,
    },
    /// A buffer sized from the input could not be allocated
    AllocationFailure(u64, &'static str),
    /// An error emanating from reading and interpreting bytes
    Scroll(scroll::Error),
    /// An IO based error
    IO(io::Error),
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IO(ref io) => Some(io),
            Error::Scroll(ref scroll) => Some(scroll),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IO(err)
    }
}

impl From<scroll::Error> for Error {
    fn from(err: scroll::Error) -> Error {
        Error::Scroll(err)
    }
}

impl Error {
    /// Map a failed fallible reservation of `size` bytes for `what`
    pub(crate) fn allocation(
        size: u64,
        what: &'static str,
    ) -> impl FnOnce(TryReserveError) -> Error {
        move |_| Error::AllocationFailure(size, what)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::NotAnExpectedBinary(ref magic) => {
                write!(fmt, "Not an ELF file (magic {:02x?})", magic)
            }
            Error::UnsupportedWordWidth(class) => {
                write!(fmt, "Unknown binary word-size (class byte 0x{:x})", class)
            }
            Error::UnsupportedEncoding(data) => {
                write!(fmt, "Unknown data encoding (data byte 0x{:x})", data)
            }
            Error::TruncatedRead {
                what,
                offset,
                wanted,
                available,
            } => write!(
                fmt,
                "Truncated {}: wanted {} bytes at offset {:#x}, only {} available",
                what, wanted, offset, available
            ),
            Error::MissingSectionTable { count } => write!(
                fmt,
                "{} sections declared but the section header table offset is 0",
                count
            ),
            Error::InvalidStringTableIndex { index, count } => write!(
                fmt,
                "String table index {} is out of range for {} sections",
                index, count
            ),
            Error::InconsistentEntrySize { declared, expected } => write!(
                fmt,
                "Section header entry size is {} bytes, expected {}",
                declared, expected
            ),
            Error::NameOffsetOutOfRange { offset, len } => write!(
                fmt,
                "Section name offset {:#x} is outside the {} byte string table",
                offset, len
            ),
            Error::SectionOutOfRange {
                index,
                offset,
                size,
                file_len,
            } => write!(
                fmt,
                "Section {} ({:#x} + {:#x}) extends past the end of the {} byte file",
                index, offset, size, file_len
            ),
            Error::AllocationFailure(size, what) => {
                write!(fmt, "Could not allocate {} bytes for the {}", size, what)
            }
            Error::Scroll(ref err) => write!(fmt, "{}", err),
            Error::IO(ref err) => write!(fmt, "{}", err),
        }
    }
}

/// The result of every fallible sectview operation
pub type Result<T> = result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_single_line() {
        let err = Error::TruncatedRead {
            what: "ELF header",
            offset: 0,
            wanted: 64,
            available: 20,
        };
        let msg = err.to_string();
        assert!(!msg.contains('\n'));
        assert!(msg.contains("wanted 64 bytes"));
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(error::Error::source(&err).is_some());
        assert!(error::Error::source(&Error::UnsupportedWordWidth(7)).is_none());
    }
}
