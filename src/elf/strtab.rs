//! The section name string table.
//!
//! A byte-offset based string table: names are looked up by the offset of
//! their first byte and run up to the next NUL, or the end of the table.

use core::fmt;
use std::io::{Read, Seek};

use crate::error;

/// An owned, NUL delimited string table indexed by byte offset.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Strtab {
    bytes: Vec<u8>,
}

impl Strtab {
    /// Wrap an already loaded string table.
    pub fn new(bytes: Vec<u8>) -> Self {
        Strtab { bytes }
    }

    /// Read `len` bytes at `offset` of `fd` into a new string table.
    ///
    /// The declared range is checked against `file_len` before anything is
    /// allocated, so a hostile `sh_size` cannot request more memory than the
    /// file could ever fill.
    pub fn from_fd<R: Read + Seek>(
        fd: &mut R,
        offset: u64,
        len: u64,
        file_len: u64,
    ) -> error::Result<Strtab> {
        super::check_available("string table", offset, len, file_len)?;
        let size = usize::try_from(len)
            .map_err(|_| error::Error::AllocationFailure(len, "string table"))?;
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(error::Error::allocation(len, "string table"))?;
        bytes.resize(size, 0);
        super::read_exact_at(fd, offset, &mut bytes, file_len, "string table")?;
        Ok(Strtab { bytes })
    }

    /// The length of the table in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the table holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw bytes of the table.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Gets the name starting at `offset`, up to the next NUL or the end of the table.
    ///
    /// Names are raw bytes; nothing requires them to be UTF-8. Fails with
    /// [`NameOffsetOutOfRange`](error::Error::NameOffsetOutOfRange) when `offset`
    /// is not inside the table.
    pub fn get(&self, offset: usize) -> error::Result<&[u8]> {
        let tail = self
            .bytes
            .get(offset..)
            .filter(|tail| !tail.is_empty())
            .ok_or(error::Error::NameOffsetOutOfRange {
                offset,
                len: self.bytes.len(),
            })?;
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Ok(&tail[..end])
    }
}

impl fmt::Debug for Strtab {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn get_runs_to_nul() {
        let strtab = Strtab::new(b"\0.text\0.data\0".to_vec());
        assert_eq!(strtab.get(0).unwrap(), b"");
        assert_eq!(strtab.get(1).unwrap(), b".text");
        assert_eq!(strtab.get(7).unwrap(), b".data");
        // an offset inside a name yields its tail
        assert_eq!(strtab.get(3).unwrap(), b"ext");
    }

    #[test]
    fn get_runs_to_end_without_nul() {
        let strtab = Strtab::new(b"\0.text\0.bss".to_vec());
        assert_eq!(strtab.get(7).unwrap(), b".bss");
        assert_eq!(strtab.get(10).unwrap(), b"s");
    }

    #[test]
    fn get_is_pure() {
        let strtab = Strtab::new(b"\0.text\0".to_vec());
        assert_eq!(strtab.get(1).unwrap(), strtab.get(1).unwrap());
    }

    #[test]
    fn offset_at_len_is_out_of_range() {
        let strtab = Strtab::new(b"\0.text\0".to_vec());
        match strtab.get(strtab.len()) {
            Err(error::Error::NameOffsetOutOfRange { offset: 7, len: 7 }) => (),
            other => panic!("unexpected {:?}", other),
        }
        assert!(Strtab::default().get(0).is_err());
    }

    #[test]
    fn names_need_not_be_utf8() {
        let strtab = Strtab::new(b"\0\xc0\xaf\0.data".to_vec());
        assert_eq!(strtab.get(1).unwrap(), b"\xc0\xaf");
        assert_eq!(strtab.get(4).unwrap(), b".data");
    }

    #[test]
    fn from_fd_reads_exactly() {
        let mut fd = Cursor::new(b"junk\0.text\0junk".to_vec());
        let strtab = Strtab::from_fd(&mut fd, 4, 7, 15).unwrap();
        assert_eq!(strtab.as_bytes(), b"\0.text\0");
    }

    #[test]
    fn from_fd_rejects_oversized_tables() {
        let mut fd = Cursor::new(vec![0u8; 16]);
        match Strtab::from_fd(&mut fd, 8, u64::MAX - 4, 16) {
            Err(error::Error::TruncatedRead { available: 8, .. }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }
}
