//! # sectview
//!
//! Reads the section layout (name, file offset, size) of 32 and 64 bit ELF
//! files, in either byte order.
//!
//! The parser works over anything that is `Read + Seek`, checks every count,
//! size and offset it takes from the file against the file's length, and
//! reports the first inconsistency it finds as an [`error::Error`]; it never
//! returns a partial table.
//!
//! # Example
//!
//! ```rust,no_run
//! use sectview::options::ParseOptions;
//!
//! let sections = sectview::from_path("/bin/ls", &ParseOptions::default())?;
//! for section in sections.iter().skip(1) {
//!     println!("{:>8x} {:>8} {}", section.offset, section.size, section.name);
//! }
//! # Ok::<(), sectview::error::Error>(())
//! ```
//!
//! # Feature Usage
//!
//! * `log` - emit `debug!` traces of the parse and `warn!`ings for inconsistencies
//!   tolerated by [`ParseMode::Permissive`](options::ParseMode::Permissive)
//! * `cli` - the `sectview` binary

#[macro_use]
mod macros;

pub mod container;
pub mod elf;
pub mod error;
pub mod options;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub use crate::elf::{SectionDescriptor, Sections};

/// Open the file at `path` and parse its section layout.
pub fn from_path<P: AsRef<Path>>(path: P, opts: &options::ParseOptions) -> error::Result<Sections> {
    let mut fd = BufReader::new(File::open(path)?);
    Sections::from_fd(&mut fd, opts)
}

/// Parse the section layout of the ELF image in `bytes`, strictly.
pub fn parse(bytes: &[u8]) -> error::Result<Sections> {
    Sections::parse(bytes)
}
