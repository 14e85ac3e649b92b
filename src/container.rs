//! The word width and byte order a file is decoded with

use scroll::Endian;

/// The field layout selected by an ELF class byte
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Width {
    ThirtyTwo,
    SixtyFour,
}

impl Width {
    /// Is this the 64-bit layout
    pub fn is_big(self) -> bool {
        self == Width::SixtyFour
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// A decoding context: which layout, and which byte order, every multi-width field is read with
pub struct Ctx {
    pub width: Width,
    pub le: Endian,
}

impl Ctx {
    /// Create a new decoding context
    pub fn new(width: Width, le: Endian) -> Self {
        Ctx { width, le }
    }

    /// Whether this decoding context is "big" or not
    pub fn is_big(self) -> bool {
        self.width.is_big()
    }

    /// Whether this decoding context is little endian or not
    pub fn is_little_endian(self) -> bool {
        self.le.is_little()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert!(!Width::ThirtyTwo.is_big());
        assert!(Ctx::new(Width::SixtyFour, Endian::Big).is_big());
        assert!(!Ctx::new(Width::SixtyFour, Endian::Big).is_little_endian());
    }
}
