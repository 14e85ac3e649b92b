//! Parsing options
//!
//! Strict parsing rejects every inconsistency it finds. Permissive parsing
//! downgrades the ones that do not stop the section table from being read to
//! warnings: a section count with no table offset, an entry size larger than
//! the layout, out of range names and sections extending past the end of the
//! file.

use crate::error;

/// Section table parsing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Fails on the first malformed field
    #[default]
    Strict,
    /// Warns about recoverable inconsistencies and keeps going
    Permissive,
}

/// Section table parsing options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// The parsing mode to use
    pub parse_mode: ParseMode,
}

impl ParseOptions {
    /// Options that warn about recoverable inconsistencies instead of failing
    pub fn permissive() -> Self {
        ParseOptions {
            parse_mode: ParseMode::Permissive,
        }
    }

    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    pub fn is_permissive(&self) -> bool {
        self.parse_mode == ParseMode::Permissive
    }
}

/// Turns a recoverable error into a warning when parsing permissively.
pub(crate) trait Permissive<T> {
    /// Strict: pass the error through. Permissive: log it as `what` and go on with `fallback`.
    fn or_warn(self, permissive: bool, what: &str, fallback: T) -> error::Result<T>;
}

impl<T> Permissive<T> for error::Result<T> {
    fn or_warn(self, permissive: bool, what: &str, fallback: T) -> error::Result<T> {
        match self {
            Err(err) if permissive => {
                warn!("{}: {}, ignoring", what, err);
                Ok(fallback)
            }
            res => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_is_default() {
        assert!(!ParseOptions::default().is_permissive());
        assert_eq!(
            ParseOptions::default().with_parse_mode(ParseMode::Permissive),
            ParseOptions::permissive()
        );
    }

    #[test]
    fn permissive_swallows_errors() {
        let failed = || -> error::Result<u32> { Err(error::Error::UnsupportedWordWidth(3)) };
        assert_eq!(failed().or_warn(true, "width", 7).unwrap(), 7);
        assert!(matches!(
            failed().or_warn(false, "width", 7),
            Err(error::Error::UnsupportedWordWidth(3))
        ));
        let ok: error::Result<u32> = Ok(1);
        assert_eq!(ok.or_warn(true, "width", 7).unwrap(), 1);
    }
}
