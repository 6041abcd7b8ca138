//! Streaming parsers for alignment records, intervals and signal tracks.
//!
//! This module provides:
//!
//! - **Line sources** ([`source`]): files, gzip files, stdin and subprocess pipes
//! - **SAM** ([`sam`]): pull-based reader and writer for SAM alignment lines
//! - **MRF** ([`mrf`]): schema-driven reader and writer for mapped read format
//! - **BED** ([`bed`]): three-column interval files
//! - **Wiggle** ([`wig`]): signal tracks for segmentation
//!
//! ## Example
//!
//! ```rust
//! use mrf_tools::parsing::sam::SamReader;
//! use mrf_tools::parsing::source::TextLines;
//!
//! let text = "@HD\tVN:1.6\nr1\t0\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII\n";
//! let mut reader = SamReader::new(TextLines::new(text.as_bytes()));
//!
//! while let Some(record) = reader.next_record().unwrap() {
//!     println!("{} {}", record.query_name, record.cigar);
//! }
//! reader.close().unwrap();
//! ```
//!
//! ## Error policy
//!
//! | Problem | Error | Default behaviour |
//! |---------|-------|-------------------|
//! | Too few fields, malformed block tuple | [`ParseError::InvalidFormat`] | stream aborts |
//! | Non-numeric number, bad CIGAR | [`ParseError::InvalidFormat`] | stream aborts (zero / `Invalid` op when lenient) |
//! | Missing or unknown MRF column | [`ParseError::Configuration`] | always fatal |
//! | Read failure | [`ParseError::Io`] | always fatal |
//!
//! See [`ParseOptions`] for the lenient and skip-malformed modes.

use thiserror::Error;

pub mod bed;
pub mod mrf;
pub mod sam;
pub mod source;
pub mod wig;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid {format} record on line {line}: {message}")]
    InvalidFormat {
        format: &'static str,
        line: usize,
        message: String,
    },

    #[error("Invalid column configuration: {0}")]
    Configuration(String),
}

impl ParseError {
    pub(crate) fn invalid(format: &'static str, line: usize, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            format,
            line,
            message: message.into(),
        }
    }

    /// Whether the stream can continue past this error when skipping malformed lines
    #[must_use]
    pub fn is_malformed_record(&self) -> bool {
        matches!(self, Self::InvalidFormat { .. })
    }
}

/// Behaviour of the stream parsers on questionable input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Parse numbers like C `atoi` (garbage becomes 0) and CIGARs without
    /// validation, and skip the SEQ length check. Unlike `atoi`, a number that
    /// does not fit its column's type (MAPQ above 255, negative FLAG) also
    /// becomes 0.
    pub lenient: bool,

    /// Log and skip malformed records instead of aborting the stream
    pub skip_malformed: bool,
}

impl ParseOptions {
    /// Strict numbers and CIGARs, abort on the first malformed record
    #[must_use]
    pub fn strict() -> Self {
        Self::default()
    }

    /// Historical behaviour: lenient numbers and CIGARs, abort on malformed records.
    ///
    /// Out-of-range numbers become 0 rather than wrapping or widening, so a
    /// MAPQ of `300` reads as 0.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            lenient: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_skip_malformed(mut self, skip_malformed: bool) -> Self {
        self.skip_malformed = skip_malformed;
        self
    }
}
